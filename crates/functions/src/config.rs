//! Functions configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FUNCTIONS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `FUNCTIONS_TOKEN_SECRET` - Identity token signing secret (min 32 chars, high entropy)
//! - `BOOTSTRAP_SUPERADMIN_UID` - Uid of the root principal (always authorized, never deletable)
//! - `SMTP_HOST` - SMTP server hostname
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//! - `SMTP_FROM` - Email sender address
//!
//! ## Optional
//! - `FUNCTIONS_HOST` - Bind address (default: 127.0.0.1)
//! - `FUNCTIONS_PORT` - Listen port (default: 3002)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use menuboard_core::Uid;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Functions service configuration.
#[derive(Debug, Clone)]
pub struct FunctionsConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// HMAC key for identity tokens
    pub token_secret: SecretString,
    /// The root principal
    pub bootstrap_uid: Uid,
    /// Email configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl FunctionsConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FUNCTIONS_DATABASE_URL")?;
        let host = get_env_or_default("FUNCTIONS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FUNCTIONS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("FUNCTIONS_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FUNCTIONS_PORT".to_string(), e.to_string()))?;

        let token_secret = get_validated_secret("FUNCTIONS_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "FUNCTIONS_TOKEN_SECRET")?;

        let bootstrap_uid = Uid::new(get_required_env("BOOTSTRAP_SUPERADMIN_UID")?.trim());
        if bootstrap_uid.is_blank() {
            return Err(ConfigError::InvalidEnvVar(
                "BOOTSTRAP_SUPERADMIN_UID".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        let email = EmailConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            token_secret,
            bootstrap_uid,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_validated_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("SMTP_FROM")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("k8$Qw2!vN7@pL4#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        for candidate in ["your-token-here", "changeme123", "my-secret-value"] {
            let err = validate_secret_strength(candidate, "TEST_VAR").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        }
    }

    #[test]
    fn test_validate_secret_strength_rejects_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_accepts_random() {
        assert!(validate_secret_strength("Zq8!mR3@tY6#uW1$vB4%nK7^pL0&sD2*", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_token_secret_length() {
        assert!(validate_token_secret(&SecretString::from("short"), "T").is_err());
        assert!(validate_token_secret(&SecretString::from("a".repeat(32)), "T").is_ok());
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.mailhost.test".to_string(),
            smtp_port: 587,
            smtp_username: "menuboard".to_string(),
            smtp_password: SecretString::from("hunter2-smtp-credential"),
            from_address: "orders@menuboard.test".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.mailhost.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2-smtp-credential"));
    }

    #[test]
    fn test_socket_addr() {
        let config = FunctionsConfig {
            database_url: SecretString::from("postgres://localhost/menuboard"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3002,
            token_secret: SecretString::from("x".repeat(32)),
            bootstrap_uid: Uid::new("root"),
            email: EmailConfig {
                smtp_host: "smtp.mailhost.test".to_string(),
                smtp_port: 587,
                smtp_username: "user".to_string(),
                smtp_password: SecretString::from("pass"),
                from_address: "orders@menuboard.test".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3002);
    }
}
