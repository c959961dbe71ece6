//! Store subdomain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Subdomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubdomainError {
    /// The input is empty after trimming.
    #[error("subdomain cannot be empty")]
    Empty,
    /// The input exceeds the DNS label limit.
    #[error("subdomain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9-]`.
    #[error("subdomain may only contain letters, digits and hyphens (found {0:?})")]
    InvalidCharacter(char),
    /// The input starts or ends with a hyphen.
    #[error("subdomain cannot start or end with a hyphen")]
    EdgeHyphen,
}

/// The human-chosen label a store is served under (`{subdomain}.example.com`).
///
/// Input is trimmed and lowercased; the result is a single DNS label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Subdomain(String);

impl Subdomain {
    /// Maximum length of a DNS label.
    pub const MAX_LENGTH: usize = 63;

    /// Parse and normalize a subdomain.
    ///
    /// # Errors
    ///
    /// Returns a [`SubdomainError`] describing the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, SubdomainError> {
        let label = s.trim().to_ascii_lowercase();
        if label.is_empty() {
            return Err(SubdomainError::Empty);
        }
        if label.len() > Self::MAX_LENGTH {
            return Err(SubdomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(bad) = label
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SubdomainError::InvalidCharacter(bad));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(SubdomainError::EdgeHyphen);
        }
        Ok(Self(label))
    }

    /// Returns the subdomain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Subdomain {
    type Err = SubdomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Subdomain {
    type Error = SubdomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Subdomain> for String {
    fn from(subdomain: Subdomain) -> Self {
        subdomain.0
    }
}
