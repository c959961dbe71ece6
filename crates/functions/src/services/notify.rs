//! Best-effort email to the store owner when a new order lands.
//!
//! The notifier never returns an error and never retries. Every outcome,
//! including failures, is reported as a [`NotificationOutcome`] and logged;
//! nothing flows back to the customer who placed the order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use menuboard_core::{Email, Order, OrderId, TenantId, TenantProfile};

use crate::services::email::{EmailError, EmailService, render_order_notification};
use crate::store::{DocumentStore, layout};

/// Emitted once per stored order.
#[derive(Debug, Clone)]
pub struct OrderCreated {
    pub tenant: TenantId,
    pub order_id: OrderId,
    pub order: Order,
}

/// A fully rendered message ready for a [`MailTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Email,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Something that can deliver an [`OutgoingMail`].
pub trait MailTransport: Send + Sync {
    /// Attempt delivery once.
    fn send(
        &self,
        mail: &OutgoingMail,
    ) -> impl Future<Output = Result<(), EmailError>> + Send;
}

/// What happened to one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    /// The store has no profile or no usable notification address.
    SkippedNoRecipient,
    /// Lookup, rendering or delivery failed. Not retried.
    Failed(String),
}

/// Mail transport that keeps messages in memory instead of sending them.
///
/// Used when running locally and in tests.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    inner: Arc<RecordingInner>,
}

#[derive(Default)]
struct RecordingInner {
    sent: Mutex<Vec<OutgoingMail>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail.
    pub fn fail_sends(&self, fail: bool) {
        self.inner.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of sends attempted, including failed ones.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Messages accepted so far.
    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.inner.sent.lock().await.clone()
    }
}

impl MailTransport for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), EmailError> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(EmailError::Rejected("mail relay unavailable".to_owned()));
        }
        self.inner.sent.lock().await.push(mail.clone());
        Ok(())
    }
}

/// The transport selected at startup.
#[derive(Clone)]
pub enum Mailer {
    Smtp(EmailService),
    Recording(RecordingMailer),
}

impl MailTransport for Mailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), EmailError> {
        match self {
            Self::Smtp(m) => m.send(mail).await,
            Self::Recording(m) => m.send(mail).await,
        }
    }
}

/// Sends the new-order email to the store owner.
#[derive(Clone)]
pub struct OrderNotifier<D, M> {
    documents: D,
    mailer: M,
}

impl<D: DocumentStore, M: MailTransport> OrderNotifier<D, M> {
    pub const fn new(documents: D, mailer: M) -> Self {
        Self { documents, mailer }
    }

    /// Handle one [`OrderCreated`] event.
    #[instrument(skip_all, fields(tenant = %event.tenant, order_id = %event.order_id))]
    pub async fn notify(&self, event: &OrderCreated) -> NotificationOutcome {
        let profile = match self.load_profile(&event.tenant).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                info!("Store has no profile, skipping order notification");
                return NotificationOutcome::SkippedNoRecipient;
            }
            Err(message) => {
                error!(error = %message, "Failed to load store profile");
                return NotificationOutcome::Failed(message);
            }
        };

        let Some(to) = profile.notification_email() else {
            info!("Store has no notification email, skipping order notification");
            return NotificationOutcome::SkippedNoRecipient;
        };

        let mail = match render_order_notification(to, &profile, &event.order_id, &event.order) {
            Ok(mail) => mail,
            Err(e) => {
                error!(error = %e, "Failed to render order notification");
                return NotificationOutcome::Failed(e.to_string());
            }
        };

        match self.mailer.send(&mail).await {
            Ok(()) => {
                info!(to = %mail.to, "Order notification sent");
                NotificationOutcome::Sent
            }
            Err(e) => {
                warn!(to = %mail.to, error = %e, "Order notification failed, not retrying");
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }

    async fn load_profile(&self, tenant: &TenantId) -> Result<Option<TenantProfile>, String> {
        let path = layout::profile_root(tenant).map_err(|e| e.to_string())?;
        let doc = self
            .documents
            .get(&path)
            .await
            .map_err(|e| e.to_string())?;
        doc.map(|d| d.decode::<TenantProfile>())
            .transpose()
            .map_err(|e| e.to_string())
    }
}

/// Start the background worker that notifies for every published order.
///
/// The worker runs until every sender is dropped.
pub fn spawn_order_notifications<D, M>(
    notifier: OrderNotifier<D, M>,
) -> (mpsc::UnboundedSender<OrderCreated>, JoinHandle<()>)
where
    D: DocumentStore + 'static,
    M: MailTransport + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<OrderCreated>();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let outcome = notifier.notify(&event).await;
            debug!(
                tenant = %event.tenant,
                order_id = %event.order_id,
                outcome = ?outcome,
                "Order notification finished"
            );
        }
        info!("Order notification worker stopped");
    });
    (tx, handle)
}
