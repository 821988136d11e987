//! E-mail delivery stand-in.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use opero_core::config::EmailSettings;
use opero_core::email::{EmailMessage, EmailReceipt, EmailSender};
use opero_core::error::{ServiceError, ServiceResult};
use uuid::Uuid;

/// Logs messages instead of delivering them, after an artificial delay.
///
/// Sent messages are kept so callers (and tests) can inspect the outbox.
pub struct SimulatedEmailSender {
    from_address: String,
    delay: Duration,
    outbox: Mutex<Vec<EmailMessage>>,
}

impl SimulatedEmailSender {
    pub fn new(settings: &EmailSettings) -> Self {
        Self {
            from_address: settings.from_address.clone(),
            delay: Duration::from_millis(settings.simulated_delay_ms),
            outbox: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for SimulatedEmailSender {
    async fn send(&self, message: EmailMessage) -> ServiceResult<EmailReceipt> {
        if !opero_core::team::is_valid_email(&message.to) {
            return Err(ServiceError::validation("Geçerli bir e-posta adresi girin."));
        }

        tokio::time::sleep(self.delay).await;

        let receipt = EmailReceipt {
            message_id: Uuid::new_v4().to_string(),
            sent_at: Utc::now(),
        };
        tracing::info!(
            from = %self.from_address,
            to = %message.to,
            subject = %message.subject,
            message_id = %receipt.message_id,
            "Simulated e-mail sent"
        );
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(message);
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opero_core::email::welcome_email;

    #[tokio::test(start_paused = true)]
    async fn test_send_waits_for_the_configured_delay() {
        let sender = SimulatedEmailSender::new(&EmailSettings::default());
        let started = tokio::time::Instant::now();

        let receipt = sender
            .send(welcome_email("ali@ofis.com", "Ali Kaya"))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(800));
        assert!(!receipt.message_id.is_empty());
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let settings = EmailSettings {
            simulated_delay_ms: 0,
            ..Default::default()
        };
        let sender = SimulatedEmailSender::new(&settings);

        let err = sender.send(welcome_email("not-an-address", "Ali")).await.unwrap_err();
        assert_eq!(err.kind, opero_core::error::ErrorKind::Validation);
        assert!(sender.sent().is_empty());
    }
}
