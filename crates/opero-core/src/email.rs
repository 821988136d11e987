//! Outgoing e-mail contract and message templates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Acknowledgement returned once a message has been handed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
}

/// Transactional e-mail provider.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> ServiceResult<EmailReceipt>;
}

pub fn invitation_email(to: &str, workspace_name: &str, inviter_name: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("{workspace_name} ekibine davet edildiniz"),
        body: format!(
            "Merhaba,\n\n{inviter_name} sizi OPERO üzerinde {workspace_name} ekibine davet etti.\n\
             Daveti kabul etmek için bağlantıya tıklayın:\n{link}\n\n\
             Bu bağlantı 7 gün boyunca geçerlidir."
        ),
    }
}

pub fn welcome_email(to: &str, full_name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "OPERO'ya hoş geldiniz".to_string(),
        body: format!(
            "Merhaba {full_name},\n\nOPERO hesabınız oluşturuldu. \
             Portföyünüzü eklemeye hemen başlayabilirsiniz."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_email_mentions_workspace_and_link() {
        let message = invitation_email(
            "ali@ofis.com",
            "Güneş Emlak",
            "Ayşe",
            "https://app.opero.io/invite/abc",
        );
        assert_eq!(message.to, "ali@ofis.com");
        assert!(message.subject.contains("Güneş Emlak"));
        assert!(message.body.contains("https://app.opero.io/invite/abc"));
    }
}
