//! Outbound email: admin alerts and general enquiries.

use crate::config::SmtpConfig;
use crate::error::AppError;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Alert administrators that a user requested vault access. Callers treat
    /// this as best-effort; failures are theirs to log and swallow.
    async fn send_access_request_alert(
        &self,
        user_id: &str,
        hub_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<(), AppError>;

    /// Forward a general enquiry. This one is the primary effect of its
    /// endpoint and failures propagate.
    async fn send_enquiry(
        &self,
        name: &str,
        reply_to: &str,
        message: &str,
    ) -> Result<(), AppError>;
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    admin_email: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig, admin_email: String) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::EmailError(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        tracing::info!(host = %config.host, "SMTP notifier initialized");

        Ok(Self {
            transport,
            from_email: config.from_email.clone(),
            admin_email,
        })
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), AppError> {
        let from: Mailbox = self
            .from_email
            .parse()
            .map_err(|e| AppError::EmailError(format!("Invalid from address: {}", e)))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::EmailError(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::EmailError(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_access_request_alert(
        &self,
        user_id: &str,
        hub_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<(), AppError> {
        let body = format!(
            "User {} requested vault access.\n\nHub: {}\nRequest: {}\n",
            user_id, hub_id, subscription_id
        );
        self.send(&self.admin_email, "New vault access request", body)
            .await?;

        tracing::info!(user_id = %user_id, "Admin access-request alert sent");
        Ok(())
    }

    async fn send_enquiry(
        &self,
        name: &str,
        reply_to: &str,
        message: &str,
    ) -> Result<(), AppError> {
        let body = format!("From: {} <{}>\n\n{}\n", name, reply_to, message);
        self.send(&self.admin_email, "New enquiry", body).await?;

        tracing::info!(reply_to = %reply_to, "Enquiry forwarded");
        Ok(())
    }
}

/// Notifier used when SMTP is disabled: messages are logged, never sent.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_access_request_alert(
        &self,
        user_id: &str,
        hub_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<(), AppError> {
        tracing::info!(
            user_id = %user_id,
            hub_id = %hub_id,
            subscription_id = %subscription_id,
            "SMTP disabled; access-request alert logged only"
        );
        Ok(())
    }

    async fn send_enquiry(
        &self,
        name: &str,
        reply_to: &str,
        _message: &str,
    ) -> Result<(), AppError> {
        tracing::info!(
            name = %name,
            reply_to = %reply_to,
            "SMTP disabled; enquiry logged only"
        );
        Ok(())
    }
}

/// Recording notifier for tests; flips to failing when `fail` is set.
#[derive(Default)]
pub struct MockNotifier {
    pub sent: std::sync::Mutex<Vec<String>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_access_request_alert(
        &self,
        user_id: &str,
        _hub_id: Uuid,
        _subscription_id: Uuid,
    ) -> Result<(), AppError> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(AppError::EmailError("smtp down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push(format!("access-request:{}", user_id));
        Ok(())
    }

    async fn send_enquiry(
        &self,
        _name: &str,
        reply_to: &str,
        _message: &str,
    ) -> Result<(), AppError> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(AppError::EmailError("smtp down".to_string()));
        }
        self.sent.lock().unwrap().push(format!("enquiry:{}", reply_to));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_accepts_without_a_transport() {
        let notifier = LogNotifier;
        let hub = Uuid::new_v4();

        assert!(notifier
            .send_access_request_alert("u1", hub, Uuid::new_v4())
            .await
            .is_ok());
        assert!(notifier
            .send_enquiry("Jane Doe", "jane@example.com", "Hello")
            .await
            .is_ok());
    }
}
