use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::ports::{EmailPort, MessagingPort};
use crate::domain::alert::{AlertRecord, DeliveryReport, DeliveryStatus};

#[derive(Clone)]
pub struct EmailChannel {
    pub transport: Arc<dyn EmailPort>,
    pub to: String,
}

#[derive(Clone)]
pub struct MessagingChannel {
    pub transport: Arc<dyn MessagingPort>,
    pub to: Vec<String>,
}

/// Reparte una alerta disparada a los canales configurados.
/// Cada canal se intenta una sola vez; los fallos se registran y se reportan.
#[derive(Clone, Default)]
pub struct Notifier {
    email: Option<EmailChannel>,
    messaging: Option<MessagingChannel>,
}

impl Notifier {
    pub fn new(email: Option<EmailChannel>, messaging: Option<MessagingChannel>) -> Self {
        Self { email, messaging }
    }

    pub fn email_enabled(&self) -> bool {
        self.email.is_some()
    }

    pub fn messaging_enabled(&self) -> bool {
        self.messaging.is_some()
    }

    pub async fn dispatch(
        &self,
        record: &AlertRecord,
        attachment: Option<PathBuf>,
    ) -> DeliveryReport {
        let email = match &self.email {
            None => {
                warn!("Email credentials not configured. Skipping email alert.");
                DeliveryStatus::Skipped
            }
            Some(ch) => {
                let attachment = attachment.as_deref().filter(|p| p.exists());
                match ch.transport
                    .send_email(&ch.to, record.email_subject(), &record.email_body(), attachment)
                    .await
                {
                    Ok(()) => {
                        info!("📧 Alert email sent to {}", ch.to);
                        DeliveryStatus::Sent
                    }
                    Err(e) => {
                        error!("❌ Failed to send alert email: {}", e);
                        DeliveryStatus::Failed(e.to_string())
                    }
                }
            }
        };

        let whatsapp = match &self.messaging {
            None => {
                warn!("WhatsApp not configured. Skipping WhatsApp alert.");
                DeliveryStatus::Skipped
            }
            Some(ch) => {
                let text = record.message_text();
                let mut failures = Vec::new();
                for to in &ch.to {
                    if let Err(e) = ch.transport.send_message(to, &text).await {
                        error!("❌ Failed to send WhatsApp alert to {}: {}", to, e);
                        failures.push(format!("{to}: {e}"));
                    }
                }
                if failures.is_empty() {
                    info!("📱 WhatsApp alert sent to {} number(s)", ch.to.len());
                    DeliveryStatus::Sent
                } else {
                    DeliveryStatus::Failed(failures.join("; "))
                }
            }
        };

        DeliveryReport { email, whatsapp }
    }
}
