use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;

use crate::application::ports::EmailPort;
use crate::config::EmailConfig;
use crate::domain::errors::{DomainError, DomainResult};

/// Envío por SMTP con STARTTLS (Gmail por defecto, puerto 587).
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(cfg: &EmailConfig) -> DomainResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
            .map_err(|e| DomainError::Transport(format!("SMTP relay {}: {e}", cfg.smtp_host)))?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(cfg.user.clone(), cfg.password.clone()))
            .build();
        Ok(Self { transport, from: parse_mailbox(&cfg.user)? })
    }
}

fn parse_mailbox(addr: &str) -> DomainResult<Mailbox> {
    addr.parse::<Mailbox>()
        .map_err(|e| DomainError::InvalidInput(format!("email address {addr:?}: {e}")))
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

pub(crate) fn build_message(
    from: Mailbox,
    to: &str,
    subject: &str,
    body: &str,
    attachment: Option<(String, &'static str, Vec<u8>)>,
) -> DomainResult<Message> {
    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(body.to_string()));
    if let Some((file_name, mime, bytes)) = attachment {
        let content_type = ContentType::parse(mime)
            .map_err(|e| DomainError::InvalidInput(format!("content type {mime}: {e}")))?;
        parts = parts.singlepart(Attachment::new(file_name).body(bytes, content_type));
    }

    Message::builder()
        .from(from)
        .to(parse_mailbox(to)?)
        .subject(subject)
        .multipart(parts)
        .map_err(|e| DomainError::InvalidInput(format!("email build: {e}")))
}

#[async_trait]
impl EmailPort for SmtpEmailSender {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> DomainResult<()> {
        let attachment = match attachment {
            Some(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| DomainError::Storage(format!("{}: {e}", path.display())))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "snapshot.jpg".into());
                Some((file_name, content_type_for(path), bytes))
            }
            None => None,
        };

        let message = build_message(self.from.clone(), to, subject, body, attachment)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| DomainError::Transport(format!("SMTP: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_attachment_part() {
        let from = parse_mailbox("shop@example.com").unwrap();
        let msg = build_message(
            from,
            "owner@example.com",
            "Person Detected",
            "someone is in the shop",
            Some(("alert_1.jpg".into(), "image/jpeg", vec![0xFF, 0xD8, 0xFF])),
        )
        .unwrap();
        let raw = String::from_utf8_lossy(&msg.formatted()).to_string();
        assert!(raw.contains("To: owner@example.com"));
        assert!(raw.contains("someone is in the shop"));
        assert!(raw.contains("filename=\"alert_1.jpg\""));
        assert!(raw.contains("image/jpeg"));
    }

    #[test]
    fn rejects_bad_recipient() {
        let from = parse_mailbox("shop@example.com").unwrap();
        assert!(matches!(
            build_message(from, "not an address", "s", "b", None),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn png_snapshots_keep_their_mime_type() {
        assert_eq!(content_type_for(Path::new("a/annotated_x.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("alert_1.jpg")), "image/jpeg");
    }
}
