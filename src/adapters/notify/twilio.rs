use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use crate::application::ports::MessagingPort;
use crate::config::WhatsAppConfig;
use crate::domain::errors::{DomainError, DomainResult};

/// WhatsApp a través de la API REST de Twilio (`Messages.json`).
pub struct TwilioWhatsApp {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_phone: String,
    api_base: String,
}

impl TwilioWhatsApp {
    pub fn new(cfg: &WhatsAppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            account_sid: cfg.account_sid.clone(),
            auth_token: cfg.auth_token.clone(),
            from_phone: cfg.from_phone.clone(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.api_base, self.account_sid)
    }
}

fn whatsapp_address(phone: &str) -> String {
    let phone = phone.trim();
    if phone.starts_with("whatsapp:") {
        phone.to_string()
    } else {
        format!("whatsapp:{phone}")
    }
}

#[async_trait]
impl MessagingPort for TwilioWhatsApp {
    async fn send_message(&self, to: &str, text: &str) -> DomainResult<()> {
        let form = [
            ("From", whatsapp_address(&self.from_phone)),
            ("To", whatsapp_address(to)),
            ("Body", text.to_string()),
        ];

        let res = self.client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("Twilio: {e}")))?;

        let status = res.status();
        let body: serde_json::Value = res.json().await.unwrap_or_default();
        if !status.is_success() {
            let detail = body["message"].as_str().unwrap_or("sin detalle");
            return Err(DomainError::Transport(format!("Twilio {status}: {detail}")));
        }

        info!("WhatsApp alert accepted by Twilio: {}", body["sid"].as_str().unwrap_or("?"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, routing::post, Form, Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

    fn record(seen: &Seen, headers: &HeaderMap, form: HashMap<String, String>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        seen.lock().unwrap().push((auth, form));
    }

    async fn fake_twilio(status: u16) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let handler = move |State(seen): State<Seen>,
                            headers: HeaderMap,
                            Form(form): Form<HashMap<String, String>>| async move {
            record(&seen, &headers, form);
            let code = axum::http::StatusCode::from_u16(status).unwrap();
            (code, Json(serde_json::json!({"sid": "SM1", "message": "bad number"})))
        };
        let app = Router::new()
            .route("/2010-04-01/Accounts/AC123/Messages.json", post(handler))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), seen)
    }

    fn sender(api_base: String) -> TwilioWhatsApp {
        TwilioWhatsApp::new(&WhatsAppConfig {
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
            from_phone: "+14155238886".into(),
            alert_phones: vec!["+34600000001".into()],
            api_base,
        })
    }

    #[test]
    fn prefixes_numbers_once() {
        assert_eq!(whatsapp_address("+3460"), "whatsapp:+3460");
        assert_eq!(whatsapp_address(" whatsapp:+3460 "), "whatsapp:+3460");
    }

    #[tokio::test]
    async fn posts_form_with_basic_auth() {
        let (base, seen) = fake_twilio(201).await;
        sender(base).send_message("+34600000001", "hola").await.unwrap();

        let seen = seen.lock().unwrap();
        let (auth, form) = &seen[0];
        assert!(auth.as_deref().unwrap().starts_with("Basic "));
        assert_eq!(form["From"], "whatsapp:+14155238886");
        assert_eq!(form["To"], "whatsapp:+34600000001");
        assert_eq!(form["Body"], "hola");
    }

    #[tokio::test]
    async fn error_status_becomes_transport_error() {
        let (base, _) = fake_twilio(400).await;
        let err = sender(base).send_message("+1", "x").await.unwrap_err();
        assert!(matches!(err, DomainError::Transport(ref m) if m.contains("bad number")));
    }
}
