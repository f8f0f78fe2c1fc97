use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::domain::alert::DEFAULT_LOG_CAPACITY;
use crate::domain::camera::{CameraId, CameraMode, CameraSettings, FrameSize};
use crate::domain::model::YoloParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },
}

type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub user: String,
    pub password: String,
    pub alert_to: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
    pub alert_phones: Vec<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub confidence_threshold: f32,
    pub alert_cooldown: Duration,
    pub alert_log_capacity: usize,
    pub model_path: PathBuf,
    pub yolo: YoloParams,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub shop_mode_file: Option<PathBuf>,
    pub camera: CameraSettings,
    pub email: Option<EmailConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
}

impl AppConfig {
    pub fn from_env() -> ConfigResult<Self> {
        load_dotenv_layers();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Igual que `from_env` pero leyendo de cualquier fuente clave/valor.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let confidence_threshold: f32 = parse_or(&get, "CONFIDENCE_THRESHOLD", 0.2)?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(ConfigError::Invalid {
                key: "CONFIDENCE_THRESHOLD",
                value: confidence_threshold.to_string(),
                reason: "must be between 0 and 1".into(),
            });
        }

        let alert_log_capacity: usize = parse_or(&get, "ALERT_LOG_CAPACITY", DEFAULT_LOG_CAPACITY)?;
        if alert_log_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "ALERT_LOG_CAPACITY",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let defaults = YoloParams::default();
        let yolo = YoloParams {
            input_size: parse_or(&get, "YOLO_INPUT_SIZE", defaults.input_size)?,
            conf_threshold: parse_or(&get, "YOLO_MIN_SCORE", defaults.conf_threshold)?,
            iou_threshold: parse_or(&get, "YOLO_IOU_THRESHOLD", defaults.iou_threshold)?,
            max_detections: defaults.max_detections,
        };

        let camera = CameraSettings {
            camera: CameraId { path: get("CAMERA_PATH").unwrap_or_else(|| "/dev/video0".into()) },
            mode: CameraMode {
                format: get("CAMERA_FOURCC").unwrap_or_else(|| "MJPG".into()),
                size: FrameSize {
                    width: parse_or(&get, "CAMERA_WIDTH", 640)?,
                    height: parse_or(&get, "CAMERA_HEIGHT", 480)?,
                },
                fps: parse_or(&get, "CAMERA_FPS", 30)?,
            },
        };

        // Cadena vacía desactiva la persistencia del modo.
        let shop_mode_file = match lookup("SHOP_MODE_FILE") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v.trim())),
            None => Some(PathBuf::from("shop_mode.json")),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "PORT", 9000)?,
            confidence_threshold,
            alert_cooldown: Duration::from_secs(parse_or(&get, "ALERT_COOLDOWN", 120)?),
            alert_log_capacity,
            model_path: PathBuf::from(
                get("MODEL_PATH").unwrap_or_else(|| "models/yolov8n.onnx".into()),
            ),
            yolo,
            upload_dir: PathBuf::from(get("UPLOAD_FOLDER").unwrap_or_else(|| "uploads".into())),
            static_dir: PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "static".into())),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            shop_mode_file,
            camera,
            email: email_config(&get)?,
            whatsapp: whatsapp_config(&get),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn email_config(get: &impl Fn(&str) -> Option<String>) -> ConfigResult<Option<EmailConfig>> {
    let (Some(user), Some(password), Some(alert_to)) =
        (get("EMAIL_USER"), get("EMAIL_PASS"), get("ALERT_TO"))
    else {
        warn!("Email credentials not configured. Email alerts disabled.");
        return Ok(None);
    };
    Ok(Some(EmailConfig {
        user,
        password,
        alert_to,
        smtp_host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".into()),
        smtp_port: parse_or(get, "SMTP_PORT", 587)?,
    }))
}

fn whatsapp_config(get: &impl Fn(&str) -> Option<String>) -> Option<WhatsAppConfig> {
    let sid = get("TWILIO_ACCOUNT_SID");
    let token = get("TWILIO_AUTH_TOKEN");
    let from = get("TWILIO_PHONE");
    let phones: Vec<String> = get("ALERT_PHONE")
        .map(|v| v.split(',').map(str::trim).filter(|p| !p.is_empty()).map(String::from).collect())
        .unwrap_or_default();

    match (sid, token, from) {
        (Some(account_sid), Some(auth_token), Some(from_phone)) if !phones.is_empty() => {
            Some(WhatsAppConfig {
                account_sid,
                auth_token,
                from_phone,
                alert_phones: phones,
                api_base: get("TWILIO_API_BASE").unwrap_or_else(|| "https://api.twilio.com".into()),
            })
        }
        _ => {
            warn!("WhatsApp not configured. WhatsApp alerts disabled.");
            None
        }
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn load_dotenv_layers() {
    for path in [".env", "../.env"] {
        let _ = dotenvy::from_path(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(pairs: &[(&str, &str)]) -> ConfigResult<AppConfig> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_match_original_deployment() {
        let c = cfg(&[]).unwrap();
        assert_eq!(c.port, 9000);
        assert!((c.confidence_threshold - 0.2).abs() < f32::EPSILON);
        assert_eq!(c.alert_cooldown, Duration::from_secs(120));
        assert_eq!(c.alert_log_capacity, 20);
        assert_eq!(c.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(c.shop_mode_file, Some(PathBuf::from("shop_mode.json")));
        assert!(c.email.is_none());
        assert!(c.whatsapp.is_none());
        assert_eq!(c.bind_addr(), "0.0.0.0:9000");
        assert_eq!(c.camera.camera.path, "/dev/video0");
        let expected = CameraMode {
            format: "MJPG".into(),
            size: FrameSize { width: 640, height: 480 },
            fps: 30,
        };
        assert_eq!(c.camera.mode, expected);
    }

    #[test]
    fn rejects_threshold_out_of_range_and_garbage() {
        assert!(matches!(
            cfg(&[("CONFIDENCE_THRESHOLD", "1.5")]),
            Err(ConfigError::Invalid { key: "CONFIDENCE_THRESHOLD", .. })
        ));
        assert!(matches!(
            cfg(&[("ALERT_COOLDOWN", "two minutes")]),
            Err(ConfigError::Invalid { key: "ALERT_COOLDOWN", .. })
        ));
        assert!(cfg(&[("PORT", "70000")]).is_err());
    }

    #[test]
    fn partial_credentials_disable_channel() {
        let c = cfg(&[("EMAIL_USER", "shop@example.com"), ("EMAIL_PASS", "x")]).unwrap();
        assert!(c.email.is_none());

        let c = cfg(&[
            ("EMAIL_USER", "shop@example.com"),
            ("EMAIL_PASS", "x"),
            ("ALERT_TO", "owner@example.com"),
            ("SMTP_PORT", "2525"),
        ])
        .unwrap();
        let email = c.email.unwrap();
        assert_eq!(email.smtp_host, "smtp.gmail.com");
        assert_eq!(email.smtp_port, 2525);
    }

    #[test]
    fn whatsapp_requires_destination_numbers() {
        let base = [
            ("TWILIO_ACCOUNT_SID", "AC1"),
            ("TWILIO_AUTH_TOKEN", "tok"),
            ("TWILIO_PHONE", "+14155238886"),
        ];
        assert!(cfg(&base).unwrap().whatsapp.is_none());

        let mut with_phones = base.to_vec();
        with_phones.push(("ALERT_PHONE", "+34600000001, +34600000002,"));
        let wa = cfg(&with_phones).unwrap().whatsapp.unwrap();
        assert_eq!(wa.alert_phones, vec!["+34600000001", "+34600000002"]);
        assert_eq!(wa.api_base, "https://api.twilio.com");
    }

    #[test]
    fn empty_shop_mode_file_disables_persistence() {
        assert!(cfg(&[("SHOP_MODE_FILE", "")]).unwrap().shop_mode_file.is_none());
    }
}
