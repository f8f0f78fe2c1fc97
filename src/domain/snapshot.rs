use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Archivo ya escrito en la carpeta de capturas.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    /// Ruta pública, p. ej. `/uploads/alert_20240101_120000_000.jpg`.
    pub public_url: String,
    pub file_path: PathBuf,
}

/// Imagen asociada a un evento de detección.
#[derive(Debug, Clone)]
pub enum SnapshotRef {
    /// JPEG en memoria; solo se escribe si la alerta se dispara.
    Pending(Vec<u8>),
    Stored(StoredSnapshot),
}

pub fn alert_snapshot_name(taken_at: DateTime<Utc>) -> String {
    format!("alert_{}.jpg", taken_at.with_timezone(&Local).format("%Y%m%d_%H%M%S_%3f"))
}

pub fn upload_name(received_at: DateTime<Utc>, original: &str) -> String {
    format!(
        "{}_{}",
        received_at.with_timezone(&Local).format("%Y%m%d_%H%M%S"),
        sanitize_filename(original)
    )
}

pub fn annotated_name(stored_name: &str) -> String {
    format!("annotated_{stored_name}")
}

/// Extensión en minúsculas si está permitida.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Deja solo ASCII alfanumérico, `.`, `-` y `_`; nunca devuelve una ruta.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\fotos\\mi foto.PNG"), "mi_foto.PNG");
        assert_eq!(sanitize_filename(".hidden.jpg"), "hidden.jpg");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert_eq!(allowed_extension("a.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("a.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(allowed_extension("a.gif"), None);
        assert_eq!(allowed_extension("sin_extension"), None);
    }

    #[test]
    fn annotated_name_prefixes_stored_name() {
        assert_eq!(annotated_name("20240101_000000_x.png"), "annotated_20240101_000000_x.png");
        assert!(alert_snapshot_name(Utc::now()).starts_with("alert_"));
    }
}
