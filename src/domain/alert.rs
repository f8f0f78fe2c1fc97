use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use super::detection::AlertSource;

pub const DEFAULT_LOG_CAPACITY: usize = 20;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlertRecord {
    pub timestamp: DateTime<Utc>,
    pub confidence: f32,
    /// Ruta pública de la captura; `None` si no se pudo escribir.
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub source: AlertSource,
}

impl AlertRecord {
    pub fn local_time(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn email_subject(&self) -> &'static str {
        "🚨 SHOP SECURITY ALERT: Person Detected!"
    }

    pub fn email_body(&self) -> String {
        format!(
            "🚨 SHOP SECURITY ALERT 🚨\n\
             ================================\n\
             \n\
             ⚠️ Someone detected in your shop!\n\
             \n\
             ⏰ Time: {}\n\
             📍 Location: Shop Camera\n\
             \n\
             A snapshot has been attached for your review.\n\
             \n\
             Detection Confidence: {:.0}%\n\
             \n\
             ⚡ Actions:\n\
             1. Review the attached image\n\
             2. Check your shop immediately\n\
             3. Contact authorities if needed\n\
             \n\
             Stay Safe!\n",
            self.local_time(),
            self.confidence * 100.0
        )
    }

    pub fn message_text(&self) -> String {
        let headline = match self.source {
            AlertSource::Live => "🚨 INTRUDER ALERT!",
            AlertSource::Upload => "🚨 SECURITY ALERT!",
        };
        format!(
            "{headline} Person detected at {}. Confidence: {:.1}%",
            self.local_time(),
            self.confidence * 100.0
        )
    }
}

/// Historial acotado; el más antiguo sale primero al desbordar.
#[derive(Debug)]
pub struct AlertLog {
    records: VecDeque<AlertRecord>,
    capacity: usize,
    total: u64,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { records: VecDeque::with_capacity(capacity), capacity, total: 0 }
    }

    pub fn append(&mut self, record: AlertRecord) {
        self.records.push_back(record);
        self.total += 1;
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Los `limit` más recientes, del más nuevo al más antiguo.
    pub fn list(&self, limit: usize) -> Vec<AlertRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Alertas registradas desde el arranque, incluidas las descartadas.
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum DeliveryStatus {
    Sent,
    /// Canal sin configurar.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReport {
    pub email: DeliveryStatus,
    pub whatsapp: DeliveryStatus,
}
