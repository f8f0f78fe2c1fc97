use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use super::shop::ShopMode;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SuppressReason {
    ShopOpen,
    LowConfidence { confidence: f32, threshold: f32 },
    Cooldown { remaining_secs: u64 },
}

impl std::fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuppressReason::ShopOpen => write!(f, "shop open"),
            SuppressReason::LowConfidence { confidence, threshold } => {
                write!(f, "confidence {confidence:.2} below threshold {threshold:.2}")
            }
            SuppressReason::Cooldown { remaining_secs } => {
                write!(f, "cooldown active ({remaining_secs}s left)")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Fire,
    Suppress(SuppressReason),
}

/// Decide si un evento de detección se convierte en alerta.
///
/// Orden de evaluación: modo de tienda, umbral de confianza y enfriamiento.
/// Solo un `Fire` modifica el estado (la hora de la última alerta).
#[derive(Debug, Clone)]
pub struct AlertGate {
    threshold: f32,
    cooldown: Duration,
    last_alert: Option<DateTime<Utc>>,
}

impl AlertGate {
    pub fn new(threshold: f32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            last_alert: None,
        }
    }

    pub fn last_alert(&self) -> Option<DateTime<Utc>> {
        self.last_alert
    }

    pub fn evaluate(
        &mut self,
        mode: ShopMode,
        confidence: f32,
        now: DateTime<Utc>,
    ) -> GateDecision {
        if mode == ShopMode::Open {
            return GateDecision::Suppress(SuppressReason::ShopOpen);
        }
        if confidence < self.threshold {
            return GateDecision::Suppress(SuppressReason::LowConfidence {
                confidence,
                threshold: self.threshold,
            });
        }
        if let Some(last) = self.last_alert {
            // Un reloj que retrocede cuenta como dentro del enfriamiento.
            let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.cooldown {
                let remaining = self.cooldown - elapsed;
                return GateDecision::Suppress(SuppressReason::Cooldown {
                    remaining_secs: remaining.as_secs_f64().ceil() as u64,
                });
            }
        }
        self.last_alert = Some(now);
        GateDecision::Fire
    }
}
