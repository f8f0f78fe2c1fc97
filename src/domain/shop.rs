use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// CLOSED = vigilancia activa.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShopMode {
    #[default]
    Open,
    Closed,
}

impl ShopMode {
    /// En la API, `is_on == true` significa tienda cerrada con vigilancia.
    pub fn from_is_on(is_on: bool) -> Self {
        if is_on {
            ShopMode::Closed
        } else {
            ShopMode::Open
        }
    }

    pub fn is_on(self) -> bool {
        matches!(self, ShopMode::Closed)
    }

    pub fn toggled(self) -> Self {
        match self {
            ShopMode::Open => ShopMode::Closed,
            ShopMode::Closed => ShopMode::Open,
        }
    }

    pub fn status_text(self) -> &'static str {
        match self {
            ShopMode::Closed => "CLOSED - Security ON",
            ShopMode::Open => "OPEN - Security OFF",
        }
    }
}

/// Valor único compartido por el bucle de detección y los manejadores HTTP.
#[derive(Debug, Default)]
pub struct ShopModeFlag {
    mode: RwLock<ShopMode>,
}

impl ShopModeFlag {
    pub fn new(initial: ShopMode) -> Self {
        Self { mode: RwLock::new(initial) }
    }

    pub fn mode(&self) -> ShopMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_mode(&self, mode: ShopMode) {
        *self.mode.write().unwrap_or_else(PoisonError::into_inner) = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_open_and_overwrites() {
        let flag = ShopModeFlag::default();
        assert_eq!(flag.mode(), ShopMode::Open);
        flag.set_mode(ShopMode::Closed);
        flag.set_mode(ShopMode::Closed);
        assert_eq!(flag.mode(), ShopMode::Closed);
        flag.set_mode(flag.mode().toggled());
        assert_eq!(flag.mode(), ShopMode::Open);
    }

    #[test]
    fn is_on_maps_to_closed() {
        assert_eq!(ShopMode::from_is_on(true), ShopMode::Closed);
        assert!(!ShopMode::Open.is_on());
    }
}
