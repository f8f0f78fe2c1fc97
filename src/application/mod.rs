pub mod annotate;
pub mod detection_loop;
pub mod dto;
pub mod notifier;
pub mod ports;
pub mod services;
pub mod upload;
