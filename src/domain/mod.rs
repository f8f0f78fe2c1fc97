pub mod alert;
pub mod camera;
pub mod detection;
pub mod errors;
pub mod gate;
pub mod model;
pub mod shop;
pub mod snapshot;
pub mod stream;
