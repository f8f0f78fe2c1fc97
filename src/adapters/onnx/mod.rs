pub mod inference;
pub mod model_catalog;
pub mod yolo_engine;
