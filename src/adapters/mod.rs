pub mod http;
pub mod notify;
pub mod onnx;
pub mod pipeline;
pub mod storage;
pub mod v4l2;
