pub mod capture;
pub mod frame_source;
