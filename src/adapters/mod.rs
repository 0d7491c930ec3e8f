pub mod device;
pub mod http;
pub mod onnx;
pub mod piper;
pub mod storage;
pub mod v4l2;
