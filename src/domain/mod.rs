pub mod battery;
pub mod camera;
pub mod detection;
pub mod errors;
pub mod hazard;
pub mod model;
pub mod relay;
pub mod settings;
pub mod speech;
pub mod stream;
