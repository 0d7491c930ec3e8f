pub mod camera;
pub mod capture;
