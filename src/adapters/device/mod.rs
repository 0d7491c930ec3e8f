pub mod battery;
pub mod clock;
pub mod geolocation;
