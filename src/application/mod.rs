pub mod battery;
pub mod classifier;
pub mod commands;
pub mod detection_loop;
pub mod dto;
pub mod emergency;
pub mod haptics;
pub mod location;
pub mod ports;
pub mod results;
pub mod services;
pub mod speech_service;
