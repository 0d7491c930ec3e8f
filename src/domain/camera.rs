// src/domain/camera.rs
use image::RgbImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Área en píxeles; 0 si alguna dimensión es nula.
    pub fn area(&self) -> f32 {
        self.width as f32 * self.height as f32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraMode {
    pub format: String,
    pub size: FrameSize,
    pub fps: u32,
}

/// Orientación de la cámara. Cambiarla exige liberar el stream y volver a abrirlo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

/// Frame actual de la superficie de vídeo, listo para el clasificador.
#[derive(Debug, Clone)]
pub struct Frame {
    pub size: FrameSize,
    pub pixels: RgbImage,
}

impl Frame {
    pub fn new(pixels: RgbImage) -> Self {
        Self {
            size: FrameSize::new(pixels.width(), pixels.height()),
            pixels,
        }
    }
}
