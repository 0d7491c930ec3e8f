use anyhow::{anyhow, Result};
use image::{ImageFormat, RgbImage};
use v4l::format::FourCC;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::domain::camera::CameraMode;

/// Captura física de frames con V4L2. Vive dentro del hilo que posee el `Device`.
pub struct V4l2Capture<'a> {
    stream: Stream<'a>,
    fourcc: FourCC,
    width: u32,
    height: u32,
}

impl<'a> V4l2Capture<'a> {
    /// Configura formato, FPS y el flujo de memoria mapeada (MMAP).
    pub fn open(dev: &'a Device, mode: &CameraMode) -> Result<Self> {
        // 1. Formato
        let mut fmt = dev.format()?;
        let b = mode.format.as_bytes();
        if b.len() != 4 {
            return Err(anyhow!("FourCC debe tener 4 caracteres"));
        }
        fmt.fourcc = FourCC::new(&[b[0], b[1], b[2], b[3]]);
        fmt.width = mode.size.width;
        fmt.height = mode.size.height;

        // El driver puede ajustar los valores a los más cercanos soportados
        let actual_fmt = dev.set_format(&fmt)?;

        // 2. FPS
        let mut params = dev.params()?;
        params.interval.numerator = 1;
        params.interval.denominator = mode.fps.max(1);
        if let Err(e) = dev.set_params(&params) {
            tracing::warn!("⚠️ El driver no aceptó {} FPS: {e}", mode.fps);
        }

        // 3. Stream
        let stream = Stream::with_buffers(dev, v4l::buffer::Type::VideoCapture, 4)?;

        tracing::info!(
            "📷 Cámara abierta: {}x{} [{}] a {} FPS",
            actual_fmt.width, actual_fmt.height, actual_fmt.fourcc, mode.fps
        );

        Ok(Self {
            stream,
            fourcc: actual_fmt.fourcc,
            width: actual_fmt.width,
            height: actual_fmt.height,
        })
    }

    /// Siguiente frame en RGB. Bloquea hasta que el driver entrega un buffer.
    pub fn next_rgb(&mut self) -> Result<RgbImage> {
        let (data, _) = self.stream.next()?;
        let fcc_str = self.fourcc.str().map_err(|_| anyhow!("FourCC inválido"))?;

        match fcc_str {
            "MJPG" => {
                let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
                Ok(img.to_rgb8())
            }
            "YUYV" => Ok(yuyv_to_rgb(data, self.width, self.height)),
            _ => Err(anyhow!("Formato de cámara {} no soportado", fcc_str)),
        }
    }
}

/// Convierte un buffer YUYV (YUV 4:2:2) a RGB con los coeficientes BT.601.
fn yuyv_to_rgb(yuyv: &[u8], w: u32, h: u32) -> RgbImage {
    let mut out = RgbImage::new(w, h);
    if w == 0 {
        return out;
    }

    // [Y0, U, Y1, V] define dos píxeles que comparten crominancia
    for (i, chunk) in yuyv.chunks_exact(4).enumerate() {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        let to_rgb = |y: f32| {
            image::Rgb([
                (y + 1.402 * v).clamp(0.0, 255.0) as u8,
                (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8,
                (y + 1.772 * u).clamp(0.0, 255.0) as u8,
            ])
        };

        let pixel_idx = i as u32 * 2;
        let (x, y) = (pixel_idx % w, pixel_idx / w);
        if y >= h {
            break;
        }
        out.put_pixel(x, y, to_rgb(chunk[0] as f32));
        if x + 1 < w {
            out.put_pixel(x + 1, y, to_rgb(chunk[2] as f32));
        }
    }
    out
}
