use anyhow::{anyhow, Result};
use image::{ImageFormat, RgbImage};
use v4l::format::FourCC;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::domain::camera::CameraSettings;

/// Captura física de frames usando V4L2 (MJPG o YUYV).
pub struct V4l2Capture {
    stream: Stream<'static>,
    fourcc: FourCC,
    width: u32,
    height: u32,
}

impl V4l2Capture {
    /// Abre el dispositivo de cámara y configura el formato y el flujo de memoria mapeada (MMAP).
    pub fn open(cfg: &CameraSettings) -> Result<Self> {
        let dev = Device::with_path(&cfg.camera.path)?;

        // 1. Configurar Formato
        let mut fmt = dev.format()?;
        let b = cfg.mode.format.as_bytes();
        if b.len() != 4 {
            return Err(anyhow!("FourCC debe tener 4 caracteres"));
        }
        fmt.fourcc = v4l::FourCC::new(&[b[0], b[1], b[2], b[3]]);
        fmt.width = cfg.mode.size.width;
        fmt.height = cfg.mode.size.height;

        // El driver puede ajustar los valores a los más cercanos soportados
        let actual_fmt = dev.set_format(&fmt)?;

        // 2. Configurar FPS (Frame Interval)
        let mut params = dev.params()?;
        params.interval.numerator = 1;
        params.interval.denominator = cfg.mode.fps.max(1);
        let _ = dev.set_params(&params);

        // 3. Inicializar Stream (MMAP)
        // El stream guarda su propio handle del dispositivo: al soltar la captura
        // se cierra el descriptor, así que reabrir no acumula fds.
        let stream = Stream::with_buffers(&dev, v4l::buffer::Type::VideoCapture, 4)?;

        tracing::info!(
            "📷 Cámara abierta: {} {}x{} [{}] a {} FPS",
            cfg.camera.path, actual_fmt.width, actual_fmt.height, actual_fmt.fourcc, cfg.mode.fps
        );

        Ok(Self {
            stream,
            fourcc: actual_fmt.fourcc,
            width: actual_fmt.width,
            height: actual_fmt.height,
        })
    }

    /// Siguiente frame como RGB para inferencia.
    pub fn next_rgb(&mut self) -> Result<RgbImage> {
        let (data, _) = self.stream.next()?;
        let fcc_str = self.fourcc.str().map_err(|_| anyhow!("FourCC inválido"))?;

        match fcc_str {
            "MJPG" => {
                // MJPG es básicamente una secuencia de JPEGs
                let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
                Ok(img.to_rgb8())
            }
            "YUYV" => Ok(yuyv_to_rgb(data, self.width, self.height)),
            _ => Err(anyhow!("Formato de cámara {} no soportado por este pipeline", fcc_str)),
        }
    }
}

/// Convierte un buffer YUYV (YUV 4:2:2) a una RgbImage.
pub(crate) fn yuyv_to_rgb(yuyv: &[u8], w: u32, h: u32) -> RgbImage {
    let mut out = RgbImage::new(w, h);
    if w == 0 {
        return out;
    }

    // Cada bloque de 4 bytes en YUYV define 2 píxeles: [Y0, U, Y1, V]
    for (i, chunk) in yuyv.chunks_exact(4).enumerate() {
        let y0 = chunk[0] as f32;
        let u  = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v  = chunk[3] as f32 - 128.0;

        let pixel_idx = i as u32 * 2;
        let x = pixel_idx % w;
        let y = pixel_idx / w;

        if y < h {
            out.put_pixel(x, y, bt601(y0, u, v));
            if x + 1 < w {
                out.put_pixel(x + 1, y, bt601(y1, u, v));
            }
        }
    }
    out
}

fn bt601(y: f32, u: f32, v: f32) -> image::Rgb<u8> {
    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
    image::Rgb([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_chroma_gives_gray_pixels() {
        let buf = [128u8, 128, 200, 128, 0, 128, 255, 128];
        let img = yuyv_to_rgb(&buf, 2, 2);
        assert_eq!(img.get_pixel(0, 0).0, [128, 128, 128]);
        assert_eq!(img.get_pixel(1, 0).0, [200, 200, 200]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn short_buffer_leaves_rest_black() {
        let img = yuyv_to_rgb(&[255, 128, 255, 128], 4, 1);
        assert_eq!(img.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(3, 0).0, [0, 0, 0]);
    }
}
