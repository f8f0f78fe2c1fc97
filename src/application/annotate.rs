use ab_glyph::{FontRef, PxScale};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ExtendedColorType, ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut},
    rect::Rect,
};
use std::io::Cursor;
use std::sync::OnceLock;

use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    shop::ShopMode,
};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CLOSED_COLOR: Rgb<u8> = Rgb([220, 30, 30]);
const OPEN_COLOR: Rgb<u8> = Rgb([30, 200, 60]);
const PLACEHOLDER_GRAY: Rgb<u8> = Rgb([50, 50, 50]);
const NO_CAMERA_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const HINT_COLOR: Rgb<u8> = Rgb([200, 200, 200]);

/// Por debajo de esta altura el texto taparía la imagen entera.
const MIN_TEXT_HEIGHT: u32 = 120;

static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

fn font() -> Option<&'static FontRef<'static>> {
    static FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();
    FONT.get_or_init(|| FontRef::try_from_slice(FONT_BYTES).ok()).as_ref()
}

/// Recuadros para cada persona, una barra de estado arriba a la izquierda
/// (roja con la vigilancia activa, verde con la tienda abierta) y dos líneas
/// de texto: confianza de la mejor persona y modo de la tienda.
pub fn annotate(image: &mut RgbImage, detections: &[Detection], mode: ShopMode) {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return;
    }

    for det in detections {
        let Some(rect) = clamp_rect(det, w, h) else { continue };
        draw_hollow_rect_mut(image, rect, BOX_COLOR);
        // Segundo trazo para que se vea en frames grandes.
        if rect.width() > 2 && rect.height() > 2 {
            let inner = Rect::at(rect.left() + 1, rect.top() + 1)
                .of_size(rect.width() - 2, rect.height() - 2);
            draw_hollow_rect_mut(image, inner, BOX_COLOR);
        }
    }

    let bar_w = (w / 4).max(1);
    let bar_h = (h / 24).max(1);
    let mode_color = match mode {
        ShopMode::Closed => CLOSED_COLOR,
        ShopMode::Open => OPEN_COLOR,
    };
    draw_filled_rect_mut(image, Rect::at(0, 0).of_size(bar_w, bar_h), mode_color);

    let Some(font) = font().filter(|_| h >= MIN_TEXT_HEIGHT) else { return };
    let confidence = detections.iter().map(|d| d.score).fold(0.0_f32, f32::max);
    let (status, status_color) = if detections.is_empty() {
        (format!("NO PERSON (Conf: {confidence:.2})"), OPEN_COLOR)
    } else {
        (format!("PERSON DETECTED (Conf: {confidence:.2})"), CLOSED_COLOR)
    };
    let mode_text = match mode {
        ShopMode::Closed => "SECURE MODE ON",
        ShopMode::Open => "OPEN MODE",
    };

    let size = (h as f32 / 20.0).max(12.0);
    let top = (bar_h + 6) as i32;
    draw_text_mut(image, status_color, 10, top, PxScale::from(size), font, &status);
    let second = top + (size * 1.3) as i32;
    draw_text_mut(image, mode_color, 10, second, PxScale::from(size * 0.8), font, mode_text);
}

fn clamp_rect(det: &Detection, w: u32, h: u32) -> Option<Rect> {
    let x1 = det.x1.max(0.0).min((w - 1) as f32) as i32;
    let y1 = det.y1.max(0.0).min((h - 1) as f32) as i32;
    let x2 = det.x2.max(0.0).min((w - 1) as f32) as i32;
    let y2 = det.y2.max(0.0).min((h - 1) as f32) as i32;
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Rect::at(x1, y1).of_size((x2 - x1) as u32, (y2 - y1) as u32))
}

/// Frame gris oscuro con aviso de "sin cámara".
pub fn placeholder_frame(width: u32, height: u32) -> RgbImage {
    let mut frame = RgbImage::from_pixel(width, height, PLACEHOLDER_GRAY);
    let Some(font) = font().filter(|_| height >= MIN_TEXT_HEIGHT) else { return frame };

    let size = height as f32 / 14.0;
    let x = (width * 150 / 640) as i32;
    let y = (height / 2) as i32 - size as i32;
    draw_text_mut(
        &mut frame,
        NO_CAMERA_COLOR,
        x,
        y,
        PxScale::from(size),
        font,
        "No Webcam Connected",
    );
    let hint_x = (width * 80 / 640) as i32;
    let hint_y = y + (size * 1.6) as i32;
    draw_text_mut(
        &mut frame,
        HINT_COLOR,
        hint_x,
        hint_y,
        PxScale::from(size * 0.55),
        font,
        "Please attach a webcam or upload images",
    );
    frame
}

pub fn encode_jpeg(image: &RgbImage) -> DomainResult<Vec<u8>> {
    let mut jpeg = Vec::new();
    let mut enc = JpegEncoder::new_with_quality(&mut jpeg, 80);
    enc.encode(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
        .map_err(|e| DomainError::OperationFailed(format!("JPEG encode: {e}")))?;
    Ok(jpeg)
}

/// Codifica según la extensión del archivo subido (`png` o JPEG).
pub fn encode_for_extension(image: &RgbImage, ext: &str) -> DomainResult<Vec<u8>> {
    if ext.eq_ignore_ascii_case("png") {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image.clone())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| DomainError::OperationFailed(format!("PNG encode: {e}")))?;
        Ok(buf)
    } else {
        encode_jpeg(image)
    }
}
