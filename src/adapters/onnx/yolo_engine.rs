use anyhow::Result;
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayView2, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;

use crate::domain::detection::Detection;
use crate::domain::model::YoloParams;

const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

pub struct OnnxYoloEngine {
    session: Session,
}

impl OnnxYoloEngine {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session })
    }

    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Nearest);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec_and_offset().0))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0).into_dimensionality()?;

        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;
        Ok(decode_output(view, sx, sy, params))
    }
}

/// Salida YOLOv8 `[4 + clases, candidatos]` → detecciones en píxeles de la imagen original.
pub(crate) fn decode_output(
    view: ArrayView2<'_, f32>,
    sx: f32,
    sy: f32,
    params: &YoloParams,
) -> Vec<Detection> {
    let num_candidates = view.shape()[1];
    let mut detections = Vec::new();

    for i in 0..num_candidates {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, &max_score)) = scores
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if max_score > params.conf_threshold {
            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];

            detections.push(Detection {
                x1: (cx - w / 2.0) * sx,
                y1: (cy - h / 2.0) * sy,
                x2: (cx + w / 2.0) * sx,
                y2: (cy + h / 2.0) * sy,
                score: max_score,
                class_id,
                label: COCO_CLASSES.get(class_id).unwrap_or(&"object").to_string(),
            });
        }
    }

    detections.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept = non_max_suppression(detections, params.iou_threshold);
    kept.truncate(params.max_detections);
    kept
}

/// Espera detecciones ordenadas por score descendente; solo suprime dentro de la misma clase.
pub(crate) fn non_max_suppression(sorted: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut kept: Vec<Detection> = Vec::with_capacity(sorted.len());
    for det in sorted {
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == det.class_id && iou(k, &det) > iou_threshold);
        if !overlaps {
            kept.push(det);
        }
    }
    kept
}

pub(crate) fn iou(a: &Detection, b: &Detection) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = ix * iy;
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn det(x1: f32, class_id: usize, score: f32) -> Detection {
        Detection { x1, y1: 0.0, x2: x1 + 10.0, y2: 10.0, score, class_id, label: String::new() }
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        assert!((iou(&det(0.0, 0, 1.0), &det(0.0, 0, 1.0)) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&det(0.0, 0, 1.0), &det(50.0, 0, 1.0)), 0.0);
    }

    #[test]
    fn nms_drops_overlaps_of_same_class_only() {
        let kept = non_max_suppression(
            vec![det(0.0, 0, 0.9), det(1.0, 0, 0.8), det(1.0, 2, 0.7), det(40.0, 0, 0.6)],
            0.45,
        );
        let scores: Vec<f32> = kept.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.6]);
    }

    #[test]
    fn decodes_person_candidate_and_scales_to_source() {
        // 4 coordenadas + 80 clases, 2 candidatos.
        let mut out = Array2::<f32>::zeros((84, 2));
        out[[0, 0]] = 320.0;
        out[[1, 0]] = 320.0;
        out[[2, 0]] = 100.0;
        out[[3, 0]] = 200.0;
        out[[4, 0]] = 0.8; // person
        out[[4 + 16, 1]] = 0.05; // dog, bajo el piso

        let params = YoloParams::default();
        let dets = decode_output(out.view(), 0.5, 0.5, &params);
        assert_eq!(dets.len(), 1);
        let p = &dets[0];
        assert_eq!(p.label, "person");
        assert_eq!(p.class_id, 0);
        assert_eq!([p.x1, p.y1, p.x2, p.y2], [135.0, 110.0, 185.0, 210.0]);
    }
}
