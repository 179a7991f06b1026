use std::path::Path;

use image::RgbImage;

use crate::detector::Detector;
use crate::error::AnonymizeError;
use crate::region::{Region, RegionKind};
use crate::weights;

/// SeetaFace scores are unbounded (roughly 0–40 in practice); divide by this
/// before clamping into the [0, 1] confidence range the thresholds use.
const SCORE_SCALE: f64 = 30.0;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is loaded once at construction from the weights directory;
/// a missing or unreadable model is fatal there. Detection itself clones
/// the parsed model per call, so a shared instance is safe to use from
/// multiple threads.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load the SeetaFace model from the weights directory resolved by
    /// [`crate::weights::resolve`].
    pub fn new(weights_dir: &Path) -> Result<Self, AnonymizeError> {
        let path = weights::resolve(weights_dir, RegionKind::Face)?;
        Self::from_path(&path)
    }

    /// Load the SeetaFace model from an explicit file path.
    pub fn from_path(path: &Path) -> Result<Self, AnonymizeError> {
        let data = std::fs::read(path).map_err(|e| {
            AnonymizeError::ModelLoad(format!("{}: {e}", path.display()))
        })?;
        let model = rustface::read_model(std::io::Cursor::new(data)).map_err(|e| {
            AnonymizeError::ModelLoad(format!(
                "failed to parse SeetaFace model {}: {e:?}",
                path.display()
            ))
        })?;
        Ok(Self { model })
    }
}

impl Detector for RustfaceDetector {
    fn kind(&self) -> RegionKind {
        RegionKind::Face
    }

    fn detect(&self, image: &RgbImage) -> Vec<Region> {
        let gray = image::imageops::grayscale(image);

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(
            gray.as_raw(),
            gray.width(),
            gray.height(),
        ));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Region::new(
                    bbox.x() as f32,
                    bbox.y() as f32,
                    (bbox.x() + bbox.width() as i32) as f32,
                    (bbox.y() + bbox.height() as i32) as f32,
                    normalized_score(face.score()),
                    RegionKind::Face,
                )
            })
            .collect()
    }
}

fn normalized_score(score: f64) -> f32 {
    (score / SCORE_SCALE).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_a_model_load_error() {
        let result = RustfaceDetector::from_path(Path::new("/nonexistent/model.bin"));
        assert!(matches!(result, Err(AnonymizeError::ModelLoad(_))));
    }

    #[test]
    fn garbage_model_file_is_a_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"xx").unwrap();
        let result = RustfaceDetector::from_path(&path);
        assert!(matches!(result, Err(AnonymizeError::ModelLoad(_))));
    }

    #[test]
    fn scores_normalize_into_unit_range() {
        assert_eq!(normalized_score(0.0), 0.0);
        assert_eq!(normalized_score(100.0), 1.0);
        let mid = normalized_score(15.0);
        assert!(mid > 0.0 && mid < 1.0);
    }
}
