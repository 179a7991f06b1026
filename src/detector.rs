use image::RgbImage;

use crate::region::{Region, RegionKind};

/// Pluggable detection backend for one kind of sensitive object.
///
/// Implement this trait to provide a custom detector (ONNX, OpenCV, etc.)
/// and pass it to [`crate::AnonymizerBuilder::detector`]. Model loading
/// belongs in the implementation's constructor, which should fail with
/// [`crate::AnonymizeError::ModelLoad`] when weights cannot be read —
/// `detect` itself is infallible per invocation.
pub trait Detector: Send + Sync {
    /// The kind of object this backend detects.
    fn kind(&self) -> RegionKind;

    /// Detect objects in `image`, returning one region per hit.
    ///
    /// Must not mutate the image and must return an empty vec (never fail)
    /// when nothing of this kind is found. Regions may extend past the
    /// image bounds; the pipeline clamps them.
    fn detect(&self, image: &RgbImage) -> Vec<Region>;
}
