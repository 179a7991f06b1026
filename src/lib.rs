//! Image anonymization: detect sensitive regions (faces, license plates)
//! and blur them irreversibly.
//!
//! The pipeline is stateless per call — detectors and blur parameters are
//! configured once at startup, then [`Anonymizer::anonymize`] can be invoked
//! concurrently from any number of threads.
//!
//! Only face detection ships with a built-in backend ([`RustfaceDetector`],
//! behind the default `rustface` feature). [`RegionKind::Plate`] has no
//! bundled model — plug in your own [`Detector`] implementation for plates
//! (or any other backend, e.g. ONNX or OpenCV based).
//!
//! # Example
//!
//! ```no_run
//! use anonymizer::{Anonymizer, DetectionThresholds, ObfuscationParams, RustfaceDetector};
//!
//! let weights = anonymizer::weights::default_weights_dir().unwrap();
//! anonymizer::weights::ensure_available(&weights).unwrap();
//!
//! let anonymizer = Anonymizer::builder()
//!     .detector(Box::new(RustfaceDetector::new(&weights).unwrap()))
//!     .obfuscation(ObfuscationParams::default())
//!     .build()
//!     .unwrap();
//!
//! let input = std::fs::read("street.jpg").unwrap();
//! let image = anonymizer::codec::decode_rgb(&input).unwrap();
//! let (output, regions) = anonymizer.anonymize(&image, &DetectionThresholds::recommended());
//! println!("blurred {} regions", regions.len());
//! ```
#![warn(missing_docs)]

mod anonymize;
/// Byte-level decode/encode helpers for wire formats.
pub mod codec;
mod detector;
mod error;
mod obfuscate;
mod region;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;
/// Model weight resolution and cached download.
pub mod weights;

use std::collections::HashMap;

use image::RgbImage;

/// Detection backend trait.
pub use detector::Detector;
/// Error type returned by anonymizer operations.
pub use error::AnonymizeError;
/// Blur configuration and the blur transform itself.
pub use obfuscate::{ObfuscationParams, Obfuscator};
/// Bounding box and kind types for detected regions.
pub use region::{Region, RegionKind};
#[cfg(feature = "rustface")]
/// Built-in detector that loads the SeetaFace model from the weights dir.
pub use rustface_backend::RustfaceDetector;

/// Minimum confidence per detector kind.
///
/// A kind with no entry uses the default threshold, which is 0.0 — every
/// detection of an unlisted kind is kept. Immutable during an anonymize
/// call; build one per configuration and share it.
#[derive(Debug, Clone, Default)]
pub struct DetectionThresholds {
    map: HashMap<RegionKind, f32>,
    default: f32,
}

impl DetectionThresholds {
    /// Empty thresholds: everything any detector reports is kept.
    pub fn new() -> Self {
        Self::default()
    }

    /// The thresholds the original deployment runs with:
    /// face 0.3, plate 0.3.
    pub fn recommended() -> Self {
        Self::new()
            .with(RegionKind::Face, 0.3)
            .with(RegionKind::Plate, 0.3)
    }

    /// Set the minimum confidence for one kind.
    pub fn with(mut self, kind: RegionKind, threshold: f32) -> Self {
        self.map.insert(kind, threshold);
        self
    }

    /// Set the threshold used for kinds without an explicit entry
    /// (default: 0.0).
    pub fn default_threshold(mut self, threshold: f32) -> Self {
        self.default = threshold;
        self
    }

    /// The effective threshold for a kind.
    pub fn get(&self, kind: RegionKind) -> f32 {
        self.map.get(&kind).copied().unwrap_or(self.default)
    }
}

/// The anonymization pipeline: configured detectors plus the obfuscator.
///
/// Construction is the fallible part (model loading, parameter validation);
/// a built `Anonymizer` is immutable and safe to share across threads.
pub struct Anonymizer {
    detectors: Vec<Box<dyn Detector>>,
    obfuscator: Obfuscator,
}

impl Anonymizer {
    /// Start building a pipeline.
    pub fn builder() -> AnonymizerBuilder {
        AnonymizerBuilder {
            detectors: Vec::new(),
            params: ObfuscationParams::default(),
        }
    }

    /// Detect, threshold, merge, and blur sensitive regions in `image`.
    ///
    /// Returns a new buffer — the input is never written to — together with
    /// the final list of blurred regions, useful for auditing. An image
    /// with zero detections comes back as an identical copy with an empty
    /// region list.
    pub fn anonymize(
        &self,
        image: &RgbImage,
        thresholds: &DetectionThresholds,
    ) -> (RgbImage, Vec<Region>) {
        anonymize::run_pipeline(image, &self.detectors, &self.obfuscator, thresholds)
    }
}

/// Builder for [`Anonymizer`].
pub struct AnonymizerBuilder {
    detectors: Vec<Box<dyn Detector>>,
    params: ObfuscationParams,
}

impl AnonymizerBuilder {
    /// Add a detection backend. Backends may be added in any order; each
    /// covers one [`RegionKind`].
    pub fn detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Set the blur parameters (default: `21, 2.0, 9`).
    pub fn obfuscation(mut self, params: ObfuscationParams) -> Self {
        self.params = params;
        self
    }

    /// Validate the configuration and build the pipeline.
    pub fn build(self) -> Result<Anonymizer, AnonymizeError> {
        if self.detectors.is_empty() {
            log::warn!("anonymizer built without detectors; output will always equal input");
        }
        Ok(Anonymizer {
            detectors: self.detectors,
            obfuscator: Obfuscator::new(self.params)?,
        })
    }
}
