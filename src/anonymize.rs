use image::RgbImage;

use crate::detector::Detector;
use crate::obfuscate::Obfuscator;
use crate::region::Region;
use crate::DetectionThresholds;

/// Two regions merge when their overlap ratio exceeds this.
///
/// 0.25 is deliberately low for an NMS-style threshold: for anonymization a
/// borderline overlap must widen the blurred area, not leave a gap.
pub(crate) const MERGE_IOU_THRESHOLD: f32 = 0.25;

/// Run the full pipeline: detect, threshold, clamp, merge, obfuscate.
///
/// Returns a new buffer (the caller's image is never written to) plus the
/// regions that were blurred.
pub(crate) fn run_pipeline(
    image: &RgbImage,
    detectors: &[Box<dyn Detector>],
    obfuscator: &Obfuscator,
    thresholds: &DetectionThresholds,
) -> (RgbImage, Vec<Region>) {
    let mut kept = Vec::new();

    for detector in detectors {
        let kind = detector.kind();
        let found = detector.detect(image);
        log::debug!("{} detector reported {} regions", kind.as_str(), found.len());

        let threshold = thresholds.get(kind);
        for region in found {
            if region.confidence < threshold {
                continue;
            }
            match region.clamp_to(image.width(), image.height()) {
                Some(clamped) => kept.push(clamped),
                // Malformed or fully out-of-bounds detector output is
                // recovered locally, never surfaced to the caller.
                None => log::debug!(
                    "dropping degenerate {} region ({}, {})-({}, {})",
                    kind.as_str(),
                    region.x_min,
                    region.y_min,
                    region.x_max,
                    region.y_max
                ),
            }
        }
    }

    let merged = merge_overlapping(kept);
    log::debug!("obfuscating {} merged regions", merged.len());

    let mut output = image.clone();
    for region in &merged {
        obfuscate_region(&mut output, obfuscator, region);
    }

    (output, merged)
}

/// Collapse overlapping boxes into their covering union.
///
/// Pairs whose IoU exceeds [`MERGE_IOU_THRESHOLD`] are replaced by their
/// union box, iterated to a fixpoint so a union that newly overlaps a third
/// box absorbs it too. Confidence ordering makes the result independent of
/// detector iteration order.
pub(crate) fn merge_overlapping(mut regions: Vec<Region>) -> Vec<Region> {
    regions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut changed = true;
    while changed {
        changed = false;
        'scan: for i in 0..regions.len() {
            for j in (i + 1)..regions.len() {
                if regions[i].iou(&regions[j]) > MERGE_IOU_THRESHOLD {
                    let absorbed = regions.swap_remove(j);
                    regions[i] = regions[i].union(&absorbed);
                    changed = true;
                    break 'scan;
                }
            }
        }
    }

    regions
}

/// Extract the region's tile, blur it, and write it back in place.
fn obfuscate_region(image: &mut RgbImage, obfuscator: &Obfuscator, region: &Region) {
    let (x, y, width, height) = region.pixel_bounds();
    if width == 0 || height == 0 {
        return;
    }

    let tile = image::imageops::crop_imm(&*image, x, y, width, height).to_image();
    let blurred = obfuscator.obfuscate(&tile);
    image::imageops::replace(image, &blurred, x as i64, y as i64);
}
