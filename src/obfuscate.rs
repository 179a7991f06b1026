use image::RgbImage;

use crate::error::AnonymizeError;

/// Obfuscation blur configuration, set once at startup.
#[derive(Debug, Clone, Copy)]
pub struct ObfuscationParams {
    /// Gaussian kernel width in pixels. Must be a positive odd integer.
    pub kernel_size: u32,
    /// Gaussian standard deviation. Must be positive and finite.
    pub sigma: f32,
    /// Box-average kernel width in pixels. Must be positive.
    pub box_kernel_size: u32,
}

impl Default for ObfuscationParams {
    /// The parameters the original deployment runs with: `21, 2.0, 9`.
    fn default() -> Self {
        Self {
            kernel_size: 21,
            sigma: 2.0,
            box_kernel_size: 9,
        }
    }
}

impl ObfuscationParams {
    pub(crate) fn validate(&self) -> Result<(), AnonymizeError> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(AnonymizeError::InvalidKernelSize(self.kernel_size));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(AnonymizeError::InvalidSigma(self.sigma));
        }
        if self.box_kernel_size == 0 {
            return Err(AnonymizeError::InvalidBoxKernelSize);
        }
        Ok(())
    }
}

/// Irreversible blur transform applied to detected regions.
///
/// Two low-pass stages — a Gaussian smoothing pass followed by a box
/// average — so that the obfuscation survives re-encoding through lossy
/// formats. Deterministic: the same input and parameters always produce
/// byte-identical output. There is no key and no inverse.
pub struct Obfuscator {
    gaussian_taps: Vec<f32>,
    box_taps: Vec<f32>,
}

impl Obfuscator {
    /// Build an obfuscator, validating the parameters.
    pub fn new(params: ObfuscationParams) -> Result<Self, AnonymizeError> {
        params.validate()?;
        Ok(Self {
            gaussian_taps: gaussian_taps(params.kernel_size, params.sigma),
            box_taps: vec![
                1.0 / params.box_kernel_size as f32;
                params.box_kernel_size as usize
            ],
        })
    }

    /// Blur a tile, producing a new buffer of identical dimensions.
    ///
    /// A zero-area tile is returned unchanged.
    pub fn obfuscate(&self, tile: &RgbImage) -> RgbImage {
        if tile.width() == 0 || tile.height() == 0 {
            return tile.clone();
        }

        let smoothed = convolve_separable(tile, &self.gaussian_taps);
        convolve_separable(&smoothed, &self.box_taps)
    }
}

/// Normalized 1-D Gaussian taps for the given kernel width and sigma.
fn gaussian_taps(kernel_size: u32, sigma: f32) -> Vec<f32> {
    let radius = (kernel_size / 2) as i64;
    let denom = 2.0 * sigma * sigma;

    let mut taps: Vec<f32> = (-radius..=radius)
        .map(|d| (-(d * d) as f32 / denom).exp())
        .collect();

    let sum: f32 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= sum;
    }
    taps
}

/// Apply a 1-D kernel horizontally then vertically, clamping at the edges.
fn convolve_separable(src: &RgbImage, taps: &[f32]) -> RgbImage {
    let horizontal = convolve_pass(src, taps, true);
    convolve_pass(&horizontal, taps, false)
}

fn convolve_pass(src: &RgbImage, taps: &[f32], horizontal: bool) -> RgbImage {
    let (width, height) = (src.width(), src.height());
    let mut out = RgbImage::new(width, height);

    // Tap offsets relative to the centre; even-length kernels sit one
    // sample left of centre, which keeps the pass deterministic.
    let center = (taps.len() / 2) as i64;

    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 3];
            for (i, tap) in taps.iter().enumerate() {
                let offset = i as i64 - center;
                let (sx, sy) = if horizontal {
                    ((x as i64 + offset).clamp(0, width as i64 - 1), y as i64)
                } else {
                    (x as i64, (y as i64 + offset).clamp(0, height as i64 - 1))
                };
                let pixel = src.get_pixel(sx as u32, sy as u32);
                for c in 0..3 {
                    acc[c] += tap * pixel.0[c] as f32;
                }
            }
            out.put_pixel(
                x,
                y,
                image::Rgb([
                    acc[0].round().clamp(0.0, 255.0) as u8,
                    acc[1].round().clamp(0.0, 255.0) as u8,
                    acc[2].round().clamp(0.0, 255.0) as u8,
                ]),
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obfuscator() -> Obfuscator {
        Obfuscator::new(ObfuscationParams::default()).unwrap()
    }

    fn gradient_tile(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        img
    }

    #[test]
    fn rejects_even_kernel_size() {
        let result = Obfuscator::new(ObfuscationParams {
            kernel_size: 20,
            ..Default::default()
        });
        assert!(matches!(result, Err(AnonymizeError::InvalidKernelSize(20))));
    }

    #[test]
    fn rejects_zero_kernel_size() {
        let result = Obfuscator::new(ObfuscationParams {
            kernel_size: 0,
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_positive_sigma() {
        for sigma in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let result = Obfuscator::new(ObfuscationParams {
                sigma,
                ..Default::default()
            });
            assert!(result.is_err(), "sigma {sigma} should be rejected");
        }
    }

    #[test]
    fn rejects_zero_box_kernel_size() {
        let result = Obfuscator::new(ObfuscationParams {
            box_kernel_size: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(AnonymizeError::InvalidBoxKernelSize)));
    }

    #[test]
    fn gaussian_taps_are_normalized_and_symmetric() {
        let taps = gaussian_taps(21, 2.0);
        assert_eq!(taps.len(), 21);
        let sum: f32 = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..10 {
            assert!((taps[i] - taps[20 - i]).abs() < 1e-6);
        }
        // Centre tap dominates
        assert!(taps[10] > taps[9]);
    }

    #[test]
    fn preserves_dimensions() {
        let tile = gradient_tile(20, 35);
        let blurred = obfuscator().obfuscate(&tile);
        assert_eq!(blurred.width(), 20);
        assert_eq!(blurred.height(), 35);
    }

    #[test]
    fn zero_area_tile_is_returned_unchanged() {
        let tile = RgbImage::new(0, 0);
        let blurred = obfuscator().obfuscate(&tile);
        assert_eq!(blurred.width(), 0);
        assert_eq!(blurred.height(), 0);
    }

    #[test]
    fn deterministic_across_calls() {
        let tile = gradient_tile(30, 30);
        let ob = obfuscator();
        let first = ob.obfuscate(&tile);
        let second = ob.obfuscate(&tile);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn uniform_tile_stays_uniform() {
        let mut tile = RgbImage::new(16, 16);
        for pixel in tile.pixels_mut() {
            *pixel = image::Rgb([255, 255, 255]);
        }
        let blurred = obfuscator().obfuscate(&tile);
        assert_eq!(blurred.as_raw(), tile.as_raw());
    }

    #[test]
    fn gradient_tile_is_actually_changed() {
        let tile = gradient_tile(30, 30);
        let blurred = obfuscator().obfuscate(&tile);
        assert_ne!(blurred.as_raw(), tile.as_raw());
    }

    #[test]
    fn single_pixel_tile_survives_large_kernel() {
        let mut tile = RgbImage::new(1, 1);
        tile.put_pixel(0, 0, image::Rgb([42, 17, 200]));
        let blurred = obfuscator().obfuscate(&tile);
        assert_eq!(blurred.get_pixel(0, 0), &image::Rgb([42, 17, 200]));
    }
}
