use serde::Serialize;

/// Category of sensitive object a detector looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Human face.
    Face,
    /// Vehicle license plate.
    Plate,
}

impl RegionKind {
    /// Short lowercase name, as used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Face => "face",
            RegionKind::Plate => "plate",
        }
    }
}

/// Axis-aligned bounding box of a detected sensitive area.
///
/// Coordinates are in pixels of the image the detector was given, with
/// `x_min < x_max` and `y_min < y_max` once clamped to the image bounds.
/// The box covers pixels `x_min..x_max` × `y_min..y_max` (max exclusive).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Region {
    /// X coordinate of the left edge (pixels).
    pub x_min: f32,
    /// Y coordinate of the top edge (pixels).
    pub y_min: f32,
    /// X coordinate of the right edge (pixels, exclusive).
    pub x_max: f32,
    /// Y coordinate of the bottom edge (pixels, exclusive).
    pub y_max: f32,
    /// Detection confidence score in [0, 1].
    pub confidence: f32,
    /// What the detector believes this region contains.
    pub kind: RegionKind,
}

impl Region {
    /// Construct a region from corner coordinates.
    pub fn new(
        x_min: f32,
        y_min: f32,
        x_max: f32,
        y_max: f32,
        confidence: f32,
        kind: RegionKind,
    ) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            confidence,
            kind,
        }
    }

    /// Box area in square pixels.
    pub fn area(&self) -> f32 {
        (self.x_max - self.x_min) * (self.y_max - self.y_min)
    }

    /// Area of the overlap with `other`, 0 when disjoint.
    pub fn intersection_area(&self, other: &Region) -> f32 {
        let x1 = self.x_min.max(other.x_min);
        let y1 = self.y_min.max(other.y_min);
        let x2 = self.x_max.min(other.x_max);
        let y2 = self.y_max.min(other.y_max);

        if x2 > x1 && y2 > y1 {
            (x2 - x1) * (y2 - y1)
        } else {
            0.0
        }
    }

    /// Intersection-over-union overlap ratio with `other`, in [0, 1].
    pub fn iou(&self, other: &Region) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Smallest box covering both regions. Keeps the higher confidence and
    /// the kind of the more confident member.
    pub fn union(&self, other: &Region) -> Region {
        let (confidence, kind) = if other.confidence > self.confidence {
            (other.confidence, other.kind)
        } else {
            (self.confidence, self.kind)
        };

        Region {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
            confidence,
            kind,
        }
    }

    /// Clamp the box to an image of the given dimensions.
    ///
    /// Returns `None` when nothing of the box remains inside the image
    /// (fully out of bounds, zero-area, or malformed coordinates) — such
    /// regions are dropped rather than processed as degenerate boxes.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        let w = width as f32;
        let h = height as f32;

        let x_min = self.x_min.clamp(0.0, w);
        let y_min = self.y_min.clamp(0.0, h);
        let x_max = self.x_max.clamp(0.0, w);
        let y_max = self.y_max.clamp(0.0, h);

        if x_min < x_max && y_min < y_max {
            Some(Region {
                x_min,
                y_min,
                x_max,
                y_max,
                confidence: self.confidence,
                kind: self.kind,
            })
        } else {
            None
        }
    }

    /// Integer pixel bounds `(x, y, width, height)` covered by this box.
    ///
    /// Only meaningful after [`Region::clamp_to`] — callers must ensure the
    /// box lies within the image.
    pub(crate) fn pixel_bounds(&self) -> (u32, u32, u32, u32) {
        let x0 = self.x_min.floor() as u32;
        let y0 = self.y_min.floor() as u32;
        let x1 = self.x_max.ceil() as u32;
        let y1 = self.y_max.ceil() as u32;
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}
