use serde::{Deserialize, Serialize};

/// A geographic coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Estimated geographic extent of an image tile.
///
/// Always approximate: it is derived from building footprints, not from a
/// geo-reference shipped with the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn new(min_lng: f64, max_lng: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            max_lng,
            min_lat,
            max_lat,
        }
    }

    pub fn empty() -> Self {
        Self {
            min_lng: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_lng > self.max_lng || self.min_lat > self.max_lat
    }

    pub fn include_point(&mut self, point: GeoPoint) {
        self.min_lng = self.min_lng.min(point.lng);
        self.max_lng = self.max_lng.max(point.lng);
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lat = self.max_lat.max(point.lat);
    }

    pub fn lng_range(&self) -> f64 {
        (self.max_lng - self.min_lng).max(0.0)
    }

    pub fn lat_range(&self) -> f64 {
        (self.max_lat - self.min_lat).max(0.0)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lng + self.max_lng) * 0.5,
            (self.min_lat + self.max_lat) * 0.5,
        )
    }

    /// Grow each side by `fraction` of the range along that axis.
    pub fn expand_fraction(&self, fraction: f64) -> Self {
        let dx = self.lng_range() * fraction;
        let dy = self.lat_range() * fraction;
        Self {
            min_lng: self.min_lng - dx,
            max_lng: self.max_lng + dx,
            min_lat: self.min_lat - dy,
            max_lat: self.max_lat + dy,
        }
    }
}

/// Axis-aligned pixel rectangle, `x2`/`y2` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// Axis-aligned bounds of floating-point pixel coordinates before rounding
/// and clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PixelExtent {
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn pad(&self, delta: f64) -> Self {
        Self {
            min_x: self.min_x - delta,
            min_y: self.min_y - delta,
            max_x: self.max_x + delta,
            max_y: self.max_y + delta,
        }
    }

    /// Round outward to whole pixels and clip to `[0, width] x [0, height]`.
    pub fn clip_to(&self, width: u32, height: u32) -> PixelRect {
        let clamp = |v: f64, hi: u32| -> u32 {
            if v.is_nan() || v <= 0.0 {
                0
            } else if v >= hi as f64 {
                hi
            } else {
                v as u32
            }
        };
        PixelRect {
            x1: clamp(self.min_x.floor(), width),
            y1: clamp(self.min_y.floor(), height),
            x2: clamp(self.max_x.ceil(), width),
            y2: clamp(self.max_y.ceil(), height),
        }
    }
}
