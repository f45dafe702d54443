use crate::geom::GeoBounds;
use crate::model::BuildingPolygon;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct BoundsConfig {
    /// Fraction of the footprint range added on each side.
    pub margin: f64,
    /// Smallest range (degrees) allowed on either axis before the margin is
    /// applied. Protects the projector against a single building or a
    /// colinear set.
    pub min_range_deg: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            margin: 0.10,
            min_range_deg: 1e-5,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BoundsError {
    #[error("no finite vertices to estimate tile bounds from")]
    NoVertices,
    #[error("tile bounds have zero extent on at least one axis")]
    Degenerate,
    #[error("invalid bounds configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Approximate the geographic extent of the whole tile from its building
/// footprints.
///
/// Buildings rarely reach the tile edges, so the raw footprint extent is
/// grown by `cfg.margin` on every side. The result is a heuristic and pixel
/// positions derived from it are estimates.
pub fn estimate_tile_bounds(
    polygons: &[BuildingPolygon],
    cfg: &BoundsConfig,
) -> Result<GeoBounds, BoundsError> {
    if !(cfg.margin.is_finite() && cfg.margin >= 0.0) {
        return Err(BoundsError::InvalidConfig("margin must be a finite value >= 0"));
    }
    if !(cfg.min_range_deg.is_finite() && cfg.min_range_deg > 0.0) {
        return Err(BoundsError::InvalidConfig("min_range_deg must be > 0"));
    }

    let mut extent = GeoBounds::empty();
    for p in polygons.iter().flat_map(|poly| poly.ring.iter()) {
        if p.is_finite() {
            extent.include_point(*p);
        }
    }
    if extent.is_empty() {
        return Err(BoundsError::NoVertices);
    }

    Ok(apply_range_floor(extent, cfg.min_range_deg).expand_fraction(cfg.margin))
}

fn apply_range_floor(bounds: GeoBounds, min_range: f64) -> GeoBounds {
    let mut out = bounds;
    let center = bounds.center();
    if bounds.lng_range() < min_range {
        out.min_lng = center.lng - min_range * 0.5;
        out.max_lng = center.lng + min_range * 0.5;
    }
    if bounds.lat_range() < min_range {
        out.min_lat = center.lat - min_range * 0.5;
        out.max_lat = center.lat + min_range * 0.5;
    }
    out
}
