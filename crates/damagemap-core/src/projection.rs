use crate::bounds::BoundsError;
use crate::geom::{GeoBounds, GeoPoint, PixelExtent};
use crate::model::{BuildingPolygon, ExcludedBuilding, PixelBox};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Boxes narrower or shorter than this (after clipping) are excluded.
    pub min_box_px: u32,
    /// Extra pixels added around every box before clipping.
    pub padding_px: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            min_box_px: 5,
            padding_px: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectedTile {
    /// In label-document order.
    pub boxes: Vec<PixelBox>,
    pub excluded: Vec<ExcludedBuilding>,
}

/// Map a geographic point into image space. North is up, so latitude runs
/// against the pixel row axis.
pub fn project_point(bounds: &GeoBounds, width: u32, height: u32, p: GeoPoint) -> (f64, f64) {
    let x = (p.lng - bounds.min_lng) / bounds.lng_range() * width as f64;
    let y = (bounds.max_lat - p.lat) / bounds.lat_range() * height as f64;
    (x, y)
}

/// Reduce one polygon to a clipped pixel box, or explain why it was dropped.
pub fn project_polygon(
    polygon: &BuildingPolygon,
    bounds: &GeoBounds,
    width: u32,
    height: u32,
    cfg: &ProjectionConfig,
) -> Result<PixelBox, ExcludedBuilding> {
    let mut extent = PixelExtent::empty();
    for p in polygon.ring.iter().filter(|p| p.is_finite()) {
        let (x, y) = project_point(bounds, width, height, *p);
        extent.include(x, y);
    }
    if extent.is_empty() {
        return Err(ExcludedBuilding {
            uid: polygon.uid.clone(),
            reason: "polygon has no finite vertices".to_string(),
            width_px: 0,
            height_px: 0,
        });
    }

    let rect = extent.pad(cfg.padding_px as f64).clip_to(width, height);
    if rect.width() < cfg.min_box_px || rect.height() < cfg.min_box_px {
        return Err(ExcludedBuilding {
            uid: polygon.uid.clone(),
            reason: format!(
                "pixel box {}x{} is below the {}px minimum",
                rect.width(),
                rect.height(),
                cfg.min_box_px
            ),
            width_px: rect.width(),
            height_px: rect.height(),
        });
    }

    Ok(PixelBox {
        uid: polygon.uid.clone(),
        rect,
    })
}

/// Project every polygon of a tile. Order is preserved in both lists.
pub fn project_all(
    polygons: &[BuildingPolygon],
    bounds: &GeoBounds,
    width: u32,
    height: u32,
    cfg: &ProjectionConfig,
) -> Result<ProjectedTile, BoundsError> {
    if !(bounds.lng_range() > 0.0 && bounds.lat_range() > 0.0) {
        return Err(BoundsError::Degenerate);
    }

    let mut out = ProjectedTile::default();
    for polygon in polygons {
        match project_polygon(polygon, bounds, width, height, cfg) {
            Ok(b) => out.boxes.push(b),
            Err(ex) => out.excluded.push(ex),
        }
    }
    Ok(out)
}
