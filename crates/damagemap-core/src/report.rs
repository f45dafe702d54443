use crate::geom::GeoBounds;
use crate::model::{Classification, DamageLabel, ExcludedBuilding, PixelBox};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
}

impl Warning {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileOutcome {
    Completed,
    NoPolygons,
    NoValidBoxes,
    Cancelled,
}

pub type DamageSummary = BTreeMap<DamageLabel, usize>;

pub fn summarize(results: &[Classification]) -> DamageSummary {
    let mut summary = DamageSummary::new();
    for r in results {
        *summary.entry(r.damage).or_default() += 1;
    }
    summary
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileReport {
    pub tile: String,
    pub generated_at: DateTime<Utc>,
    pub outcome: TileOutcome,
    pub image_size: Option<ImageSize>,
    /// Estimated, not geo-referenced.
    pub bounds: Option<GeoBounds>,
    pub buildings_total: usize,
    pub batches: usize,
    pub results: Vec<Classification>,
    pub excluded: Vec<ExcludedBuilding>,
    pub summary: DamageSummary,
    pub warnings: Vec<Warning>,
}

impl TileReport {
    pub fn empty(tile: impl Into<String>, outcome: TileOutcome) -> Self {
        Self {
            tile: tile.into(),
            generated_at: Utc::now(),
            outcome,
            image_size: None,
            bounds: None,
            buildings_total: 0,
            batches: 0,
            results: Vec::new(),
            excluded: Vec::new(),
            summary: DamageSummary::new(),
            warnings: Vec::new(),
        }
    }

    pub fn unclassified_count(&self) -> usize {
        self.summary
            .get(&DamageLabel::Unclassified)
            .copied()
            .unwrap_or(0)
    }
}

/// Where each building of a tile lands on the image, without any
/// classification. `bounds` is `None` when the document has no polygons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub image_size: ImageSize,
    pub bounds: Option<GeoBounds>,
    pub boxes: Vec<PixelBox>,
    pub excluded: Vec<ExcludedBuilding>,
    pub warnings: Vec<Warning>,
}
