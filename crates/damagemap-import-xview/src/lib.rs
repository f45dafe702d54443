//! Reader for xView2-style building label documents.
//!
//! The document carries `features.lng_lat`, a list of entries with a WKT
//! `POLYGON` string and a `properties` object holding the building `uid`
//! (and, in unstripped files, the damage `subtype`).

use anyhow::{anyhow, bail, Context, Result};
use damagemap_core::geom::GeoPoint;
use damagemap_core::model::{BuildingPolygon, DamageLabel};
use damagemap_core::report::Warning;
use serde::Deserialize;
use geo::Geometry;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;
use wkt::Wkt;

#[derive(Debug, Clone, Default)]
pub struct LabelDocument {
    pub image_name: Option<String>,
    pub buildings: Vec<BuildingPolygon>,
    /// uid -> damage label, only for entries that still carry a `subtype`.
    pub ground_truth: HashMap<String, DamageLabel>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    features: RawFeatures,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFeatures {
    #[serde(default)]
    lng_lat: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    img_name: Option<String>,
}

pub fn import_labels(path: &Path) -> Result<LabelDocument> {
    let json = std::fs::read_to_string(path).with_context(|| format!("read labels: {path:?}"))?;
    parse_labels(&json).with_context(|| format!("parse labels: {path:?}"))
}

/// Parse a label document. Bad entries are skipped with a warning; only a
/// document that is not JSON at all is an error.
pub fn parse_labels(json: &str) -> Result<LabelDocument> {
    let raw: RawDocument =
        serde_json::from_str(json).context("label document is not valid JSON")?;

    let mut doc = LabelDocument {
        image_name: raw.metadata.and_then(|m| m.img_name),
        ..LabelDocument::default()
    };
    let mut seen = HashSet::new();

    for (index, entry) in raw.features.lng_lat.iter().enumerate() {
        let uid = entry
            .pointer("/properties/uid")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let Some(uid) = uid else {
            let message = format!("feature #{index} has no uid; skipped");
            push_warning(&mut doc, "missing_uid", message);
            continue;
        };
        if !seen.insert(uid.to_string()) {
            let message = format!("uid {uid} appears more than once; later copy skipped");
            push_warning(&mut doc, "duplicate_uid", message);
            continue;
        }

        let Some(geometry) = entry.get("wkt").and_then(Value::as_str) else {
            let message = format!("uid {uid} has no wkt geometry; skipped");
            push_warning(&mut doc, "missing_geometry", message);
            continue;
        };

        let ring = match parse_wkt_polygon(geometry) {
            Ok(ring) => ring,
            Err(err) => {
                let message = format!("uid {uid}: {err:#}; skipped");
                push_warning(&mut doc, "invalid_polygon", message);
                continue;
            }
        };

        let polygon = BuildingPolygon {
            uid: uid.to_string(),
            ring,
        };
        if polygon.distinct_vertex_count() < 3 {
            push_warning(
                &mut doc,
                "degenerate_polygon",
                format!("uid {uid} has fewer than 3 distinct vertices; skipped"),
            );
            continue;
        }

        if let Some(label) = entry
            .pointer("/properties/subtype")
            .and_then(Value::as_str)
            .and_then(DamageLabel::parse_loose)
        {
            doc.ground_truth.insert(polygon.uid.clone(), label);
        }

        doc.buildings.push(polygon);
    }

    Ok(doc)
}

fn push_warning(doc: &mut LabelDocument, code: &str, message: String) {
    warn!(code, "{message}");
    doc.warnings.push(Warning::new(code, message));
}

/// Exterior ring of a WKT `POLYGON`, closed. Interior rings are ignored.
pub fn parse_wkt_polygon(text: &str) -> Result<Vec<GeoPoint>> {
    let text = text.trim();
    let parsed = Wkt::<f64>::from_str(text).map_err(|e| anyhow!("invalid WKT: {e}"))?;
    let geometry = Geometry::try_from(parsed).map_err(|e| anyhow!("unsupported WKT: {e}"))?;
    let Geometry::Polygon(polygon) = geometry else {
        bail!("not a POLYGON: {:.32}", text);
    };

    let mut ring = Vec::with_capacity(polygon.exterior().0.len());
    for c in polygon.exterior().coords() {
        if !(c.x.is_finite() && c.y.is_finite()) {
            bail!("non-finite coordinate ({}, {})", c.x, c.y);
        }
        ring.push(GeoPoint::new(c.x, c.y));
    }
    if ring.is_empty() {
        bail!("empty POLYGON");
    }
    Ok(ring)
}
