use crate::geom::{GeoPoint, PixelRect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One building footprint from a label document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingPolygon {
    pub uid: String,
    /// Exterior ring in (lng, lat).
    pub ring: Vec<GeoPoint>,
}

impl BuildingPolygon {
    pub fn distinct_vertex_count(&self) -> usize {
        let mut seen: Vec<GeoPoint> = Vec::with_capacity(self.ring.len());
        for p in &self.ring {
            if !seen.contains(p) {
                seen.push(*p);
            }
        }
        seen.len()
    }
}

/// A building located on the image, ready to be sent for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub uid: String,
    #[serde(flatten)]
    pub rect: PixelRect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedBuilding {
    pub uid: String,
    pub reason: String,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DamageLabel {
    #[serde(rename = "no-damage")]
    NoDamage,
    #[serde(rename = "minor-damage")]
    MinorDamage,
    #[serde(rename = "major-damage")]
    MajorDamage,
    #[serde(rename = "destroyed")]
    Destroyed,
    /// Assigned locally whenever no usable classification exists.
    #[serde(rename = "un-classified")]
    Unclassified,
}

impl DamageLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageLabel::NoDamage => "no-damage",
            DamageLabel::MinorDamage => "minor-damage",
            DamageLabel::MajorDamage => "major-damage",
            DamageLabel::Destroyed => "destroyed",
            DamageLabel::Unclassified => "un-classified",
        }
    }

    /// Lenient parse: case-insensitive, spaces and underscores read as hyphens.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let norm: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '_' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match norm.as_str() {
            "no-damage" => Some(DamageLabel::NoDamage),
            "minor-damage" => Some(DamageLabel::MinorDamage),
            "major-damage" => Some(DamageLabel::MajorDamage),
            "destroyed" => Some(DamageLabel::Destroyed),
            "un-classified" | "unclassified" => Some(DamageLabel::Unclassified),
            _ => None,
        }
    }
}

impl fmt::Display for DamageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of labels the remote model may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vocabulary {
    #[default]
    ThreeLevel,
    FourLevel,
}

impl Vocabulary {
    pub fn labels(&self) -> &'static [DamageLabel] {
        match self {
            Vocabulary::ThreeLevel => &[
                DamageLabel::NoDamage,
                DamageLabel::MinorDamage,
                DamageLabel::Destroyed,
            ],
            Vocabulary::FourLevel => &[
                DamageLabel::NoDamage,
                DamageLabel::MinorDamage,
                DamageLabel::MajorDamage,
                DamageLabel::Destroyed,
            ],
        }
    }

    pub fn contains(&self, label: DamageLabel) -> bool {
        self.labels().contains(&label)
    }
}

/// Final per-building outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub uid: String,
    pub damage: DamageLabel,
    pub confidence: f64,
    pub description: String,
}

impl Classification {
    pub fn unclassified(uid: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            damage: DamageLabel::Unclassified,
            confidence: 0.0,
            description: description.into(),
        }
    }
}

/// One element of a remote response after validation. Order and identifiers
/// are whatever the remote model produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub uid: Option<String>,
    pub damage: DamageLabel,
    pub confidence: f64,
    pub description: String,
}

/// Pre/post rasters of one tile, encoded for transport.
#[derive(Debug, Clone)]
pub struct TileImages {
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub pre: Vec<u8>,
    pub post: Vec<u8>,
}
