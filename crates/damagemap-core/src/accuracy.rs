use crate::model::{Classification, DamageLabel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionEntry {
    pub truth: DamageLabel,
    pub predicted: DamageLabel,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub compared: usize,
    pub correct: usize,
    /// Percentage in [0, 100]; `None` when nothing was comparable.
    pub accuracy_pct: Option<f64>,
    pub confusion: Vec<ConfusionEntry>,
}

/// Score predictions against known labels.
///
/// Buildings without ground truth, or whose truth is itself un-classified,
/// are not compared. A predicted un-classified counts as a miss.
pub fn score(results: &[Classification], truth: &HashMap<String, DamageLabel>) -> AccuracyReport {
    let mut compared = 0usize;
    let mut correct = 0usize;
    let mut pairs: BTreeMap<(DamageLabel, DamageLabel), usize> = BTreeMap::new();

    for r in results {
        let Some(&gt) = truth.get(&r.uid) else {
            continue;
        };
        if gt == DamageLabel::Unclassified {
            continue;
        }
        compared += 1;
        if gt == r.damage {
            correct += 1;
        }
        *pairs.entry((gt, r.damage)).or_default() += 1;
    }

    let mut confusion: Vec<ConfusionEntry> = pairs
        .into_iter()
        .map(|((truth, predicted), count)| ConfusionEntry {
            truth,
            predicted,
            count,
        })
        .collect();
    // Stable on ties: BTreeMap order is kept.
    confusion.sort_by(|a, b| b.count.cmp(&a.count));

    AccuracyReport {
        compared,
        correct,
        accuracy_pct: (compared > 0).then(|| correct as f64 / compared as f64 * 100.0),
        confusion,
    }
}
