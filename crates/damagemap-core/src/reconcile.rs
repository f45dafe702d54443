use crate::model::{Classification, PixelBox, ResponseRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MISSING_RESULT: &str = "model returned no result for this item";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchKind {
    Identifier,
    Position,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub by_identifier: usize,
    pub by_position: usize,
    pub missing: usize,
    /// Response records that ended up assigned to nobody.
    pub unused_records: usize,
}

/// Restore one result per requested building, in request order.
///
/// Identifier matches are resolved for the whole batch first. Remaining
/// buildings then take the unconsumed record at their own index, unless that
/// record names a different batch member. Anything left is synthesized as
/// un-classified.
pub fn reconcile(
    batch: &[PixelBox],
    records: Vec<ResponseRecord>,
) -> (Vec<Classification>, ReconcileStats) {
    let members: HashMap<&str, usize> = batch
        .iter()
        .enumerate()
        .map(|(i, b)| (b.uid.as_str(), i))
        .collect();

    let mut assigned: Vec<Option<(usize, MatchKind)>> = vec![None; batch.len()];
    let mut consumed = vec![false; records.len()];

    for (ri, rec) in records.iter().enumerate() {
        let Some(uid) = rec.uid.as_deref() else {
            continue;
        };
        if let Some(&bi) = members.get(uid) {
            if assigned[bi].is_none() {
                assigned[bi] = Some((ri, MatchKind::Identifier));
                consumed[ri] = true;
            }
        }
    }

    for (bi, slot) in assigned.iter_mut().enumerate() {
        if slot.is_some() || bi >= records.len() || consumed[bi] {
            continue;
        }
        let names_other_member = records[bi]
            .uid
            .as_deref()
            .is_some_and(|uid| members.contains_key(uid));
        if !names_other_member {
            *slot = Some((bi, MatchKind::Position));
            consumed[bi] = true;
        }
    }

    let mut stats = ReconcileStats::default();
    let mut taken: Vec<Option<ResponseRecord>> = records.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(batch.len());
    for (b, slot) in batch.iter().zip(assigned) {
        let record = slot.and_then(|(ri, kind)| taken[ri].take().map(|r| (r, kind)));
        match record {
            Some((r, kind)) => {
                match kind {
                    MatchKind::Identifier => stats.by_identifier += 1,
                    MatchKind::Position => stats.by_position += 1,
                }
                out.push(Classification {
                    uid: b.uid.clone(),
                    damage: r.damage,
                    confidence: r.confidence,
                    description: r.description,
                });
            }
            None => {
                stats.missing += 1;
                out.push(Classification::unclassified(b.uid.clone(), MISSING_RESULT));
            }
        }
    }
    stats.unused_records = taken.iter().filter(|r| r.is_some()).count();

    (out, stats)
}

/// Degrade a whole batch to un-classified with a shared reason.
pub fn fail_batch(batch: &[PixelBox], reason: &str) -> Vec<Classification> {
    batch
        .iter()
        .map(|b| Classification::unclassified(b.uid.clone(), reason))
        .collect()
}
