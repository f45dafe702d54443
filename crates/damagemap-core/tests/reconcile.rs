use damagemap_core::geom::PixelRect;
use damagemap_core::model::{DamageLabel, PixelBox, ResponseRecord};
use damagemap_core::reconcile::{fail_batch, reconcile, MISSING_RESULT};

fn building(uid: &str) -> PixelBox {
    PixelBox {
        uid: uid.to_string(),
        rect: PixelRect {
            x1: 0,
            y1: 0,
            x2: 10,
            y2: 10,
        },
    }
}

fn record(uid: Option<&str>, damage: DamageLabel) -> ResponseRecord {
    ResponseRecord {
        uid: uid.map(str::to_string),
        damage,
        confidence: 0.8,
        description: format!("{damage}"),
    }
}

#[test]
fn matches_by_identifier_despite_reordering() {
    let batch = vec![building("a"), building("b"), building("c")];
    let records = vec![
        record(Some("c"), DamageLabel::Destroyed),
        record(Some("a"), DamageLabel::NoDamage),
        record(Some("b"), DamageLabel::MinorDamage),
    ];
    let (out, stats) = reconcile(&batch, records);
    let got: Vec<_> = out.iter().map(|c| (c.uid.as_str(), c.damage)).collect();
    assert_eq!(
        vec![
            ("a", DamageLabel::NoDamage),
            ("b", DamageLabel::MinorDamage),
            ("c", DamageLabel::Destroyed),
        ],
        got
    );
    assert_eq!(3, stats.by_identifier);
    assert_eq!(0, stats.by_position);
}

#[test]
fn falls_back_to_position_for_anonymous_records() {
    let batch = vec![building("a"), building("b"), building("c")];
    let records = vec![
        record(Some("a"), DamageLabel::Destroyed),
        record(None, DamageLabel::MinorDamage),
    ];
    let (out, stats) = reconcile(&batch, records);

    assert_eq!(3, out.len());
    assert_eq!(DamageLabel::Destroyed, out[0].damage);
    assert_eq!("b", out[1].uid);
    assert_eq!(DamageLabel::MinorDamage, out[1].damage);
    assert_eq!("c", out[2].uid);
    assert_eq!(DamageLabel::Unclassified, out[2].damage);
    assert_eq!(0.0, out[2].confidence);
    assert_eq!(MISSING_RESULT, out[2].description);
    assert_eq!(1, stats.by_identifier);
    assert_eq!(1, stats.by_position);
    assert_eq!(1, stats.missing);
}

#[test]
fn mismatched_identifier_is_used_positionally() {
    let batch = vec![building("a"), building("b")];
    let records = vec![
        record(Some("zzz"), DamageLabel::NoDamage),
        record(Some("b"), DamageLabel::Destroyed),
    ];
    let (out, stats) = reconcile(&batch, records);
    assert_eq!(DamageLabel::NoDamage, out[0].damage);
    assert_eq!(DamageLabel::Destroyed, out[1].damage);
    assert_eq!(1, stats.by_identifier);
    assert_eq!(1, stats.by_position);
}

#[test]
fn record_naming_another_member_is_not_reassigned() {
    let batch = vec![building("a"), building("b")];
    // Two answers for "b", none for "a".
    let records = vec![
        record(Some("b"), DamageLabel::NoDamage),
        record(Some("b"), DamageLabel::Destroyed),
    ];
    let (out, stats) = reconcile(&batch, records);
    assert_eq!(DamageLabel::Unclassified, out[0].damage);
    assert_eq!(DamageLabel::NoDamage, out[1].damage);
    assert_eq!(1, stats.missing);
    assert_eq!(1, stats.unused_records);
}

#[test]
fn empty_response_yields_all_unclassified() {
    let batch = vec![building("a"), building("b")];
    let (out, stats) = reconcile(&batch, Vec::new());
    assert_eq!(2, out.len());
    assert!(out
        .iter()
        .all(|c| c.damage == DamageLabel::Unclassified && c.confidence == 0.0));
    assert_eq!(2, stats.missing);
}

#[test]
fn extra_records_are_ignored() {
    let batch = vec![building("a")];
    let records = vec![
        record(None, DamageLabel::MinorDamage),
        record(None, DamageLabel::Destroyed),
    ];
    let (out, stats) = reconcile(&batch, records);
    assert_eq!(1, out.len());
    assert_eq!(DamageLabel::MinorDamage, out[0].damage);
    assert_eq!(1, stats.unused_records);
}

#[test]
fn failed_batch_keeps_every_building() {
    let batch = vec![building("a"), building("b")];
    let out = fail_batch(&batch, "Error: boom");
    assert_eq!(vec!["a", "b"], out.iter().map(|c| c.uid.as_str()).collect::<Vec<_>>());
    assert!(out.iter().all(|c| c.description == "Error: boom"));
}
