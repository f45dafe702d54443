use damagemap_core::accuracy::score;
use damagemap_core::model::{Classification, DamageLabel};
use std::collections::HashMap;

fn result(uid: &str, damage: DamageLabel) -> Classification {
    Classification {
        uid: uid.to_string(),
        damage,
        confidence: 0.5,
        description: String::new(),
    }
}

#[test]
fn scores_against_ground_truth() {
    let results = vec![
        result("a", DamageLabel::Destroyed),
        result("b", DamageLabel::NoDamage),
        result("c", DamageLabel::Unclassified),
        result("d", DamageLabel::NoDamage),
        result("e", DamageLabel::Destroyed),
    ];
    let truth: HashMap<String, DamageLabel> = [
        ("a", DamageLabel::Destroyed),
        ("b", DamageLabel::MinorDamage),
        ("c", DamageLabel::Destroyed),
        ("d", DamageLabel::Unclassified),
        ("e", DamageLabel::Destroyed),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let report = score(&results, &truth);
    assert_eq!(4, report.compared);
    assert_eq!(2, report.correct);
    assert_eq!(Some(50.0), report.accuracy_pct);
    assert_eq!(DamageLabel::Destroyed, report.confusion[0].truth);
    assert_eq!(DamageLabel::Destroyed, report.confusion[0].predicted);
    assert_eq!(2, report.confusion[0].count);
    assert_eq!(3, report.confusion.len());
}

#[test]
fn nothing_comparable() {
    let report = score(&[result("a", DamageLabel::Destroyed)], &HashMap::new());
    assert_eq!(0, report.compared);
    assert_eq!(None, report.accuracy_pct);
}
