use damagemap_core::model::{DamageLabel, Vocabulary};
use damagemap_core::response::{parse_response, strip_fences, ResponseError};

#[test]
fn strips_markdown_fences() {
    assert_eq!("[1]", strip_fences("```json\n[1]\n```"));
    assert_eq!("[2]", strip_fences("Here you go:\n```\n[2]\n```\nthanks"));
    assert_eq!("[3]", strip_fences("  [3]  "));
}

#[test]
fn parses_fenced_array() {
    let text = r#"```json
[
  {"uid": "abc", "damage": "destroyed", "confidence": 0.9, "description": "Reduced to ash"},
  {"uid": "def", "damage": "No Damage", "confidence": 1.7}
]
```"#;
    let records = parse_response(text, Vocabulary::ThreeLevel).expect("valid response");
    assert_eq!(2, records.len());
    assert_eq!(Some("abc"), records[0].uid.as_deref());
    assert_eq!(DamageLabel::Destroyed, records[0].damage);
    assert_eq!("Reduced to ash", records[0].description);
    assert_eq!(DamageLabel::NoDamage, records[1].damage);
    assert_eq!(1.0, records[1].confidence);
    assert_eq!("", records[1].description);
}

#[test]
fn relabels_out_of_vocabulary_entries_in_place() {
    let text = r#"[
        {"uid": "a", "damage": "major-damage", "confidence": 0.6},
        "not an object",
        {"uid": "c", "damage": "minor-damage", "confidence": 0.4}
    ]"#;
    let records = parse_response(text, Vocabulary::ThreeLevel).expect("valid response");
    assert_eq!(3, records.len());
    assert_eq!(DamageLabel::Unclassified, records[0].damage);
    assert_eq!(0.0, records[0].confidence);
    assert!(records[0].description.contains("major-damage"));
    assert_eq!(DamageLabel::Unclassified, records[1].damage);
    assert_eq!(DamageLabel::MinorDamage, records[2].damage);

    let four = parse_response(text, Vocabulary::FourLevel).expect("valid response");
    assert_eq!(DamageLabel::MajorDamage, four[0].damage);
}

#[test]
fn model_cannot_emit_the_sentinel() {
    let text = r#"[{"uid": "a", "damage": "un-classified", "confidence": 0.9}]"#;
    let records = parse_response(text, Vocabulary::FourLevel).expect("valid response");
    assert_eq!(DamageLabel::Unclassified, records[0].damage);
    assert_eq!(0.0, records[0].confidence);
}

#[test]
fn rejects_non_list_and_garbage() {
    let err = parse_response(r#"{"uid": "a"}"#, Vocabulary::ThreeLevel).expect_err("object");
    assert!(matches!(err, ResponseError::NotAList("object")));

    let err = parse_response("I cannot help with that.", Vocabulary::ThreeLevel)
        .expect_err("prose");
    assert!(matches!(err, ResponseError::Json(_)));
}
