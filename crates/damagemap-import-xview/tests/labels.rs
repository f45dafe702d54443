use damagemap_core::model::DamageLabel;
use damagemap_import_xview::{parse_labels, parse_wkt_polygon};

const DOC: &str = r#"{
  "metadata": {"img_name": "guatemala-volcano_00000000_post_disaster.png"},
  "features": {
    "lng_lat": [
      {
        "properties": {"feature_type": "building", "subtype": "destroyed", "uid": "b1"},
        "wkt": "POLYGON ((-90.8812 14.4751, -90.8810 14.4751, -90.8810 14.4749, -90.8812 14.4749, -90.8812 14.4751))"
      },
      {
        "properties": {"uid": "b2"},
        "wkt": "POLYGON ((-90.8950 14.4850, -90.8948 14.4850, -90.8948 14.4848))"
      },
      {
        "properties": {"uid": "b3"},
        "wkt": "POLYGON ((garbage))"
      },
      {
        "properties": {},
        "wkt": "POLYGON ((0 0, 1 0, 1 1, 0 0))"
      },
      {
        "properties": {"uid": "b1"},
        "wkt": "POLYGON ((0 0, 1 0, 1 1, 0 0))"
      },
      {
        "properties": {"uid": "b6"},
        "wkt": "POLYGON ((0 0, 1 1, 0 0, 1 1))"
      }
    ],
    "xy": []
  }
}"#;

#[test]
fn loads_valid_polygons_and_warns_on_the_rest() {
    let doc = parse_labels(DOC).expect("document parses");
    assert_eq!(
        Some("guatemala-volcano_00000000_post_disaster.png"),
        doc.image_name.as_deref()
    );

    let uids: Vec<_> = doc.buildings.iter().map(|b| b.uid.as_str()).collect();
    assert_eq!(vec!["b1", "b2"], uids);
    // b2 is written open; the importer closes it.
    assert_eq!(5, doc.buildings[0].ring.len());
    assert_eq!(4, doc.buildings[1].ring.len());
    assert_eq!(doc.buildings[1].ring.first(), doc.buildings[1].ring.last());

    let codes: Vec<_> = doc.warnings.iter().map(|w| w.code.as_str()).collect();
    assert_eq!(
        vec!["invalid_polygon", "missing_uid", "duplicate_uid", "degenerate_polygon"],
        codes
    );

    assert_eq!(Some(&DamageLabel::Destroyed), doc.ground_truth.get("b1"));
    assert_eq!(None, doc.ground_truth.get("b2"));
}

#[test]
fn empty_feature_list_is_not_an_error() {
    let doc = parse_labels(r#"{"features": {"lng_lat": []}}"#).expect("empty document");
    assert!(doc.buildings.is_empty());
    assert!(doc.warnings.is_empty());

    let doc = parse_labels("{}").expect("no features key");
    assert!(doc.buildings.is_empty());
}

#[test]
fn malformed_json_is_an_error() {
    assert!(parse_labels("{not json").is_err());
}

#[test]
fn parses_wkt_exterior_ring() {
    let ring = parse_wkt_polygon("POLYGON ((1 2, 3 4, 5 6, 1 2), (9 9, 9 8, 8 8, 9 9))")
        .expect("valid polygon");
    assert_eq!(4, ring.len());
    assert_eq!(1.0, ring[0].lng);
    assert_eq!(6.0, ring[2].lat);

    assert!(parse_wkt_polygon("POINT (1 2)").is_err());
    assert!(parse_wkt_polygon("POLYGON EMPTY").is_err());
    assert!(parse_wkt_polygon("POLYGON ((1 2, 3").is_err());
    assert!(parse_wkt_polygon("POLYGON ((1 2, 3 4, oops))").is_err());
    assert!(parse_wkt_polygon("LINESTRING (1 2, 3 4)").is_err());
}
