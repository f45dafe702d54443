use damagemap_core::bounds::{estimate_tile_bounds, BoundsConfig, BoundsError};
use damagemap_core::geom::{GeoBounds, GeoPoint};
use damagemap_core::model::BuildingPolygon;
use damagemap_core::projection::{project_all, project_point, ProjectionConfig};

fn square(uid: &str, lng: f64, lat: f64, half: f64) -> BuildingPolygon {
    BuildingPolygon {
        uid: uid.to_string(),
        ring: vec![
            GeoPoint::new(lng - half, lat - half),
            GeoPoint::new(lng + half, lat - half),
            GeoPoint::new(lng + half, lat + half),
            GeoPoint::new(lng - half, lat + half),
            GeoPoint::new(lng - half, lat - half),
        ],
    }
}

fn scenario_bounds() -> GeoBounds {
    GeoBounds::new(-90.90, -90.86, 14.46, 14.49)
}

#[test]
fn projects_scenario_points() {
    let bounds = scenario_bounds();

    let (x, y) = project_point(&bounds, 1024, 1024, GeoPoint::new(-90.88, 14.475));
    assert!((x - 512.0).abs() < 1.0, "x = {x}");
    assert!((y - 512.0).abs() < 1.0, "y = {y}");

    let (x, y) = project_point(&bounds, 1024, 1024, GeoPoint::new(-90.895, 14.485));
    assert!((x - 128.0).abs() < 1.0, "x = {x}");
    assert!((y - 171.0).abs() < 1.0, "y = {y}");
}

#[test]
fn latitude_runs_against_pixel_rows() {
    let bounds = scenario_bounds();
    let (_, north) = project_point(&bounds, 1024, 1024, GeoPoint::new(-90.88, 14.4899));
    let (_, south) = project_point(&bounds, 1024, 1024, GeoPoint::new(-90.88, 14.4601));
    assert!(north < 5.0, "north row = {north}");
    assert!(south > 1019.0, "south row = {south}");
}

#[test]
fn boxes_are_clipped_to_the_image() {
    let bounds = scenario_bounds();
    let polygons = vec![square("edge", -90.90, 14.49, 0.001)];
    let tile = project_all(&polygons, &bounds, 1024, 1024, &ProjectionConfig::default())
        .expect("valid bounds");
    assert_eq!(1, tile.boxes.len());
    let r = tile.boxes[0].rect;
    assert_eq!(0, r.x1);
    assert_eq!(0, r.y1);
    assert!(r.x2 > r.x1 && r.y2 > r.y1);
    assert!(r.x2 <= 1024 && r.y2 <= 1024);
}

#[test]
fn tiny_boxes_are_reported_as_excluded() {
    let bounds = scenario_bounds();
    let polygons = vec![
        square("big", -90.88, 14.475, 0.0005),
        square("tiny", -90.87, 14.47, 0.000001),
    ];
    let tile = project_all(&polygons, &bounds, 1024, 1024, &ProjectionConfig::default())
        .expect("valid bounds");
    assert_eq!(1, tile.boxes.len());
    assert_eq!("big", tile.boxes[0].uid);
    assert_eq!(1, tile.excluded.len());
    assert_eq!("tiny", tile.excluded[0].uid);
    assert!(tile.excluded[0].width_px < 5);
}

#[test]
fn padding_grows_boxes() {
    let bounds = scenario_bounds();
    let polygons = vec![square("a", -90.88, 14.475, 0.0005)];
    let plain = project_all(&polygons, &bounds, 1024, 1024, &ProjectionConfig::default())
        .expect("valid bounds");
    let padded = project_all(
        &polygons,
        &bounds,
        1024,
        1024,
        &ProjectionConfig {
            padding_px: 10,
            ..ProjectionConfig::default()
        },
    )
    .expect("valid bounds");
    assert_eq!(plain.boxes[0].rect.width() + 20, padded.boxes[0].rect.width());
}

#[test]
fn degenerate_bounds_are_rejected() {
    let bounds = GeoBounds::new(-90.88, -90.88, 14.46, 14.49);
    let polygons = vec![square("a", -90.88, 14.475, 0.0005)];
    let err = project_all(&polygons, &bounds, 1024, 1024, &ProjectionConfig::default())
        .expect_err("zero lng range");
    assert_eq!(BoundsError::Degenerate, err);
}

#[test]
fn margin_expands_ranges_and_compresses_footprints() {
    let polygons = vec![
        square("a", -90.89, 14.47, 0.0005),
        square("b", -90.87, 14.48, 0.0005),
    ];
    let narrow = estimate_tile_bounds(
        &polygons,
        &BoundsConfig {
            margin: 0.02,
            ..BoundsConfig::default()
        },
    )
    .expect("bounds");
    let wide = estimate_tile_bounds(
        &polygons,
        &BoundsConfig {
            margin: 0.10,
            ..BoundsConfig::default()
        },
    )
    .expect("bounds");
    assert!(wide.lng_range() > narrow.lng_range());
    assert!(wide.lat_range() > narrow.lat_range());

    let cfg = ProjectionConfig {
        min_box_px: 1,
        padding_px: 0,
    };
    let a_narrow = project_all(&polygons, &narrow, 1024, 1024, &cfg).expect("narrow");
    let a_wide = project_all(&polygons, &wide, 1024, 1024, &cfg).expect("wide");
    let (rn, rw) = (a_narrow.boxes[0].rect, a_wide.boxes[0].rect);
    assert!(rw.width() <= rn.width());
    // Building "a" sits in the lower-left quadrant; more margin pulls it inward.
    assert!(rw.x1 > rn.x1);
    assert!(rw.y2 < rn.y2);
}

#[test]
fn single_building_gets_a_range_floor() {
    let point = BuildingPolygon {
        uid: "p".to_string(),
        ring: vec![
            GeoPoint::new(-90.88, 14.475),
            GeoPoint::new(-90.88, 14.475),
            GeoPoint::new(-90.88, 14.475),
        ],
    };
    let bounds = estimate_tile_bounds(&[point], &BoundsConfig::default()).expect("bounds");
    assert!(bounds.lng_range() > 0.0);
    assert!(bounds.lat_range() > 0.0);
    let (x, y) = project_point(&bounds, 1024, 1024, GeoPoint::new(-90.88, 14.475));
    assert!(x.is_finite() && y.is_finite());
}

#[test]
fn empty_input_has_no_bounds() {
    let err = estimate_tile_bounds(&[], &BoundsConfig::default()).expect_err("no vertices");
    assert_eq!(BoundsError::NoVertices, err);
}
