use damagemap_assess::images::{load_tile_images, ImageLoadError};
use image::RgbImage;
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("damagemap-images-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[test]
fn loads_matching_pair_as_png() {
    let pre = scratch("pair_pre.png");
    let post = scratch("pair_post.png");
    RgbImage::new(32, 16).save(&pre).unwrap();
    RgbImage::new(32, 16).save(&post).unwrap();

    let images = load_tile_images(&pre, &post).unwrap();
    assert_eq!((images.width, images.height), (32, 16));
    assert_eq!(images.mime_type, "image/png");
    assert!(images.pre.starts_with(&[0x89, b'P', b'N', b'G']));
    assert!(images.post.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn rejects_mismatched_sizes() {
    let pre = scratch("mismatch_pre.png");
    let post = scratch("mismatch_post.png");
    RgbImage::new(32, 32).save(&pre).unwrap();
    RgbImage::new(16, 32).save(&post).unwrap();

    let err = load_tile_images(&pre, &post).unwrap_err();
    assert!(matches!(
        err,
        ImageLoadError::SizeMismatch {
            pre_w: 32,
            post_w: 16,
            ..
        }
    ));
}

#[test]
fn missing_file_names_the_path() {
    let pre = scratch("does_not_exist_pre.png");
    let post = scratch("does_not_exist_post.png");
    let err = load_tile_images(&pre, &post).unwrap_err();
    assert!(matches!(err, ImageLoadError::Open { ref path, .. } if path == &pre));
}
