use damagemap_core::model::TileImages;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("open image {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("pre image is {pre_w}x{pre_h} but post image is {post_w}x{post_h}")]
    SizeMismatch {
        pre_w: u32,
        pre_h: u32,
        post_w: u32,
        post_h: u32,
    },
    #[error("encode PNG: {0}")]
    Encode(#[source] image::ImageError),
}

/// Decode both rasters of a tile and re-encode them as PNG for upload.
pub fn load_tile_images(pre: &Path, post: &Path) -> Result<TileImages, ImageLoadError> {
    let pre_img = open(pre)?;
    let post_img = open(post)?;
    if (pre_img.width(), pre_img.height()) != (post_img.width(), post_img.height()) {
        return Err(ImageLoadError::SizeMismatch {
            pre_w: pre_img.width(),
            pre_h: pre_img.height(),
            post_w: post_img.width(),
            post_h: post_img.height(),
        });
    }

    Ok(TileImages {
        width: pre_img.width(),
        height: pre_img.height(),
        mime_type: "image/png".to_string(),
        pre: encode_png(&pre_img)?,
        post: encode_png(&post_img)?,
    })
}

fn open(path: &Path) -> Result<DynamicImage, ImageLoadError> {
    image::open(path).map_err(|source| ImageLoadError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ImageLoadError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(ImageLoadError::Encode)?;
    Ok(buf)
}
