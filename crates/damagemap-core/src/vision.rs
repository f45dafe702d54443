//! Seams to the remote multimodal model.
//!
//! Two levels are exposed. [`VisionModel`] is raw transport: a list of
//! text/image parts in, model text out. [`DamageClassifier`] is the
//! capability the pipeline consumes: images and buildings in, validated
//! records out, with no ordering or completeness guarantee.

use crate::model::{PixelBox, ResponseRecord, TileImages};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestPart<'a> {
    Text(String),
    Image { mime_type: &'a str, data: &'a [u8] },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelRequest<'a> {
    pub parts: Vec<RequestPart<'a>>,
}

impl<'a> ModelRequest<'a> {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(RequestPart::Text(text.into()));
        self
    }

    pub fn image(mut self, mime_type: &'a str, data: &'a [u8]) -> Self {
        self.parts.push(RequestPart::Image { mime_type, data });
        self
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    /// Quota exhausted; the service may suggest how long to back off.
    #[error("rate limited by remote service (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("remote service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote service returned no text")]
    EmptyResponse,
}

pub trait VisionModel {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<String, ModelError>;
}

impl<M: VisionModel + ?Sized> VisionModel for &M {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<String, ModelError> {
        (**self).generate(request)
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

pub trait DamageClassifier {
    fn classify(
        &self,
        images: &TileImages,
        batch: &[PixelBox],
    ) -> Result<Vec<ResponseRecord>, ClassifyError>;
}

impl<C: DamageClassifier + ?Sized> DamageClassifier for &C {
    fn classify(
        &self,
        images: &TileImages,
        batch: &[PixelBox],
    ) -> Result<Vec<ResponseRecord>, ClassifyError> {
        (**self).classify(images, batch)
    }
}
