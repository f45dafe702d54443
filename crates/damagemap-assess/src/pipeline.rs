use crate::config::AssessConfig;
use crate::events::{CancelToken, PipelineEvent, PipelineObserver, Stage};
use crate::images::load_tile_images;
use crate::pacing::{Sleeper, ThreadSleeper};
use anyhow::{Context, Result};
use damagemap_core::bounds::estimate_tile_bounds;
use damagemap_core::geom::GeoBounds;
use damagemap_core::model::{BuildingPolygon, Classification, PixelBox, TileImages};
use damagemap_core::projection::{project_all, ProjectedTile};
use damagemap_core::reconcile::{fail_batch, reconcile};
use damagemap_core::report::{
    summarize, ImageSize, ProjectionReport, TileOutcome, TileReport,
};
use damagemap_core::vision::DamageClassifier;
use damagemap_import_xview::{import_labels, LabelDocument};
use std::path::PathBuf;
use tracing::info;

pub const CANCELLED: &str = "analysis cancelled before this batch ran";

#[derive(Debug, Clone)]
pub struct TileInput {
    pub name: String,
    pub pre_image: PathBuf,
    pub post_image: PathBuf,
    pub labels: PathBuf,
}

/// Locate every building of a tile on the image without contacting the
/// model. Pixel positions are estimates.
pub fn locate_buildings(
    buildings: &[BuildingPolygon],
    width: u32,
    height: u32,
    cfg: &AssessConfig,
) -> Result<(GeoBounds, ProjectedTile)> {
    let bounds = estimate_tile_bounds(buildings, &cfg.bounds).context("estimate tile bounds")?;
    let projected = project_all(buildings, &bounds, width, height, &cfg.projection)
        .context("project buildings")?;
    Ok((bounds, projected))
}

/// Dry run over a loaded label document: the importer's warnings plus the
/// located and excluded buildings.
pub fn project_document(
    doc: &LabelDocument,
    width: u32,
    height: u32,
    cfg: &AssessConfig,
) -> Result<ProjectionReport> {
    let (bounds, projected) = if doc.buildings.is_empty() {
        (None, ProjectedTile::default())
    } else {
        let (bounds, projected) = locate_buildings(&doc.buildings, width, height, cfg)?;
        (Some(bounds), projected)
    };
    Ok(ProjectionReport {
        image_size: ImageSize { width, height },
        bounds,
        boxes: projected.boxes,
        excluded: projected.excluded,
        warnings: doc.warnings.clone(),
    })
}

/// Runs one tile end to end, strictly one batch at a time.
pub struct Assessor<C, S = ThreadSleeper> {
    cfg: AssessConfig,
    classifier: C,
    sleeper: S,
}

impl<C: DamageClassifier> Assessor<C, ThreadSleeper> {
    pub fn new(cfg: AssessConfig, classifier: C) -> Result<Self> {
        Self::with_sleeper(cfg, classifier, ThreadSleeper)
    }
}

impl<C: DamageClassifier, S: Sleeper> Assessor<C, S> {
    pub fn with_sleeper(cfg: AssessConfig, classifier: C, sleeper: S) -> Result<Self> {
        cfg.validate().context("invalid assessment configuration")?;
        Ok(Self {
            cfg,
            classifier,
            sleeper,
        })
    }

    /// Load the tile from disk and assess it. Missing or unreadable inputs
    /// are errors; everything after loading degrades per building instead.
    pub fn assess_tile(
        &self,
        tile: &TileInput,
        observer: &mut dyn PipelineObserver,
        cancel: &CancelToken,
    ) -> Result<TileReport> {
        observer.on_event(&PipelineEvent::Stage(Stage::LoadGeometry));
        let doc = import_labels(&tile.labels)?;
        if doc.buildings.is_empty() {
            return Ok(self.assess_without_images(&tile.name, &doc, observer));
        }
        let images = load_tile_images(&tile.pre_image, &tile.post_image)
            .with_context(|| format!("load images for tile {}", tile.name))?;
        self.assess(&tile.name, &doc, &images, observer, cancel)
    }

    fn assess_without_images(
        &self,
        tile: &str,
        doc: &LabelDocument,
        observer: &mut dyn PipelineObserver,
    ) -> TileReport {
        let mut report = TileReport::empty(tile, TileOutcome::NoPolygons);
        for w in &doc.warnings {
            observer.on_event(&PipelineEvent::Warning(w));
        }
        report.warnings = doc.warnings.clone();
        info!(tile, "no polygons in label document");
        observer.on_event(&PipelineEvent::Stage(Stage::Done));
        report
    }

    pub fn assess(
        &self,
        tile: &str,
        doc: &LabelDocument,
        images: &TileImages,
        observer: &mut dyn PipelineObserver,
        cancel: &CancelToken,
    ) -> Result<TileReport> {
        if doc.buildings.is_empty() {
            return Ok(self.assess_without_images(tile, doc, observer));
        }

        let mut report = TileReport::empty(tile, TileOutcome::Completed);
        for w in &doc.warnings {
            observer.on_event(&PipelineEvent::Warning(w));
        }
        report.warnings = doc.warnings.clone();
        report.buildings_total = doc.buildings.len();
        report.image_size = Some(ImageSize {
            width: images.width,
            height: images.height,
        });

        observer.on_event(&PipelineEvent::Stage(Stage::EstimateBounds));
        observer.on_event(&PipelineEvent::Stage(Stage::ProjectAll));
        let (bounds, projected) =
            locate_buildings(&doc.buildings, images.width, images.height, &self.cfg)?;
        info!(
            tile,
            min_lng = bounds.min_lng,
            max_lng = bounds.max_lng,
            min_lat = bounds.min_lat,
            max_lat = bounds.max_lat,
            "estimated tile bounds"
        );
        report.bounds = Some(bounds);

        for ex in &projected.excluded {
            observer.on_event(&PipelineEvent::Excluded(ex));
        }
        report.excluded = projected.excluded;
        let boxes = projected.boxes;
        info!(tile, valid = boxes.len(), excluded = report.excluded.len(), "buildings located");

        if boxes.is_empty() {
            report.outcome = TileOutcome::NoValidBoxes;
            observer.on_event(&PipelineEvent::Stage(Stage::Done));
            return Ok(report);
        }

        observer.on_event(&PipelineEvent::Stage(Stage::PartitionBatches));
        let batches: Vec<&[PixelBox]> = boxes.chunks(self.cfg.batch_size).collect();
        let total = batches.len();
        report.batches = total;

        observer.on_event(&PipelineEvent::Stage(Stage::ClassifyBatch));
        let mut results: Vec<Classification> = Vec::with_capacity(boxes.len());
        for (i, batch) in batches.iter().enumerate() {
            let index = i + 1;
            if cancel.is_cancelled() {
                let rest = &batches[i..];
                let remaining = rest.iter().map(|b| b.len()).sum();
                observer.on_event(&PipelineEvent::Cancelled { remaining });
                for b in rest {
                    results.extend(fail_batch(b, CANCELLED));
                }
                report.outcome = TileOutcome::Cancelled;
                break;
            }

            observer.on_event(&PipelineEvent::BatchStarted {
                index,
                total,
                size: batch.len(),
            });
            let (batch_results, stats) = match self.classifier.classify(images, batch) {
                Ok(records) => {
                    let (out, stats) = reconcile(batch, records);
                    (out, Some(stats))
                }
                Err(err) => {
                    let reason = format!("Error: {err}");
                    observer.on_event(&PipelineEvent::BatchFailed {
                        index,
                        total,
                        error: &reason,
                    });
                    (fail_batch(batch, &reason), None)
                }
            };
            let summary = summarize(&batch_results);
            observer.on_event(&PipelineEvent::BatchFinished {
                index,
                total,
                summary: &summary,
                stats: stats.as_ref(),
            });
            results.extend(batch_results);

            if index < total && !cancel.is_cancelled() {
                self.sleeper.sleep(self.cfg.batch_pause);
            }
        }

        observer.on_event(&PipelineEvent::Stage(Stage::Aggregate));
        debug_assert_eq!(boxes.len(), results.len());
        report.summary = summarize(&results);
        report.results = results;
        info!(
            tile,
            classified = report.results.len(),
            unclassified = report.unclassified_count(),
            "assessment complete"
        );
        observer.on_event(&PipelineEvent::Stage(Stage::Done));
        Ok(report)
    }
}
