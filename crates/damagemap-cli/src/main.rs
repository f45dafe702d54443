use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use damagemap_assess::config::duration_from_secs;
use damagemap_assess::{
    project_document, AssessConfig, Assessor, CancelToken, ModelClassifier, RetryPolicy,
    TileInput, TracingObserver,
};
use damagemap_core::accuracy::{score, AccuracyReport};
use damagemap_core::bounds::BoundsConfig;
use damagemap_core::model::Vocabulary;
use damagemap_core::projection::ProjectionConfig;
use damagemap_core::report::TileReport;
use damagemap_gemini::{GeminiConfig, GeminiModel, DEFAULT_BASE_URL, DEFAULT_MODEL};
use damagemap_import_xview::import_labels;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "damagemap")]
#[command(about = "Per-building disaster damage assessment from pre/post satellite tiles.")]
struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify every building of one tile with the remote model.
    Analyze {
        #[arg(long)]
        pre: PathBuf,
        #[arg(long)]
        post: PathBuf,
        /// Label document with building polygons (damage labels stripped).
        #[arg(long)]
        labels: PathBuf,
        /// Unstripped label document to score the results against.
        #[arg(long)]
        ground_truth: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        tuning: Tuning,
        #[command(flatten)]
        remote: Remote,
    },
    /// Locate buildings on the image without calling the model.
    Project {
        #[arg(long)]
        labels: PathBuf,
        /// Take width/height from this image instead of the flags.
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, default_value_t = 1024)]
        width: u32,
        #[arg(long, default_value_t = 1024)]
        height: u32,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Score a saved report against ground-truth labels.
    Score {
        #[arg(long)]
        results: PathBuf,
        #[arg(long)]
        ground_truth: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VocabularyArg {
    Three,
    Four,
}

#[derive(Debug, Args)]
struct Tuning {
    /// Fraction of the footprint extent added on each side of the tile.
    #[arg(long, default_value_t = 0.10)]
    margin: f64,
    #[arg(long, default_value_t = 1e-5)]
    min_range_deg: f64,
    #[arg(long, default_value_t = 85)]
    batch_size: usize,
    #[arg(long, default_value_t = 5)]
    min_box_px: u32,
    #[arg(long, default_value_t = 0)]
    padding_px: u32,
    #[arg(long, value_enum, default_value_t = VocabularyArg::Three)]
    vocabulary: VocabularyArg,
    /// Seconds to wait between batches.
    #[arg(long, default_value_t = 10.0)]
    batch_pause: f64,
    #[arg(long, default_value_t = 5)]
    retries: u32,
}

#[derive(Debug, Args)]
struct Remote {
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 300)]
    timeout: u64,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput {
    #[serde(flatten)]
    report: TileReport,
    accuracy: Option<AccuracyReport>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    match cli.cmd {
        Command::Analyze {
            pre,
            post,
            labels,
            ground_truth,
            report,
            tuning,
            remote,
        } => analyze(
            &pre,
            &post,
            &labels,
            ground_truth.as_deref(),
            report.as_deref(),
            &tuning,
            remote,
        ),
        Command::Project {
            labels,
            image,
            width,
            height,
            tuning,
        } => project(&labels, image.as_deref(), width, height, &tuning),
        Command::Score {
            results,
            ground_truth,
        } => score_report(&results, &ground_truth),
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

impl Tuning {
    fn to_config(&self) -> Result<AssessConfig> {
        let batch_pause = duration_from_secs(self.batch_pause).context("--batch-pause")?;
        let cfg = AssessConfig {
            bounds: BoundsConfig {
                margin: self.margin,
                min_range_deg: self.min_range_deg,
            },
            projection: ProjectionConfig {
                min_box_px: self.min_box_px,
                padding_px: self.padding_px,
            },
            vocabulary: match self.vocabulary {
                VocabularyArg::Three => Vocabulary::ThreeLevel,
                VocabularyArg::Four => Vocabulary::FourLevel,
            },
            batch_size: self.batch_size,
            batch_pause,
            retry: RetryPolicy {
                max_retries: self.retries,
                ..RetryPolicy::default()
            },
        };
        cfg.validate().context("invalid tuning flags")?;
        Ok(cfg)
    }
}

fn analyze(
    pre: &Path,
    post: &Path,
    labels: &Path,
    ground_truth: Option<&Path>,
    report: Option<&Path>,
    tuning: &Tuning,
    remote: Remote,
) -> Result<()> {
    for input in [pre, post, labels].into_iter().chain(ground_truth) {
        ensure_input_file(input)?;
    }
    let cfg = tuning.to_config()?;

    let Some(api_key) = remote.api_key.filter(|k| !k.trim().is_empty()) else {
        bail!("no API key: pass --api-key or set GOOGLE_API_KEY");
    };
    let model = GeminiModel::new(GeminiConfig {
        api_key,
        model: remote.model,
        base_url: remote.base_url,
        timeout: Duration::from_secs(remote.timeout),
    })
    .context("build HTTP client")?;
    let classifier = ModelClassifier::new(model, cfg.retry.clone(), cfg.vocabulary);
    let assessor = Assessor::new(cfg, classifier)?;

    let tile = TileInput {
        name: tile_name(labels),
        pre_image: pre.to_path_buf(),
        post_image: post.to_path_buf(),
        labels: labels.to_path_buf(),
    };
    let mut observer = TracingObserver::default();
    let tile_report = assessor.assess_tile(&tile, &mut observer, &CancelToken::new())?;

    let accuracy = match ground_truth {
        Some(path) => {
            let truth = import_labels(path)?.ground_truth;
            let acc = score(&tile_report.results, &truth);
            if let Some(pct) = acc.accuracy_pct {
                info!(correct = acc.correct, compared = acc.compared, "accuracy {pct:.1}%");
            }
            Some(acc)
        }
        None => None,
    };

    let out = AnalyzeOutput {
        report: tile_report,
        accuracy,
    };
    let json = serde_json::to_string_pretty(&out).context("serialize report")?;
    emit(report, &json)
}

fn project(
    labels: &Path,
    image: Option<&Path>,
    width: u32,
    height: u32,
    tuning: &Tuning,
) -> Result<()> {
    ensure_input_file(labels)?;
    let cfg = tuning.to_config()?;
    let (width, height) = match image {
        Some(path) => {
            ensure_input_file(path)?;
            image::image_dimensions(path).with_context(|| format!("read image size: {path:?}"))?
        }
        None => (width, height),
    };

    let doc = import_labels(labels)?;
    if doc.buildings.is_empty() {
        info!("no polygons in label document");
    }
    let projection = project_document(&doc, width, height, &cfg)?;
    let json = serde_json::to_string_pretty(&projection).context("serialize projection")?;
    println!("{json}");
    Ok(())
}

fn score_report(results: &Path, ground_truth: &Path) -> Result<()> {
    ensure_input_file(results)?;
    ensure_input_file(ground_truth)?;
    let raw =
        std::fs::read_to_string(results).with_context(|| format!("read report: {results:?}"))?;
    let report: TileReport =
        serde_json::from_str(&raw).with_context(|| format!("parse report: {results:?}"))?;
    let truth = import_labels(ground_truth)?.ground_truth;
    let acc = score(&report.results, &truth);
    let json = serde_json::to_string_pretty(&acc).context("serialize accuracy")?;
    println!("{json}");
    Ok(())
}

fn emit(path: Option<&Path>, json: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            std::fs::write(path, json).with_context(|| format!("write report: {path:?}"))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn tile_name(labels: &Path) -> String {
    labels
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim_end_matches("_post_disaster").to_string())
        .unwrap_or_else(|| "tile".to_string())
}

fn ensure_input_file(input: &Path) -> Result<()> {
    match std::fs::metadata(input) {
        Ok(meta) => {
            if meta.is_file() {
                Ok(())
            } else {
                bail!("input is not a file: {input:?}");
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            bail!("input not found: {input:?} (cwd: {cwd:?}).");
        }
        Err(err) => Err(err).with_context(|| format!("stat input: {input:?}")),
    }
}
