pub mod classifier;
pub mod config;
pub mod events;
pub mod images;
pub mod pacing;
pub mod pipeline;
pub mod prompt;

pub use classifier::ModelClassifier;
pub use config::{AssessConfig, RetryPolicy};
pub use events::{CancelToken, PipelineEvent, PipelineObserver, Stage, TracingObserver};
pub use pipeline::{locate_buildings, project_document, Assessor, TileInput};
