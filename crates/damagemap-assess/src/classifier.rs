use crate::config::RetryPolicy;
use crate::pacing::{Sleeper, ThreadSleeper};
use crate::prompt::{build_prompt, POST_CAPTION, PRE_CAPTION};
use damagemap_core::model::{PixelBox, ResponseRecord, TileImages, Vocabulary};
use damagemap_core::response::parse_response;
use damagemap_core::vision::{
    ClassifyError, DamageClassifier, ModelError, ModelRequest, VisionModel,
};
use std::time::Duration;
use tracing::{debug, warn};

/// [`DamageClassifier`] over a raw [`VisionModel`]: builds the request,
/// validates the answer and retries under a bounded policy.
pub struct ModelClassifier<M, S = ThreadSleeper> {
    model: M,
    sleeper: S,
    policy: RetryPolicy,
    vocabulary: Vocabulary,
}

impl<M: VisionModel> ModelClassifier<M, ThreadSleeper> {
    pub fn new(model: M, policy: RetryPolicy, vocabulary: Vocabulary) -> Self {
        Self::with_sleeper(model, ThreadSleeper, policy, vocabulary)
    }
}

impl<M: VisionModel, S: Sleeper> ModelClassifier<M, S> {
    pub fn with_sleeper(model: M, sleeper: S, policy: RetryPolicy, vocabulary: Vocabulary) -> Self {
        Self {
            model,
            sleeper,
            policy,
            vocabulary,
        }
    }

    fn attempt(&self, request: &ModelRequest<'_>) -> Result<Vec<ResponseRecord>, Failure> {
        let text = self.model.generate(request).map_err(Failure::Model)?;
        parse_response(&text, self.vocabulary).map_err(|e| Failure::Response(e.to_string()))
    }
}

enum Failure {
    Model(ModelError),
    Response(String),
}

impl Failure {
    fn describe(&self) -> String {
        match self {
            Failure::Model(e) => e.to_string(),
            Failure::Response(e) => e.clone(),
        }
    }
}

impl<M: VisionModel, S: Sleeper> DamageClassifier for ModelClassifier<M, S> {
    fn classify(
        &self,
        images: &TileImages,
        batch: &[PixelBox],
    ) -> Result<Vec<ResponseRecord>, ClassifyError> {
        let request = ModelRequest::default()
            .text(PRE_CAPTION)
            .image(&images.mime_type, &images.pre)
            .text(POST_CAPTION)
            .image(&images.mime_type, &images.post)
            .text(build_prompt(batch, self.vocabulary));

        let attempts = self.policy.attempts();
        let mut last = String::new();
        for attempt in 1..=attempts {
            let wait: Duration = match self.attempt(&request) {
                Ok(records) => {
                    debug!(attempt, records = records.len(), "model answered");
                    return Ok(records);
                }
                Err(Failure::Model(ModelError::RateLimited { retry_after })) => {
                    last = ModelError::RateLimited { retry_after }.to_string();
                    let wait = self.policy.rate_limit_delay(retry_after);
                    warn!(attempt, attempts, ?wait, "rate limited");
                    wait
                }
                Err(failure) => {
                    last = failure.describe();
                    warn!(attempt, attempts, error = %last, "attempt failed");
                    self.policy.backoff
                }
            };
            if attempt < attempts {
                self.sleeper.sleep(wait);
            }
        }

        Err(ClassifyError::Exhausted { attempts, last })
    }
}
