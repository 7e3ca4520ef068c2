use tracing::Instrument;

use crate::api::types::{LinkedInInput, LinkedInInsight};
use crate::api::ApiClient;
use crate::error::{SubmissionError, ValidationError};
use crate::feed::RefreshSignal;
use crate::telemetry::{self};
use crate::telemetry::ops::submit::Phase as SubmitPhase;

pub const MIN_BIO_CHARS: usize = 50;
pub const MIN_PITCH_CHARS: usize = 100;
const REJECTED: &str = "Failed to create LinkedIn insight. Please try again.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkedInForm {
    pub linkedin_bio: String,
    pub pitch_deck_content: String,
}

impl LinkedInForm {
    pub fn validate(&self) -> Result<LinkedInInput, ValidationError> {
        if self.linkedin_bio.chars().count() < MIN_BIO_CHARS {
            return Err(ValidationError::BioTooShort);
        }
        if self.pitch_deck_content.chars().count() < MIN_PITCH_CHARS {
            return Err(ValidationError::PitchTooShort);
        }
        Ok(LinkedInInput {
            linkedin_bio: self.linkedin_bio.clone(),
            pitch_deck_content: self.pitch_deck_content.clone(),
        })
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool { *self == Self::default() }

    pub async fn submit(&mut self, api: &dyn ApiClient, refresh: &dyn RefreshSignal) -> Result<LinkedInInsight, SubmissionError> {
        let log = telemetry::submit();
        let input = {
            let _s = log.span(&SubmitPhase::Validate).entered();
            self.validate()?
        };

        let created = api
            .create_linkedin_insight(&input)
            .instrument(log.span(&SubmitPhase::Create))
            .await
            .map_err(|cause| {
                log.warn_kv("⚠️ linkedin submission failed", [("error", cause.to_string())]);
                SubmissionError::Rejected { message: REJECTED, cause }
            })?;

        log.info_kv("➕ linkedin insight queued", [("id", created.id.to_string()), ("task_id", created.task_id.clone().unwrap_or_default())]);
        *self = Self::default();
        let _s = log.span(&SubmitPhase::Refresh).entered();
        refresh.request_refresh();
        Ok(created)
    }
}
