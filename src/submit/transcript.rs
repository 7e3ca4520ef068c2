use tracing::Instrument;

use crate::api::types::{Transcript, TranscriptInput};
use crate::api::ApiClient;
use crate::error::{SubmissionError, ValidationError};
use crate::feed::RefreshSignal;
use crate::telemetry::{self};
use crate::telemetry::ops::submit::Phase as SubmitPhase;
use crate::util::time::parse_calendar_date;

use super::required;

pub const MIN_TRANSCRIPT_CHARS: usize = 200;
const REJECTED: &str = "Failed to create transcript analysis. Please try again.";

/// Call-transcript form as typed by the user. `attendees` is the raw
/// comma-separated field; it is split only once the form validates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranscriptForm {
    pub company_name: String,
    pub attendees: String,
    pub date: String,
    pub transcript_text: String,
}

impl TranscriptForm {
    pub fn validate(&self) -> Result<TranscriptInput, ValidationError> {
        required("Company name", &self.company_name)?;
        required("Meeting attendees", &self.attendees)?;
        required("Meeting date", &self.date)?;
        required("Call transcript", &self.transcript_text)?;

        if self.transcript_text.chars().count() < MIN_TRANSCRIPT_CHARS {
            return Err(ValidationError::TranscriptTooShort);
        }
        // "you and the prospect": a comma list, or at least two words
        if !self.attendees.contains(',') && self.attendees.split_whitespace().count() < 2 {
            return Err(ValidationError::TooFewAttendees);
        }
        if parse_calendar_date(&self.date).is_none() {
            return Err(ValidationError::InvalidDate(self.date.clone()));
        }

        Ok(TranscriptInput {
            company_name: self.company_name.clone(),
            attendees: self.attendees.split(',').map(|a| a.trim().to_string()).collect(),
            date: self.date.trim().to_string(),
            transcript_text: self.transcript_text.clone(),
        })
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool { *self == Self::default() }

    /// Validate, create, then clear the form and ask the feed to refresh.
    /// On any failure the form keeps what the user typed.
    pub async fn submit(&mut self, api: &dyn ApiClient, refresh: &dyn RefreshSignal) -> Result<Transcript, SubmissionError> {
        let log = telemetry::submit();
        let input = {
            let _s = log.span(&SubmitPhase::Validate).entered();
            self.validate()?
        };

        let created = api
            .create_transcript(&input)
            .instrument(log.span_kv(&SubmitPhase::Create, [("company", input.company_name.clone())]))
            .await
            .map_err(|cause| {
                log.warn_kv("⚠️ transcript submission failed", [("error", cause.to_string())]);
                SubmissionError::Rejected { message: REJECTED, cause }
            })?;

        log.info_kv("➕ transcript queued", [("id", created.id.to_string()), ("task_id", created.task_id.clone().unwrap_or_default())]);
        *self = Self::default();
        let _s = log.span(&SubmitPhase::Refresh).entered();
        refresh.request_refresh();
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{server_error, MockApi};
    use crate::api::types::RecordId;
    use crate::error::Resource;
    use crate::submit::CountingRefresh;

    fn valid_form() -> TranscriptForm {
        TranscriptForm {
            company_name: "Acme".into(),
            attendees: "Jo, Sam".into(),
            date: "2024-01-01".into(),
            transcript_text: "J".repeat(220),
        }
    }

    fn ack(id: &str) -> Transcript {
        Transcript { id: RecordId::new(id), status: Some("queued".into()), task_id: Some("task-1".into()), ..Transcript::default() }
    }

    #[test]
    fn attendees_are_split_and_trimmed() {
        let mut form = valid_form();
        form.attendees = " Jo Smith (you) ,Sam Lee,  Mike ".into();
        let input = form.validate().unwrap();
        assert_eq!(input.attendees, vec!["Jo Smith (you)", "Sam Lee", "Mike"]);
    }

    #[test]
    fn attendee_rule() {
        let mut form = valid_form();
        form.attendees = "Jo".into();
        assert_eq!(form.validate().unwrap_err(), ValidationError::TooFewAttendees);
        form.attendees = "Jo Sam".into();
        assert_eq!(form.validate().unwrap().attendees, vec!["Jo Sam"]);
        form.attendees = "Jo,".into();
        assert_eq!(form.validate().unwrap().attendees, vec!["Jo", ""]);
    }

    #[test]
    fn transcript_length_boundary() {
        let mut form = valid_form();
        form.transcript_text = "x".repeat(199);
        assert_eq!(form.validate().unwrap_err(), ValidationError::TranscriptTooShort);
        form.transcript_text = "é".repeat(200);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn required_fields_and_date_format() {
        let mut form = valid_form();
        form.company_name = "  ".into();
        assert_eq!(form.validate().unwrap_err(), ValidationError::MissingField("Company name"));
        let mut form = valid_form();
        form.date = "01/01/2024".into();
        assert!(matches!(form.validate().unwrap_err(), ValidationError::InvalidDate(_)));
    }

    #[tokio::test]
    async fn valid_submission_refreshes_once_and_clears() {
        let api = MockApi::new();
        api.push_created_transcript(Ok(ack("1")));
        let refresh = CountingRefresh::default();

        let mut form = valid_form();
        let created = form.submit(&api, &refresh).await.unwrap();

        assert_eq!(created.id.as_str(), "1");
        assert_eq!(refresh.count(), 1);
        assert!(form.is_empty());
        let sent = api.transcript_inputs();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attendees, vec!["Jo", "Sam"]);
        assert_eq!(sent[0].date, "2024-01-01");
    }

    #[tokio::test]
    async fn invalid_form_never_hits_the_network() {
        let api = MockApi::new();
        let refresh = CountingRefresh::default();
        let mut form = valid_form();
        form.transcript_text = "too short".into();

        let err = form.submit(&api, &refresh).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Invalid(ValidationError::TranscriptTooShort)));
        assert!(!err.is_retryable());
        assert!(api.calls().is_empty());
        assert_eq!(refresh.count(), 0);
        assert_eq!(form.transcript_text, "too short");
    }

    #[tokio::test]
    async fn backend_failure_keeps_input() {
        let api = MockApi::new();
        api.push_created_transcript(Err(server_error(Resource::Transcripts)));
        let refresh = CountingRefresh::default();
        let mut form = valid_form();

        let err = form.submit(&api, &refresh).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Failed to create transcript analysis. Please try again.");
        assert_eq!(form, valid_form());
        assert_eq!(refresh.count(), 0);
    }
}
