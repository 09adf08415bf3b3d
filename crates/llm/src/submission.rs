use serde::Deserialize;

use crate::error::LlmError;

/// The caller's request payload.
///
/// Every field is optional. Unknown fields are ignored, and an empty body is
/// the same as an empty object. Each field has several accepted spellings;
/// when a body carries more than one, the first in declaration order wins.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Spellings")]
pub(crate) struct Submission {
    /// Who the submission is about, e.g. the patient or the service.
    pub subject_name: Option<String>,
    /// When the described event happened.
    pub event_date: Option<String>,
    /// Free-form notes or logs.
    pub free_text: Option<String>,
}

/// Every key a submission field may arrive under.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Spellings {
    patient_name: Option<String>,
    subject_name: Option<String>,
    #[serde(rename = "subjectName")]
    subject_name_camel: Option<String>,
    service: Option<String>,

    date_of_visit: Option<String>,
    event_date: Option<String>,
    #[serde(rename = "eventDate")]
    event_date_camel: Option<String>,
    deployment_date: Option<String>,

    notes: Option<String>,
    free_text: Option<String>,
    #[serde(rename = "freeText")]
    free_text_camel: Option<String>,
    logs: Option<String>,
}

impl From<Spellings> for Submission {
    fn from(spellings: Spellings) -> Self {
        Self {
            subject_name: spellings
                .patient_name
                .or(spellings.subject_name)
                .or(spellings.subject_name_camel)
                .or(spellings.service),
            event_date: spellings
                .date_of_visit
                .or(spellings.event_date)
                .or(spellings.event_date_camel)
                .or(spellings.deployment_date),
            free_text: spellings
                .notes
                .or(spellings.free_text)
                .or(spellings.free_text_camel)
                .or(spellings.logs),
        }
    }
}

impl Submission {
    /// Parse a request body. Whitespace-only bodies and `null` yield an empty submission.
    pub(crate) fn from_body(body: &[u8]) -> crate::Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let submission: Option<Self> = sonic_rs::from_slice(body).map_err(|e| {
            log::debug!("Failed to parse submission body: {e}");
            LlmError::InvalidRequest(format!("Malformed submission: {e}"))
        })?;

        Ok(submission.unwrap_or_default())
    }
}
