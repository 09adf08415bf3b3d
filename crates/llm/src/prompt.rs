use config::PromptPreset;
use itertools::Itertools;

use crate::submission::Submission;

/// Fixed instructions of a preset: what the model is, and the three sections it must reply with.
struct Instructions {
    intro: &'static [&'static str],
    headings: [&'static str; 3],
    labels: Labels,
}

/// Labels of the submission fields in the prompt body.
struct Labels {
    subject: &'static str,
    date: &'static str,
    notes: &'static str,
}

const CONSULTATION: Instructions = Instructions {
    intro: &[
        "You are provided with notes written by a doctor from a patient's visit.",
        "Your job is to summarize the visit for the doctor and provide an email.",
        "Reply with exactly three sections with the headings:",
    ],
    headings: [
        "Summary of visit for the doctor's records",
        "Next steps for the doctor",
        "Draft of email to patient in patient-friendly language",
    ],
    labels: Labels {
        subject: "Patient Name",
        date: "Date of Visit",
        notes: "Notes",
    },
};

const DEPLOYMENT: Instructions = Instructions {
    intro: &[
        "You are an expert DevOps and Cloud Infrastructure analyst.",
        "You are provided with deployment logs, error messages, and infrastructure details from a DevOps engineer.",
        "Your job is to analyze the deployment and provide actionable insights.",
        "Reply with exactly three sections with these headings:",
    ],
    headings: [
        "Deployment Analysis Summary",
        "Critical Issues & Recommendations",
        "Optimization Suggestions",
    ],
    labels: Labels {
        subject: "Service",
        date: "Deployment Date",
        notes: "Logs",
    },
};

fn instructions(preset: PromptPreset) -> &'static Instructions {
    match preset {
        PromptPreset::Consultation => &CONSULTATION,
        PromptPreset::Deployment => &DEPLOYMENT,
    }
}

/// The instruction text sent to a provider.
///
/// Split into the fixed preamble and the body rendered from the submission,
/// so adapters with a system role can send them separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Prompt {
    preamble: String,
    body: String,
}

impl Prompt {
    /// Build the prompt for one submission. Absent fields render as empty strings.
    pub(crate) fn build(preset: PromptPreset, submission: Submission) -> Self {
        let Instructions { intro, headings, labels } = instructions(preset);

        let preamble = intro
            .iter()
            .map(|line| line.to_string())
            .chain(headings.iter().map(|heading| format!("### {heading}")))
            .join("\n");

        let Submission {
            subject_name,
            event_date,
            free_text,
        } = submission;

        let body = format!(
            "{}: {}\n{}: {}\n{}:\n{}",
            labels.subject,
            subject_name.unwrap_or_default(),
            labels.date,
            event_date.unwrap_or_default(),
            labels.notes,
            free_text.unwrap_or_default(),
        );

        Self { preamble, body }
    }

    pub(crate) fn preamble(&self) -> &str {
        &self.preamble
    }

    pub(crate) fn body(&self) -> &str {
        &self.body
    }

    /// The full prompt, preamble and body separated by a blank line.
    pub(crate) fn text(&self) -> String {
        format!("{}\n\n{}", self.preamble, self.body)
    }
}
