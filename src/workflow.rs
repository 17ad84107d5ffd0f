//! Workflow progress derived from an envelope's status and recipients.

use serde::Serialize;

use crate::docusign::models::EnvelopeRecipients;

/// Coarse position of an envelope in its signing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStep {
    Pending,
    InProgress,
    Completed,
    Terminated,
}

impl WorkflowStep {
    /// Maps a raw DocuSign envelope status. Unknown statuses count as pending.
    pub fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "sent" | "delivered" | "signed" | "correct" => WorkflowStep::InProgress,
            "completed" => WorkflowStep::Completed,
            "declined" | "voided" | "deleted" => WorkflowStep::Terminated,
            // "created", "draft" and anything unrecognised
            _ => WorkflowStep::Pending,
        }
    }
}

/// Recipient counts and completion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProgress {
    /// Signers plus carbon copies
    pub total_recipients: usize,
    /// Signers whose status is `completed`
    pub completed_recipients: usize,
    /// round(100 * completed / total), 0 when there are no recipients
    pub progress_percentage: u32,
}

impl WorkflowProgress {
    pub fn from_recipients(recipients: &EnvelopeRecipients) -> Self {
        let total_recipients = recipients.signers.len() + recipients.carbon_copies.len();
        let completed_recipients = recipients
            .signers
            .iter()
            .filter(|s| {
                s.status
                    .as_deref()
                    .is_some_and(|status| status.eq_ignore_ascii_case("completed"))
            })
            .count();

        let progress_percentage = if total_recipients == 0 {
            0
        } else {
            (100.0 * completed_recipients as f64 / total_recipients as f64).round() as u32
        };

        Self {
            total_recipients,
            completed_recipients,
            progress_percentage,
        }
    }
}
