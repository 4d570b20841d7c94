//! Notification dispatch seam.

use log::info;

use crate::boundaries::{BoundaryResult, Notifier};
use crate::domain::submission::SubmissionStatus;
use crate::domain::types::Reference;

/// Logs dispatch intents instead of sending anything.
///
/// The rendering and transport of summaries and status-change mails live in a
/// separate service; this default keeps the intake deployable without it.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_summary(&self, reference: &Reference) -> BoundaryResult<()> {
        info!("submission {reference}: summary dispatch requested");
        Ok(())
    }

    fn send_status_change(
        &self,
        reference: &Reference,
        old_status: &SubmissionStatus,
        new_status: &SubmissionStatus,
    ) -> BoundaryResult<()> {
        info!("submission {reference}: status change {old_status} -> {new_status} dispatch requested");
        Ok(())
    }
}
