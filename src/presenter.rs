// ABOUTME: Terminal rendering of job progress using indicatif
// ABOUTME: Shows within-step progress as the bar and the step boundary in the message

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::poller::PollUpdate;
use crate::progress::ProgressFractions;
use crate::remote::models::{JobSnapshot, JobStatus};

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    Aborted,
    NotUnderstood,
    /// Polling ended before the job reached a terminal state.
    Incomplete,
}

impl Outcome {
    pub fn from_update(update: &PollUpdate) -> Self {
        match update {
            PollUpdate::Pending => Outcome::Incomplete,
            PollUpdate::Unparseable { .. } => Outcome::NotUnderstood,
            PollUpdate::Progress { snapshot, .. } => match snapshot.status {
                _ if snapshot.was_success() => Outcome::Succeeded,
                JobStatus::FailedTotal => Outcome::Failed,
                JobStatus::Aborted | JobStatus::AbortedPending => Outcome::Aborted,
                _ => Outcome::Incomplete,
            },
        }
    }
}

pub struct ProgressPresenter {
    bar: ProgressBar,
    label: String,
    indeterminate: Option<bool>,
}

impl ProgressPresenter {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_bar(ProgressBar::new(100), label)
    }

    /// Presenter that draws nothing; used when stderr is not a terminal and in tests.
    pub fn hidden(label: impl Into<String>) -> Self {
        Self::with_bar(ProgressBar::hidden(), label)
    }

    fn with_bar(bar: ProgressBar, label: impl Into<String>) -> Self {
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            label: label.into(),
            indeterminate: None,
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn render(&mut self, update: &PollUpdate) {
        match update {
            PollUpdate::Pending => {
                self.use_spinner();
                self.bar.set_message(format!("{}: waiting for first status", self.label));
            }
            PollUpdate::Progress {
                snapshot,
                fractions,
            } => {
                match fractions.within_step_percent {
                    Some(value) if !fractions.indeterminate => {
                        self.use_bar();
                        self.bar.set_position(value.clamp(0.0, 100.0).round() as u64);
                    }
                    _ => self.use_spinner(),
                }
                self.bar.set_message(status_line(&self.label, snapshot, fractions));
            }
            PollUpdate::Unparseable { message } => {
                self.bar.set_message(format!("{}: {}", self.label, message));
            }
        }
    }

    /// Stops the bar and leaves a final line describing how the job ended.
    pub fn finish(&self, update: &PollUpdate) -> Outcome {
        let outcome = Outcome::from_update(update);
        let summary = match (outcome, update) {
            (Outcome::NotUnderstood, PollUpdate::Unparseable { message }) => {
                format!("{}: did not understand response ({})", self.label, message)
            }
            (Outcome::Succeeded, _) => format!("{}: finished", self.label),
            (Outcome::Failed, _) => format!("{}: failed", self.label),
            (Outcome::Aborted, _) => format!("{}: aborted", self.label),
            _ => format!("{}: polling stopped before the job finished", self.label),
        };

        if outcome == Outcome::Succeeded {
            self.bar.finish_with_message(summary);
        } else {
            self.bar.abandon_with_message(summary);
        }
        outcome
    }

    fn use_bar(&mut self) {
        if self.indeterminate != Some(false) {
            if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                self.bar.set_style(style.progress_chars("=>-"));
            }
            self.bar.set_length(100);
            self.indeterminate = Some(false);
        }
    }

    fn use_spinner(&mut self) {
        if self.indeterminate != Some(true) {
            if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
                self.bar.set_style(style);
            }
            self.indeterminate = Some(true);
        }
    }
}

pub fn status_line(label: &str, snapshot: &JobSnapshot, fractions: &ProgressFractions) -> String {
    let mut line = format!("{} [{:?}]", label, snapshot.status);

    if let Some(step) = &snapshot.current_step {
        if let Some(number) = step.number {
            if snapshot.total_steps > 0 {
                line.push_str(&format!(
                    " step {}/{}",
                    number.saturating_add(1),
                    snapshot.total_steps
                ));
            } else {
                line.push_str(&format!(" step {}", number.saturating_add(1)));
            }
        }
        if let Some(description) = &step.description {
            line.push_str(&format!(": {}", description));
        }
    }

    if let Some(buffer) = fractions.step_boundary_percent {
        line.push_str(&format!(" (step ends at {:.0}%)", buffer));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn update(status: &str) -> PollUpdate {
        let snapshot = JobSnapshot::from_value(json!({
            "jobId": "VX-31",
            "status": status,
            "priority": "HIGH",
            "totalSteps": 4,
            "currentStep": {
                "description": "Transcoding",
                "number": 1,
                "progress": { "value": 50, "unit": "percent" }
            }
        }))
        .unwrap();
        let fractions = ProgressFractions::from_snapshot(&snapshot);
        PollUpdate::Progress {
            snapshot: Arc::new(snapshot),
            fractions,
        }
    }

    #[test]
    fn test_outcomes() {
        assert_eq!(Outcome::from_update(&update("FINISHED")), Outcome::Succeeded);
        assert_eq!(Outcome::from_update(&update("FINISHED_WARNING")), Outcome::Succeeded);
        assert_eq!(Outcome::from_update(&update("FAILED_TOTAL")), Outcome::Failed);
        assert_eq!(Outcome::from_update(&update("ABORTED_PENDING")), Outcome::Aborted);
        assert_eq!(Outcome::from_update(&update("STARTED")), Outcome::Incomplete);
        assert_eq!(Outcome::from_update(&PollUpdate::Pending), Outcome::Incomplete);
        assert_eq!(
            Outcome::from_update(&PollUpdate::Unparseable {
                message: "missing field `jobId`".to_string()
            }),
            Outcome::NotUnderstood
        );
    }

    #[test]
    fn test_status_line() {
        let PollUpdate::Progress {
            snapshot,
            fractions,
        } = update("STARTED")
        else {
            unreachable!()
        };
        assert_eq!(
            status_line("VX-31", &snapshot, &fractions),
            "VX-31 [Started] step 2/4: Transcoding (step ends at 50%)"
        );
    }

    #[test]
    fn test_status_line_with_huge_step_number() {
        let snapshot = JobSnapshot::from_value(json!({
            "jobId": "VX-31",
            "status": "STARTED",
            "priority": "HIGH",
            "totalSteps": 4,
            "currentStep": { "number": i64::MAX }
        }))
        .unwrap();
        let fractions = ProgressFractions::from_snapshot(&snapshot);
        let line = status_line("VX-31", &snapshot, &fractions);
        assert!(line.starts_with(&format!("VX-31 [Started] step {}/4", i64::MAX)));

        let mut presenter = ProgressPresenter::hidden("VX-31");
        presenter.render(&PollUpdate::Progress {
            snapshot: Arc::new(snapshot),
            fractions,
        });
    }

    #[test]
    fn test_hidden_presenter_renders_and_finishes() {
        let mut presenter = ProgressPresenter::hidden("VX-31");
        presenter.render(&PollUpdate::Pending);
        presenter.render(&update("STARTED"));
        assert_eq!(presenter.indeterminate, Some(false));
        assert_eq!(presenter.finish(&update("FINISHED")), Outcome::Succeeded);
    }
}
