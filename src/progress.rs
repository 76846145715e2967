// ABOUTME: Derives step-level progress percentages from a job snapshot
// ABOUTME: Produces a look-ahead "buffer" boundary and a finer within-step value

use crate::remote::models::{JobSnapshot, StepProgress};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressFractions {
    /// Progress up to the end of the current step.
    pub step_boundary_percent: Option<f64>,
    /// Progress including the portion of the current step already done.
    pub within_step_percent: Option<f64>,
    pub indeterminate: bool,
}

impl ProgressFractions {
    pub fn from_snapshot(snapshot: &JobSnapshot) -> Self {
        let total_steps = snapshot.total_steps;
        let indeterminate = total_steps <= 0;

        let mut fractions = ProgressFractions {
            indeterminate,
            ..Default::default()
        };
        if indeterminate {
            return fractions;
        }

        let Some(step) = snapshot.current_step.as_ref() else {
            return fractions;
        };
        let Some(number) = step.number else {
            return fractions;
        };

        let total = total_steps as f64;
        // Not clamped: a step number at or past total_steps reports over 100.
        let boundary = ((number as f64 + 1.0) / total) * 100.0;
        let sub_fraction = step.progress.as_ref().map(sub_fraction).unwrap_or(0.0);

        fractions.step_boundary_percent = Some(boundary);
        fractions.within_step_percent =
            Some(boundary - (100.0 / total) + (100.0 * sub_fraction / total));
        fractions
    }

    pub fn describe(&self) -> String {
        if self.indeterminate {
            return "progress indeterminate".to_string();
        }
        match (self.within_step_percent, self.step_boundary_percent) {
            (Some(value), Some(buffer)) => format!("{:.1}% (step ends at {:.1}%)", value, buffer),
            _ => "progress unknown".to_string(),
        }
    }
}

fn sub_fraction(progress: &StepProgress) -> f64 {
    if progress.unit.as_deref() == Some("percent") {
        return progress.value / 100.0;
    }
    match progress.total {
        Some(total) if total != 0.0 => progress.value / total,
        _ => 0.0,
    }
}
