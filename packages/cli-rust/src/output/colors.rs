//! Color utilities for CLI output
//!
//! Provides consistent styling for bootstrap step outcomes.

use console::{Style, StyledObject};
use opsdesk_core::remote::StepOutcome;

/// Short label for a step outcome
pub fn outcome_label(outcome: &StepOutcome) -> &'static str {
    match outcome {
        StepOutcome::AlreadySatisfied => "ok",
        StepOutcome::Applied => "applied",
        StepOutcome::Failed(_) => "failed",
    }
}

/// Style a step outcome label
///
/// - ok -> dim
/// - applied -> green bold
/// - failed -> yellow (best-effort steps never abort)
pub fn outcome_style(outcome: &StepOutcome) -> StyledObject<&'static str> {
    let style = match outcome {
        StepOutcome::AlreadySatisfied => Style::new().dim(),
        StepOutcome::Applied => Style::new().green().bold(),
        StepOutcome::Failed(_) => Style::new().yellow(),
    };
    style.apply_to(outcome_label(outcome))
}
