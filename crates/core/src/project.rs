//! Project validation rules and the status transition table.
//!
//! The `core` crate contains no database dependencies; handlers call these
//! checks before anything reaches the repository layer.

use crate::error::CoreError;
use crate::status::ProjectStatus;
use crate::types::{Date, Money};

/// Lowest accepted progress value (percent).
pub const MIN_PROGRESS: i32 = 0;
/// Highest accepted progress value (percent).
pub const MAX_PROGRESS: i32 = 100;
/// Quality score range, inclusive.
pub const QUALITY_SCORE_RANGE: (i16, i16) = (1, 10);
/// Client satisfaction range, inclusive.
pub const SATISFACTION_RANGE: (i16, i16) = (1, 5);
/// Maximum length of a project name.
pub const MAX_NAME_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

/// Returns `true` when `start` strictly precedes `end`.
///
/// Equal dates are rejected: a project must span at least one day.
pub fn validate_project_dates(start: Date, end: Date) -> bool {
    start < end
}

/// [`validate_project_dates`] as a `Result`, for handler use. Either date
/// being absent imposes no constraint.
pub fn check_project_dates(start: Option<Date>, end: Option<Date>) -> Result<(), CoreError> {
    match (start, end) {
        (Some(start), Some(end)) if !validate_project_dates(start, end) => {
            Err(CoreError::Validation(format!(
                "Start date ({start}) must be before estimated end date ({end})"
            )))
        }
        _ => Ok(()),
    }
}

/// Validate that a project name is present and not overly long.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Project name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Project name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Progress must be a whole percentage.
pub fn validate_progress(progress: i32) -> Result<(), CoreError> {
    if !(MIN_PROGRESS..=MAX_PROGRESS).contains(&progress) {
        return Err(CoreError::Validation(format!(
            "Progress must be between {MIN_PROGRESS} and {MAX_PROGRESS}, got {progress}"
        )));
    }
    Ok(())
}

/// Budgets are strictly positive.
pub fn validate_budget(budget: Money) -> Result<(), CoreError> {
    if budget <= Money::ZERO {
        return Err(CoreError::Validation(
            "Budget must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Costs and revenues may be zero but never negative.
pub fn validate_amount(field: &str, amount: Money) -> Result<(), CoreError> {
    if amount < Money::ZERO {
        return Err(CoreError::Validation(format!(
            "{field} must not be negative"
        )));
    }
    Ok(())
}

pub fn validate_quality_score(score: i16) -> Result<(), CoreError> {
    validate_range("Quality score", score, QUALITY_SCORE_RANGE)
}

pub fn validate_client_satisfaction(score: i16) -> Result<(), CoreError> {
    validate_range("Client satisfaction", score, SATISFACTION_RANGE)
}

fn validate_range(field: &str, value: i16, (min, max): (i16, i16)) -> Result<(), CoreError> {
    if value < min || value > max {
        return Err(CoreError::Validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Statuses reachable from `from` in one step.
///
/// ```text
/// planning -> approved -> in_progress <-> on_hold
///                         in_progress -> completed
/// any non-terminal -> cancelled
/// ```
pub fn allowed_transitions(from: ProjectStatus) -> &'static [ProjectStatus] {
    use ProjectStatus::*;
    match from {
        Planning => &[Approved, Cancelled],
        Approved => &[InProgress, Cancelled],
        InProgress => &[OnHold, Completed, Cancelled],
        OnHold => &[InProgress, Cancelled],
        Completed | Cancelled => &[],
    }
}

/// Whether `from -> to` follows the lifecycle. Re-setting the current
/// status is always accepted.
pub fn can_transition(from: ProjectStatus, to: ProjectStatus) -> bool {
    from == to || allowed_transitions(from).contains(&to)
}

/// Reject a status change that skips or reverses the lifecycle.
pub fn check_transition(from: ProjectStatus, to: ProjectStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Cannot change project status from '{from}' to '{to}'"
        )))
    }
}
