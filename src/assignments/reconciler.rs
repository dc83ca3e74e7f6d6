//! Conflict reconciliation — what is left to retry after a batch response.

use std::collections::HashSet;

use super::model::{Assignment, BatchResult, ItemRef};

/// What a reconciliation did to the pending list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterOutcome {
    /// Everything persisted; nothing pending.
    Cleared,
    /// Only conflicting assignments remain.
    RetryPending,
    /// Nothing persisted; the list is as it was.
    Unchanged,
}

/// Pending assignments after `result`.
///
/// `Success` leaves nothing. `PartialSuccess` keeps exactly the entries whose
/// operator is named in a conflict, so created assignments are never sent
/// again. `ValidationFailure` and `Fatal` return `current` untouched.
pub fn reconcile(current: &[Assignment], result: &BatchResult) -> Vec<Assignment> {
    match result {
        BatchResult::Success => Vec::new(),
        BatchResult::PartialSuccess { conflicts, .. } => {
            let conflicted: HashSet<i64> = conflicts.iter().map(|c| c.operator_id).collect();
            current
                .iter()
                .filter(|a| conflicted.contains(&a.operator_id))
                .cloned()
                .collect()
        }
        BatchResult::ValidationFailure { .. } | BatchResult::Fatal { .. } => current.to_vec(),
    }
}

/// Classify a reconciliation for the roster state machine.
pub fn outcome(result: &BatchResult, remaining: &[Assignment]) -> RosterOutcome {
    match result {
        BatchResult::Success => RosterOutcome::Cleared,
        BatchResult::PartialSuccess { .. } if remaining.is_empty() => RosterOutcome::Cleared,
        BatchResult::PartialSuccess { .. } => RosterOutcome::RetryPending,
        BatchResult::ValidationFailure { .. } | BatchResult::Fatal { .. } => {
            RosterOutcome::Unchanged
        }
    }
}

/// Message shown to staff after a submission.
///
/// `batch` is the list that was submitted, used to name the operator behind
/// an index-based validation error.
pub fn summarize(result: &BatchResult, batch: &[Assignment]) -> String {
    match result {
        BatchResult::Success => format!("{} assignment(s) saved.", batch.len()),
        BatchResult::PartialSuccess {
            created,
            conflicts,
            message,
        } => {
            let mut lines = vec![message.clone().unwrap_or_else(|| {
                format!(
                    "{} assignment(s) saved, {} could not be assigned.",
                    created.len(),
                    conflicts.len()
                )
            })];
            lines.extend(
                conflicts
                    .iter()
                    .map(|c| format!("• Operator {}: {}", c.operator_id, c.message)),
            );
            lines.join("\n")
        }
        BatchResult::ValidationFailure { errors, message } => {
            let mut lines = vec![
                message
                    .clone()
                    .unwrap_or_else(|| "The assignments were rejected.".to_string()),
            ];
            lines.extend(errors.iter().map(|e| match e.item {
                ItemRef::Operator(id) => format!("• Operator {id}: {}", e.message),
                ItemRef::Index(i) => match batch.get(i) {
                    Some(a) => format!("• Operator {}: {}", a.operator_id, e.message),
                    None => format!("• Item {}: {}", i.saturating_add(1), e.message),
                },
                ItemRef::Unknown => format!("• {}", e.message),
            }));
            lines.join("\n")
        }
        BatchResult::Fatal { .. } => {
            "The assignments could not be saved. Please try again.".to_string()
        }
    }
}
