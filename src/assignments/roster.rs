//! Roster session — one order's pending assignments and their submission.
//!
//! Idle → Submitting → {Cleared | RetryPending | Unchanged}, back to Idle
//! on the next edit. A failed or partial batch may be resubmitted directly.
//! A submission whose future is dropped before the response arrives leaves
//! the list untouched and falls back to Idle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::draft_list::AssignmentDraftList;
use super::model::{Assignment, BatchResult};
use super::reconciler::{RosterOutcome, outcome, reconcile, summarize};
use super::submitter::AssignmentBatchSubmitter;
use crate::error::AssignmentError;
use crate::session::{InFlight, Liveness};

/// State of the roster screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterState {
    #[default]
    Idle,
    Submitting,
    Cleared,
    RetryPending,
    Unchanged,
}

impl RosterState {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: RosterState) -> bool {
        use RosterState::*;
        matches!(
            (self, target),
            (Idle, Submitting)
                | (Submitting, Cleared)
                | (Submitting, RetryPending)
                | (Submitting, Unchanged)
                | (Submitting, Idle)
                | (Cleared, Idle)
                | (RetryPending, Idle)
                | (Unchanged, Idle)
                | (RetryPending, Submitting)
                | (Unchanged, Submitting)
        )
    }
}

impl From<RosterOutcome> for RosterState {
    fn from(o: RosterOutcome) -> Self {
        match o {
            RosterOutcome::Cleared => Self::Cleared,
            RosterOutcome::RetryPending => Self::RetryPending,
            RosterOutcome::Unchanged => Self::Unchanged,
        }
    }
}

impl std::fmt::Display for RosterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Cleared => "cleared",
            Self::RetryPending => "retry_pending",
            Self::Unchanged => "unchanged",
        };
        write!(f, "{s}")
    }
}

/// What one submission did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub result: BatchResult,
    pub outcome: RosterOutcome,
    /// Message for staff.
    pub summary: String,
    /// Assignments still pending after reconciliation.
    pub remaining: Vec<Assignment>,
}

struct RosterInner {
    list: AssignmentDraftList,
    state: RosterState,
}

impl RosterInner {
    fn transition(&mut self, target: RosterState) {
        if !self.state.can_transition_to(target) {
            warn!(from = %self.state, to = %target, "Unexpected roster transition");
        }
        self.state = target;
    }

    /// Only valid while the caller knows no submission holds the flag.
    fn recover_abandoned(&mut self) {
        if self.state == RosterState::Submitting {
            warn!(order_id = self.list.order_id(), "Previous submission was abandoned; roster unchanged");
            self.transition(RosterState::Idle);
        }
    }
}

/// Owns one order's pending roster and submits it as a batch.
pub struct RosterSession {
    inner: RwLock<RosterInner>,
    submitter: Arc<dyn AssignmentBatchSubmitter>,
    liveness: Liveness,
    in_flight: InFlight,
}

impl RosterSession {
    pub fn new(order_id: i64, submitter: Arc<dyn AssignmentBatchSubmitter>) -> Self {
        Self {
            inner: RwLock::new(RosterInner {
                list: AssignmentDraftList::new(order_id),
                state: RosterState::Idle,
            }),
            submitter,
            liveness: Liveness::new(),
            in_flight: InFlight::new(),
        }
    }

    /// Handle the host screen closes when it is torn down.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub async fn state(&self) -> RosterState {
        let state = self.inner.read().await.state;
        if state == RosterState::Submitting && !self.in_flight.is_busy() {
            return RosterState::Idle;
        }
        state
    }

    pub async fn pending(&self) -> Vec<Assignment> {
        self.inner.read().await.list.as_slice().to_vec()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Edit the pending list. Not allowed while a batch is in flight.
    pub async fn edit<F, R>(&self, f: F) -> Result<R, AssignmentError>
    where
        F: FnOnce(&mut AssignmentDraftList) -> Result<R, AssignmentError>,
    {
        let mut inner = self.inner.write().await;
        if self.in_flight.is_busy() {
            return Err(AssignmentError::AlreadySubmitting);
        }
        inner.recover_abandoned();
        let out = f(&mut inner.list)?;
        if inner.state != RosterState::Idle {
            inner.transition(RosterState::Idle);
        }
        Ok(out)
    }

    pub async fn add(&self, assignment: Assignment) -> Result<(), AssignmentError> {
        self.edit(|list| list.add(assignment)).await
    }

    pub async fn remove(&self, operator_id: i64) -> Result<Assignment, AssignmentError> {
        self.edit(|list| {
            list.remove(operator_id)
                .ok_or(AssignmentError::UnknownOperator { operator_id })
        })
        .await
    }

    /// Submit every pending assignment and reconcile the list with the result.
    pub async fn submit(&self) -> Result<SubmitReport, AssignmentError> {
        if !self.liveness.is_alive() {
            return Err(AssignmentError::SessionClosed);
        }
        let _guard = self
            .in_flight
            .try_begin()
            .ok_or(AssignmentError::AlreadySubmitting)?;

        let (batch, order_id) = {
            let mut inner = self.inner.write().await;
            // We hold the flag, so a stored Submitting is left over from a dropped future.
            inner.recover_abandoned();
            if inner.list.is_empty() {
                return Err(AssignmentError::EmptyBatch);
            }
            inner.transition(RosterState::Submitting);
            (inner.list.as_slice().to_vec(), inner.list.order_id())
        };
        info!(order_id, size = batch.len(), "Submitting assignment batch");

        let result = self.submitter.submit(&batch).await;

        if !self.liveness.is_alive() {
            warn!(order_id, outcome = result.kind(), "Batch response arrived after the roster closed; discarding");
            return Err(AssignmentError::SessionClosed);
        }

        let remaining = reconcile(&batch, &result);
        let roster_outcome = outcome(&result, &remaining);
        let summary = summarize(&result, &batch);

        {
            let mut inner = self.inner.write().await;
            inner.list.replace(remaining.clone());
            inner.transition(roster_outcome.into());
        }

        match &result {
            BatchResult::PartialSuccess { conflicts, .. } => {
                warn!(order_id, conflicts = conflicts.len(), "Assignment batch had conflicts");
            }
            BatchResult::ValidationFailure { errors, .. } => {
                warn!(order_id, errors = errors.len(), "Assignment batch rejected");
            }
            BatchResult::Fatal { cause } => {
                warn!(order_id, %cause, "Assignment batch failed");
            }
            BatchResult::Success => {
                info!(order_id, "Assignment batch saved");
            }
        }

        Ok(SubmitReport {
            result,
            outcome: roster_outcome,
            summary,
            remaining,
        })
    }
}
