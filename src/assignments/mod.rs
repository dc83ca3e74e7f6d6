//! Order staffing — building a roster of operator assignments and
//! submitting it as one batch.
//!
//! The server may accept all, some or none of a batch. Whatever it did not
//! accept stays in the pending list so it can be corrected and resubmitted;
//! whatever it accepted is never sent again.

pub mod draft_list;
pub mod model;
pub mod reconciler;
pub mod roster;
pub mod submitter;

pub use draft_list::AssignmentDraftList;
pub use model::{Assignment, BatchResult, Conflict, ItemError, ItemRef, Role};
pub use reconciler::{RosterOutcome, reconcile, summarize};
pub use roster::{RosterSession, RosterState, SubmitReport};
pub use submitter::{AssignmentBatchSubmitter, HttpBatchSubmitter};
