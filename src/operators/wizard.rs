//! Operator intake wizard — three validated steps, then submit.
//!
//! Step screens edit the form draft through [`FormSurface`]. Nothing reaches
//! the [`DraftStore`] until `next()`/`submit()` has validated the current
//! step; `back()` never validates and never discards what was typed.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::draft::DraftStore;
use super::encoder::SubmissionEncoder;
use super::gateway::OperatorGateway;
use super::model::{Operator, OperatorDraft, OperatorPatch};
use super::validators::{
    FieldErrors, ValidationRules, validate_dependents, validate_employment, validate_identity,
};
use crate::error::WizardError;
use crate::session::{Clock, InFlight, Liveness, SystemClock};

/// Wizard position.
///
/// Progresses linearly: Step1 → Step2 → Step3 → Submitted. Backward moves
/// are allowed between the three form steps only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Step1,
    Step2,
    Step3,
    Submitted,
}

impl WizardStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Step1, Step2)
                | (Step2, Step3)
                | (Step3, Submitted)
                | (Step2, Step1)
                | (Step3, Step2)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Next form step. Step 3 leaves only through `submit()`.
    pub fn next(&self) -> Option<WizardStep> {
        match self {
            Self::Step1 => Some(Self::Step2),
            Self::Step2 => Some(Self::Step3),
            Self::Step3 | Self::Submitted => None,
        }
    }

    pub fn previous(&self) -> Option<WizardStep> {
        match self {
            Self::Step2 => Some(Self::Step1),
            Self::Step3 => Some(Self::Step2),
            Self::Step1 | Self::Submitted => None,
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Step1 => "step1",
            Self::Step2 => "step2",
            Self::Step3 => "step3",
            Self::Submitted => "submitted",
        };
        write!(f, "{s}")
    }
}

/// The seam between the wizard and its step screens.
///
/// Step screens only see the current form data, can patch it, and know
/// whether they are editing an existing operator. Navigation goes through
/// the wizard's `next`/`back`/`submit`.
pub trait FormSurface {
    fn form_data(&self) -> &OperatorDraft;
    fn update_form_data(&mut self, patch: OperatorPatch);
    fn is_editing(&self) -> bool;
}

/// Drives one operator create or edit session.
pub struct FormWizard {
    step: WizardStep,
    form: OperatorDraft,
    store: DraftStore,
    errors: FieldErrors,
    rules: ValidationRules,
    encoder: SubmissionEncoder,
    gateway: Arc<dyn OperatorGateway>,
    clock: Arc<dyn Clock>,
    liveness: Liveness,
    in_flight: InFlight,
}

impl FormWizard {
    /// Start a session that creates a new operator.
    pub fn new(
        gateway: Arc<dyn OperatorGateway>,
        rules: ValidationRules,
        encoder: SubmissionEncoder,
    ) -> Self {
        Self::with_draft(OperatorDraft::default(), gateway, rules, encoder)
    }

    /// Start a session that edits an existing operator.
    pub fn edit(
        operator: &Operator,
        gateway: Arc<dyn OperatorGateway>,
        rules: ValidationRules,
        encoder: SubmissionEncoder,
    ) -> Self {
        Self::with_draft(OperatorDraft::from_operator(operator), gateway, rules, encoder)
    }

    fn with_draft(
        draft: OperatorDraft,
        gateway: Arc<dyn OperatorGateway>,
        rules: ValidationRules,
        encoder: SubmissionEncoder,
    ) -> Self {
        Self {
            step: WizardStep::Step1,
            store: DraftStore::new(draft.clone()),
            form: draft,
            errors: FieldErrors::new(),
            rules,
            encoder,
            gateway,
            clock: Arc::new(SystemClock),
            liveness: Liveness::new(),
            in_flight: InFlight::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Field errors from the last failed `next()`/`submit()`.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// The committed draft.
    pub fn committed(&self) -> &OperatorDraft {
        self.store.draft()
    }

    pub fn is_submit_ready(&self) -> bool {
        self.store.is_submit_ready()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Loading flag a host can poll while `submit` borrows the wizard.
    pub fn loading_flag(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Handle the host screen closes when it is torn down.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Run the current step's validators against the form data.
    pub fn validate_current(&self) -> FieldErrors {
        let year = self.clock.current_year();
        match self.step {
            WizardStep::Step1 => validate_identity(&self.form.identity, &self.rules, year),
            WizardStep::Step2 => validate_dependents(&self.form.dependents, year),
            WizardStep::Step3 => validate_employment(&self.form.employment, &self.rules),
            WizardStep::Submitted => FieldErrors::new(),
        }
    }

    /// Validate the current step, commit it, and move forward.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let target = self.step.next().ok_or(WizardError::InvalidTransition {
            step: self.step,
            direction: "forward".into(),
        })?;

        self.check_current()?;
        self.commit_current();
        self.transition(target);
        Ok(target)
    }

    /// Move back one step without validating.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let target = self.step.previous().ok_or(WizardError::InvalidTransition {
            step: self.step,
            direction: "back".into(),
        })?;
        self.errors.clear();
        self.transition(target);
        Ok(target)
    }

    /// Validate step 3, encode the committed draft and send it.
    ///
    /// On success the wizard becomes `Submitted` and gives up the draft. On
    /// failure it stays on step 3 with the server message.
    pub async fn submit(&mut self) -> Result<Operator, WizardError> {
        if self.step != WizardStep::Step3 {
            return Err(WizardError::NotOnFinalStep { step: self.step });
        }
        if !self.liveness.is_alive() {
            return Err(WizardError::SessionClosed);
        }
        // `&mut self` already rules out a second submit; the flag is for observers.
        let _guard = self.in_flight.begin();

        self.check_current()?;
        self.commit_current();
        if !self.store.is_submit_ready() {
            return Err(WizardError::Incomplete);
        }

        let payload = self.encoder.encode(self.store.draft(), Utc::now())?;
        let editing = self.store.draft().editing_id();
        info!(editing = ?editing, parts = payload.parts.len(), "Submitting operator");

        let result = match editing {
            Some(id) => self.gateway.update(id, payload).await,
            None => self.gateway.create(payload).await,
        };

        if !self.liveness.is_alive() {
            warn!("Operator response arrived after the wizard closed; discarding");
            return Err(WizardError::SessionClosed);
        }

        match result {
            Ok(operator) => {
                self.transition(WizardStep::Submitted);
                self.store.take();
                self.form = OperatorDraft::default();
                self.errors.clear();
                Ok(operator)
            }
            Err(e) => {
                warn!(error = %e, "Operator submission failed");
                Err(WizardError::Gateway(e.to_string()))
            }
        }
    }

    fn check_current(&mut self) -> Result<(), WizardError> {
        let errors = self.validate_current();
        if errors.is_empty() {
            self.errors.clear();
            return Ok(());
        }
        debug!(step = %self.step, fields = ?errors.keys().collect::<Vec<_>>(), "Step invalid");
        self.errors = errors.clone();
        Err(WizardError::Invalid {
            step: self.step,
            errors,
        })
    }

    fn commit_current(&mut self) {
        match self.step {
            WizardStep::Step1 => self.store.commit_identity(self.form.identity.clone()),
            WizardStep::Step2 => {
                self.store.commit_dependents(self.form.dependents.clone());
                self.form.dependents = self.store.draft().dependents.clone();
            }
            WizardStep::Step3 => {
                self.store.commit_employment(self.form.employment.clone());
                self.form.employment = self.store.draft().employment.clone();
            }
            WizardStep::Submitted => {}
        }
    }

    fn transition(&mut self, target: WizardStep) {
        debug_assert!(self.step.can_transition_to(target));
        info!(from = %self.step, to = %target, "Wizard transition");
        self.step = target;
    }
}

impl FormSurface for FormWizard {
    fn form_data(&self) -> &OperatorDraft {
        &self.form
    }

    fn update_form_data(&mut self, patch: OperatorPatch) {
        if self.step.is_terminal() {
            debug!("Ignoring form update on a submitted wizard");
            return;
        }
        patch.apply(&mut self.form);
    }

    fn is_editing(&self) -> bool {
        self.form.editing_id().is_some()
    }
}
