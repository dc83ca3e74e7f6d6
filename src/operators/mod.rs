//! Operator onboarding — the three-step intake wizard.
//!
//! Staff fill in identity, licence/dependents and employment data across
//! three steps. Each step is validated before it is committed to the draft;
//! the committed draft is encoded as multipart and sent to the server as a
//! create or an update.

pub mod draft;
pub mod encoder;
pub mod gateway;
pub mod model;
pub mod validators;
pub mod wizard;

pub use draft::DraftStore;
pub use encoder::{MultipartPayload, PayloadPart, Platform, SubmissionEncoder};
pub use gateway::{HttpOperatorGateway, OperatorGateway};
pub use model::{ImageRef, Operator, OperatorDraft, OperatorPatch};
pub use validators::{FieldErrors, ValidationRules};
pub use wizard::{FormSurface, FormWizard, WizardStep};
