//! Transfer module - main module file
//!
//! This module provides the staged transfer wizard: the stage machine, the
//! credential and passcode verifiers, the outcome policy resolver and the
//! collaborator adapters they run against.

pub mod state;
pub mod types;
pub mod clock;
pub mod validator;
pub mod credentials;
pub mod passcode;
pub mod countdown;
pub mod policy;
pub mod coordinator;
pub mod adapters;

// Re-export commonly used types
pub use state::{transition, Stage, WizardEvent};
pub use types::{
    AttemptOutcome, AuthorizationKey, Capability, CredentialKind, PendingAuthorization, Session, UserId,
    VerificationAttempt, VerificationKind,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::CredentialVerifier;
pub use passcode::{IssuedPasscode, PasscodeService};
pub use countdown::Countdown;
pub use policy::{OutcomePolicy, OutcomePolicyResolver, SettlementMode};
pub use coordinator::{Collaborators, TransferWizard, WizardConfig, WizardState};
