//! Transfer Wizard State Machine
//!
//! Defines the wizard stages, events, and transition function.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transfer::types::CredentialKind;

/// Wizard stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Amount and recipient entry
    AmountEntry,
    /// Review before authorization
    Confirm,
    /// Transaction Authorization Code
    Tac,
    SecurityCode,
    /// Tax Identification Number
    Tin,
    /// One-time passcode sent by email
    Passcode,
    /// Settled, balance debited ✅
    Completed,
    /// Recorded, awaiting manual approval ⏳
    Pending,
    /// Passcode consumed but settlement could not be written ❌
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AmountEntry => "amount_entry",
            Stage::Confirm => "confirm",
            Stage::Tac => "tac",
            Stage::SecurityCode => "security_code",
            Stage::Tin => "tin",
            Stage::Passcode => "passcode",
            Stage::Completed => "completed",
            Stage::Pending => "pending",
            Stage::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "amount_entry" => Some(Stage::AmountEntry),
            "confirm" => Some(Stage::Confirm),
            "tac" => Some(Stage::Tac),
            "security_code" => Some(Stage::SecurityCode),
            "tin" => Some(Stage::Tin),
            "passcode" => Some(Stage::Passcode),
            "completed" => Some(Stage::Completed),
            "pending" => Some(Stage::Pending),
            "failed" => Some(Stage::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal stage (only restart leaves it)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Pending | Stage::Failed)
    }

    /// Credential checked at this stage, if any
    pub fn credential_kind(&self) -> Option<CredentialKind> {
        match self {
            Stage::Tac => Some(CredentialKind::Tac),
            Stage::SecurityCode => Some(CredentialKind::SecurityCode),
            Stage::Tin => Some(CredentialKind::Tin),
            _ => None,
        }
    }

    /// Stages that can only be reached with an in-flight transfer
    pub fn requires_transfer(&self) -> bool {
        !matches!(self, Stage::AmountEntry)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wizard events (inputs that trigger stage transitions)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    /// Amount and details passed validation
    AmountAccepted,
    /// Policy read #1 selected the long chain
    FullChainRequired,
    /// Policy read #1 (or a capability) selected the short chain
    ChainSkipped,
    /// The current credential matched
    CredentialAccepted,
    /// Third mismatch on a credential stage
    CredentialLockout,
    /// Passcode verified, policy read #2 chose immediate settlement
    SettledImmediately,
    /// Passcode verified, policy read #2 chose pending settlement
    SettledPending,
    /// Passcode consumed but the ledger write failed
    SettlementFailed,
    /// Cancel, restart or missing navigation state
    Abandoned,
}

/// Stage transition function
///
/// Given the current stage and an event, returns the next stage.
/// Invalid transitions return `None`.
pub fn transition(current: Stage, event: WizardEvent) -> Option<Stage> {
    use Stage::*;
    use WizardEvent::*;

    let next = match (current, event) {
        (AmountEntry, AmountAccepted) => Confirm,

        // Policy read #1
        (Confirm, FullChainRequired) => Tac,
        (Confirm, ChainSkipped) => Passcode,

        // Long chain
        (Tac, CredentialAccepted) => SecurityCode,
        (SecurityCode, CredentialAccepted) => Tin,
        (Tin, CredentialAccepted) => Passcode,
        (Tac | SecurityCode | Tin, CredentialLockout) => AmountEntry,

        // Policy read #2
        (Passcode, SettledImmediately) => Completed,
        (Passcode, SettledPending) => Pending,
        (Passcode, SettlementFailed) => Failed,

        (_, Abandoned) => AmountEntry,

        _ => return None,
    };

    Some(next)
}
