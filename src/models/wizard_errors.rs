// Error types for the transfer wizard
use rust_decimal::Decimal;
use std::fmt;

use crate::transfer::state::Stage;
use crate::transfer::types::CredentialKind;

#[derive(Debug, Clone, PartialEq)]
pub enum WizardError {
    // Validation errors (re-prompt, no attempt consumed)
    InvalidAmount(String),
    InsufficientBalance { available: Decimal, requested: Decimal },
    TransferLimitExceeded { limit: Decimal, requested: Decimal },
    InvalidField { field: &'static str, reason: String },

    // Session errors
    Unauthenticated,
    OutOfSequence { operation: &'static str, stage: Stage },

    // Credential errors
    CredentialMismatch { kind: CredentialKind, remaining: u32 },
    LockoutExceeded { kind: CredentialKind },
    LookupFailed { kind: CredentialKind, reason: String },

    // Passcode errors
    PasscodeNotFound,
    PasscodeExpired,
    PasscodeMismatch,

    // Remote collaborators
    CollaboratorUnavailable { collaborator: &'static str, reason: String },
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            Self::InsufficientBalance { available, requested } => {
                write!(f, "Insufficient funds: available {}, requested {}", available, requested)
            }
            Self::TransferLimitExceeded { limit, requested } => {
                write!(f, "Transfer amount {} exceeds limit of {}", requested, limit)
            }
            Self::InvalidField { field, reason } => write!(f, "Invalid {}: {}", field, reason),
            Self::Unauthenticated => write!(f, "Sign in required"),
            Self::OutOfSequence { operation, stage } => {
                write!(f, "Cannot {} while at stage {}", operation, stage)
            }
            Self::CredentialMismatch { kind, remaining } => {
                write!(f, "Incorrect {}. {} attempts remaining", kind.label(), remaining)
            }
            Self::LockoutExceeded { kind } => {
                write!(f, "Maximum {} attempts exceeded, please start again", kind.label())
            }
            Self::LookupFailed { kind, reason } => {
                write!(f, "Failed to validate {}: {}", kind.label(), reason)
            }
            Self::PasscodeNotFound => write!(f, "Transaction not found"),
            Self::PasscodeExpired => write!(f, "OTP has expired"),
            Self::PasscodeMismatch => write!(f, "Invalid OTP"),
            Self::CollaboratorUnavailable { collaborator, reason } => {
                write!(f, "{} unavailable: {}", collaborator, reason)
            }
        }
    }
}

impl std::error::Error for WizardError {}

impl WizardError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::TransferLimitExceeded { .. } => "TRANSFER_LIMIT_EXCEEDED",
            Self::InvalidField { .. } => "VALIDATION_ERROR",
            Self::Unauthenticated => "AUTH_REQUIRED",
            Self::OutOfSequence { .. } => "MISSING_TRANSFER_STATE",
            Self::CredentialMismatch { .. } => "CREDENTIAL_MISMATCH",
            Self::LockoutExceeded { .. } => "LOCKOUT_EXCEEDED",
            Self::LookupFailed { .. } => "LOOKUP_FAILED",
            Self::PasscodeNotFound => "PASSCODE_NOT_FOUND",
            Self::PasscodeExpired => "PASSCODE_EXPIRED",
            Self::PasscodeMismatch => "PASSCODE_MISMATCH",
            Self::CollaboratorUnavailable { .. } => "COLLABORATOR_UNAVAILABLE",
        }
    }

    /// Bad input caught before any remote call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InsufficientBalance { .. }
                | Self::TransferLimitExceeded { .. }
                | Self::InvalidField { .. }
        )
    }

    /// The user may repeat the same action
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LookupFailed { .. } | Self::CollaboratorUnavailable { .. }
        )
    }

    pub fn is_user_error(&self) -> bool {
        self.is_validation()
            || matches!(
                self,
                Self::CredentialMismatch { .. } | Self::PasscodeMismatch | Self::PasscodeExpired
            )
    }

    /// The wizard run is over and the user starts again from amount entry
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            Self::LockoutExceeded { .. } | Self::Unauthenticated | Self::OutOfSequence { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = WizardError::InsufficientBalance {
            available: Decimal::new(50_000, 2),
            requested: Decimal::new(60_000, 2),
        };
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
        assert!(err.is_validation());
        assert!(!err.is_retryable());
        assert!(err.is_user_error());

        let err2 = WizardError::CollaboratorUnavailable {
            collaborator: "ledger",
            reason: "timeout".to_string(),
        };
        assert_eq!(err2.error_code(), "COLLABORATOR_UNAVAILABLE");
        assert!(err2.is_retryable());
        assert!(!err2.is_user_error());
    }

    #[test]
    fn test_lockout_is_fatal() {
        let err = WizardError::LockoutExceeded { kind: CredentialKind::Tac };
        assert!(err.is_fatal_to_run());
        assert!(!err.is_retryable());

        let mismatch = WizardError::CredentialMismatch { kind: CredentialKind::Tac, remaining: 2 };
        assert!(!mismatch.is_fatal_to_run());
    }

    #[test]
    fn test_error_display() {
        let err = WizardError::CredentialMismatch {
            kind: CredentialKind::SecurityCode,
            remaining: 1,
        };
        assert_eq!(err.to_string(), "Incorrect security code. 1 attempts remaining");
        assert_eq!(WizardError::PasscodeExpired.to_string(), "OTP has expired");
    }
}
