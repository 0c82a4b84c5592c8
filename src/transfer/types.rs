//! Core types for the transfer wizard
//!
//! Identifiers, session capabilities, authorization records and attempt counters
//! shared by the services and the controller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::models::transfer_types::TransferRequest;

/// Identifier handed out by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secret credentials checked by the long authorization chain
///
/// Uses strum for String conversion:
/// - `kind.as_ref()` -> "tac"
/// - `"tin".parse::<CredentialKind>()` -> Ok(CredentialKind::Tin)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CredentialKind {
    Tac,
    SecurityCode,
    Tin,
}

impl CredentialKind {
    /// Human label for notifications
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tac => "TAC code",
            Self::SecurityCode => "security code",
            Self::Tin => "TIN",
        }
    }
}

/// What a [`VerificationAttempt`] is guarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationKind {
    Credential(CredentialKind),
    Passcode,
}

/// Result of recording a failed guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Retry { remaining: u32 },
    LockedOut,
}

/// Attempt counter for the active stage; created on stage entry, dropped on exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationAttempt {
    kind: VerificationKind,
    failures: u32,
    /// `None` for passcodes, which are gated by expiry and resend instead
    max_failures: Option<u32>,
}

impl VerificationAttempt {
    pub fn credential(kind: CredentialKind, max_failures: u32) -> Self {
        Self {
            kind: VerificationKind::Credential(kind),
            failures: 0,
            max_failures: Some(max_failures),
        }
    }

    pub fn passcode() -> Self {
        Self {
            kind: VerificationKind::Passcode,
            failures: 0,
            max_failures: None,
        }
    }

    pub fn kind(&self) -> VerificationKind {
        self.kind
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn record_failure(&mut self) -> AttemptOutcome {
        self.failures += 1;
        match self.max_failures {
            Some(max) if self.failures >= max => AttemptOutcome::LockedOut,
            Some(max) => AttemptOutcome::Retry { remaining: max - self.failures },
            None => AttemptOutcome::Retry { remaining: u32::MAX },
        }
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

/// Capabilities granted to a session by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Administrator,
    /// Always take the short chain regardless of the outcome policy
    SkipAuthorizationChain,
}

/// Signed-in user as seen by the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub capabilities: HashSet<Capability>,
}

impl Session {
    pub fn customer(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            capabilities: HashSet::new(),
        }
    }

    pub fn administrator(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            capabilities: [Capability::Administrator, Capability::SkipAuthorizationChain]
                .into_iter()
                .collect(),
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Key of a pending authorization: (user, recipient, amount)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationKey {
    pub user_id: UserId,
    pub recipient: String,
    pub amount: Decimal,
}

impl AuthorizationKey {
    pub fn for_request(user_id: &UserId, request: &TransferRequest) -> Self {
        Self {
            user_id: user_id.clone(),
            recipient: request.recipient.clone(),
            amount: request.amount.normalize(),
        }
    }
}

impl fmt::Display for AuthorizationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.user_id, self.recipient, self.amount)
    }
}

/// Server-side record holding the live passcode for a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub key: AuthorizationKey,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub transfer: Arc<TransferRequest>,
    /// Set once the code has been verified; a consumed code never verifies again
    pub consumed: bool,
}

impl PendingAuthorization {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
