//! Collaborator traits
//!
//! Narrow contracts the wizard uses to reach the managed backend. Every call is
//! a blocking, fallible remote operation; none of them retries on its own.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt;

use crate::models::transfer_types::{TransactionRecord, TransferSummary};
use crate::transfer::types::{AuthorizationKey, CredentialKind, PendingAuthorization, Session, UserId};

/// Identity/session collaborator
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current signed-in session, or `None` when the user must authenticate
    async fn current_session(&self) -> Result<Option<Session>>;
}

/// Why a stored credential could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialLookupError {
    /// Profile exists but has no value for this credential
    NotFound,
    /// Network or storage failure
    Transport(String),
}

impl fmt::Display for CredentialLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "credential not found"),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for CredentialLookupError {}

/// Credential store collaborator (TAC / Security Code / TIN per user)
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn fetch(
        &self,
        user_id: &UserId,
        kind: CredentialKind,
    ) -> std::result::Result<String, CredentialLookupError>;
}

/// Passcode persistence collaborator
///
/// One live record per key; `save` overwrites whatever was there.
#[async_trait]
pub trait PasscodeStore: Send + Sync {
    /// Create or replace the record for `auth.key`
    async fn save(&self, auth: PendingAuthorization) -> Result<()>;

    /// Most recent record for the key
    async fn latest(&self, key: &AuthorizationKey) -> Result<Option<PendingAuthorization>>;

    /// Conditional update: mark consumed IF the record exists, is unconsumed
    /// and holds `code`. Returns whether this call won.
    async fn consume_if(&self, key: &AuthorizationKey, code: &str) -> Result<bool>;

    async fn delete(&self, key: &AuthorizationKey) -> Result<()>;
}

/// Email dispatch collaborator. No delivery confirmation.
#[async_trait]
pub trait PasscodeDispatcher: Send + Sync {
    async fn send(&self, address: &str, code: &str, summary: &TransferSummary) -> Result<()>;

    /// Dispatcher name for logging
    fn name(&self) -> &str;
}

/// Outcome policy collaborator: the per-user force-success flag
#[async_trait]
pub trait OutcomePolicySource: Send + Sync {
    async fn force_success(&self, user_id: &UserId) -> Result<Option<bool>>;
}

/// Ledger collaborator
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn balance(&self, user_id: &UserId) -> Result<Decimal>;

    /// Apply a signed delta to the displayed balance, returning the new balance
    async fn adjust_balance(&self, user_id: &UserId, delta: Decimal) -> Result<Decimal>;

    async fn append(&self, user_id: &UserId, record: TransactionRecord) -> Result<()>;
}
