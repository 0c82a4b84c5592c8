//! Passcode Issuer/Verifier
//!
//! Issues 6-digit one-time passcodes bound to (user, recipient, amount),
//! dispatches them by email and verifies them against the stored record.

use chrono::Duration as ChronoDuration;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::models::transfer_types::TransferRequest;
use crate::models::wizard_errors::WizardError;
use crate::transfer::adapters::{PasscodeDispatcher, PasscodeStore};
use crate::transfer::clock::Clock;
use crate::transfer::types::{AuthorizationKey, PendingAuthorization, Session};

pub const PASSCODE_LEN: usize = 6;
pub const DEFAULT_PASSCODE_TTL: Duration = Duration::from_secs(180);

/// Generate a 6-digit code in 100000..=999999
pub fn generate_passcode() -> String {
    rand::rng().random_range(100_000..1_000_000u32).to_string()
}

/// Passcode input must be exactly 6 ASCII digits
pub fn validate_passcode_format(submitted: &str) -> Result<(), WizardError> {
    if submitted.len() != PASSCODE_LEN || !submitted.chars().all(|c| c.is_ascii_digit()) {
        return Err(WizardError::InvalidField {
            field: "OTP",
            reason: "must be exactly 6 digits".to_string(),
        });
    }
    Ok(())
}

/// Issue result; the code itself only travels through the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedPasscode {
    pub key: AuthorizationKey,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

pub struct PasscodeService {
    store: Arc<dyn PasscodeStore>,
    dispatcher: Arc<dyn PasscodeDispatcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PasscodeService {
    pub fn new(
        store: Arc<dyn PasscodeStore>,
        dispatcher: Arc<dyn PasscodeDispatcher>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate, dispatch and persist a passcode.
    ///
    /// Dispatch happens first; if it fails nothing is persisted and no code is live.
    /// Any previous record for the same key is overwritten.
    pub async fn issue(
        &self,
        session: &Session,
        transfer: &Arc<TransferRequest>,
    ) -> Result<IssuedPasscode, WizardError> {
        let key = AuthorizationKey::for_request(&session.user_id, transfer);
        let code = generate_passcode();
        let issued_at = self.clock.now();
        let ttl = ChronoDuration::from_std(self.ttl).unwrap_or_else(|_| ChronoDuration::seconds(180));
        let expires_at = issued_at + ttl;

        self.dispatcher
            .send(&session.email, &code, &transfer.summary())
            .await
            .map_err(|e| {
                log::error!("Passcode dispatch via {} failed for {}: {}", self.dispatcher.name(), key, e);
                WizardError::CollaboratorUnavailable {
                    collaborator: "email",
                    reason: e.to_string(),
                }
            })?;

        self.store
            .save(PendingAuthorization {
                key: key.clone(),
                code,
                issued_at,
                expires_at,
                transfer: Arc::clone(transfer),
                consumed: false,
            })
            .await
            .map_err(|e| WizardError::CollaboratorUnavailable {
                collaborator: "passcode store",
                reason: e.to_string(),
            })?;

        crate::log_passcode_issued!(key.to_string(), expires_at.timestamp_millis());

        Ok(IssuedPasscode { key, expires_at })
    }

    /// Same as issue: the new code replaces the old one immediately
    pub async fn resend(
        &self,
        session: &Session,
        transfer: &Arc<TransferRequest>,
    ) -> Result<IssuedPasscode, WizardError> {
        self.issue(session, transfer).await
    }

    /// Verify and consume the code for `key`.
    ///
    /// Exactly one caller can succeed for a given issued code.
    pub async fn verify(
        &self,
        key: &AuthorizationKey,
        submitted: &str,
    ) -> Result<PendingAuthorization, WizardError> {
        validate_passcode_format(submitted)?;

        let record = self
            .store
            .latest(key)
            .await
            .map_err(|e| WizardError::CollaboratorUnavailable {
                collaborator: "passcode store",
                reason: e.to_string(),
            })?
            .filter(|r| !r.consumed)
            .ok_or(WizardError::PasscodeNotFound)?;

        if record.is_expired_at(self.clock.now()) {
            return Err(WizardError::PasscodeExpired);
        }

        if record.code != submitted {
            return Err(WizardError::PasscodeMismatch);
        }

        // Conditional consume: a concurrent double-submit loses here
        let won = self
            .store
            .consume_if(key, submitted)
            .await
            .map_err(|e| WizardError::CollaboratorUnavailable {
                collaborator: "passcode store",
                reason: e.to_string(),
            })?;
        if !won {
            return Err(WizardError::PasscodeNotFound);
        }

        Ok(PendingAuthorization {
            consumed: true,
            ..record
        })
    }

    /// Remove a consumed record once the transfer has settled
    pub async fn discard(&self, key: &AuthorizationKey) {
        if let Err(e) = self.store.delete(key).await {
            log::warn!("Failed to delete pending authorization {}: {}", key, e);
        }
    }
}
