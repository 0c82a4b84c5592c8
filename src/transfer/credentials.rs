//! Credential Verifier
//!
//! Compares a submitted TAC, Security Code or TIN with the value stored for
//! the user. Attempt counting belongs to the wizard.

use std::sync::Arc;

use crate::models::wizard_errors::WizardError;
use crate::transfer::adapters::{CredentialLookupError, CredentialStore};
use crate::transfer::types::{CredentialKind, UserId};

/// Length of TAC and Security Code values
pub const SHORT_CODE_LEN: usize = 6;
pub const TIN_MIN_LEN: usize = 8;
pub const TIN_MAX_LEN: usize = 15;

pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Returns `Ok(true)` on match, `Ok(false)` on a wrong guess.
    ///
    /// Malformed input is rejected before the lookup and is not a guess.
    pub async fn verify(
        &self,
        user_id: &UserId,
        kind: CredentialKind,
        submitted: &str,
    ) -> Result<bool, WizardError> {
        let submitted = normalize_submission(kind, submitted)?;

        let expected = self.store.fetch(user_id, kind).await.map_err(|e| {
            log::error!("Credential lookup failed for {} ({}): {}", user_id, kind, e);
            WizardError::LookupFailed {
                kind,
                reason: match e {
                    CredentialLookupError::NotFound => "no value on file".to_string(),
                    CredentialLookupError::Transport(msg) => msg,
                },
            }
        })?;

        Ok(submitted == normalize_stored(kind, &expected))
    }
}

/// Normalise user input and check its format
pub fn normalize_submission(kind: CredentialKind, raw: &str) -> Result<String, WizardError> {
    match kind {
        CredentialKind::Tac | CredentialKind::SecurityCode => {
            let value = raw.trim().to_uppercase();
            if value.chars().count() != SHORT_CODE_LEN || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(WizardError::InvalidField {
                    field: kind_field(kind),
                    reason: format!("please enter the complete {}-character code", SHORT_CODE_LEN),
                });
            }
            Ok(value)
        }
        CredentialKind::Tin => {
            let value = strip_tin(raw);
            if !(TIN_MIN_LEN..=TIN_MAX_LEN).contains(&value.len()) {
                return Err(WizardError::InvalidField {
                    field: "TIN",
                    reason: format!(
                        "must be between {} and {} characters",
                        TIN_MIN_LEN, TIN_MAX_LEN
                    ),
                });
            }
            Ok(value)
        }
    }
}

/// Stored values get the same normalisation, without the format check
fn normalize_stored(kind: CredentialKind, stored: &str) -> String {
    match kind {
        CredentialKind::Tac | CredentialKind::SecurityCode => stored.trim().to_uppercase(),
        CredentialKind::Tin => strip_tin(stored),
    }
}

fn strip_tin(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

fn kind_field(kind: CredentialKind) -> &'static str {
    match kind {
        CredentialKind::Tac => "TAC code",
        CredentialKind::SecurityCode => "security code",
        CredentialKind::Tin => "TIN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::adapters::InMemoryCredentialStore;

    fn setup() -> (CredentialVerifier, Arc<InMemoryCredentialStore>, UserId) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let user = UserId::new("u-1");
        store.set(&user, CredentialKind::Tac, "AB12CD");
        store.set(&user, CredentialKind::SecurityCode, "X9Y8Z7");
        store.set(&user, CredentialKind::Tin, "12-345-6789");
        (CredentialVerifier::new(store.clone()), store, user)
    }

    #[tokio::test]
    async fn test_tac_is_case_insensitive() {
        let (verifier, _, user) = setup();
        assert!(verifier.verify(&user, CredentialKind::Tac, "ab12cd").await.unwrap());
        assert!(verifier.verify(&user, CredentialKind::Tac, " AB12CD ").await.unwrap());
        assert!(!verifier.verify(&user, CredentialKind::Tac, "AB12CE").await.unwrap());
    }

    #[tokio::test]
    async fn test_security_code_match() {
        let (verifier, _, user) = setup();
        assert!(verifier.verify(&user, CredentialKind::SecurityCode, "x9y8z7").await.unwrap());
        assert!(!verifier.verify(&user, CredentialKind::SecurityCode, "000000").await.unwrap());
    }

    #[tokio::test]
    async fn test_tin_ignores_separators() {
        let (verifier, _, user) = setup();
        assert!(verifier.verify(&user, CredentialKind::Tin, "123456789").await.unwrap());
        assert!(verifier.verify(&user, CredentialKind::Tin, "123 456 789").await.unwrap());
        assert!(!verifier.verify(&user, CredentialKind::Tin, "987654321").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_input_is_validation_error() {
        let (verifier, _, user) = setup();

        let err = verifier.verify(&user, CredentialKind::Tac, "AB12").await.unwrap_err();
        assert!(err.is_validation());

        let err = verifier.verify(&user, CredentialKind::Tin, "1234567").await.unwrap_err();
        assert!(err.is_validation());

        let err = verifier
            .verify(&user, CredentialKind::Tin, "1234567890123456")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_hard_failure() {
        let (verifier, store, user) = setup();
        store.set_transport_error(Some("connection reset"));

        let err = verifier.verify(&user, CredentialKind::Tac, "AB12CD").await.unwrap_err();
        assert!(matches!(err, WizardError::LookupFailed { kind: CredentialKind::Tac, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_value_is_lookup_failure() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let verifier = CredentialVerifier::new(store);

        let err = verifier
            .verify(&UserId::new("nobody"), CredentialKind::Tac, "AB12CD")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "LOOKUP_FAILED");
    }

    #[test]
    fn test_normalize_tin() {
        assert_eq!(normalize_submission(CredentialKind::Tin, "ab-123-456").unwrap(), "AB123456");
    }
}
