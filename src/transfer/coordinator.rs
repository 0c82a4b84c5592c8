//! Transfer Wizard Controller
//!
//! Owns the ordered stage sequence, carries the transfer payload between stages
//! and calls the verifiers, the policy resolver and the ledger at the right
//! points. Balance and ledger writes happen only on the terminal transition.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use crate::models::transfer_types::{TransactionRecord, TransactionStatus, TransferReceipt, TransferRequest};
use crate::models::wizard_errors::WizardError;
use crate::transfer::adapters::{
    CredentialStore, IdentityProvider, Ledger, OutcomePolicySource, PasscodeDispatcher, PasscodeStore,
};
use crate::transfer::clock::Clock;
use crate::transfer::countdown::Countdown;
use crate::transfer::credentials::CredentialVerifier;
use crate::transfer::passcode::{PasscodeService, DEFAULT_PASSCODE_TTL};
use crate::transfer::policy::{OutcomePolicy, OutcomePolicyResolver, SettlementMode};
use crate::transfer::state::{transition, Stage, WizardEvent};
use crate::transfer::types::{
    AttemptOutcome, AuthorizationKey, Capability, CredentialKind, PendingAuthorization, Session, UserId,
    VerificationAttempt,
};
use crate::transfer::validator::validate_transfer_request;

/// Wizard tunables
#[derive(Debug, Clone, PartialEq)]
pub struct WizardConfig {
    /// Per-transfer ceiling
    pub transfer_limit: Decimal,
    /// Failures allowed on each credential stage before lockout
    pub max_credential_attempts: u32,
    pub passcode_ttl: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            transfer_limit: Decimal::new(500_000, 0),
            max_credential_attempts: 3,
            passcode_ttl: DEFAULT_PASSCODE_TTL,
        }
    }
}

/// Everything the wizard talks to
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityProvider>,
    pub credentials: Arc<dyn CredentialStore>,
    pub passcodes: Arc<dyn PasscodeStore>,
    pub dispatcher: Arc<dyn PasscodeDispatcher>,
    pub policy: Arc<dyn OutcomePolicySource>,
    pub ledger: Arc<dyn Ledger>,
    pub clock: Arc<dyn Clock>,
}

/// Wizard state with the data each stage needs
#[derive(Debug)]
pub enum WizardState {
    AmountEntry,
    Confirm {
        transfer: Arc<TransferRequest>,
    },
    Authorizing {
        transfer: Arc<TransferRequest>,
        kind: CredentialKind,
        attempt: VerificationAttempt,
    },
    Passcode {
        transfer: Arc<TransferRequest>,
        key: AuthorizationKey,
        attempt: VerificationAttempt,
        countdown: Countdown,
    },
    Completed(TransferReceipt),
    Pending(TransferReceipt),
    Failed {
        transfer: Arc<TransferRequest>,
        reason: String,
    },
}

impl WizardState {
    pub fn stage(&self) -> Stage {
        match self {
            Self::AmountEntry => Stage::AmountEntry,
            Self::Confirm { .. } => Stage::Confirm,
            Self::Authorizing { kind, .. } => match kind {
                CredentialKind::Tac => Stage::Tac,
                CredentialKind::SecurityCode => Stage::SecurityCode,
                CredentialKind::Tin => Stage::Tin,
            },
            Self::Passcode { .. } => Stage::Passcode,
            Self::Completed(_) => Stage::Completed,
            Self::Pending(_) => Stage::Pending,
            Self::Failed { .. } => Stage::Failed,
        }
    }

    /// In-flight transfer payload, if any
    pub fn transfer(&self) -> Option<&TransferRequest> {
        match self {
            Self::AmountEntry => None,
            Self::Confirm { transfer }
            | Self::Authorizing { transfer, .. }
            | Self::Passcode { transfer, .. }
            | Self::Failed { transfer, .. } => Some(transfer.as_ref()),
            Self::Completed(receipt) | Self::Pending(receipt) => Some(&receipt.request),
        }
    }
}

/// Credential checked after `kind`, or `None` when the chain is done
fn next_credential(kind: CredentialKind) -> Option<CredentialKind> {
    match kind {
        CredentialKind::Tac => Some(CredentialKind::SecurityCode),
        CredentialKind::SecurityCode => Some(CredentialKind::Tin),
        CredentialKind::Tin => None,
    }
}

fn unavailable(collaborator: &'static str) -> impl FnOnce(anyhow::Error) -> WizardError {
    move |e| WizardError::CollaboratorUnavailable {
        collaborator,
        reason: e.to_string(),
    }
}

/// Transfer Wizard - one instance per user session
pub struct TransferWizard {
    identity: Arc<dyn IdentityProvider>,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    credentials: CredentialVerifier,
    passcodes: PasscodeService,
    policy: OutcomePolicyResolver,
    config: WizardConfig,
    state: WizardState,
    visited: Vec<Stage>,
    trace_id: Option<String>,
}

impl TransferWizard {
    pub fn new(collaborators: Collaborators, config: WizardConfig) -> Self {
        let passcodes = PasscodeService::new(
            collaborators.passcodes,
            collaborators.dispatcher,
            collaborators.clock.clone(),
            config.passcode_ttl,
        );

        Self {
            identity: collaborators.identity,
            ledger: collaborators.ledger,
            clock: collaborators.clock,
            credentials: CredentialVerifier::new(collaborators.credentials),
            passcodes,
            policy: OutcomePolicyResolver::new(collaborators.policy),
            config,
            state: WizardState::AmountEntry,
            visited: vec![Stage::AmountEntry],
            trace_id: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Stages visited in the current run, oldest first
    pub fn visited(&self) -> &[Stage] {
        &self.visited
    }

    pub fn transfer(&self) -> Option<&TransferRequest> {
        self.state.transfer()
    }

    pub fn receipt(&self) -> Option<&TransferReceipt> {
        match &self.state {
            WizardState::Completed(receipt) | WizardState::Pending(receipt) => Some(receipt),
            _ => None,
        }
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Attempt counter of the active verification stage
    pub fn active_attempt(&self) -> Option<&VerificationAttempt> {
        match &self.state {
            WizardState::Authorizing { attempt, .. } | WizardState::Passcode { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    pub fn passcode_countdown(&self) -> Option<&Countdown> {
        match &self.state {
            WizardState::Passcode { countdown, .. } => Some(countdown),
            _ => None,
        }
    }

    /// AmountEntry -> Confirm
    pub async fn submit_transfer(&mut self, request: TransferRequest) -> Result<Stage, WizardError> {
        let session = self.require_session().await?;
        if !matches!(self.state, WizardState::AmountEntry) {
            return Err(self.out_of_sequence("submit transfer"));
        }

        let balance = self
            .ledger
            .balance(&session.user_id)
            .await
            .map_err(unavailable("ledger"))?;
        validate_transfer_request(&request, balance, self.config.transfer_limit)?;

        self.trace_id = Some(crate::logging::gen_wizard_trace_id(session.user_id.as_str()));
        self.advance(
            &session.user_id,
            WizardEvent::AmountAccepted,
            WizardState::Confirm {
                transfer: Arc::new(request),
            },
        )
    }

    /// Confirm -> Tac (long chain) or Passcode (short chain)
    pub async fn confirm(&mut self) -> Result<Stage, WizardError> {
        let session = self.require_session().await?;
        let transfer = match &self.state {
            WizardState::Confirm { transfer } => Arc::clone(transfer),
            _ => return Err(self.out_of_sequence("confirm")),
        };

        let full_chain = if session.has(Capability::SkipAuthorizationChain) {
            false
        } else {
            self.policy_for_chain_selection(&session.user_id)
                .await
                .requires_full_chain()
        };

        if full_chain {
            let attempt = VerificationAttempt::credential(CredentialKind::Tac, self.config.max_credential_attempts);
            self.advance(
                &session.user_id,
                WizardEvent::FullChainRequired,
                WizardState::Authorizing {
                    transfer,
                    kind: CredentialKind::Tac,
                    attempt,
                },
            )
        } else {
            self.enter_passcode(&session, transfer, WizardEvent::ChainSkipped).await
        }
    }

    /// Check the secret for the current credential stage
    pub async fn submit_credential(&mut self, value: &str) -> Result<Stage, WizardError> {
        let session = self.require_session().await?;
        let (transfer, kind) = match &self.state {
            WizardState::Authorizing { transfer, kind, .. } => (Arc::clone(transfer), *kind),
            _ => return Err(self.out_of_sequence("submit credential")),
        };

        // Validation and lookup failures leave the attempt counter alone
        let matched = self.credentials.verify(&session.user_id, kind, value).await?;

        if matched {
            return match next_credential(kind) {
                Some(next) => {
                    let attempt = VerificationAttempt::credential(next, self.config.max_credential_attempts);
                    self.advance(
                        &session.user_id,
                        WizardEvent::CredentialAccepted,
                        WizardState::Authorizing {
                            transfer,
                            kind: next,
                            attempt,
                        },
                    )
                }
                None => {
                    self.enter_passcode(&session, transfer, WizardEvent::CredentialAccepted)
                        .await
                }
            };
        }

        let outcome = match &mut self.state {
            WizardState::Authorizing { attempt, .. } => attempt.record_failure(),
            _ => return Err(self.out_of_sequence("submit credential")),
        };

        match outcome {
            AttemptOutcome::Retry { remaining } => Err(WizardError::CredentialMismatch { kind, remaining }),
            AttemptOutcome::LockedOut => {
                crate::log_lockout!(
                    session.user_id.as_str(),
                    kind.as_ref(),
                    self.config.max_credential_attempts
                );
                self.advance(&session.user_id, WizardEvent::CredentialLockout, WizardState::AmountEntry)?;
                Err(WizardError::LockoutExceeded { kind })
            }
        }
    }

    /// Verify the passcode and settle
    pub async fn submit_passcode(&mut self, code: &str) -> Result<Stage, WizardError> {
        let session = self.require_session().await?;
        let (transfer, key) = match &self.state {
            WizardState::Passcode {
                transfer,
                key,
                countdown,
                ..
            } => {
                if countdown.is_expired() {
                    return Err(WizardError::PasscodeExpired);
                }
                (Arc::clone(transfer), key.clone())
            }
            _ => return Err(self.out_of_sequence("verify passcode")),
        };

        match self.passcodes.verify(&key, code).await {
            Ok(auth) => self.settle(&session, transfer, auth).await,
            Err(e) => {
                if matches!(e, WizardError::PasscodeMismatch | WizardError::PasscodeExpired) {
                    if let WizardState::Passcode { attempt, .. } = &mut self.state {
                        attempt.record_failure();
                    }
                }
                Err(e)
            }
        }
    }

    /// Issue a fresh passcode; the old one stops working and the countdown restarts
    pub async fn resend_passcode(&mut self) -> Result<Stage, WizardError> {
        let session = self.require_session().await?;
        let transfer = match &self.state {
            WizardState::Passcode { transfer, .. } => Arc::clone(transfer),
            _ => return Err(self.out_of_sequence("resend passcode")),
        };

        let issued = self.passcodes.resend(&session, &transfer).await?;

        if let WizardState::Passcode {
            key,
            attempt,
            countdown,
            ..
        } = &mut self.state
        {
            *key = issued.key;
            attempt.reset();
            // Replacing drops the old countdown, which cancels its ticker
            *countdown = Countdown::start(self.passcodes.ttl());
        }

        log::info!("Passcode resent for {}", session.user_id);
        Ok(Stage::Passcode)
    }

    /// Direct navigation to `stage`. Anything other than the current stage
    /// has no navigation state behind it and lands on amount entry.
    pub fn open(&mut self, stage: Stage) -> Stage {
        if stage == self.stage() {
            return stage;
        }
        if stage.requires_transfer() {
            log::warn!("No transfer state for {}, returning to amount entry", stage);
        }
        self.reset_to_start();
        Stage::AmountEntry
    }

    /// Abandon the run from any stage; nothing is written
    pub fn cancel(&mut self) {
        self.reset_to_start();
    }

    /// Start a new transfer after a terminal stage
    pub fn restart(&mut self) -> Result<Stage, WizardError> {
        let stage = self.stage();
        if !stage.is_terminal() {
            return Err(WizardError::OutOfSequence {
                operation: "restart",
                stage,
            });
        }
        self.reset_to_start();
        Ok(Stage::AmountEntry)
    }

    /// Policy read #1: selects the chain length
    async fn policy_for_chain_selection(&self, user_id: &UserId) -> OutcomePolicy {
        let policy = self.policy.resolve(user_id).await;
        log::debug!("Chain selection policy for {}: {}", user_id, policy.as_str());
        policy
    }

    /// Policy read #2: selects the settlement mode, independent of read #1
    async fn policy_for_settlement(&self, user_id: &UserId) -> OutcomePolicy {
        let policy = self.policy.resolve(user_id).await;
        log::debug!("Settlement policy for {}: {}", user_id, policy.as_str());
        policy
    }

    async fn enter_passcode(
        &mut self,
        session: &Session,
        transfer: Arc<TransferRequest>,
        event: WizardEvent,
    ) -> Result<Stage, WizardError> {
        // Issue failure keeps the current stage so the user can retry
        let issued = self.passcodes.issue(session, &transfer).await?;

        self.advance(
            &session.user_id,
            event,
            WizardState::Passcode {
                transfer,
                key: issued.key,
                attempt: VerificationAttempt::passcode(),
                countdown: Countdown::start(self.passcodes.ttl()),
            },
        )
    }

    async fn settle(
        &mut self,
        session: &Session,
        transfer: Arc<TransferRequest>,
        auth: PendingAuthorization,
    ) -> Result<Stage, WizardError> {
        let user_id = &session.user_id;
        let mode = self.policy_for_settlement(user_id).await.settlement_mode();
        let now = self.clock.now();

        let (status, event) = match mode {
            SettlementMode::Immediate => (TransactionStatus::Completed, WizardEvent::SettledImmediately),
            SettlementMode::PendingApproval => (TransactionStatus::Pending, WizardEvent::SettledPending),
        };
        let record = TransactionRecord::outgoing_transfer(&transfer, status, now);

        let written = match mode {
            SettlementMode::Immediate => self.write_completed(user_id, &transfer, record.clone()).await,
            // Balance untouched until the transfer is approved
            SettlementMode::PendingApproval => self
                .ledger
                .append(user_id, record.clone())
                .await
                .map(|_| None),
        };

        let balance_after = match written {
            Ok(balance_after) => balance_after,
            Err(e) => {
                log::error!("Settlement write failed for {}: {}", user_id, e);
                let reason = e.to_string();
                self.advance(
                    user_id,
                    WizardEvent::SettlementFailed,
                    WizardState::Failed {
                        transfer,
                        reason: reason.clone(),
                    },
                )?;
                return Err(WizardError::CollaboratorUnavailable {
                    collaborator: "ledger",
                    reason,
                });
            }
        };

        if mode == SettlementMode::Immediate {
            self.passcodes.discard(&auth.key).await;
        }

        crate::log_settlement!(
            user_id.as_str(),
            record.id.to_string(),
            status.as_str(),
            record.amount.to_string()
        );

        let receipt = TransferReceipt {
            request: (*transfer).clone(),
            record,
            balance_after,
        };
        let next = match mode {
            SettlementMode::Immediate => WizardState::Completed(receipt),
            SettlementMode::PendingApproval => WizardState::Pending(receipt),
        };
        self.advance(user_id, event, next)
    }

    async fn write_completed(
        &self,
        user_id: &UserId,
        transfer: &TransferRequest,
        record: TransactionRecord,
    ) -> anyhow::Result<Option<Decimal>> {
        let balance = self.ledger.adjust_balance(user_id, -transfer.amount).await?;

        if let Err(e) = self.ledger.append(user_id, record).await {
            // Roll the debit back so a failed run leaves the ledger untouched
            match self.ledger.adjust_balance(user_id, transfer.amount).await {
                Ok(restored) => log::warn!("Debit rolled back for {}, balance {}", user_id, restored),
                Err(undo) => log::error!(
                    "Failed to roll back debit of {} for {}: {}",
                    transfer.amount, user_id, undo
                ),
            }
            return Err(e);
        }

        Ok(Some(balance))
    }

    async fn require_session(&mut self) -> Result<Session, WizardError> {
        match self.identity.current_session().await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => {
                self.reset_to_start();
                Err(WizardError::Unauthenticated)
            }
            Err(e) => Err(unavailable("identity")(e)),
        }
    }

    /// Apply `event` through the transition table and install `next`
    fn advance(&mut self, user_id: &UserId, event: WizardEvent, next: WizardState) -> Result<Stage, WizardError> {
        let from = self.state.stage();
        let to = match transition(from, event) {
            Some(to) if to == next.stage() => to,
            _ => {
                log::error!("Rejected transition {:?} from {} to {}", event, from, next.stage());
                return Err(WizardError::OutOfSequence {
                    operation: "advance",
                    stage: from,
                });
            }
        };

        // Dropping the previous state cancels any running countdown
        self.state = next;
        if to == Stage::AmountEntry {
            self.visited.clear();
            self.trace_id = None;
        }
        self.visited.push(to);

        crate::log_stage_transition!(user_id.as_str(), from.as_str(), to.as_str());
        Ok(to)
    }

    fn out_of_sequence(&mut self, operation: &'static str) -> WizardError {
        let stage = self.stage();
        // Terminal receipts stay visible; a double-submit must not erase them
        if !stage.is_terminal() {
            log::warn!("Cannot {} at {}, returning to amount entry", operation, stage);
            self.reset_to_start();
        }
        WizardError::OutOfSequence { operation, stage }
    }

    fn reset_to_start(&mut self) {
        let from = self.stage();
        let to = transition(from, WizardEvent::Abandoned).unwrap_or(Stage::AmountEntry);
        self.state = WizardState::AmountEntry;
        self.visited = vec![to];
        self.trace_id = None;
        log::info!("Wizard reset from {} to {}", from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::adapters::mock::InMemoryBackend;
    use crate::transfer::types::VerificationKind;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn request(amount: &str) -> TransferRequest {
        TransferRequest {
            amount: dec(amount),
            recipient: "Jane Doe".to_string(),
            account_number: "0123456789".to_string(),
            bank_name: "First Bank".to_string(),
            sort_code: "12-34-56".to_string(),
            description: None,
        }
    }

    fn wizard(backend: &InMemoryBackend) -> TransferWizard {
        TransferWizard::new(backend.collaborators(), WizardConfig::default())
    }

    #[tokio::test]
    async fn test_rejects_invalid_amounts() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        let mut w = wizard(&backend);

        for amount in ["0", "-5", "500.01"] {
            let err = w.submit_transfer(request(amount)).await.unwrap_err();
            assert!(err.is_validation(), "{amount}");
            assert_eq!(w.stage(), Stage::AmountEntry);
        }
    }

    #[tokio::test]
    async fn test_limit_applies_even_with_large_balance() {
        let backend = InMemoryBackend::customer(dec("900000"));
        let mut w = wizard(&backend);

        let err = w.submit_transfer(request("500000.01")).await.unwrap_err();
        assert!(matches!(err, WizardError::TransferLimitExceeded { .. }));
        assert_eq!(w.stage(), Stage::AmountEntry);
    }

    #[tokio::test]
    async fn test_signed_out_user_is_rejected() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        backend.identity.sign_out();
        let mut w = wizard(&backend);

        let err = w.submit_transfer(request("100.00")).await.unwrap_err();
        assert_eq!(err, WizardError::Unauthenticated);
        assert_eq!(w.stage(), Stage::AmountEntry);
    }

    #[tokio::test]
    async fn test_operation_without_transfer_returns_to_start() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        let mut w = wizard(&backend);

        let err = w.submit_passcode("123456").await.unwrap_err();
        assert!(matches!(err, WizardError::OutOfSequence { stage: Stage::AmountEntry, .. }));
        assert_eq!(w.stage(), Stage::AmountEntry);
    }

    #[tokio::test]
    async fn test_open_unknown_stage_redirects() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        let mut w = wizard(&backend);

        assert_eq!(w.open(Stage::Tin), Stage::AmountEntry);

        w.submit_transfer(request("100.00")).await.unwrap();
        assert_eq!(w.open(Stage::Confirm), Stage::Confirm);
        assert_eq!(w.open(Stage::Passcode), Stage::AmountEntry);
        assert!(w.transfer().is_none());
    }

    #[tokio::test]
    async fn test_admin_skips_chain_under_force_failure() {
        let backend = InMemoryBackend::administrator(dec("500.00"));
        backend.policy.set_force_success(&backend.user_id, Some(false));
        let mut w = wizard(&backend);

        w.submit_transfer(request("100.00")).await.unwrap();
        assert_eq!(w.confirm().await.unwrap(), Stage::Passcode);

        // Settlement still follows the policy
        let code = backend.dispatcher.last_code().unwrap();
        assert_eq!(w.submit_passcode(&code).await.unwrap(), Stage::Pending);
    }

    #[tokio::test]
    async fn test_malformed_credential_does_not_count() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        backend.policy.set_force_success(&backend.user_id, Some(false));
        let mut w = wizard(&backend);

        w.submit_transfer(request("100.00")).await.unwrap();
        w.confirm().await.unwrap();

        for _ in 0..5 {
            let err = w.submit_credential("AB").await.unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(w.stage(), Stage::Tac);
        let attempt = w.active_attempt().unwrap();
        assert_eq!(attempt.kind(), VerificationKind::Credential(CredentialKind::Tac));
        assert_eq!(attempt.failures(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_does_not_count() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        backend.policy.set_force_success(&backend.user_id, Some(false));
        let mut w = wizard(&backend);

        w.submit_transfer(request("100.00")).await.unwrap();
        w.confirm().await.unwrap();
        backend.credentials.set_transport_error(Some("timeout"));

        let err = w.submit_credential(InMemoryBackend::TAC).await.unwrap_err();
        assert!(matches!(err, WizardError::LookupFailed { .. }));
        assert_eq!(w.stage(), Stage::Tac);
        assert_eq!(w.active_attempt().unwrap().failures(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_confirm_stage() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        backend.dispatcher.set_fail(true);
        let mut w = wizard(&backend);

        w.submit_transfer(request("100.00")).await.unwrap();
        let err = w.confirm().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(w.stage(), Stage::Confirm);

        backend.dispatcher.set_fail(false);
        assert_eq!(w.confirm().await.unwrap(), Stage::Passcode);
    }

    #[tokio::test]
    async fn test_ledger_failure_after_verification_fails_run() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        backend.ledger.set_fail_appends(true);
        let mut w = wizard(&backend);

        w.submit_transfer(request("100.00")).await.unwrap();
        w.confirm().await.unwrap();
        let code = backend.dispatcher.last_code().unwrap();

        let err = w.submit_passcode(&code).await.unwrap_err();
        assert!(matches!(err, WizardError::CollaboratorUnavailable { collaborator: "ledger", .. }));
        assert_eq!(w.stage(), Stage::Failed);

        // Debit is rolled back and nothing is recorded
        assert_eq!(backend.ledger.balance_of(&backend.user_id), dec("500.00"));
        assert!(backend.ledger.transactions(&backend.user_id).is_empty());
        assert!(w.receipt().is_none());
    }

    #[tokio::test]
    async fn test_double_submit_after_completion_is_rejected() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        let mut w = wizard(&backend);

        w.submit_transfer(request("100.00")).await.unwrap();
        w.confirm().await.unwrap();
        let code = backend.dispatcher.last_code().unwrap();
        assert_eq!(w.submit_passcode(&code).await.unwrap(), Stage::Completed);

        let err = w.submit_passcode(&code).await.unwrap_err();
        assert!(matches!(err, WizardError::OutOfSequence { stage: Stage::Completed, .. }));
        assert_eq!(w.stage(), Stage::Completed);
        assert_eq!(backend.ledger.transactions(&backend.user_id).len(), 1);
    }

    #[tokio::test]
    async fn test_restart_only_from_terminal() {
        let backend = InMemoryBackend::customer(dec("500.00"));
        let mut w = wizard(&backend);

        assert!(w.restart().is_err());
        w.submit_transfer(request("100.00")).await.unwrap();
        w.cancel();
        assert_eq!(w.stage(), Stage::AmountEntry);
        assert_eq!(w.visited(), &[Stage::AmountEntry]);
    }
}
