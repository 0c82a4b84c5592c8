//! In-memory collaborators for testing and the demo binary
//!
//! Each mock can be told to fail so outage paths can be exercised.

use anyhow::{bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::traits::{
    CredentialLookupError, CredentialStore, IdentityProvider, Ledger, OutcomePolicySource,
    PasscodeDispatcher, PasscodeStore,
};
use crate::models::transfer_types::{TransactionRecord, TransferSummary};
use crate::transfer::clock::ManualClock;
use crate::transfer::coordinator::Collaborators;
use crate::transfer::types::{AuthorizationKey, CredentialKind, PendingAuthorization, Session, UserId};

/// Identity collaborator returning a fixed session
pub struct StaticIdentity {
    session: Mutex<Option<Session>>,
}

impl StaticIdentity {
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    pub fn sign_out(&self) {
        *self.session.lock().unwrap() = None;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }
}

/// Credential profiles keyed by (user, kind)
pub struct InMemoryCredentialStore {
    values: Mutex<HashMap<(UserId, CredentialKind), String>>,
    transport_error: Mutex<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            transport_error: Mutex::new(None),
        }
    }

    pub fn set(&self, user_id: &UserId, kind: CredentialKind, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert((user_id.clone(), kind), value.to_string());
    }

    /// Make every lookup fail with a transport error
    pub fn set_transport_error(&self, reason: Option<&str>) {
        *self.transport_error.lock().unwrap() = reason.map(str::to_string);
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn fetch(
        &self,
        user_id: &UserId,
        kind: CredentialKind,
    ) -> std::result::Result<String, CredentialLookupError> {
        if let Some(reason) = self.transport_error.lock().unwrap().clone() {
            return Err(CredentialLookupError::Transport(reason));
        }
        self.values
            .lock()
            .unwrap()
            .get(&(user_id.clone(), kind))
            .cloned()
            .ok_or(CredentialLookupError::NotFound)
    }
}

/// Pending authorizations keyed by (user, recipient, amount)
pub struct InMemoryPasscodeStore {
    records: Mutex<HashMap<AuthorizationKey, PendingAuthorization>>,
    fail_writes: AtomicBool,
}

impl InMemoryPasscodeStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct read for assertions
    pub fn get(&self, key: &AuthorizationKey) -> Option<PendingAuthorization> {
        self.records.lock().unwrap().get(key).cloned()
    }
}

impl Default for InMemoryPasscodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PasscodeStore for InMemoryPasscodeStore {
    async fn save(&self, auth: PendingAuthorization) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("passcode store write failed");
        }
        self.records.lock().unwrap().insert(auth.key.clone(), auth);
        Ok(())
    }

    async fn latest(&self, key: &AuthorizationKey) -> Result<Option<PendingAuthorization>> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn consume_if(&self, key: &AuthorizationKey, code: &str) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(key) {
            Some(auth) if !auth.consumed && auth.code == code => {
                auth.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, key: &AuthorizationKey) -> Result<()> {
        self.records.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A dispatched passcode message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPasscode {
    pub address: String,
    pub code: String,
    pub summary: TransferSummary,
}

/// Dispatcher that records messages instead of sending them
pub struct RecordingDispatcher {
    sent: Mutex<Vec<SentPasscode>>,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentPasscode> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|m| m.code.clone())
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PasscodeDispatcher for RecordingDispatcher {
    async fn send(&self, address: &str, code: &str, summary: &TransferSummary) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("Failed to send OTP email");
        }
        log::debug!("[recording] passcode for {} ({})", address, summary.recipient);
        self.sent.lock().unwrap().push(SentPasscode {
            address: address.to_string(),
            code: code.to_string(),
            summary: summary.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Force-success flags set by an "administrator"
pub struct StaticPolicySource {
    flags: Mutex<HashMap<UserId, bool>>,
    failing: AtomicBool,
}

impl StaticPolicySource {
    pub fn new() -> Self {
        Self {
            flags: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// `None` clears the flag (unset)
    pub fn set_force_success(&self, user_id: &UserId, flag: Option<bool>) {
        let mut flags = self.flags.lock().unwrap();
        match flag {
            Some(value) => {
                flags.insert(user_id.clone(), value);
            }
            None => {
                flags.remove(user_id);
            }
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for StaticPolicySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutcomePolicySource for StaticPolicySource {
    async fn force_success(&self, user_id: &UserId) -> Result<Option<bool>> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("admin_transfer_settings lookup failed");
        }
        Ok(self.flags.lock().unwrap().get(user_id).copied())
    }
}

/// Balances and transaction history per user
pub struct InMemoryLedger {
    balances: Mutex<HashMap<UserId, Decimal>>,
    transactions: Mutex<HashMap<UserId, Vec<TransactionRecord>>>,
    fail_appends: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            transactions: Mutex::new(HashMap::new()),
            fail_appends: AtomicBool::new(false),
        }
    }

    pub fn set_balance(&self, user_id: &UserId, balance: Decimal) {
        self.balances.lock().unwrap().insert(user_id.clone(), balance);
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn balance_of(&self, user_id: &UserId) -> Decimal {
        self.balances
            .lock()
            .unwrap()
            .get(user_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn transactions(&self, user_id: &UserId) -> Vec<TransactionRecord> {
        self.transactions
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn balance(&self, user_id: &UserId) -> Result<Decimal> {
        Ok(self.balance_of(user_id))
    }

    async fn adjust_balance(&self, user_id: &UserId, delta: Decimal) -> Result<Decimal> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(user_id.clone()).or_insert(Decimal::ZERO);
        *balance += delta;
        Ok(*balance)
    }

    async fn append(&self, user_id: &UserId, record: TransactionRecord) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            bail!("ledger append failed");
        }
        self.transactions
            .lock()
            .unwrap()
            .entry(user_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }
}

/// Complete in-memory backend for one signed-in user, seeded with known credentials
pub struct InMemoryBackend {
    pub user_id: UserId,
    pub identity: Arc<StaticIdentity>,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub passcodes: Arc<InMemoryPasscodeStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub policy: Arc<StaticPolicySource>,
    pub ledger: Arc<InMemoryLedger>,
    pub clock: Arc<ManualClock>,
}

impl InMemoryBackend {
    pub const TAC: &'static str = "TAC123";
    pub const SECURITY_CODE: &'static str = "SEC456";
    pub const TIN: &'static str = "12345678901";

    pub fn with_session(session: Session, balance: Decimal) -> Self {
        let user_id = session.user_id.clone();

        let credentials = Arc::new(InMemoryCredentialStore::new());
        credentials.set(&user_id, CredentialKind::Tac, Self::TAC);
        credentials.set(&user_id, CredentialKind::SecurityCode, Self::SECURITY_CODE);
        credentials.set(&user_id, CredentialKind::Tin, Self::TIN);

        let ledger = Arc::new(InMemoryLedger::new());
        ledger.set_balance(&user_id, balance);

        Self {
            user_id,
            identity: Arc::new(StaticIdentity::signed_in(session)),
            credentials,
            passcodes: Arc::new(InMemoryPasscodeStore::new()),
            dispatcher: Arc::new(RecordingDispatcher::new()),
            policy: Arc::new(StaticPolicySource::new()),
            ledger,
            clock: Arc::new(ManualClock::default()),
        }
    }

    pub fn customer(balance: Decimal) -> Self {
        Self::with_session(Session::customer(UserId::new("u-1001"), "customer@bank.test"), balance)
    }

    pub fn administrator(balance: Decimal) -> Self {
        Self::with_session(Session::administrator(UserId::new("u-admin"), "admin@bank.test"), balance)
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            identity: self.identity.clone(),
            credentials: self.credentials.clone(),
            passcodes: self.passcodes.clone(),
            dispatcher: self.dispatcher.clone(),
            policy: self.policy.clone(),
            ledger: self.ledger.clone(),
            clock: self.clock.clone(),
        }
    }
}
