//! Adapters module - collaborator contracts and their implementations

pub mod traits;
pub mod mock;
pub mod email;

pub use traits::{
    CredentialLookupError, CredentialStore, IdentityProvider, Ledger, OutcomePolicySource,
    PasscodeDispatcher, PasscodeStore,
};
pub use mock::{
    InMemoryBackend, InMemoryCredentialStore, InMemoryLedger, InMemoryPasscodeStore, RecordingDispatcher,
    SentPasscode, StaticIdentity, StaticPolicySource,
};
pub use email::{ConsoleDispatcher, HttpEmailDispatcher, PasscodeEmail};
