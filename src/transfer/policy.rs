//! Outcome Policy Resolver
//!
//! Maps the per-user force-success flag to the path and settlement mode.
//! Lookup failures resolve to `Unset`, which fails open toward the
//! frictionless path.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::transfer::adapters::OutcomePolicySource;
use crate::transfer::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomePolicy {
    ForceSuccessExplicit,
    ForceFailureExplicit,
    Unset,
}

/// How a verified transfer is written to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementMode {
    /// Debit now, record as completed
    Immediate,
    /// Record as pending, balance untouched until manual approval
    PendingApproval,
}

impl OutcomePolicy {
    pub fn from_flag(force_success: Option<bool>) -> Self {
        match force_success {
            Some(true) => Self::ForceSuccessExplicit,
            Some(false) => Self::ForceFailureExplicit,
            None => Self::Unset,
        }
    }

    pub fn requires_full_chain(&self) -> bool {
        matches!(self, Self::ForceFailureExplicit)
    }

    pub fn settlement_mode(&self) -> SettlementMode {
        match self {
            Self::ForceFailureExplicit => SettlementMode::PendingApproval,
            Self::ForceSuccessExplicit | Self::Unset => SettlementMode::Immediate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForceSuccessExplicit => "force_success",
            Self::ForceFailureExplicit => "force_failure",
            Self::Unset => "unset",
        }
    }
}

pub struct OutcomePolicyResolver {
    source: Arc<dyn OutcomePolicySource>,
}

impl OutcomePolicyResolver {
    pub fn new(source: Arc<dyn OutcomePolicySource>) -> Self {
        Self { source }
    }

    /// Fresh read on every call; nothing is cached
    pub async fn resolve(&self, user_id: &UserId) -> OutcomePolicy {
        match self.source.force_success(user_id).await {
            Ok(flag) => OutcomePolicy::from_flag(flag),
            Err(e) => {
                log::warn!(
                    "Outcome policy lookup failed for {}, treating as unset: {}",
                    user_id, e
                );
                OutcomePolicy::Unset
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::adapters::StaticPolicySource;

    #[test]
    fn test_flag_mapping() {
        assert_eq!(OutcomePolicy::from_flag(Some(true)), OutcomePolicy::ForceSuccessExplicit);
        assert_eq!(OutcomePolicy::from_flag(Some(false)), OutcomePolicy::ForceFailureExplicit);
        assert_eq!(OutcomePolicy::from_flag(None), OutcomePolicy::Unset);
    }

    #[test]
    fn test_only_force_failure_is_friction() {
        assert!(OutcomePolicy::ForceFailureExplicit.requires_full_chain());
        assert!(!OutcomePolicy::ForceSuccessExplicit.requires_full_chain());
        assert!(!OutcomePolicy::Unset.requires_full_chain());

        assert_eq!(OutcomePolicy::ForceFailureExplicit.settlement_mode(), SettlementMode::PendingApproval);
        assert_eq!(OutcomePolicy::ForceSuccessExplicit.settlement_mode(), SettlementMode::Immediate);
        assert_eq!(OutcomePolicy::Unset.settlement_mode(), SettlementMode::Immediate);
    }

    #[tokio::test]
    async fn test_lookup_error_fails_open() {
        let source = Arc::new(StaticPolicySource::new());
        let user = UserId::new("u-1");
        source.set_force_success(&user, Some(false));
        source.set_failing(true);

        let resolver = OutcomePolicyResolver::new(source);
        assert_eq!(resolver.resolve(&user).await, OutcomePolicy::Unset);
    }

    #[tokio::test]
    async fn test_each_resolve_reads_the_source() {
        let source = Arc::new(StaticPolicySource::new());
        let user = UserId::new("u-1");
        let resolver = OutcomePolicyResolver::new(source.clone());

        assert_eq!(resolver.resolve(&user).await, OutcomePolicy::Unset);
        source.set_force_success(&user, Some(false));
        assert_eq!(resolver.resolve(&user).await, OutcomePolicy::ForceFailureExplicit);
    }
}
