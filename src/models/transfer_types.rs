use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transfer payload collected at amount entry and carried through every stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub amount: Decimal,
    pub recipient: String,
    pub account_number: String,
    pub bank_name: String,
    pub sort_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransferRequest {
    /// Short summary used in passcode emails and logs
    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            amount: self.amount,
            recipient: self.recipient.clone(),
            bank_name: self.bank_name.clone(),
            account_hint: mask_account(&self.account_number),
        }
    }
}

/// Displayable subset of a transfer (no full account number)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub amount: Decimal,
    pub recipient: String,
    pub bank_name: String,
    pub account_hint: String,
}

fn mask_account(account_number: &str) -> String {
    let digits: Vec<char> = account_number.chars().collect();
    let visible = digits.len().min(4);
    let tail: String = digits[digits.len() - visible..].iter().collect();
    format!("****{}", tail)
}

/// Ledger status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Transfer,
}

/// Transaction appended to the ledger at settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Signed: outgoing transfers are negative
    pub amount: Decimal,
    pub description: String,
    pub recipient: String,
    pub bank_name: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn outgoing_transfer(
        request: &TransferRequest,
        status: TransactionStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TransactionKind::Transfer,
            amount: -request.amount,
            description: format!("Transfer to {}", request.recipient),
            recipient: request.recipient.clone(),
            bank_name: request.bank_name.clone(),
            status,
            created_at,
        }
    }
}

/// What the user sees once the wizard reaches `Completed` or `Pending`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub request: TransferRequest,
    pub record: TransactionRecord,
    /// Balance after settlement; unchanged for pending transfers
    pub balance_after: Option<Decimal>,
}

impl TransferReceipt {
    pub fn status(&self) -> TransactionStatus {
        self.record.status
    }
}
