use rust_decimal::Decimal;

use crate::models::transfer_types::TransferRequest;
use crate::models::wizard_errors::WizardError;

/// Maximum decimal places accepted for an amount
pub const AMOUNT_DECIMALS: u32 = 2;

const ACCOUNT_NUMBER_LEN: usize = 10;
const NAME_MIN_LEN: usize = 2;
const NAME_MAX_LEN: usize = 100;
const DESCRIPTION_MAX_LEN: usize = 500;

/// Validate a transfer before leaving amount entry
pub fn validate_transfer_request(
    req: &TransferRequest,
    balance: Decimal,
    transfer_limit: Decimal,
) -> Result<(), WizardError> {
    // 1. Amount
    validate_amount(req.amount, balance, transfer_limit)?;

    // 2. Recipient details
    validate_recipient(&req.recipient)?;
    validate_account_number(&req.account_number)?;
    validate_bank_name(&req.bank_name)?;
    validate_sort_code(&req.sort_code)?;

    // 3. Optional description
    if let Some(description) = &req.description {
        if description.trim().chars().count() > DESCRIPTION_MAX_LEN {
            return Err(invalid("description", "must be less than 500 characters"));
        }
    }

    Ok(())
}

/// Amount must be positive, at most 2 decimals, within balance and limit
pub fn validate_amount(amount: Decimal, balance: Decimal, transfer_limit: Decimal) -> Result<(), WizardError> {
    if amount <= Decimal::ZERO {
        return Err(WizardError::InvalidAmount(
            "Please enter a valid transfer amount".to_string(),
        ));
    }

    if amount.normalize().scale() > AMOUNT_DECIMALS {
        return Err(WizardError::InvalidAmount(format!(
            "amount precision exceeds {} decimals",
            AMOUNT_DECIMALS
        )));
    }

    if amount > balance {
        return Err(WizardError::InsufficientBalance {
            available: balance,
            requested: amount,
        });
    }

    if amount > transfer_limit {
        return Err(WizardError::TransferLimitExceeded {
            limit: transfer_limit,
            requested: amount,
        });
    }

    Ok(())
}

fn validate_recipient(recipient: &str) -> Result<(), WizardError> {
    let recipient = recipient.trim();
    check_length("recipient", recipient, NAME_MIN_LEN, NAME_MAX_LEN)?;
    if !recipient
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'')
    {
        return Err(invalid(
            "recipient",
            "can only contain letters, spaces, hyphens, and apostrophes",
        ));
    }
    Ok(())
}

fn validate_account_number(account_number: &str) -> Result<(), WizardError> {
    let account_number = account_number.trim();
    if account_number.len() != ACCOUNT_NUMBER_LEN || !account_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("account number", "must be exactly 10 digits"));
    }
    Ok(())
}

fn validate_bank_name(bank_name: &str) -> Result<(), WizardError> {
    let bank_name = bank_name.trim();
    check_length("bank name", bank_name, NAME_MIN_LEN, NAME_MAX_LEN)?;
    if !bank_name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || matches!(c, '-' | '&' | '.'))
    {
        return Err(invalid("bank name", "contains invalid characters"));
    }
    Ok(())
}

/// Sort code format: 12-34-56
fn validate_sort_code(sort_code: &str) -> Result<(), WizardError> {
    let groups: Vec<&str> = sort_code.trim().split('-').collect();
    let valid = groups.len() == 3
        && groups
            .iter()
            .all(|g| g.len() == 2 && g.chars().all(|c| c.is_ascii_digit()));
    if !valid {
        return Err(invalid("sort code", "must be in format 12-34-56"));
    }
    Ok(())
}

fn check_length(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), WizardError> {
    let len = value.chars().count();
    if len < min {
        return Err(invalid(field, &format!("must be at least {} characters", min)));
    }
    if len > max {
        return Err(invalid(field, &format!("must be less than {} characters", max)));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> WizardError {
    WizardError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn valid_request() -> TransferRequest {
        TransferRequest {
            amount: dec("100.00"),
            recipient: "Mary O'Neil-Smith".to_string(),
            account_number: "0123456789".to_string(),
            bank_name: "Barclays & Co.".to_string(),
            sort_code: "12-34-56".to_string(),
            description: Some("rent".to_string()),
        }
    }

    #[test]
    fn test_validate_valid_transfer() {
        assert!(validate_transfer_request(&valid_request(), dec("500.00"), dec("500000")).is_ok());
    }

    #[test]
    fn test_non_positive_amount() {
        for amount in ["0", "-0.01", "-100"] {
            let err = validate_amount(dec(amount), dec("500"), dec("500000")).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_AMOUNT");
        }
    }

    #[test]
    fn test_amount_over_balance() {
        let err = validate_amount(dec("500.01"), dec("500.00"), dec("500000")).unwrap_err();
        assert!(matches!(err, WizardError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_amount_over_limit() {
        let err = validate_amount(dec("500000.01"), dec("1000000"), dec("500000")).unwrap_err();
        assert!(matches!(err, WizardError::TransferLimitExceeded { .. }));
    }

    #[test]
    fn test_amount_boundaries_accepted() {
        assert!(validate_amount(dec("500.00"), dec("500.00"), dec("500000")).is_ok());
        assert!(validate_amount(dec("500000"), dec("600000"), dec("500000")).is_ok());
        assert!(validate_amount(dec("0.01"), dec("1"), dec("500000")).is_ok());
    }

    #[test]
    fn test_amount_precision() {
        assert!(validate_amount(dec("1.005"), dec("500"), dec("500000")).is_err());
        // Trailing zeros are not extra precision
        assert!(validate_amount(dec("1.5000"), dec("500"), dec("500000")).is_ok());
    }

    #[test]
    fn test_invalid_recipient() {
        let mut req = valid_request();
        req.recipient = "J".to_string();
        assert!(validate_transfer_request(&req, dec("500"), dec("500000")).is_err());

        req.recipient = "Jane99".to_string();
        let err = validate_transfer_request(&req, dec("500"), dec("500000")).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_invalid_account_number() {
        let mut req = valid_request();
        req.account_number = "12345".to_string();
        assert!(validate_transfer_request(&req, dec("500"), dec("500000")).is_err());

        req.account_number = "01234567a9".to_string();
        assert!(validate_transfer_request(&req, dec("500"), dec("500000")).is_err());
    }

    #[test]
    fn test_invalid_sort_code() {
        for code in ["123456", "12-34-5", "12-34-56-78", "ab-cd-ef"] {
            let mut req = valid_request();
            req.sort_code = code.to_string();
            assert!(validate_transfer_request(&req, dec("500"), dec("500000")).is_err(), "{code}");
        }
    }

    #[test]
    fn test_invalid_bank_name() {
        let mut req = valid_request();
        req.bank_name = "Bank#1".to_string();
        assert!(validate_transfer_request(&req, dec("500"), dec("500000")).is_err());
    }

    #[test]
    fn test_description_too_long() {
        let mut req = valid_request();
        req.description = Some("x".repeat(501));
        assert!(validate_transfer_request(&req, dec("500"), dec("500000")).is_err());
    }
}
