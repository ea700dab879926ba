use crate::error::{PaymentError, Result};
use crate::transaction::{Category, TransactionRequest};

/// One required form field and its shape rule. The per-category rule
/// tables below replace per-screen branching: a single validator walks
/// whatever list applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub label: &'static str,
    pub min_len: usize,
    pub max_len: usize,
    pub digits_only: bool,
}

const fn rule(
    name: &'static str,
    label: &'static str,
    min_len: usize,
    max_len: usize,
    digits_only: bool,
) -> FieldRule {
    FieldRule {
        name,
        label,
        min_len,
        max_len,
        digits_only,
    }
}

const PHONE: FieldRule = rule("phone", "phone number", 10, 13, true);
const METER_ID: FieldRule = rule("meter_id", "meter id", 11, 12, true);
const CUSTOMER_ID: FieldRule = rule("customer_id", "customer id", 6, 12, true);
const CARD_NUMBER: FieldRule = rule("card_number", "BPJS card number", 13, 13, true);
const PROVIDER: FieldRule = rule("provider", "provider", 2, 16, false);
const REGION: FieldRule = rule("region", "region", 2, 16, false);
const USER_ID: FieldRule = rule("user_id", "user id", 4, 16, true);
const ZONE_ID: FieldRule = rule("zone_id", "zone id", 3, 6, true);
const SERVER_ID: FieldRule = rule("server_id", "server", 2, 16, false);
const RIOT_ID: FieldRule = rule("riot_id", "Riot ID", 3, 24, false);
const DESTINATION: FieldRule = rule("destination", "destination", 4, 4, false);
const BANK_NAME: FieldRule = rule("bank_name", "bank name", 2, 32, false);
const ACCOUNT_NUMBER: FieldRule = rule("account_number", "account number", 8, 16, true);

/// Required fields for a category. Game vouchers and withdrawals vary
/// with the selected provider/destination, passed as `variant`.
pub fn rules_for(category: Category, variant: Option<&str>) -> Vec<FieldRule> {
    match category {
        Category::Pulsa => vec![PHONE],
        Category::ElectricityToken | Category::ElectricityBill => vec![METER_ID],
        Category::Pascabayar => vec![PHONE, PROVIDER],
        Category::Pdam => vec![CUSTOMER_ID, REGION],
        Category::Bpjs => vec![CARD_NUMBER],
        Category::EWallet => vec![PHONE, PROVIDER],
        Category::GameVoucher => match variant {
            Some("ml") => vec![USER_ID, PROVIDER, ZONE_ID],
            Some("genshin") => vec![USER_ID, PROVIDER, SERVER_ID],
            Some("valorant") => vec![RIOT_ID, PROVIDER],
            _ => vec![USER_ID, PROVIDER],
        },
        Category::Withdrawal => match variant {
            Some("bank") => vec![DESTINATION, BANK_NAME, ACCOUNT_NUMBER],
            _ => vec![DESTINATION],
        },
    }
}

/// The field holding the transaction's target identifier.
pub fn primary_field(category: Category, variant: Option<&str>) -> &'static str {
    rules_for(category, variant)[0].name
}

/// Checks every required field of the request against its rule. The
/// first violation is reported as `InvalidInput`.
pub fn validate_fields(request: &TransactionRequest) -> Result<()> {
    for field_rule in rules_for(request.category, request.variant()) {
        let value = request.field(field_rule.name).ok_or_else(|| {
            PaymentError::InvalidInput(format!("{} is required", field_rule.label))
        })?;
        if value.len() < field_rule.min_len || value.len() > field_rule.max_len {
            return Err(PaymentError::InvalidInput(format!(
                "{} must be {}-{} characters",
                field_rule.label, field_rule.min_len, field_rule.max_len
            )));
        }
        if field_rule.digits_only && !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::InvalidInput(format!(
                "{} must contain digits only",
                field_rule.label
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_invalid() {
        let request = TransactionRequest::new(Category::Pulsa);
        let err = validate_fields(&request).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }

    #[test]
    fn test_identifier_too_short_is_invalid() {
        let mut request = TransactionRequest::new(Category::Pulsa);
        request.set_field("phone", "0812345");
        assert!(validate_fields(&request).is_err());
        request.set_field("phone", "081234567890");
        assert!(validate_fields(&request).is_ok());
    }

    #[test]
    fn test_digits_only_rule() {
        let mut request = TransactionRequest::new(Category::Bpjs);
        request.set_field("card_number", "00012345678AB");
        assert!(validate_fields(&request).is_err());
        request.set_field("card_number", "0001234567890");
        assert!(validate_fields(&request).is_ok());
    }

    #[test]
    fn test_game_rules_depend_on_provider() {
        let mut request = TransactionRequest::new(Category::GameVoucher);
        request.set_field("provider", "ml");
        request.set_field("user_id", "123456789");
        // Mobile Legends also needs a zone id.
        assert!(validate_fields(&request).is_err());
        request.set_field("zone_id", "1234");
        assert!(validate_fields(&request).is_ok());

        // Valorant identifies players by Riot ID instead.
        let mut request = TransactionRequest::new(Category::GameVoucher);
        request.set_field("provider", "valorant");
        request.set_field("riot_id", "Player#SEA1");
        assert!(validate_fields(&request).is_ok());
        assert_eq!(
            primary_field(Category::GameVoucher, Some("valorant")),
            "riot_id"
        );
    }

    #[test]
    fn test_bank_withdrawal_needs_account_details() {
        let mut request = TransactionRequest::new(Category::Withdrawal);
        request.set_field("destination", "bank");
        assert!(validate_fields(&request).is_err());
        request.set_field("bank_name", "BCA");
        request.set_field("account_number", "1234567890");
        assert!(validate_fields(&request).is_ok());

        let mut request = TransactionRequest::new(Category::Withdrawal);
        request.set_field("destination", "main");
        assert!(validate_fields(&request).is_ok());
    }
}
