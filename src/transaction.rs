use crate::catalog::{CustomerRecord, Product};
use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The payment categories the counter sells, plus the balance-withdrawal
/// flow, which runs through the same state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pulsa,
    #[serde(rename = "token")]
    ElectricityToken,
    #[serde(rename = "electricity")]
    ElectricityBill,
    Pascabayar,
    Pdam,
    Bpjs,
    #[serde(rename = "ewallet")]
    EWallet,
    #[serde(rename = "game")]
    GameVoucher,
    Withdrawal,
}

impl Category {
    /// Categories that model a real customer account and therefore go
    /// through a remote-style lookup before validation. Everything else
    /// skips straight from Input to Validated.
    pub fn requires_lookup(&self) -> bool {
        matches!(
            self,
            Category::ElectricityBill | Category::Pascabayar | Category::Pdam | Category::Bpjs
        )
    }

    /// Categories whose amount comes from a looked-up bill rather than a
    /// selected catalog product.
    pub fn is_bill(&self) -> bool {
        self.requires_lookup()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Pulsa => "Pulsa",
            Category::ElectricityToken => "Token Listrik",
            Category::ElectricityBill => "Tagihan Listrik",
            Category::Pascabayar => "Pascabayar",
            Category::Pdam => "PDAM",
            Category::Bpjs => "BPJS Kesehatan",
            Category::EWallet => "E-Wallet",
            Category::GameVoucher => "Voucher Game",
            Category::Withdrawal => "Tarik Saldo",
        }
    }

    /// Short code used as the receipt reference-number prefix.
    pub fn code(&self) -> &'static str {
        match self {
            Category::Pulsa => "PLS",
            Category::ElectricityToken => "TKN",
            Category::ElectricityBill => "PLN",
            Category::Pascabayar => "PSC",
            Category::Pdam => "PDM",
            Category::Bpjs => "BPJ",
            Category::EWallet => "EWL",
            Category::GameVoucher => "GMV",
            Category::Withdrawal => "WDR",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a withdrawal pays out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalDestination {
    /// Internal transfer to the merchant's main balance. No admin fee.
    MainBalance,
    /// External bank transfer. Fixed admin fee.
    BankTransfer,
}

impl WithdrawalDestination {
    pub fn parse(value: &str) -> Result<Self, PaymentError> {
        match value {
            "main" => Ok(Self::MainBalance),
            "bank" => Ok(Self::BankTransfer),
            other => Err(PaymentError::InvalidInput(format!(
                "unknown withdrawal destination: {other}"
            ))),
        }
    }
}

/// A transaction being assembled from user input. Built field by field;
/// confirmable only once the category's required fields are all present
/// and a product or amount has been selected.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub category: Category,
    fields: HashMap<String, String>,
    pub product: Option<Product>,
    pub customer: Option<CustomerRecord>,
    pub amount: Option<Decimal>,
}

impl TransactionRequest {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            fields: HashMap::new(),
            product: None,
            customer: None,
            amount: None,
        }
    }

    pub fn set_field(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.trim().to_string());
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// The provider/destination variant the field schema may depend on.
    pub fn variant(&self) -> Option<&str> {
        self.field("provider").or_else(|| self.field("destination"))
    }
}

/// Why a transaction ended in the `Failed` terminal state. `Timeout` and
/// `GatewayFailure` are reserved for a real settlement gateway; the local
/// simulation only ever produces `InsufficientBalance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    InsufficientBalance,
    Timeout,
    GatewayFailure,
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::InsufficientBalance => f.write_str("insufficient balance"),
            FailReason::Timeout => f.write_str("timeout"),
            FailReason::GatewayFailure => f.write_str("gateway failure"),
        }
    }
}

/// The confirmation view pushed to the Confirmation surface. Pure data;
/// the surface renders it and relays confirm/cancel back.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub category: Category,
    pub product_name: String,
    pub target: String,
    pub customer_name: Option<String>,
    pub operator: Option<String>,
    pub amount: Decimal,
    pub admin_fee: Decimal,
    pub commission: Decimal,
    pub total: Decimal,
    /// Withdrawal only: amount the merchant actually receives after fee.
    pub received: Option<Decimal>,
}

/// Proof of a settled transaction. Immutable, display-only; never
/// re-validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub ref_number: String,
    pub category: Category,
    pub target: String,
    pub product_name: String,
    pub amount: Decimal,
    pub admin_fee: Decimal,
    pub commission: Decimal,
    pub token: Option<String>,
    pub received: Option<Decimal>,
}
