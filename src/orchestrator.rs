use crate::catalog::{CatalogBox, CustomerRecord};
use crate::error::{PaymentError, Result};
use crate::ledger::Ledger;
use crate::money::Amount;
use crate::schema;
use crate::surface::{NullSurface, ProcessingStatus, Surface};
use crate::token;
use crate::transaction::{
    Category, FailReason, Receipt, Summary, TransactionRequest, WithdrawalDestination,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const MIN_WITHDRAWAL: Decimal = dec!(10_000);
pub const BANK_WITHDRAWAL_FEE: Decimal = dec!(2_500);
/// Flat commission for bill payments, which carry no catalog product.
pub const BILL_COMMISSION: Decimal = dec!(1_500);

/// Where the current transaction stands. `Cancelled`, `Settled` and
/// `Failed` are terminal; `begin` starts the next transaction from any
/// of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    Input,
    LookedUp,
    Validated,
    Confirming,
    Processing,
    Settled,
    Cancelled,
    Failed(FailReason),
}

/// Drives every category through the same sequence: collect input,
/// look up the account where the category has one, validate fields and
/// funds, confirm, process, settle against the ledger.
///
/// One transaction is in flight at a time; `begin`, `submit` and
/// `confirm` are rejected with `AlreadyProcessing` while a settlement
/// is running, and cancellation is only possible from `Confirming`.
pub struct Orchestrator {
    catalog: CatalogBox,
    ledger: Ledger,
    surface: Box<dyn Surface + Send>,
    state: TxState,
    request: Option<TransactionRequest>,
    summary: Option<Summary>,
    receipt: Option<Receipt>,
}

impl Orchestrator {
    pub fn new(catalog: CatalogBox, ledger: Ledger) -> Self {
        Self {
            catalog,
            ledger,
            surface: Box::new(NullSurface),
            state: TxState::Idle,
            request: None,
            summary: None,
            receipt: None,
        }
    }

    pub fn with_surface(mut self, surface: Box<dyn Surface + Send>) -> Self {
        self.surface = surface;
        self
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Starts a fresh transaction, discarding any terminal or
    /// half-finished one. Rejected while a settlement is in flight.
    pub fn begin(&mut self, category: Category) -> Result<()> {
        self.ensure_not_processing()?;
        self.state = TxState::Input;
        self.request = Some(TransactionRequest::new(category));
        self.summary = None;
        self.receipt = None;
        Ok(())
    }

    /// Records a form field. Editing drops any prior validation, and
    /// editing the target identifier drops the stale customer record.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_not_processing()?;
        if self.state == TxState::Confirming {
            return Err(PaymentError::InvalidInput(
                "cancel the confirmation before editing".to_string(),
            ));
        }
        let request = self.request_mut()?;
        request.set_field(name, value);
        if name == schema::primary_field(request.category, request.variant()) {
            request.customer = None;
        }
        self.state = TxState::Input;
        self.summary = None;
        Ok(())
    }

    /// Selects a catalog product by id for the current category.
    pub fn select_product(&mut self, product_id: &str) -> Result<()> {
        self.ensure_not_processing()?;
        let category = self.request_ref()?.category;
        let product = self
            .catalog
            .products_by_category(category)
            .into_iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| {
                PaymentError::InvalidInput(format!("unknown product: {product_id}"))
            })?;
        let request = self.request_mut()?;
        request.product = Some(product);
        self.state = TxState::Input;
        self.summary = None;
        Ok(())
    }

    /// Sets the requested amount. Only meaningful for withdrawals.
    pub fn set_amount(&mut self, amount: Decimal) -> Result<()> {
        self.ensure_not_processing()?;
        let request = self.request_mut()?;
        request.amount = Some(amount);
        self.state = TxState::Input;
        self.summary = None;
        Ok(())
    }

    /// Remote-style account lookup for bill categories. Not-found keeps
    /// the machine in `Input` and surfaces as a recoverable error.
    pub async fn lookup(&mut self) -> Result<CustomerRecord> {
        self.ensure_not_processing()?;
        let (category, identifier) = {
            let request = self.request_ref()?;
            if !request.category.requires_lookup() {
                return Err(PaymentError::InvalidInput(format!(
                    "{} has no account lookup",
                    request.category
                )));
            }
            let primary = schema::primary_field(request.category, request.variant());
            let identifier = request.field(primary).ok_or_else(|| {
                PaymentError::InvalidInput(format!("{primary} is required"))
            })?;
            (request.category, identifier.to_string())
        };

        let found = self.catalog.lookup_customer(category, &identifier).await?;
        match found {
            Some(record) => {
                let request = self.request_mut()?;
                request.customer = Some(record.clone());
                self.state = TxState::LookedUp;
                Ok(record)
            }
            None => {
                self.state = TxState::Input;
                Err(PaymentError::NotFound {
                    category: category.label().to_string(),
                    identifier,
                })
            }
        }
    }

    /// Checks required fields, the selected product or amount, and the
    /// ledger balance. Insufficient funds bounce back to `Input`.
    pub async fn validate(&mut self) -> Result<()> {
        self.ensure_not_processing()?;
        if !matches!(self.state, TxState::Input | TxState::LookedUp) {
            return Err(PaymentError::InvalidInput(
                "nothing to validate".to_string(),
            ));
        }
        let summary = self.build_summary()?;

        // Early feedback only; the authoritative check runs inside the
        // ledger's settlement critical section.
        let available = self.ledger.balance().await;
        if summary.total > available {
            self.state = TxState::Input;
            return Err(PaymentError::InsufficientBalance {
                required: summary.total,
                available,
            });
        }

        self.summary = Some(summary);
        self.state = TxState::Validated;
        Ok(())
    }

    /// Pushes the summary to the confirmation surface and waits for the
    /// user's confirm or cancel.
    pub fn review(&mut self) -> Result<Summary> {
        if self.state != TxState::Validated {
            return Err(PaymentError::InvalidInput(
                "nothing to review".to_string(),
            ));
        }
        let summary = self
            .summary
            .clone()
            .ok_or_else(|| PaymentError::InvalidInput("nothing to review".to_string()))?;
        self.surface.show_confirmation(&summary);
        self.state = TxState::Confirming;
        Ok(summary)
    }

    /// One-shot form submission: lookup where the category needs it,
    /// then validate, then move to `Confirming`.
    pub async fn submit(&mut self) -> Result<Summary> {
        self.ensure_not_processing()?;
        let needs_lookup = {
            let request = self.request_ref()?;
            request.category.requires_lookup() && request.customer.is_none()
        };
        if needs_lookup {
            self.lookup().await?;
        }
        self.validate().await?;
        self.review()
    }

    /// User backed out at the confirmation step. No ledger mutation has
    /// happened; terminal.
    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            TxState::Confirming => {
                self.state = TxState::Cancelled;
                self.request = None;
                self.summary = None;
                Ok(())
            }
            TxState::Processing => Err(PaymentError::AlreadyProcessing),
            _ => Err(PaymentError::InvalidInput("nothing to cancel".to_string())),
        }
    }

    /// User confirmed. Enters `Processing`; a second confirm while the
    /// settlement runs is rejected, which is what keeps the confirm
    /// control single-shot.
    pub fn confirm(&mut self) -> Result<()> {
        match self.state {
            TxState::Confirming => {
                self.state = TxState::Processing;
                self.surface.show_status(ProcessingStatus::Processing, None);
                Ok(())
            }
            TxState::Processing => Err(PaymentError::AlreadyProcessing),
            _ => Err(PaymentError::InvalidInput(
                "nothing to confirm".to_string(),
            )),
        }
    }

    /// Runs the simulated settlement: synthesize the receipt, then apply
    /// the ledger mutation as one unit. A failed debit means the whole
    /// transaction fails with no partial commission.
    pub async fn settle(&mut self) -> Result<Receipt> {
        if self.state != TxState::Processing {
            return Err(PaymentError::InvalidInput(
                "no transaction is processing".to_string(),
            ));
        }
        let summary = self
            .summary
            .clone()
            .ok_or_else(|| PaymentError::GatewayFailure("summary lost".to_string()))?;
        let request = self
            .request
            .clone()
            .ok_or_else(|| PaymentError::GatewayFailure("request lost".to_string()))?;

        let receipt = Receipt {
            ref_number: token::reference_number(summary.category),
            category: summary.category,
            target: summary.target.clone(),
            product_name: summary.product_name.clone(),
            amount: summary.amount,
            admin_fee: summary.admin_fee,
            commission: summary.commission,
            token: (summary.category == Category::ElectricityToken)
                .then(token::generate_token),
            received: summary.received,
        };

        let outcome = if summary.category == Category::Withdrawal {
            let destination = request
                .field("destination")
                .map(WithdrawalDestination::parse)
                .transpose()?
                .unwrap_or(WithdrawalDestination::MainBalance);
            let amount = Amount::new(summary.amount)?;
            self.ledger
                .withdraw(amount, destination == WithdrawalDestination::MainBalance)
                .await
        } else {
            let total = Amount::new(summary.total)?;
            self.ledger.settle(total, summary.commission).await
        };

        match outcome {
            Ok(()) => {
                self.state = TxState::Settled;
                self.receipt = Some(receipt.clone());
                self.surface
                    .show_status(ProcessingStatus::Success, Some(&receipt));
                Ok(receipt)
            }
            Err(err) => {
                self.state = TxState::Failed(fail_reason(&err));
                self.surface.show_status(ProcessingStatus::Failed, None);
                Err(err)
            }
        }
    }

    /// Confirm and settle in one call, for non-interactive callers.
    pub async fn execute(&mut self) -> Result<Receipt> {
        self.confirm()?;
        self.settle().await
    }

    fn ensure_not_processing(&self) -> Result<()> {
        if self.state == TxState::Processing {
            return Err(PaymentError::AlreadyProcessing);
        }
        Ok(())
    }

    fn request_ref(&self) -> Result<&TransactionRequest> {
        self.request
            .as_ref()
            .ok_or_else(|| PaymentError::InvalidInput("no transaction in progress".to_string()))
    }

    fn request_mut(&mut self) -> Result<&mut TransactionRequest> {
        self.request
            .as_mut()
            .ok_or_else(|| PaymentError::InvalidInput("no transaction in progress".to_string()))
    }

    /// Builds the confirmation summary from the validated request. Pure;
    /// no ledger access.
    fn build_summary(&self) -> Result<Summary> {
        let request = self.request_ref()?;
        let category = request.category;

        if category.requires_lookup() && request.customer.is_none() {
            return Err(PaymentError::InvalidInput(
                "customer lookup required".to_string(),
            ));
        }
        schema::validate_fields(request)?;
        self.check_directories(request)?;

        let primary = schema::primary_field(category, request.variant());
        let target = request
            .field(primary)
            .ok_or_else(|| PaymentError::InvalidInput(format!("{primary} is required")))?
            .to_string();

        let operator = request
            .field("phone")
            .and_then(|phone| self.catalog.detect_operator(phone))
            .map(|operator| operator.name.to_string());
        if category == Category::Pulsa && operator.is_none() {
            return Err(PaymentError::InvalidInput(
                "unrecognized operator prefix".to_string(),
            ));
        }

        let (product_name, amount, admin_fee, commission, received) = if category.is_bill() {
            let customer = request.customer.as_ref().ok_or_else(|| {
                PaymentError::InvalidInput("customer lookup required".to_string())
            })?;
            let name = format!("{} {}", category.label(), customer.period);
            (name, customer.bill_amount, customer.admin_fee, BILL_COMMISSION, None)
        } else if category == Category::Withdrawal {
            let amount = request.amount.ok_or_else(|| {
                PaymentError::InvalidInput("enter a withdrawal amount".to_string())
            })?;
            if amount < MIN_WITHDRAWAL {
                return Err(PaymentError::InvalidInput(format!(
                    "minimum withdrawal is {MIN_WITHDRAWAL}"
                )));
            }
            let destination = request
                .field("destination")
                .map(WithdrawalDestination::parse)
                .transpose()?
                .unwrap_or(WithdrawalDestination::MainBalance);
            let fee = match destination {
                WithdrawalDestination::MainBalance => Decimal::ZERO,
                WithdrawalDestination::BankTransfer => BANK_WITHDRAWAL_FEE,
            };
            let name = match destination {
                WithdrawalDestination::MainBalance => "Tarik Saldo Utama".to_string(),
                WithdrawalDestination::BankTransfer => "Tarik Saldo Bank".to_string(),
            };
            (name, amount, fee, Decimal::ZERO, Some(amount - fee))
        } else {
            let product = request.product.as_ref().ok_or_else(|| {
                PaymentError::InvalidInput("select a product".to_string())
            })?;
            (
                product.name.clone(),
                product.price,
                Decimal::ZERO,
                product.commission,
                None,
            )
        };

        // The withdrawal fee comes out of the requested amount, so the
        // ledger is only ever charged `amount` for withdrawals.
        let total = if category == Category::Withdrawal {
            amount
        } else {
            amount + admin_fee
        };

        Ok(Summary {
            category,
            product_name,
            target,
            customer_name: request.customer.as_ref().map(|c| c.name.clone()),
            operator,
            amount,
            admin_fee,
            commission,
            total,
            received,
        })
    }

    /// Provider and region fields must name a directory entry.
    fn check_directories(&self, request: &TransactionRequest) -> Result<()> {
        if let Some(provider) = request.field("provider")
            && !self
                .catalog
                .providers(request.category)
                .iter()
                .any(|p| p.id == provider)
        {
            return Err(PaymentError::InvalidInput(format!(
                "unknown provider: {provider}"
            )));
        }
        if request.category == Category::Pdam
            && let Some(region) = request.field("region")
            && !self
                .catalog
                .regions(request.category)
                .iter()
                .any(|r| r.id == region)
        {
            return Err(PaymentError::InvalidInput(format!(
                "unknown region: {region}"
            )));
        }
        Ok(())
    }
}

fn fail_reason(err: &PaymentError) -> FailReason {
    match err {
        PaymentError::InsufficientBalance { .. } => FailReason::InsufficientBalance,
        PaymentError::Timeout => FailReason::Timeout,
        _ => FailReason::GatewayFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalog;

    fn orchestrator(balance: Decimal) -> Orchestrator {
        Orchestrator::new(Box::new(MockCatalog::new()), Ledger::new(balance))
    }

    #[tokio::test]
    async fn test_confirm_without_review_is_rejected() {
        let mut orch = orchestrator(dec!(1_000_000));
        orch.begin(Category::Pulsa).unwrap();
        let err = orch.confirm().unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_lookup_on_prepaid_category_is_rejected() {
        let mut orch = orchestrator(dec!(1_000_000));
        orch.begin(Category::Pulsa).unwrap();
        orch.set_field("phone", "081234567890").unwrap();
        let err = orch.lookup().await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_editing_identifier_drops_stale_customer() {
        let mut orch = orchestrator(dec!(1_000_000));
        orch.begin(Category::ElectricityBill).unwrap();
        orch.set_field("meter_id", "14012345678").unwrap();
        orch.lookup().await.unwrap();
        assert_eq!(orch.state(), TxState::LookedUp);

        orch.set_field("meter_id", "14087654321").unwrap();
        assert_eq!(orch.state(), TxState::Input);
        let err = orch.validate().await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_pulsa_requires_known_operator_prefix() {
        let mut orch = orchestrator(dec!(1_000_000));
        orch.begin(Category::Pulsa).unwrap();
        orch.set_field("phone", "0999123456789").unwrap();
        orch.select_product("PLS10").unwrap();
        let err = orch.submit().await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let mut orch = orchestrator(dec!(1_000_000));
        orch.begin(Category::Pulsa).unwrap();
        let err = orch.select_product("PLS9999").unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_rejected() {
        let mut orch = orchestrator(dec!(1_000_000));
        orch.begin(Category::EWallet).unwrap();
        orch.set_field("phone", "081234567890").unwrap();
        orch.set_field("provider", "paypal").unwrap();
        orch.select_product("EWL50").unwrap();
        let err = orch.submit().await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }
}
