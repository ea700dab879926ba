use kiospay::catalog::MockCatalog;
use kiospay::ledger::Ledger;
use kiospay::orchestrator::Orchestrator;
use rust_decimal::Decimal;

/// Fresh orchestrator plus a handle on the ledger it settles against.
pub fn engine(opening_balance: Decimal) -> (Orchestrator, Ledger) {
    let ledger = Ledger::new(opening_balance);
    let orchestrator = Orchestrator::new(Box::new(MockCatalog::new()), ledger.clone());
    (orchestrator, ledger)
}
