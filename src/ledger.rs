use crate::error::{PaymentError, Result};
use crate::money::{Amount, Balance};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Commission accrued per reporting bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CommissionTotals {
    pub today: Balance,
    pub this_week: Balance,
    pub this_month: Balance,
}

/// Settled-transaction counters per reporting bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageStats {
    pub today: u64,
    pub this_week: u64,
    pub this_month: u64,
}

/// The merchant's money position. Mutated only through [`Ledger`]
/// operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerState {
    pub balance: Balance,
    pub main_balance: Balance,
    pub commission: CommissionTotals,
    pub stats: UsageStats,
}

/// Shared handle over the ledger state. Clones point at the same state;
/// every mutation happens under a single write lock, so the balance
/// check and the matching debit can never be split by another writer.
#[derive(Clone)]
pub struct Ledger {
    state: Arc<RwLock<LedgerState>>,
}

impl Ledger {
    pub fn new(opening_balance: Decimal) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                balance: Balance::new(opening_balance),
                main_balance: Balance::ZERO,
                commission: CommissionTotals::default(),
                stats: UsageStats::default(),
            })),
        }
    }

    pub async fn balance(&self) -> Decimal {
        self.state.read().await.balance.0
    }

    pub async fn main_balance(&self) -> Decimal {
        self.state.read().await.main_balance.0
    }

    pub async fn commission(&self) -> CommissionTotals {
        self.state.read().await.commission
    }

    pub async fn stats(&self) -> UsageStats {
        self.state.read().await.stats
    }

    pub async fn snapshot(&self) -> LedgerState {
        self.state.read().await.clone()
    }

    /// Check-and-set debit. Fails without mutating anything when the
    /// balance does not cover the amount.
    pub async fn debit(&self, amount: Amount) -> Result<()> {
        let mut state = self.state.write().await;
        Self::debit_locked(&mut state, amount)
    }

    /// Credit, for top-ups and refunds.
    pub async fn credit(&self, amount: Amount) {
        let mut state = self.state.write().await;
        state.balance += amount.into();
    }

    /// Adds to the named commission bucket. An unknown bucket name is an
    /// API misuse, reported as `InvalidPeriod`.
    pub async fn accrue_commission(&self, amount: Decimal, period: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let bucket = match period {
            "today" => &mut state.commission.today,
            "thisWeek" => &mut state.commission.this_week,
            "thisMonth" => &mut state.commission.this_month,
            other => return Err(PaymentError::InvalidPeriod(other.to_string())),
        };
        *bucket += Balance::new(amount);
        Ok(())
    }

    /// Increments the named settled-transaction counter.
    pub async fn increment_stats(&self, period: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let counter = match period {
            "today" => &mut state.stats.today,
            "thisWeek" => &mut state.stats.this_week,
            "thisMonth" => &mut state.stats.this_month,
            other => return Err(PaymentError::InvalidPeriod(other.to_string())),
        };
        *counter += 1;
        Ok(())
    }

    /// The Settled step as one critical section: debit the charged total,
    /// accrue today's commission and bump today's counter. A failed debit
    /// leaves all three untouched.
    pub async fn settle(&self, total: Amount, commission: Decimal) -> Result<()> {
        let mut state = self.state.write().await;
        Self::debit_locked(&mut state, total)?;
        state.commission.today += Balance::new(commission);
        state.stats.today += 1;
        Ok(())
    }

    /// Withdrawal settlement. Debits the requested amount; the internal
    /// branch additionally credits the main balance, in the same critical
    /// section.
    pub async fn withdraw(&self, amount: Amount, to_main: bool) -> Result<()> {
        let mut state = self.state.write().await;
        Self::debit_locked(&mut state, amount)?;
        if to_main {
            state.main_balance += amount.into();
        }
        state.stats.today += 1;
        Ok(())
    }

    fn debit_locked(state: &mut LedgerState, amount: Amount) -> Result<()> {
        if !state.balance.covers(amount) {
            return Err(PaymentError::InsufficientBalance {
                required: amount.value(),
                available: state.balance.0,
            });
        }
        state.balance -= amount.into();
        Ok(())
    }
}
