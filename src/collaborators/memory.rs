//! In-memory collaborators for local wiring and tests.

use super::{ContributionSink, Custody, CustodyError, OracleError, SinkError, SupplyOracle};
use crate::domain::{Address, Amount, Timestamp, Token};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

type TransferObserver = Box<dyn Fn(&Token, &Address, Amount) + Send + Sync>;

/// In-memory token bank implementing the custody capability.
///
/// `balance_of` answers for the custodian account the bank was scoped to.
/// An optional transfer observer fires during each outbound transfer,
/// after balances are applied; reentrancy tests use it to read the ledger
/// mid-transfer the way a hostile token callback would.
pub struct InMemoryBank {
    custodian: Address,
    balances: Mutex<HashMap<(Token, Address), Amount>>,
    transfer_observer: Mutex<Option<TransferObserver>>,
}

impl InMemoryBank {
    /// Create a bank scoped to the given custodian account.
    pub fn new(custodian: Address) -> Self {
        Self {
            custodian,
            balances: Mutex::new(HashMap::new()),
            transfer_observer: Mutex::new(None),
        }
    }

    /// Credit `amount` of `token` to `holder` out of thin air.
    pub fn mint(&self, token: &Token, holder: &Address, amount: Amount) {
        let mut balances = self.balances.lock().expect("bank lock poisoned");
        let entry = balances
            .entry((token.clone(), holder.clone()))
            .or_insert(Amount::ZERO);
        *entry = entry.saturating_add(amount);
    }

    /// Current balance of `holder` for `token`.
    pub fn balance(&self, token: &Token, holder: &Address) -> Amount {
        let balances = self.balances.lock().expect("bank lock poisoned");
        balances
            .get(&(token.clone(), holder.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Install a hook invoked during each outbound transfer.
    pub fn set_transfer_observer(
        &self,
        observer: impl Fn(&Token, &Address, Amount) + Send + Sync + 'static,
    ) {
        let mut slot = self.transfer_observer.lock().expect("bank lock poisoned");
        *slot = Some(Box::new(observer));
    }

    fn debit(
        balances: &mut HashMap<(Token, Address), Amount>,
        token: &Token,
        holder: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let entry = balances
            .entry((token.clone(), holder.clone()))
            .or_insert(Amount::ZERO);
        match entry.checked_sub(amount) {
            Some(remaining) => {
                *entry = remaining;
                Ok(())
            }
            None => Err(CustodyError::InsufficientBalance {
                token: token.clone(),
                requested: amount,
                held: *entry,
            }),
        }
    }

    fn credit(
        balances: &mut HashMap<(Token, Address), Amount>,
        token: &Token,
        holder: &Address,
        amount: Amount,
    ) {
        let entry = balances
            .entry((token.clone(), holder.clone()))
            .or_insert(Amount::ZERO);
        *entry = entry.saturating_add(amount);
    }
}

impl fmt::Debug for InMemoryBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryBank")
            .field("custodian", &self.custodian)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Custody for InMemoryBank {
    async fn balance_of(&self, token: &Token) -> Result<Amount, CustodyError> {
        Ok(self.balance(token, &self.custodian))
    }

    async fn transfer(
        &self,
        token: &Token,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        {
            let mut balances = self.balances.lock().expect("bank lock poisoned");
            Self::debit(&mut balances, token, &self.custodian, amount)?;
            Self::credit(&mut balances, token, to, amount);
        }
        // Balance lock released first: the observer may read balances back.
        let observer = self.transfer_observer.lock().expect("bank lock poisoned");
        if let Some(observer) = observer.as_ref() {
            observer(token, to, amount);
        }
        Ok(())
    }

    async fn transfer_from(
        &self,
        token: &Token,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let mut balances = self.balances.lock().expect("bank lock poisoned");
        Self::debit(&mut balances, token, from, amount)?;
        Self::credit(&mut balances, token, to, amount);
        Ok(())
    }
}

/// Recording contribution sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    contributions: Mutex<HashMap<Address, Amount>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total contributed to `beneficiary` so far.
    pub fn contributed_to(&self, beneficiary: &Address) -> Amount {
        let contributions = self.contributions.lock().expect("sink lock poisoned");
        contributions
            .get(beneficiary)
            .copied()
            .unwrap_or(Amount::ZERO)
    }
}

#[async_trait]
impl ContributionSink for MemorySink {
    async fn contribute(&self, beneficiary: &Address, amount: Amount) -> Result<Amount, SinkError> {
        let mut contributions = self.contributions.lock().expect("sink lock poisoned");
        let entry = contributions
            .entry(beneficiary.clone())
            .or_insert(Amount::ZERO);
        *entry = entry.saturating_add(amount);
        Ok(amount)
    }
}

/// Fixed average-supply oracle with an aligned period grid.
#[derive(Debug)]
pub struct MemoryTwab {
    average_supply: Mutex<Amount>,
    period_length: u64,
}

impl MemoryTwab {
    /// Create an oracle reporting `average_supply` for every window, with
    /// period boundaries at multiples of `period_length` seconds.
    pub fn new(average_supply: Amount, period_length: u64) -> Self {
        Self {
            average_supply: Mutex::new(average_supply),
            period_length: period_length.max(1),
        }
    }

    /// Change the reported average supply (scripted tests).
    pub fn set_average_supply(&self, average_supply: Amount) {
        let mut slot = self.average_supply.lock().expect("twab lock poisoned");
        *slot = average_supply;
    }
}

#[async_trait]
impl SupplyOracle for MemoryTwab {
    async fn integrated_supply_between(
        &self,
        _beneficiary: &Address,
        _from: Timestamp,
        _to: Timestamp,
    ) -> Result<Amount, OracleError> {
        Ok(*self.average_supply.lock().expect("twab lock poisoned"))
    }

    async fn period_boundary_at_or_after(&self, at: Timestamp) -> Result<Timestamp, OracleError> {
        let secs = at.as_secs();
        let length = self.period_length;
        if secs % length == 0 {
            return Ok(at);
        }
        Ok(Timestamp::new((secs / length + 1) * length))
    }

    async fn period_length(&self) -> Result<u64, OracleError> {
        Ok(self.period_length)
    }
}
