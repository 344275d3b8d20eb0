use crate::auth::{Authorization, NotOwner};
use crate::collaborators::{ContributionSink, Custody, CustodyError, OracleError, SinkError, SupplyOracle};
use crate::config::Config;
use crate::domain::{
    Address, Amount, Boost, LiquidationReceipt, RateMultiplier, Timestamp, Token,
};
use crate::engine::accrual::{project_available, AccrualWindow};
use crate::engine::LedgerEvent;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid token identifier")]
    InvalidToken,
    #[error("invalid counterparty address")]
    InvalidCounterparty,
    #[error("caller {0} is not authorized")]
    Unauthorized(Address),
    #[error("token {0} has no boost configured")]
    NotBoosted(Token),
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("unsupported reference token {0}")]
    UnsupportedReferenceToken(Token),
    #[error("insufficient available balance: requested {requested}, available {available}")]
    InsufficientAvailable {
        requested: Amount,
        available: Amount,
    },
    #[error("receipt does not match the draw it claims to settle")]
    ReceiptMismatch,
    #[error(transparent)]
    Custody(#[from] CustodyError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl From<NotOwner> for LedgerError {
    fn from(err: NotOwner) -> Self {
        LedgerError::Unauthorized(err.caller)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    boosts: HashMap<Token, Boost>,
    events: Vec<LedgerEvent>,
}

/// The accrual and liquidation accounting ledger.
///
/// Mutating operations are serialized by an operation mutex. Record state
/// sits behind a read-write lock that is never held across an await, and
/// every operation commits its bookkeeping before issuing an external
/// transfer: a reader arriving while a transfer is in flight observes the
/// already-committed post-operation state. If the transfer then fails, the
/// operation restores the prior record and re-raises, so callers only ever
/// see all-or-nothing outcomes.
#[derive(Debug)]
pub struct BoostLedger {
    state: RwLock<LedgerState>,
    op_lock: Mutex<()>,
    custody: Arc<dyn Custody>,
    sink: Arc<dyn ContributionSink>,
    oracle: Arc<dyn SupplyOracle>,
    auth: Arc<dyn Authorization>,
    beneficiary: Address,
    prize_token: Token,
    address: Address,
    period_quantized: bool,
}

impl BoostLedger {
    pub fn new(
        custody: Arc<dyn Custody>,
        sink: Arc<dyn ContributionSink>,
        oracle: Arc<dyn SupplyOracle>,
        auth: Arc<dyn Authorization>,
        config: &Config,
    ) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            op_lock: Mutex::new(()),
            custody,
            sink,
            oracle,
            auth,
            beneficiary: Address::new(config.beneficiary.clone()),
            prize_token: Token::new(config.prize_token.clone()),
            address: Address::new(config.booster_address.clone()),
            period_quantized: config.period_quantized,
        }
    }

    /// Configure (or fully replace) the boost for `token`.
    ///
    /// Re-baseline semantics: the prior record is discarded unconditionally,
    /// including accrued-but-uncommitted value. Callers that want to keep
    /// pending accrual call `accrue` first themselves.
    pub async fn set_boost(
        &self,
        caller: &Address,
        token: &Token,
        pair: &Address,
        rate_multiplier: RateMultiplier,
        tokens_per_second: Amount,
        seed_available: Amount,
        now: Timestamp,
    ) -> Result<Boost, LedgerError> {
        self.auth.ensure_owner(caller)?;
        if token.is_unset() {
            return Err(LedgerError::InvalidToken);
        }
        if pair.is_unset() {
            return Err(LedgerError::InvalidCounterparty);
        }

        let _op = self.op_lock.lock().await;
        let balance = self.custody.balance_of(token).await?;
        let boost = Boost {
            liquidation_pair: pair.clone(),
            rate_multiplier,
            tokens_per_second,
            available: seed_available.min(balance),
            last_accrued_at: now,
        };

        {
            let mut state = self.state.write().expect("ledger state lock poisoned");
            state.boosts.insert(token.clone(), boost.clone());
            state.events.push(LedgerEvent::CounterpartySet {
                token: token.clone(),
                pair: pair.clone(),
            });
            state.events.push(LedgerEvent::BoostConfigured {
                token: token.clone(),
                pair: pair.clone(),
                rate_multiplier,
                tokens_per_second,
                available: boost.available,
            });
        }

        tracing::info!(
            token = %token,
            pair = %pair,
            rate_multiplier = %rate_multiplier,
            tokens_per_second = %tokens_per_second,
            available = %boost.available,
            "boost configured"
        );
        Ok(boost)
    }

    /// Swap rate parameters without re-baselining: pending accrual is
    /// committed under the old rates first.
    pub async fn update_rates(
        &self,
        caller: &Address,
        token: &Token,
        rate_multiplier: RateMultiplier,
        tokens_per_second: Amount,
        now: Timestamp,
    ) -> Result<Boost, LedgerError> {
        self.auth.ensure_owner(caller)?;
        let _op = self.op_lock.lock().await;
        let available = self.accrue_held(token, now).await?;

        let boost = {
            let mut state = self.state.write().expect("ledger state lock poisoned");
            let record = state
                .boosts
                .get_mut(token)
                .ok_or_else(|| LedgerError::NotBoosted(token.clone()))?;
            record.rate_multiplier = rate_multiplier;
            record.tokens_per_second = tokens_per_second;
            let boost = record.clone();
            state.events.push(LedgerEvent::RatesUpdated {
                token: token.clone(),
                rate_multiplier,
                tokens_per_second,
                available,
            });
            boost
        };

        tracing::info!(
            token = %token,
            rate_multiplier = %rate_multiplier,
            tokens_per_second = %tokens_per_second,
            "rates updated"
        );
        Ok(boost)
    }

    /// Swap the liquidation pair with no accrual side effect.
    pub async fn update_counterparty(
        &self,
        caller: &Address,
        token: &Token,
        pair: &Address,
    ) -> Result<(), LedgerError> {
        self.auth.ensure_owner(caller)?;
        if pair.is_unset() {
            return Err(LedgerError::InvalidCounterparty);
        }

        let _op = self.op_lock.lock().await;
        {
            let mut state = self.state.write().expect("ledger state lock poisoned");
            let record = state
                .boosts
                .get_mut(token)
                .ok_or_else(|| LedgerError::NotBoosted(token.clone()))?;
            record.liquidation_pair = pair.clone();
            state.events.push(LedgerEvent::CounterpartyUpdated {
                token: token.clone(),
                pair: pair.clone(),
            });
        }

        tracing::info!(token = %token, pair = %pair, "counterparty updated");
        Ok(())
    }

    /// Commit the accrual projection for `token` through `now`.
    ///
    /// Idempotent: a second call with the same `now` sees zero elapsed time
    /// and changes nothing.
    pub async fn accrue(&self, token: &Token, now: Timestamp) -> Result<Amount, LedgerError> {
        let _op = self.op_lock.lock().await;
        self.accrue_held(token, now).await
    }

    /// Read-only accrual projection: what `accrue` would commit at `now`.
    pub async fn compute_available(
        &self,
        token: &Token,
        now: Timestamp,
    ) -> Result<(Amount, Timestamp), LedgerError> {
        let boost = self.read_boost(token)?;
        self.project(token, &boost, now).await
    }

    /// Move `amount` of `token` from `from` into custody.
    ///
    /// Accrual is committed first so the clamp prices in the pre-deposit
    /// balance; the deposited amount is not itself treated as accrued.
    pub async fn deposit(
        &self,
        token: &Token,
        amount: Amount,
        from: &Address,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let _op = self.op_lock.lock().await;
        let prior = self.read_boost(token)?;
        let events_len = self.events_len();
        let available = self.accrue_held(token, now).await?;

        if let Err(e) = self
            .custody
            .transfer_from(token, from, &self.address, amount)
            .await
        {
            self.restore(token, Some(prior), events_len);
            return Err(e.into());
        }

        {
            let mut state = self.state.write().expect("ledger state lock poisoned");
            state.events.push(LedgerEvent::Deposited {
                token: token.clone(),
                from: from.clone(),
                amount,
                available,
            });
        }

        tracing::info!(token = %token, from = %from, amount = %amount, "deposited");
        Ok(available)
    }

    /// Owner withdrawal out of custody.
    ///
    /// Accrues first, then clamps `available` against the balance that will
    /// remain after the withdrawal: draining custody can shrink `available`
    /// below its accrued value, never raise it. For a token with no boost
    /// record, the transfer alone runs (owner rescue of unboosted custody).
    pub async fn withdraw(
        &self,
        caller: &Address,
        token: &Token,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        self.auth.ensure_owner(caller)?;
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let _op = self.op_lock.lock().await;
        let prior = self.boost_of(token);
        let events_len = self.events_len();

        let available = match &prior {
            Some(boost) => {
                let (accrued, accrued_at) = self.project(token, boost, now).await?;
                let balance = self.custody.balance_of(token).await?;
                let clamped = accrued.min(balance.saturating_sub(amount));
                let mut state = self.state.write().expect("ledger state lock poisoned");
                let record = state
                    .boosts
                    .get_mut(token)
                    .ok_or_else(|| LedgerError::NotBoosted(token.clone()))?;
                record.available = clamped;
                record.last_accrued_at = accrued_at;
                clamped
            }
            None => Amount::ZERO,
        };

        if let Err(e) = self.custody.transfer(token, caller, amount).await {
            self.restore(token, prior, events_len);
            return Err(e.into());
        }

        {
            let mut state = self.state.write().expect("ledger state lock poisoned");
            state.events.push(LedgerEvent::Withdrawn {
                token: token.clone(),
                to: caller.clone(),
                amount,
                available,
            });
        }

        tracing::info!(token = %token, to = %caller, amount = %amount, available = %available, "withdrawn");
        Ok(available)
    }

    /// The amount the liquidation pair may draw right now.
    ///
    /// Deliberately the committing read: callers rely on it as the commit
    /// point before a draw, so it delegates to `accrue` rather than the
    /// pure projection.
    pub async fn liquidatable_balance_of(
        &self,
        token: &Token,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        self.accrue(token, now).await
    }

    /// The liquidation draw: release `amount_out` of `token` to `receiver`.
    ///
    /// Bookkeeping is committed before the custody transfer is issued, so a
    /// reentrant read during the transfer observes the reduced state.
    pub async fn transfer_out(
        &self,
        caller: &Address,
        receiver: &Address,
        token: &Token,
        amount_out: Amount,
        now: Timestamp,
    ) -> Result<LiquidationReceipt, LedgerError> {
        let _op = self.op_lock.lock().await;
        let prior = self
            .boost_of(token)
            .filter(|b| b.liquidation_pair == *caller)
            .ok_or_else(|| LedgerError::Unauthorized(caller.clone()))?;

        let (accrued, accrued_at) = self.project(token, &prior, now).await?;
        if amount_out > accrued {
            return Err(LedgerError::InsufficientAvailable {
                requested: amount_out,
                available: accrued,
            });
        }
        let remaining = accrued.saturating_sub(amount_out);
        let events_len = self.events_len();

        {
            let mut state = self.state.write().expect("ledger state lock poisoned");
            let record = state
                .boosts
                .get_mut(token)
                .ok_or_else(|| LedgerError::NotBoosted(token.clone()))?;
            record.available = remaining;
            record.last_accrued_at = accrued_at;
        }

        if let Err(e) = self.custody.transfer(token, receiver, amount_out).await {
            self.restore(token, Some(prior), events_len);
            return Err(e.into());
        }

        {
            let mut state = self.state.write().expect("ledger state lock poisoned");
            state.events.push(LedgerEvent::Liquidated {
                token: token.clone(),
                receiver: receiver.clone(),
                amount_out,
                available: remaining,
            });
        }

        tracing::info!(
            token = %token,
            receiver = %receiver,
            amount_out = %amount_out,
            available = %remaining,
            "liquidated"
        );
        Ok(LiquidationReceipt::new(token.clone(), amount_out, accrued_at))
    }

    /// The settlement half of a draw: forward `amount_in` of the reference
    /// token to the contribution sink, attributed to the beneficiary.
    pub async fn verify_contribution(
        &self,
        caller: &Address,
        reference_token: &Token,
        amount_in: Amount,
        receipt: &LiquidationReceipt,
    ) -> Result<Amount, LedgerError> {
        if *reference_token != self.prize_token {
            return Err(LedgerError::UnsupportedReferenceToken(
                reference_token.clone(),
            ));
        }

        let _op = self.op_lock.lock().await;
        self.boost_of(&receipt.token)
            .filter(|b| b.liquidation_pair == *caller)
            .ok_or_else(|| LedgerError::Unauthorized(caller.clone()))?;
        if !receipt.is_intact() {
            return Err(LedgerError::ReceiptMismatch);
        }

        let committed = self.sink.contribute(&self.beneficiary, amount_in).await?;
        tracing::info!(
            token = %receipt.token,
            caller = %caller,
            amount_in = %amount_in,
            committed = %committed,
            "contribution verified"
        );
        Ok(committed)
    }

    /// Identity of the contribution target for the reference token.
    pub fn target_of(&self, reference_token: &Token) -> Result<Address, LedgerError> {
        if *reference_token != self.prize_token {
            return Err(LedgerError::UnsupportedReferenceToken(
                reference_token.clone(),
            ));
        }
        Ok(self.beneficiary.clone())
    }

    /// Current record for `token`, if boosted.
    pub fn boost_of(&self, token: &Token) -> Option<Boost> {
        let state = self.state.read().expect("ledger state lock poisoned");
        state.boosts.get(token).cloned()
    }

    /// Snapshot of the audit event log.
    pub fn events(&self) -> Vec<LedgerEvent> {
        let state = self.state.read().expect("ledger state lock poisoned");
        state.events.clone()
    }

    pub fn beneficiary(&self) -> &Address {
        &self.beneficiary
    }

    pub fn prize_token(&self) -> &Token {
        &self.prize_token
    }

    /// Accrue with the operation lock already held.
    async fn accrue_held(&self, token: &Token, now: Timestamp) -> Result<Amount, LedgerError> {
        let boost = self.read_boost(token)?;
        let (available, accrued_at) = self.project(token, &boost, now).await?;

        {
            let mut state = self.state.write().expect("ledger state lock poisoned");
            let record = state
                .boosts
                .get_mut(token)
                .ok_or_else(|| LedgerError::NotBoosted(token.clone()))?;
            record.available = available;
            record.last_accrued_at = accrued_at;
            state.events.push(LedgerEvent::Accrued {
                token: token.clone(),
                available,
                accrued_at,
            });
        }

        tracing::debug!(token = %token, available = %available, accrued_at = %accrued_at, "accrued");
        Ok(available)
    }

    /// Projection of `boost` through `now`: the 5-step availability
    /// algorithm. Queries no collaborator when zero time has elapsed.
    async fn project(
        &self,
        token: &Token,
        boost: &Boost,
        now: Timestamp,
    ) -> Result<(Amount, Timestamp), LedgerError> {
        if now.elapsed_since(boost.last_accrued_at) == 0 {
            return Ok((boost.available, boost.last_accrued_at));
        }

        let accrued_at = if self.period_quantized {
            self.closed_period_end(now).await?
        } else {
            now
        };
        // In quantized mode the window only moves once a period has fully
        // closed past the last accrual point.
        if accrued_at.elapsed_since(boost.last_accrued_at) == 0 {
            return Ok((boost.available, boost.last_accrued_at));
        }

        let integrated_supply = if boost.rate_multiplier.is_zero() {
            Amount::ZERO
        } else {
            self.oracle
                .integrated_supply_between(&self.beneficiary, boost.last_accrued_at, accrued_at)
                .await?
        };
        let balance = self.custody.balance_of(token).await?;

        let window = AccrualWindow {
            accrued_at,
            integrated_supply,
            balance,
        };
        Ok((project_available(boost, &window), accrued_at))
    }

    /// Latest fully-closed period boundary at or before `now`.
    async fn closed_period_end(&self, now: Timestamp) -> Result<Timestamp, LedgerError> {
        let boundary = self.oracle.period_boundary_at_or_after(now).await?;
        if boundary <= now {
            return Ok(boundary);
        }
        let length = self.oracle.period_length().await?;
        Ok(Timestamp::new(boundary.as_secs().saturating_sub(length)))
    }

    fn read_boost(&self, token: &Token) -> Result<Boost, LedgerError> {
        self.boost_of(token)
            .ok_or_else(|| LedgerError::NotBoosted(token.clone()))
    }

    fn events_len(&self) -> usize {
        let state = self.state.read().expect("ledger state lock poisoned");
        state.events.len()
    }

    /// Roll a failed operation back to its pre-operation record and event
    /// log. Only called with the operation lock held, so nothing else can
    /// have appended in between.
    fn restore(&self, token: &Token, prior: Option<Boost>, events_len: usize) {
        let mut state = self.state.write().expect("ledger state lock poisoned");
        match prior {
            Some(boost) => {
                state.boosts.insert(token.clone(), boost);
            }
            None => {
                state.boosts.remove(token);
            }
        }
        state.events.truncate(events_len);
    }
}
