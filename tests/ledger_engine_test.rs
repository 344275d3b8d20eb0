use std::sync::Arc;
use vaultboost::collaborators::{InMemoryBank, MemorySink, MemoryTwab};
use vaultboost::domain::WAD;
use vaultboost::{
    Address, Amount, BoostLedger, Config, LedgerError, RateMultiplier, SingleOwner, Timestamp,
    Token,
};

fn addr(s: &str) -> Address {
    Address::new(s.to_string())
}

fn token(s: &str) -> Token {
    Token::new(s.to_string())
}

fn rate(s: &str) -> RateMultiplier {
    s.parse().unwrap()
}

fn test_config() -> Config {
    Config {
        port: 0,
        owner: "owner".to_string(),
        beneficiary: "vault".to_string(),
        prize_token: "PRIZE".to_string(),
        booster_address: "booster".to_string(),
        period_quantized: false,
        twab_oracle_url: None,
        twab_period_seconds: 86400,
        twab_average_supply: 0,
    }
}

struct TestLedger {
    ledger: Arc<BoostLedger>,
    bank: Arc<InMemoryBank>,
}

fn setup(average_supply: u128) -> TestLedger {
    let config = test_config();
    let bank = Arc::new(InMemoryBank::new(addr("booster")));
    let sink = Arc::new(MemorySink::new());
    let twab = Arc::new(MemoryTwab::new(
        Amount::new(average_supply),
        config.twab_period_seconds,
    ));
    let auth = Arc::new(SingleOwner::new(addr("owner")));
    let ledger = Arc::new(BoostLedger::new(bank.clone(), sink, twab, auth, &config));
    TestLedger { ledger, bank }
}

#[tokio::test]
async fn test_flat_rate_accrues_linearly() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(1_000_000));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(7),
            Amount::ZERO,
            Timestamp::new(1000),
        )
        .await
        .unwrap();

    let available = t.ledger.accrue(&token("POOL"), Timestamp::new(1010)).await.unwrap();
    assert_eq!(available, Amount::new(70));

    let boost = t.ledger.boost_of(&token("POOL")).unwrap();
    assert_eq!(boost.available, Amount::new(70));
    assert_eq!(boost.last_accrued_at, Timestamp::new(1010));
}

#[tokio::test]
async fn test_flat_rate_clamps_to_balance() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(WAD));

    // 0.1e18 tokens per second against a 1e18 balance.
    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(WAD / 10),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    let at_five = t.ledger.accrue(&token("POOL"), Timestamp::new(5)).await.unwrap();
    assert_eq!(at_five, Amount::new(WAD / 2));

    let at_ten = t.ledger.accrue(&token("POOL"), Timestamp::new(10)).await.unwrap();
    assert_eq!(at_ten, Amount::new(WAD));

    // Past the clamp nothing more accrues.
    let at_twenty = t.ledger.accrue(&token("POOL"), Timestamp::new(20)).await.unwrap();
    assert_eq!(at_twenty, Amount::new(WAD));
}

#[tokio::test]
async fn test_supply_proportional_concrete_scenario() {
    // 0.02 multiplier, 5e18 average supply, 10 seconds -> 1e18.
    let t = setup(5 * WAD);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(100 * WAD));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            rate("0.02"),
            Amount::ZERO,
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    let available = t.ledger.accrue(&token("POOL"), Timestamp::new(10)).await.unwrap();
    assert_eq!(available, Amount::new(WAD));
}

#[tokio::test]
async fn test_composed_rates_accumulate_additively() {
    let t = setup(5 * WAD);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(100 * WAD));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            rate("0.02"),
            Amount::new(3),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    let available = t.ledger.accrue(&token("POOL"), Timestamp::new(10)).await.unwrap();
    assert_eq!(available, Amount::new(WAD + 30));
}

#[tokio::test]
async fn test_zero_elapsed_accrue_is_idempotent() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(1_000));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(10),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    let first = t.ledger.accrue(&token("POOL"), Timestamp::new(50)).await.unwrap();
    let after_first = t.ledger.boost_of(&token("POOL")).unwrap();
    let second = t.ledger.accrue(&token("POOL"), Timestamp::new(50)).await.unwrap();
    let after_second = t.ledger.boost_of(&token("POOL")).unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_last_accrued_at_never_moves_backward() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(1_000));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(10),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    t.ledger.accrue(&token("POOL"), Timestamp::new(50)).await.unwrap();
    // A stale timestamp is zero elapsed time, not a rewind.
    let available = t.ledger.accrue(&token("POOL"), Timestamp::new(20)).await.unwrap();
    assert_eq!(available, Amount::new(500));

    let boost = t.ledger.boost_of(&token("POOL")).unwrap();
    assert_eq!(boost.last_accrued_at, Timestamp::new(50));
}

#[tokio::test]
async fn test_seed_clamps_to_custody_balance() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(50));

    let boost = t
        .ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::ZERO,
            Amount::new(100),
            Timestamp::new(0),
        )
        .await
        .unwrap();

    assert_eq!(boost.available, Amount::new(50));
}

#[tokio::test]
async fn test_reconfigure_discards_pending_accrual() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(10_000));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(10),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    // 100 units accrued by t=10, never committed; the re-baseline drops them.
    let boost = t
        .ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(10),
            Amount::ZERO,
            Timestamp::new(10),
        )
        .await
        .unwrap();

    assert_eq!(boost.available, Amount::ZERO);
    assert_eq!(boost.last_accrued_at, Timestamp::new(10));
}

#[tokio::test]
async fn test_update_rates_commits_pending_accrual_under_old_rates() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(10_000));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(10),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    let boost = t
        .ledger
        .update_rates(
            &addr("owner"),
            &token("POOL"),
            RateMultiplier::ZERO,
            Amount::new(1),
            Timestamp::new(10),
        )
        .await
        .unwrap();

    // 10/s for 10s under the old rate, then 1/s going forward.
    assert_eq!(boost.available, Amount::new(100));
    assert_eq!(boost.tokens_per_second, Amount::new(1));

    let available = t.ledger.accrue(&token("POOL"), Timestamp::new(20)).await.unwrap();
    assert_eq!(available, Amount::new(110));
}

#[tokio::test]
async fn test_owner_gate_on_configuration() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(100));

    let err = t
        .ledger
        .set_boost(
            &addr("mallory"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::ZERO,
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));

    let err = t
        .ledger
        .update_rates(
            &addr("mallory"),
            &token("POOL"),
            RateMultiplier::ZERO,
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));
}

#[tokio::test]
async fn test_set_boost_rejects_null_identities() {
    let t = setup(0);

    let err = t
        .ledger
        .set_boost(
            &addr("owner"),
            &token(""),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::ZERO,
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidToken));

    let err = t
        .ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr(""),
            RateMultiplier::ZERO,
            Amount::ZERO,
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidCounterparty));
}

#[tokio::test]
async fn test_update_counterparty_is_a_pure_authorization_swap() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(1_000));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(10),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    t.ledger
        .update_counterparty(&addr("owner"), &token("POOL"), &addr("pair2"))
        .await
        .unwrap();

    let boost = t.ledger.boost_of(&token("POOL")).unwrap();
    assert_eq!(boost.liquidation_pair, addr("pair2"));
    // No accrual side effect.
    assert_eq!(boost.last_accrued_at, Timestamp::new(0));
    assert_eq!(boost.available, Amount::ZERO);
}

#[tokio::test]
async fn test_deposit_requires_configured_boost() {
    let t = setup(0);
    let err = t
        .ledger
        .deposit(&token("POOL"), Amount::new(10), &addr("alice"), Timestamp::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotBoosted(_)));
}

#[tokio::test]
async fn test_deposit_rejects_zero_amount() {
    let t = setup(0);
    let err = t
        .ledger
        .deposit(&token("POOL"), Amount::ZERO, &addr("alice"), Timestamp::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ZeroAmount));
}

#[tokio::test]
async fn test_deposit_prices_clamp_at_pre_deposit_balance() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("alice"), Amount::new(1_000));

    // Custody is empty at configuration time.
    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(10),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();

    // 100 units have notionally accrued by t=10, but the pre-deposit
    // balance is zero, so the committed available is zero.
    let available = t
        .ledger
        .deposit(&token("POOL"), Amount::new(1_000), &addr("alice"), Timestamp::new(10))
        .await
        .unwrap();
    assert_eq!(available, Amount::ZERO);
    assert_eq!(
        t.bank.balance(&token("POOL"), &addr("booster")),
        Amount::new(1_000)
    );

    // The deposited amount is not retroactively treated as accrued.
    let boost = t.ledger.boost_of(&token("POOL")).unwrap();
    assert_eq!(boost.available, Amount::ZERO);
    assert_eq!(boost.last_accrued_at, Timestamp::new(10));

    // Accrual resumes against the new balance going forward.
    let available = t.ledger.accrue(&token("POOL"), Timestamp::new(20)).await.unwrap();
    assert_eq!(available, Amount::new(100));
}

#[tokio::test]
async fn test_deposit_failure_leaves_state_unchanged() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(500));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::new(10),
            Amount::ZERO,
            Timestamp::new(0),
        )
        .await
        .unwrap();
    let before = t.ledger.boost_of(&token("POOL")).unwrap();
    let events_before = t.ledger.events().len();

    // Alice holds nothing: the custody pull fails after the accrual commit,
    // and the whole operation rolls back.
    let err = t
        .ledger
        .deposit(&token("POOL"), Amount::new(10), &addr("alice"), Timestamp::new(10))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Custody(_)));
    assert_eq!(t.ledger.boost_of(&token("POOL")).unwrap(), before);
    assert_eq!(t.ledger.events().len(), events_before);
}

#[tokio::test]
async fn test_withdraw_shrinks_available_to_remaining_balance() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(100));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            RateMultiplier::ZERO,
            Amount::ZERO,
            Amount::new(100),
            Timestamp::new(0),
        )
        .await
        .unwrap();

    let available = t
        .ledger
        .withdraw(&addr("owner"), &token("POOL"), Amount::new(40), Timestamp::new(0))
        .await
        .unwrap();

    assert_eq!(available, Amount::new(60));
    assert_eq!(t.bank.balance(&token("POOL"), &addr("owner")), Amount::new(40));
    assert_eq!(
        t.ledger.boost_of(&token("POOL")).unwrap().available,
        Amount::new(60)
    );
}

#[tokio::test]
async fn test_withdraw_requires_owner_and_nonzero_amount() {
    let t = setup(0);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(100));

    let err = t
        .ledger
        .withdraw(&addr("mallory"), &token("POOL"), Amount::new(1), Timestamp::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));

    let err = t
        .ledger
        .withdraw(&addr("owner"), &token("POOL"), Amount::ZERO, Timestamp::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ZeroAmount));
}

#[tokio::test]
async fn test_withdraw_rescues_unboosted_custody() {
    let t = setup(0);
    t.bank.mint(&token("STRAY"), &addr("booster"), Amount::new(25));

    let available = t
        .ledger
        .withdraw(&addr("owner"), &token("STRAY"), Amount::new(25), Timestamp::new(0))
        .await
        .unwrap();

    assert_eq!(available, Amount::ZERO);
    assert_eq!(t.bank.balance(&token("STRAY"), &addr("owner")), Amount::new(25));
    assert!(t.ledger.boost_of(&token("STRAY")).is_none());
}

#[tokio::test]
async fn test_available_never_exceeds_custody_balance() {
    let t = setup(2 * WAD);
    t.bank.mint(&token("POOL"), &addr("booster"), Amount::new(300));

    t.ledger
        .set_boost(
            &addr("owner"),
            &token("POOL"),
            &addr("pair"),
            rate("0.5"),
            Amount::new(50),
            Amount::new(200),
            Timestamp::new(0),
        )
        .await
        .unwrap();

    for now in [1u64, 3, 10, 50, 1_000] {
        let available = t.ledger.accrue(&token("POOL"), Timestamp::new(now)).await.unwrap();
        let balance = t.bank.balance(&token("POOL"), &addr("booster"));
        assert!(available <= balance, "available {} > balance {}", available, balance);
    }
}
