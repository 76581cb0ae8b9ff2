use std::{sync::Arc, time::Duration};

use gatehouse_auth::{AccountGate, AuthError, ErrorCode};
use gatehouse_lock::LockKey;
use gatehouse_store::{AccountFilter, AccountStore, InMemoryStore, StorageError};
use gatehouse_test_sdk::{
    auth::{account_gate, create_gate},
    random_username,
    storage::{faulty_store, in_memory_store, unique_store, FaultyStore},
};
use rstest::rstest;
use test_log::test;
use tokio::{task::JoinSet, time::timeout};

const WAIT: Duration = Duration::from_secs(2);

#[rstest]
#[test(tokio::test)]
async fn alice_registers_once_and_logs_in(account_gate: AccountGate<InMemoryStore>) {
    let gate = account_gate;

    assert_eq!(gate.register("alice", "pw1", "test").await.unwrap(), ErrorCode::Ok);
    assert_eq!(
        gate.register("alice", "pw2", "test").await.unwrap(),
        ErrorCode::AlreadyExists
    );

    let accepted = gate.login("alice", "pw1").await.unwrap();
    assert_eq!(accepted.error_code, ErrorCode::Ok);
    assert!(accepted.account_id.get() > 0);

    let rejected = gate.login("alice", "wrong").await.unwrap();
    assert_eq!(rejected.error_code, ErrorCode::InvalidCredentials);
    assert_eq!(rejected.account_id.get(), 0);

    assert_eq!(gate.store().len().await, 1);
    assert_eq!(gate.cache().len(), 1);
}

#[rstest]
#[case("", "pw")]
#[case("alice", "")]
#[case("", "")]
#[test_log::test(tokio::test)]
async fn empty_input_is_rejected_without_side_effects(
    account_gate: AccountGate<InMemoryStore>,
    #[case] username: &str,
    #[case] password: &str,
) {
    let gate = account_gate;

    assert_eq!(
        gate.register(username, password, "test").await.unwrap(),
        ErrorCode::InvalidArgument
    );

    let login = gate.login(username, password).await.unwrap();
    assert_eq!(login.error_code, ErrorCode::InvalidArgument);
    assert!(!login.account_id.is_assigned());

    assert!(gate.store().is_empty().await);
    assert!(gate.cache().is_empty());
    assert_eq!(gate.locks().active_slots(), 0);
}

#[rstest]
#[test(tokio::test)]
async fn empty_input_does_not_wait_for_the_lock(account_gate: AccountGate<InMemoryStore>) {
    let gate = account_gate;
    let _held = gate.locks().acquire(LockKey::register("")).await;

    let code = timeout(WAIT, gate.register("", "pw", "test")).await;

    assert!(matches!(code, Ok(Ok(ErrorCode::InvalidArgument))));
}

#[rstest]
#[test(tokio::test)]
async fn login_updates_last_login(account_gate: AccountGate<InMemoryStore>) {
    let gate = account_gate;
    gate.register("alice", "pw1", "test").await.unwrap();

    let response = gate.login("alice", "pw1").await.unwrap();

    let account = gate.store().get(response.account_id).await.unwrap();
    assert_eq!(account.username, "alice");
    assert!(account.last_login_at.is_some());
    assert!(account.last_login_at >= Some(account.created_at));
}

#[rstest]
#[test(tokio::test)]
async fn failed_login_changes_nothing(account_gate: AccountGate<InMemoryStore>) {
    let gate = account_gate;
    gate.register("alice", "pw1", "test").await.unwrap();

    let unknown = gate.login("bob", "pw1").await.unwrap();
    let wrong = gate.login("alice", "pw2").await.unwrap();

    assert_eq!(unknown.error_code, ErrorCode::InvalidCredentials);
    assert_eq!(wrong.error_code, ErrorCode::InvalidCredentials);

    let accounts = gate
        .store()
        .find_all(&AccountFilter::Username("alice"))
        .await;
    assert_eq!(accounts.len(), 1);
    assert!(accounts[0].last_login_at.is_none());
}

#[rstest]
#[test(tokio::test)]
async fn login_does_not_touch_the_cache(account_gate: AccountGate<InMemoryStore>) {
    let gate = account_gate;
    let mut account = gatehouse_store::Account::new("carol", "pw", "import");
    gate.store().save(&mut account).await.unwrap();

    assert_eq!(gate.login("carol", "pw").await.unwrap().error_code, ErrorCode::Ok);
    assert!(gate.cache().is_empty());

    // Known to the store only, still refused.
    assert_eq!(
        gate.register("carol", "pw", "test").await.unwrap(),
        ErrorCode::AlreadyExists
    );
}

#[rstest]
#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_registrations_admit_exactly_one(
    faulty_store: Arc<FaultyStore<InMemoryStore>>,
) {
    faulty_store.set_latency(Duration::from_millis(5));
    let gate = create_gate(faulty_store.clone());
    let username = random_username();

    let mut tasks = JoinSet::new();
    for i in 0..16 {
        let gate = gate.clone();
        let username = username.clone();
        tasks.spawn(async move { gate.register(&username, &format!("pw{i}"), "test").await });
    }

    let mut codes = Vec::new();
    while let Some(result) = tasks.join_next().await {
        codes.push(result.unwrap().unwrap());
    }

    assert_eq!(codes.iter().filter(|code| code.is_ok()).count(), 1);
    assert_eq!(
        codes
            .iter()
            .filter(|code| **code == ErrorCode::AlreadyExists)
            .count(),
        15
    );
    assert_eq!(
        faulty_store
            .inner()
            .find_all(&AccountFilter::Username(&username))
            .await
            .len(),
        1
    );
    assert_eq!(gate.locks().active_slots(), 0);
}

#[rstest]
#[test(tokio::test)]
async fn held_username_does_not_block_others(account_gate: AccountGate<InMemoryStore>) {
    let gate = account_gate;
    let held = gate.locks().acquire(LockKey::register("bob")).await;

    let alice = timeout(WAIT, gate.register("alice", "pw1", "test")).await;
    assert!(matches!(alice, Ok(Ok(ErrorCode::Ok))));

    let blocked = timeout(Duration::from_millis(50), gate.register("bob", "pw1", "test")).await;
    assert!(blocked.is_err());

    drop(held);

    let bob = timeout(WAIT, gate.register("bob", "pw1", "test")).await;
    assert!(matches!(bob, Ok(Ok(ErrorCode::Ok))));
}

#[rstest]
#[test(tokio::test)]
async fn login_and_register_do_not_wait_on_each_other(account_gate: AccountGate<InMemoryStore>) {
    let gate = account_gate;
    gate.register("alice", "pw1", "test").await.unwrap();

    {
        let _login = gate.locks().acquire(LockKey::login("alice")).await;
        let register = timeout(WAIT, gate.register("alice", "pw2", "test")).await;
        assert!(matches!(register, Ok(Ok(ErrorCode::AlreadyExists))));
    }

    let _register = gate.locks().acquire(LockKey::register("alice")).await;
    let login = timeout(WAIT, gate.login("alice", "pw1")).await;
    assert!(matches!(login, Ok(Ok(response)) if response.error_code.is_ok()));
}

#[rstest]
#[test(tokio::test)]
async fn save_failure_surfaces_and_releases_the_lock(
    faulty_store: Arc<FaultyStore<InMemoryStore>>,
) {
    let gate = create_gate(faulty_store.clone());

    faulty_store.fail_save(true);
    let failed = gate.register("alice", "pw1", "test").await;
    assert!(matches!(
        failed,
        Err(AuthError::StoreUnavailable(StorageError::Unavailable(_)))
    ));
    assert!(gate.cache().is_empty());
    assert_eq!(gate.locks().active_slots(), 0);

    faulty_store.fail_save(false);
    let retried = timeout(WAIT, gate.register("alice", "pw1", "test")).await;
    assert!(matches!(retried, Ok(Ok(ErrorCode::Ok))));
}

#[rstest]
#[test(tokio::test)]
async fn lookup_failures_are_not_reported_as_codes(
    faulty_store: Arc<FaultyStore<InMemoryStore>>,
) {
    let gate = create_gate(faulty_store.clone());

    faulty_store.fail_find_one(true);
    assert!(gate.login("alice", "pw1").await.is_err());

    faulty_store.fail_exists(true);
    assert!(gate.register("alice", "pw1", "test").await.is_err());

    faulty_store.fail_find_one(false);
    faulty_store.fail_exists(false);
    assert_eq!(
        gate.register("alice", "pw1", "test").await.unwrap(),
        ErrorCode::Ok
    );
    assert_eq!(gate.login("alice", "pw1").await.unwrap().error_code, ErrorCode::Ok);
}

#[rstest]
#[test(tokio::test(start_paused = true))]
async fn store_uniqueness_conflict_reads_as_already_exists(unique_store: Arc<InMemoryStore>) {
    let store = Arc::new(FaultyStore::new(unique_store.clone()));
    store.set_latency(Duration::from_millis(20));

    // Two gates stand for two processes sharing one database.
    let first = create_gate(store.clone());
    let second = create_gate(store.clone());

    let (a, b) = tokio::join!(
        first.register("alice", "pw1", "test"),
        second.register("alice", "pw2", "test"),
    );

    let mut codes = vec![a.unwrap(), b.unwrap()];
    codes.sort_by_key(|code| code.code());

    assert_eq!(codes, vec![ErrorCode::Ok, ErrorCode::AlreadyExists]);
    assert_eq!(unique_store.len().await, 1);
}

#[rstest]
#[test(tokio::test)]
async fn registration_fills_the_cache(in_memory_store: Arc<InMemoryStore>) {
    let gate = create_gate(in_memory_store.clone());

    gate.register("alice", "pw1", "signup-page").await.unwrap();

    let cached = gate.cache().try_get("alice").unwrap();
    assert_eq!(cached.source, "signup-page");
    assert_eq!(Some(cached), in_memory_store.get(gatehouse_store::AccountId::new(1)).await);
}
