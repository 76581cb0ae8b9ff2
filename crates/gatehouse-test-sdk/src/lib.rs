pub mod auth;
pub mod storage;

use rand::{distributions::Alphanumeric, Rng};

/// Random username, unique enough for tests sharing one store.
pub fn random_username() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();

    format!("user-{suffix}")
}
