use std::{
    collections::HashMap,
    fmt,
    future::IntoFuture,
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use gatehouse_auth::{AuthClient, AuthService, ErrorCode, LoginRequest, RegisterRequest};
use gatehouse_config::GatehouseConfig;
use gatehouse_store::InMemoryStore;
use tokio::{spawn, task::JoinSet};
use tracing::{info, warn};

use self::commands::Stress;
use crate::tracing::setup_tracing;

pub(crate) mod commands;

const STRESS_SOURCE: &str = "stress";

/// Outcome of one stress run.
#[derive(Debug, Default)]
pub(crate) struct StressReport {
    pub(crate) users: usize,
    pub(crate) contenders: usize,
    pub(crate) registered: usize,
    pub(crate) duplicates: usize,
    pub(crate) logins_accepted: usize,
    pub(crate) logins_rejected: usize,
    pub(crate) failures: usize,
    /// Usernames that did not end up with exactly one successful registration
    pub(crate) mismatched: Vec<String>,
    pub(crate) elapsed: Duration,
}

impl StressReport {
    pub(crate) fn is_consistent(&self) -> bool {
        self.mismatched.is_empty() && self.failures == 0
    }
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "users: {}, contenders per user: {}, elapsed: {:?}",
            self.users, self.contenders, self.elapsed
        )?;
        writeln!(
            f,
            "registrations: {} ok, {} already existing",
            self.registered, self.duplicates
        )?;
        writeln!(
            f,
            "logins: {} accepted, {} rejected",
            self.logins_accepted, self.logins_rejected
        )?;
        write!(
            f,
            "failures: {}, usernames without exactly one success: {}",
            self.failures,
            self.mismatched.len()
        )
    }
}

#[derive(Debug)]
struct InconsistentRun {
    mismatched: usize,
    failures: usize,
}

impl fmt::Display for InconsistentRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} username(s) without exactly one account, {} failed request(s)",
            self.mismatched, self.failures
        )
    }
}

impl std::error::Error for InconsistentRun {}

pub(crate) async fn handle_command(
    cmd: Stress,
    verbose: u8,
    home: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing(verbose)?;

    let config = GatehouseConfig::load(home, Some(&cmd.auth), Some(&cmd.store))?;

    let store = Arc::new(
        InMemoryStore::new().with_unique_usernames(config.store.enforce_unique_usernames),
    );
    let (client, service) = AuthService::builder()
        .store(store)
        .config(&config.auth)
        .await?;
    let service = spawn(service.into_future());

    info!(
        "Stressing {} user(s) with {} contender(s) each",
        cmd.users, cmd.contenders
    );

    let report = run(&client, cmd.users, cmd.contenders, cmd.logins).await;

    client.shutdown().await?;
    service.await??;

    println!("{report}");
    println!("{}", gatehouse_metrics::gather_metrics());

    if report.is_consistent() {
        Ok(())
    } else {
        for username in &report.mismatched {
            warn!("Inconsistent registration for {username}");
        }

        Err(Box::new(InconsistentRun {
            mismatched: report.mismatched.len(),
            failures: report.failures,
        }))
    }
}

pub(crate) async fn run(
    client: &AuthClient,
    users: usize,
    contenders: usize,
    logins: usize,
) -> StressReport {
    let started = Instant::now();
    let mut report = StressReport {
        users,
        contenders,
        ..Default::default()
    };

    let mut registrations = JoinSet::new();
    for user in 0..users {
        for _ in 0..contenders {
            let client = client.clone();
            registrations.spawn(async move {
                let request =
                    RegisterRequest::new(username(user), password(user)).with_source(STRESS_SOURCE);

                (user, client.register(request).await)
            });
        }
    }

    let mut successes: HashMap<usize, usize> = HashMap::new();
    while let Some(joined) = registrations.join_next().await {
        match joined {
            Ok((user, Ok(response))) => match response.error_code {
                ErrorCode::Ok => {
                    report.registered += 1;
                    *successes.entry(user).or_default() += 1;
                }
                ErrorCode::AlreadyExists => report.duplicates += 1,
                other => {
                    warn!("Unexpected registration outcome {other}");
                    report.failures += 1;
                }
            },
            Ok((_, Err(error))) => {
                warn!("Registration failed: {error}");
                report.failures += 1;
            }
            Err(error) => {
                warn!("Registration task failed: {error}");
                report.failures += 1;
            }
        }
    }

    if contenders > 0 {
        report.mismatched = (0..users)
            .filter(|user| successes.get(user).copied().unwrap_or_default() != 1)
            .map(username)
            .collect();
    }

    let mut attempts = JoinSet::new();
    for user in 0..users {
        for attempt in 0..logins {
            let client = client.clone();
            attempts.spawn(async move {
                let password = if attempt % 2 == 0 {
                    password(user)
                } else {
                    format!("wrong-{}", password(user))
                };

                client
                    .login(LoginRequest::new(username(user), password))
                    .await
            });
        }
    }

    while let Some(joined) = attempts.join_next().await {
        match joined {
            Ok(Ok(response)) if response.error_code.is_ok() => report.logins_accepted += 1,
            Ok(Ok(_)) => report.logins_rejected += 1,
            Ok(Err(error)) => {
                warn!("Login failed: {error}");
                report.failures += 1;
            }
            Err(error) => {
                warn!("Login task failed: {error}");
                report.failures += 1;
            }
        }
    }

    report.elapsed = started.elapsed();

    report
}

fn username(user: usize) -> String {
    format!("stress-user-{user}")
}

fn password(user: usize) -> String {
    format!("password-{user}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    async fn client() -> AuthClient {
        let (client, service) = AuthService::builder()
            .store(Arc::new(InMemoryStore::new()))
            .lock_shards(16)
            .await
            .unwrap();
        spawn(service.into_future());

        client
    }

    #[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
    async fn every_user_registers_once() {
        let client = client().await;

        let report = run(&client, 10, 5, 4).await;

        assert!(report.is_consistent(), "{report}");
        assert_eq!(report.registered, 10);
        assert_eq!(report.duplicates, 40);
        assert_eq!(report.logins_accepted, 20);
        assert_eq!(report.logins_rejected, 20);
    }

    #[test(tokio::test)]
    async fn no_contenders_registers_nobody() {
        let client = client().await;

        let report = run(&client, 3, 0, 1).await;

        assert!(report.is_consistent());
        assert_eq!(report.registered, 0);
        assert_eq!(report.logins_rejected, 3);
    }
}
