use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_with_registry, Histogram, IntCounterVec, IntGauge,
};

use lazy_static::lazy_static;

use crate::GATEHOUSE_METRIC_REGISTRY;

lazy_static! {
    pub static ref AUTH_LOGIN_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "auth_login_total",
        "Number of login requests by outcome.",
        &["outcome"],
        GATEHOUSE_METRIC_REGISTRY
    )
    .unwrap();
    pub static ref AUTH_REGISTER_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "auth_register_total",
        "Number of register requests by outcome.",
        &["outcome"],
        GATEHOUSE_METRIC_REGISTRY
    )
    .unwrap();
    pub static ref AUTH_LOCK_CONTENDED_TOTAL: IntCounterVec =
        register_int_counter_vec_with_registry!(
            "auth_lock_contended_total",
            "Number of account lock acquisitions that had to wait for another holder.",
            &["namespace"],
            GATEHOUSE_METRIC_REGISTRY
        )
        .unwrap();
    pub static ref AUTH_LOCK_WAIT_SECONDS: Histogram = register_histogram_with_registry!(
        "auth_lock_wait_seconds",
        "Time spent waiting for an account lock.",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0],
        GATEHOUSE_METRIC_REGISTRY
    )
    .unwrap();
    pub static ref AUTH_ACCOUNT_CACHE_SIZE: IntGauge = register_int_gauge_with_registry!(
        "auth_account_cache_size",
        "Number of accounts held in the registration cache.",
        GATEHOUSE_METRIC_REGISTRY
    )
    .unwrap();
}
