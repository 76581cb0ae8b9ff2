use crate::{gather_metrics, AUTH_LOCK_CONTENDED_TOTAL, AUTH_REGISTER_TOTAL};

#[test]
fn register_outcomes_are_labelled() {
    let m = &AUTH_REGISTER_TOTAL;
    let before = m.with_label_values(&["already_exists"]).get();

    m.with_label_values(&["already_exists"]).inc();

    assert_eq!(
        m.get_metric_with_label_values(&["already_exists"]).unwrap().get(),
        before + 1
    );
}

#[test]
fn gathered_metrics_use_the_gatehouse_prefix() {
    AUTH_LOCK_CONTENDED_TOTAL.with_label_values(&["register"]).inc();

    let text = gather_metrics();

    assert!(text.contains("gatehouse_auth_lock_contended_total"));
}
