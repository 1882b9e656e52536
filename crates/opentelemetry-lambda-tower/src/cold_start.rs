//! Cold start detection for Lambda functions.

use std::sync::atomic::{AtomicBool, Ordering};

const INITIALIZATION_TYPE_ENV_VAR: &str = "AWS_LAMBDA_INITIALIZATION_TYPE";
const PROVISIONED_CONCURRENCY: &str = "provisioned-concurrency";

static IS_COLD_START: AtomicBool = AtomicBool::new(true);

/// Returns `true` for the first invocation in this execution environment.
///
/// Exactly one caller observes `true`. Environments initialised for
/// provisioned concurrency are pre-warmed and never report a cold start.
///
/// ```
/// use opentelemetry_lambda_tower::check_cold_start;
///
/// let _ = check_cold_start();
/// assert!(!check_cold_start());
/// ```
pub fn check_cold_start() -> bool {
    let was_cold = IS_COLD_START.swap(false, Ordering::SeqCst);
    was_cold && !is_provisioned_concurrency()
}

fn is_provisioned_concurrency() -> bool {
    std::env::var(INITIALIZATION_TYPE_ENV_VAR).is_ok_and(|value| value == PROVISIONED_CONCURRENCY)
}

#[cfg(test)]
pub(crate) fn reset_cold_start_for_testing() {
    IS_COLD_START.store(true, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_only_first_invocation_is_cold() {
        reset_cold_start_for_testing();

        temp_env::with_var_unset(INITIALIZATION_TYPE_ENV_VAR, || {
            assert!(check_cold_start());
            assert!(!check_cold_start());
            assert!(!check_cold_start());
        });
    }

    #[test]
    #[serial]
    fn test_provisioned_concurrency_is_never_cold() {
        reset_cold_start_for_testing();

        temp_env::with_var(
            INITIALIZATION_TYPE_ENV_VAR,
            Some(PROVISIONED_CONCURRENCY),
            || {
                assert!(!check_cold_start());
                assert!(!check_cold_start());
            },
        );
    }

    #[test]
    #[serial]
    fn test_on_demand_is_cold() {
        reset_cold_start_for_testing();

        temp_env::with_var(INITIALIZATION_TYPE_ENV_VAR, Some("on-demand"), || {
            assert!(check_cold_start());
        });
    }
}
