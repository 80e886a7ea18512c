use chrono::{DateTime, Duration, Utc};

/// Whether a reconciliation pass may run now
///
/// Uses rolling elapsed time since the last executed pass. A last run that lies
/// in the future (clock skew) gives a negative elapsed time and blocks the pass
/// until the clock catches up.
pub fn should_run(last_run: Option<DateTime<Utc>>, now: DateTime<Utc>, min_interval: Duration, force: bool) -> bool {
    if force {
        return true;
    }
    match last_run {
        None => true,
        Some(last) => now.signed_duration_since(last) >= min_interval,
    }
}

/// Earliest time a non-forced pass would be allowed
pub fn next_eligible_run(last_run: Option<DateTime<Utc>>, min_interval: Duration) -> Option<DateTime<Utc>> {
    last_run.map(|last| last + min_interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_previous_run_always_runs() {
        assert!(should_run(None, now(), Duration::hours(1), false));
        assert!(should_run(None, now(), Duration::hours(1), true));
    }

    #[test]
    fn test_force_always_runs() {
        let just_now = Some(now());
        assert!(should_run(just_now, now(), Duration::hours(24), true));
        assert!(should_run(Some(now() + Duration::hours(3)), now(), Duration::hours(1), true));
    }

    #[test]
    fn test_rolling_interval() {
        let hour = Duration::hours(1);
        assert!(!should_run(Some(now() - Duration::minutes(30)), now(), hour, false));
        assert!(should_run(Some(now() - Duration::minutes(90)), now(), hour, false));
        assert!(should_run(Some(now() - hour), now(), hour, false));
    }

    #[test]
    fn test_future_last_run_blocks() {
        assert!(!should_run(Some(now() + Duration::minutes(5)), now(), Duration::zero(), false));
    }

    #[test]
    fn test_next_eligible_run() {
        let last = now() - Duration::minutes(30);
        assert_eq!(next_eligible_run(Some(last), Duration::hours(1)), Some(now() + Duration::minutes(30)));
        assert_eq!(next_eligible_run(None, Duration::hours(1)), None);
    }
}
