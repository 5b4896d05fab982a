//! Property tests for the progress calculator.

use chrono::{Days, NaiveDate, TimeZone, Utc};
use distrack_core::progress::calculate;
use distrack_core::{Challenge, LogEntry};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn challenge(window: u64, target: f64, logs: &[(u64, f64)]) -> Challenge {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Challenge {
        id: "c".into(),
        name: "prop".into(),
        sport: "general".into(),
        start_date: base(),
        end_date: base() + Days::new(window),
        target_distance_km: target,
        distance_log: logs
            .iter()
            .enumerate()
            .map(|(i, (day, km))| LogEntry {
                id: format!("l{i}"),
                date: base() + Days::new(*day),
                km: *km,
                note: String::new(),
            })
            .collect(),
        notes: String::new(),
        created_at: created,
        updated_at: created,
    }
}

proptest! {
    #![proptest_config(Config::with_cases(256))]
    #[test]
    fn metrics_stay_in_range(
        window in 0_u64..400,
        target in 0.0_f64..5_000.0,
        logs in prop::collection::vec((0_u64..400, 0.0_f64..300.0), 0..30),
        offset in 0_u64..500,
        hour in 0_u32..24,
    ) {
        let ch = challenge(window, target, &logs);
        let now = (base() + Days::new(offset)).and_hms_opt(hour, 0, 0).unwrap();
        let p = calculate(&ch, now);

        prop_assert!(p.pct >= 0.0 && p.pct <= 1.0);
        prop_assert_eq!(p.total_days, window as i64 + 1);
        prop_assert_eq!(p.elapsed, offset as i64 + 1);
        prop_assert!(p.remaining >= 0 && p.remaining <= p.total_days);
        prop_assert!(p.remaining_km >= 0.0);
        prop_assert!(p.avg_needed_whole.is_finite());
        prop_assert!(p.avg_needed_from_now.is_finite());
        prop_assert!(p.current_pace.is_finite());
        if let Some(finish) = p.projected_finish {
            prop_assert!(finish >= now.date());
        }
        if p.current_pace == 0.0 {
            prop_assert!(p.projected_finish.is_none());
        }
    }

    #[test]
    fn calculation_is_deterministic(
        window in 0_u64..100,
        target in 0.0_f64..1_000.0,
        logs in prop::collection::vec((0_u64..100, 0.0_f64..50.0), 0..10),
        offset in 0_u64..150,
    ) {
        let ch = challenge(window, target, &logs);
        let now = (base() + Days::new(offset)).and_hms_opt(12, 0, 0).unwrap();
        prop_assert_eq!(calculate(&ch, now), calculate(&ch, now));
    }
}

#[test]
fn no_logs_on_day_five() {
    let ch = challenge(9, 100.0, &[]);
    let p = calculate(&ch, base().checked_add_days(Days::new(4)).unwrap().and_hms_opt(10, 0, 0).unwrap());
    assert_eq!(p.total_days, 10);
    assert_eq!(p.elapsed, 5);
    assert_eq!(p.avg_needed_whole, 10.0);
    assert_eq!(p.current_pace, 0.0);
    assert_eq!(p.done, 0.0);
    assert_eq!(p.pct, 0.0);
    assert!(p.projected_finish.is_none());
}

#[test]
fn overshooting_target_clamps_pct() {
    let ch = challenge(9, 100.0, &[(0, 70.0), (1, 70.0)]);
    let p = calculate(&ch, base().and_hms_opt(23, 0, 0).unwrap());
    assert_eq!(p.done, 140.0);
    assert_eq!(p.pct, 1.0);
    assert_eq!(p.remaining_km, 0.0);
}
