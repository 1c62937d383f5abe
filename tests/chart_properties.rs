use ch_load_chart::{Measurement, MeasurementLog, chart::measurement_panels};
use chrono::{TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use std::time::Duration;

fn log_from(steps: &[(i64, Option<u64>, u64)]) -> MeasurementLog {
    let mut at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    steps
        .iter()
        .map(|&(step_ms, connections, latency_ms)| {
            at += TimeDelta::milliseconds(step_ms);
            Measurement::new(at, connections, Duration::from_millis(latency_ms))
        })
        .collect()
}

proptest! {
    #[test]
    fn relative_time_starts_at_zero_and_never_decreases(
        steps in prop::collection::vec((0i64..5_000, prop::option::of(0u64..10_000), 0u64..2_000), 1..64)
    ) {
        let log = log_from(&steps);
        let times = log.relative_seconds();

        prop_assert_eq!(times.len(), log.len());
        prop_assert_eq!(times[0], 0.0);
        prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn both_series_keep_one_point_per_measurement(
        steps in prop::collection::vec((0i64..5_000, prop::option::of(0u64..10_000), 0u64..2_000), 1..64)
    ) {
        let log = log_from(&steps);
        let panels = measurement_panels(&log).unwrap();

        prop_assert_eq!(panels.len(), 2);
        let times = log.relative_seconds();
        for panel in &panels {
            prop_assert_eq!(panel.points().len(), log.len());
            for (point, t) in panel.points().iter().zip(&times) {
                prop_assert_eq!(point.0, *t);
            }
        }
        for (point, measurement) in panels[0].points().iter().zip(log.iter()) {
            #[allow(clippy::cast_precision_loss)]
            let expected = measurement.connections().unwrap_or(0) as f64;
            prop_assert_eq!(point.1, expected);
        }
    }
}
