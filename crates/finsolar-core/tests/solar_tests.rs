use chrono::{NaiveDate, Timelike};
use finsolar_core::convergence::{ConvergencePolicy, ConvergenceStatus};
use finsolar_core::solar::daylight::{calculate_daylight, DaylightInput};
use finsolar_core::solar::events::{
    event_time, solve_event, sunrise, sunset, GeoCoordinate, PolarCondition, SolarEvent,
};
use finsolar_core::FinSolarError;
use pretty_assertions::assert_eq;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn day_length(latitude: f64, longitude: f64, day: NaiveDate) -> f64 {
    let input = DaylightInput {
        latitude,
        longitude,
        date: day,
        utc_offset_hours: Some(0),
        policy: ConvergencePolicy::Strict,
    };
    calculate_daylight(&input)
        .unwrap()
        .result
        .day_length_hours
        .unwrap()
}

// ===========================================================================
// Day length
// ===========================================================================

#[test]
fn test_equator_equinox_is_twelve_hours() {
    let hours = day_length(0.0, 0.0, date(2024, 3, 20));
    // refraction and the solar disc add a few minutes
    assert!((hours - 12.0).abs() < 0.25, "day length {hours}");
}

#[test]
fn test_summer_solstice_long_day_at_40n() {
    let hours = day_length(40.0, -74.0, date(2024, 6, 20));
    assert!(hours > 12.0, "day length {hours}");
    assert!((hours - 14.97).abs() < 0.1, "day length {hours}");
}

#[test]
fn test_southern_hemisphere_january() {
    let hours = day_length(-33.9, 151.2, date(2024, 1, 1));
    assert!(hours > 14.0 && hours < 14.7, "day length {hours}");
}

#[test]
fn test_polar_summer_does_not_converge() {
    let coord = GeoCoordinate {
        latitude: 69.6,
        longitude: 18.9,
    };
    for event in [SolarEvent::Sunrise, SolarEvent::Sunset] {
        let report = solve_event(&coord, date(2024, 6, 21), event);
        assert_eq!(report.status, ConvergenceStatus::OutOfDomain);
        assert_eq!(report.state.polar_condition(), Some(PolarCondition::PolarDay));
    }

    match event_time(&coord, date(2024, 6, 21), SolarEvent::Sunrise, None) {
        Err(FinSolarError::DomainError { reason, .. }) => assert!(reason.contains("polar day")),
        other => panic!("Expected DomainError, got {other:?}"),
    }
}

// ===========================================================================
// Convergence behaviour
// ===========================================================================

#[test]
fn test_residuals_shrink_near_fixed_point() {
    // at 50N the first refined trial still misses by more than the
    // tolerance, so each solve leaves at least two small residuals
    let days = [
        date(2024, 3, 20),
        date(2024, 4, 10),
        date(2024, 5, 1),
        date(2024, 8, 10),
    ];
    let coord = GeoCoordinate {
        latitude: 50.0,
        longitude: 0.0,
    };

    for day in days {
        for event in [SolarEvent::Sunrise, SolarEvent::Sunset] {
            let report = solve_event(&coord, day, event);
            assert_eq!(report.status, ConvergenceStatus::Converged);

            let near: Vec<f64> = report
                .deltas
                .iter()
                .copied()
                .skip_while(|d| *d > 5.0)
                .collect();
            assert!(
                near.windows(2).count() > 0,
                "nothing to compare on {day} {}: {:?}",
                event.label(),
                report.deltas
            );
            for pair in near.windows(2) {
                assert!(
                    pair[1] < pair[0],
                    "residuals not decreasing on {day}: {:?}",
                    report.deltas
                );
            }
        }
    }
}

#[test]
fn test_mid_latitude_solves_converge() {
    let cases = [
        (40.0, -74.0, date(2024, 6, 20)),
        (39.9, 116.4, date(2024, 6, 21)),
        (-33.9, 151.2, date(2024, 1, 1)),
        (51.5, 0.0, date(2024, 12, 21)),
        (35.7, 139.7, date(2024, 9, 22)),
    ];

    for (latitude, longitude, day) in cases {
        let coord = GeoCoordinate {
            latitude,
            longitude,
        };
        for event in [SolarEvent::Sunrise, SolarEvent::Sunset] {
            let report = solve_event(&coord, day, event);
            assert_eq!(report.status, ConvergenceStatus::Converged);
            assert!(report.last_delta <= 0.1);
            assert_eq!(report.deltas.len() as u32, report.iterations + 1);
        }
    }
}

#[test]
fn test_event_times_carry_iteration_details() {
    let coord = GeoCoordinate {
        latitude: 35.7,
        longitude: 139.7,
    };
    let rise = event_time(&coord, date(2024, 9, 22), SolarEvent::Sunrise, Some(9)).unwrap();
    let set = event_time(&coord, date(2024, 9, 22), SolarEvent::Sunset, Some(9)).unwrap();

    assert_eq!(rise.convergence, ConvergenceStatus::Converged);
    assert!(rise.iterations >= 1);
    // Tokyo equinox: about 05:30 and 17:40 local
    assert_eq!(rise.local.hour(), 5);
    assert_eq!(set.local.hour(), 17);
    assert_eq!(rise.local.date(), date(2024, 9, 22));
}

#[test]
fn test_today_entry_points_agree_on_order() {
    // mid-latitude: both events exist every day of the year
    let rise = sunrise(45.0, 10.0).unwrap();
    let set = sunset(45.0, 10.0).unwrap();
    assert!(rise < set);
}
