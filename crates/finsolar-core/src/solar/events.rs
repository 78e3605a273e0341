//! Sunrise and sunset by fixed-point iteration on the Greenwich hour angle.
//!
//! Low-precision solar coordinates (mean longitude, mean anomaly, equation
//! of centre, obliquity) are evaluated at the trial instant, and the hour
//! angle at which the sun's centre sits at [`HORIZON_ALTITUDE`] gives the
//! next trial. Times come out to roughly a minute for mid latitudes.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::angle::{to_degrees, to_radians};
use crate::convergence::{
    iterate, settle, ConvergenceCriteria, ConvergencePolicy, ConvergenceStatus, IterationReport,
    Step,
};
use crate::error::FinSolarError;
use crate::types::Degrees;
use crate::FinSolarResult;

pub const MAX_SOLAR_ITERATIONS: u32 = 128;
pub const HOUR_ANGLE_TOLERANCE: Degrees = 0.1;

/// Altitude of the sun's centre at apparent rise/set: refraction plus semi-diameter.
pub const HORIZON_ALTITUDE: Degrees = -0.833;

/// First trial hour angle: local noon at Greenwich.
const INITIAL_HOUR_ANGLE: Degrees = 180.0;

/// `num_days_from_ce` of 2000-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 730_120;

const SOLAR_CRITERIA: ConvergenceCriteria = ConvergenceCriteria {
    max_iterations: MAX_SOLAR_ITERATIONS,
    tolerance: HOUR_ANGLE_TOLERANCE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarEvent {
    Sunrise,
    Sunset,
}

impl SolarEvent {
    /// The horizon correction is subtracted for sunrise, added for sunset.
    fn horizon_sign(self) -> f64 {
        match self {
            SolarEvent::Sunrise => -1.0,
            SolarEvent::Sunset => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SolarEvent::Sunrise => "SUNRISE",
            SolarEvent::Sunset => "SUNSET",
        }
    }
}

/// Observer position in degrees. North and east are positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: Degrees,
    pub longitude: Degrees,
}

/// Why the sun does not cross the horizon on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarCondition {
    /// The sun stays above the horizon.
    PolarDay,
    /// The sun stays below the horizon.
    PolarNight,
}

impl PolarCondition {
    fn describe(self) -> &'static str {
        match self {
            PolarCondition::PolarDay => "the sun stays above the horizon (polar day)",
            PolarCondition::PolarNight => "the sun stays below the horizon (polar night)",
        }
    }
}

/// Low-precision solar coordinates at one instant. Angles in radians except
/// `mean_longitude` (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarCoordinates {
    /// Julian centuries since 2000-01-01.
    pub century: f64,
    pub mean_longitude: Degrees,
    pub mean_anomaly: f64,
    pub ecliptic_longitude: f64,
    pub obliquity: f64,
    pub declination: f64,
}

impl SolarCoordinates {
    pub fn at(day_count: f64, hour_angle: Degrees) -> Self {
        let century = (day_count + hour_angle / 360.0) / 36525.0;
        let mean_longitude = 280.460 + 36000.777 * century;
        let mean_anomaly = to_radians(357.528 + 35999.050 * century);
        let ecliptic_longitude = to_radians(
            mean_longitude + 1.915 * mean_anomaly.sin() + 0.020 * (2.0 * mean_anomaly).sin(),
        );
        let obliquity = to_radians(23.4393 - 0.0130 * century);
        let declination = (obliquity.sin() * ecliptic_longitude.sin()).asin();

        SolarCoordinates {
            century,
            mean_longitude,
            mean_anomaly,
            ecliptic_longitude,
            obliquity,
            declination,
        }
    }

    /// Greenwich hour angle of the sun, relative to `hour_angle`, in degrees.
    fn greenwich_hour_angle(&self, hour_angle: Degrees) -> Degrees {
        let g = self.mean_anomaly;
        let lambda = self.ecliptic_longitude;
        hour_angle - 180.0 - 1.915 * g.sin() - 0.020 * (2.0 * g).sin()
            + 2.466 * (2.0 * lambda).sin()
            - 0.053 * (4.0 * lambda).sin()
    }
}

/// One round of the hour-angle iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarIterationState {
    /// Trial hour angle used in this round (degrees).
    pub ut0: Degrees,
    /// Hour angle produced by this round (degrees); NaN when the round left the domain.
    pub ut_start: Degrees,
    /// Solar declination at `ut0` (radians).
    pub declination: f64,
    /// Argument of the horizon arccos; outside [-1, 1] the sun does not cross.
    pub horizon_cosine: f64,
}

impl SolarIterationState {
    /// No trial yet; the only estimate is local noon.
    fn seed() -> Self {
        SolarIterationState {
            ut0: 0.0,
            ut_start: INITIAL_HOUR_ANGLE,
            declination: 0.0,
            horizon_cosine: 0.0,
        }
    }

    pub fn polar_condition(&self) -> Option<PolarCondition> {
        if self.horizon_cosine < -1.0 {
            Some(PolarCondition::PolarDay)
        } else if self.horizon_cosine > 1.0 {
            Some(PolarCondition::PolarNight)
        } else {
            None
        }
    }
}

/// The solved event as a clock time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTime {
    pub event: SolarEvent,
    /// Local clock time, truncated to the minute.
    pub local: NaiveDateTime,
    pub utc: NaiveDateTime,
    pub utc_offset_hours: i32,
    /// Solved Greenwich hour angle in degrees (15 degrees per UTC hour after midnight).
    pub hour_angle: Degrees,
    pub iterations: u32,
    pub convergence: ConvergenceStatus,
}

/// Whole days from 2000-01-01 to `day`.
pub fn days_since_epoch(day: NaiveDate) -> i64 {
    i64::from(day.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
}

/// Whole-hour UTC offset guessed from longitude, one zone per 15 degrees.
///
/// A civil approximation only; real zone boundaries and daylight saving are ignored.
pub fn estimate_utc_offset(longitude: Degrees) -> i32 {
    let zone = if longitude >= 0.0 {
        longitude / 15.0 + 1.0
    } else {
        longitude / 15.0 - 1.0
    };
    zone.trunc() as i32
}

/// Iterate the hour angle of `event` at `coordinate` on `reference_day`.
pub fn solve_event(
    coordinate: &GeoCoordinate,
    reference_day: NaiveDate,
    event: SolarEvent,
) -> IterationReport<SolarIterationState> {
    let latitude = to_radians(coordinate.latitude);
    let longitude = coordinate.longitude;
    let day_count = days_since_epoch(reference_day) as f64;
    let h = to_radians(HORIZON_ALTITUDE).sin();

    let report = iterate(
        SolarIterationState::seed(),
        &SOLAR_CRITERIA,
        |s: &SolarIterationState| (s.ut_start - s.ut0).abs(),
        |s: &SolarIterationState| {
            let ut0 = s.ut_start;
            let sun = SolarCoordinates::at(day_count, ut0);
            let gha = sun.greenwich_hour_angle(ut0);
            let horizon_cosine = h - latitude.tan() * sun.declination.tan();

            let round = SolarIterationState {
                ut0,
                ut_start: f64::NAN,
                declination: sun.declination,
                horizon_cosine,
            };
            if !(-1.0..=1.0).contains(&horizon_cosine) {
                return Step::OutOfDomain(round);
            }

            let e = to_degrees(horizon_cosine.acos());
            Step::Next(SolarIterationState {
                ut_start: ut0 - gha - longitude + event.horizon_sign() * e,
                ..round
            })
        },
    );

    if report.converged() {
        log::debug!(
            "{} at ({}, {}) on {} converged to {} deg after {} iterations",
            event.label(),
            coordinate.latitude,
            coordinate.longitude,
            reference_day,
            report.state.ut_start,
            report.iterations
        );
    } else {
        log::warn!(
            "{} at ({}, {}) on {} stopped with status {:?} after {} iterations",
            event.label(),
            coordinate.latitude,
            coordinate.longitude,
            reference_day,
            report.status,
            report.iterations
        );
    }

    report
}

/// Turn a finished iteration into a clock time under `policy`.
///
/// Returns `Ok(None)` only under `BestEffort` when the sun does not cross the
/// horizon; a warning is recorded in that case.
pub fn resolve_event(
    report: IterationReport<SolarIterationState>,
    event: SolarEvent,
    date: NaiveDate,
    utc_offset_hours: i32,
    policy: ConvergencePolicy,
    warnings: &mut Vec<String>,
) -> FinSolarResult<Option<EventTime>> {
    if report.status == ConvergenceStatus::OutOfDomain {
        if let Some(polar) = report.state.polar_condition() {
            return match policy {
                ConvergencePolicy::Strict => Err(FinSolarError::DomainError {
                    function: event.label().into(),
                    reason: format!(
                        "no {} on {date}: {}",
                        event.label().to_lowercase(),
                        polar.describe()
                    ),
                }),
                ConvergencePolicy::BestEffort => {
                    warnings.push(format!(
                        "No {} on {date}: {}",
                        event.label().to_lowercase(),
                        polar.describe()
                    ));
                    Ok(None)
                }
            };
        }
    }

    let report = settle(report, event.label(), policy, warnings)?;
    if report.status == ConvergenceStatus::OutOfDomain {
        return Ok(None);
    }

    let hour_angle = report.state.ut_start;
    let local_hours = hour_angle / 15.0 + f64::from(utc_offset_hours);
    let midnight = date.and_time(NaiveTime::MIN);

    Ok(Some(EventTime {
        event,
        local: shift(midnight, (local_hours * 60.0).floor() * 60.0)?,
        utc: shift(midnight, (hour_angle / 15.0 * 3600.0).round())?,
        utc_offset_hours,
        hour_angle,
        iterations: report.iterations,
        convergence: report.status,
    }))
}

/// Strict sunrise or sunset for `date`.
///
/// The date is both the astronomical reference day and the calendar day the
/// local clock time is attached to. With `utc_offset_hours` unset the offset
/// is estimated from longitude.
pub fn event_time(
    coordinate: &GeoCoordinate,
    date: NaiveDate,
    event: SolarEvent,
    utc_offset_hours: Option<i32>,
) -> FinSolarResult<EventTime> {
    let offset = utc_offset_hours.unwrap_or_else(|| estimate_utc_offset(coordinate.longitude));
    let report = solve_event(coordinate, date, event);
    let mut warnings = Vec::new();

    let time = resolve_event(
        report,
        event,
        date,
        offset,
        ConvergencePolicy::Strict,
        &mut warnings,
    )?;
    time.ok_or_else(|| FinSolarError::DomainError {
        function: event.label().into(),
        reason: format!("no {} on {date}", event.label().to_lowercase()),
    })
}

/// Local sunrise on `date`, UTC offset estimated from longitude.
pub fn sunrise_on(
    latitude: Degrees,
    longitude: Degrees,
    date: NaiveDate,
) -> FinSolarResult<NaiveDateTime> {
    let coordinate = GeoCoordinate { latitude, longitude };
    event_time(&coordinate, date, SolarEvent::Sunrise, None).map(|t| t.local)
}

/// Local sunset on `date`, UTC offset estimated from longitude.
pub fn sunset_on(
    latitude: Degrees,
    longitude: Degrees,
    date: NaiveDate,
) -> FinSolarResult<NaiveDateTime> {
    let coordinate = GeoCoordinate { latitude, longitude };
    event_time(&coordinate, date, SolarEvent::Sunset, None).map(|t| t.local)
}

/// Sunrise today, reading the host's local date once.
pub fn sunrise(latitude: Degrees, longitude: Degrees) -> FinSolarResult<NaiveDateTime> {
    sunrise_on(latitude, longitude, Local::now().date_naive())
}

/// Sunset today, reading the host's local date once.
pub fn sunset(latitude: Degrees, longitude: Degrees) -> FinSolarResult<NaiveDateTime> {
    sunset_on(latitude, longitude, Local::now().date_naive())
}

fn shift(base: NaiveDateTime, seconds: f64) -> FinSolarResult<NaiveDateTime> {
    if !seconds.is_finite() {
        return Err(FinSolarError::DateError(format!(
            "cannot offset {base} by {seconds} seconds"
        )));
    }
    TimeDelta::try_seconds(seconds as i64)
        .and_then(|delta| base.checked_add_signed(delta))
        .ok_or_else(|| FinSolarError::DateError(format!("{base} + {seconds}s is out of range")))
}
