use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::convergence::{ConvergencePolicy, ConvergenceStatus};
use crate::error::FinSolarError;
use crate::solar::events::{
    estimate_utc_offset, resolve_event, solve_event, EventTime, GeoCoordinate, PolarCondition,
    SolarEvent,
};
use crate::types::{with_metadata, ComputationOutput, Degrees};
use crate::FinSolarResult;

/// Input for a sunrise/sunset/day-length calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaylightInput {
    pub latitude: Degrees,
    pub longitude: Degrees,
    /// Reference day; also the calendar day the local times are attached to.
    pub date: NaiveDate,
    /// Whole-hour UTC offset; estimated from longitude when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_hours: Option<i32>,
    #[serde(default)]
    pub policy: ConvergencePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaylightOutput {
    pub date: NaiveDate,
    pub utc_offset_hours: i32,
    pub sunrise: Option<EventTime>,
    pub sunset: Option<EventTime>,
    /// Sunset minus sunrise, in hours, when both exist.
    pub day_length_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar_condition: Option<PolarCondition>,
}

/// A single sunrise or sunset, flattened for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarEventOutput {
    pub event: SolarEvent,
    pub date: NaiveDate,
    pub utc_offset_hours: i32,
    pub local: Option<NaiveDateTime>,
    pub utc: Option<NaiveDateTime>,
    pub hour_angle: Option<Degrees>,
    pub iterations: u32,
    pub convergence: ConvergenceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar_condition: Option<PolarCondition>,
}

/// Sunrise, sunset and day length for one location and date.
pub fn calculate_daylight(
    input: &DaylightInput,
) -> FinSolarResult<ComputationOutput<DaylightOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_daylight_input(input, &mut warnings)?;

    let coordinate = GeoCoordinate {
        latitude: input.latitude,
        longitude: input.longitude,
    };
    let utc_offset_hours = utc_offset(input, &mut warnings);

    let mut polar_condition = None;
    let mut solve = |event: SolarEvent, warnings: &mut Vec<String>| {
        let report = solve_event(&coordinate, input.date, event);
        if polar_condition.is_none() {
            polar_condition = report.state.polar_condition();
        }
        resolve_event(report, event, input.date, utc_offset_hours, input.policy, warnings)
    };

    let sunrise = solve(SolarEvent::Sunrise, &mut warnings)?;
    let sunset = solve(SolarEvent::Sunset, &mut warnings)?;

    let day_length_hours = match (&sunrise, &sunset) {
        (Some(rise), Some(set)) => Some((set.hour_angle - rise.hour_angle) / 15.0),
        _ => match polar_condition {
            Some(PolarCondition::PolarDay) => Some(24.0),
            Some(PolarCondition::PolarNight) => Some(0.0),
            None => None,
        },
    };

    let output = DaylightOutput {
        date: input.date,
        utc_offset_hours,
        sunrise,
        sunset,
        day_length_hours,
        polar_condition,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Hour-angle fixed-point iteration, horizon at -0.833 deg",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// One sunrise or sunset with the same input checks as [`calculate_daylight`].
pub fn calculate_event(
    input: &DaylightInput,
    event: SolarEvent,
) -> FinSolarResult<ComputationOutput<SolarEventOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_daylight_input(input, &mut warnings)?;
    let utc_offset_hours = utc_offset(input, &mut warnings);

    let coordinate = GeoCoordinate {
        latitude: input.latitude,
        longitude: input.longitude,
    };
    let report = solve_event(&coordinate, input.date, event);
    let iterations = report.iterations;
    let convergence = report.status;
    let polar_condition = report.state.polar_condition();
    let time = resolve_event(
        report,
        event,
        input.date,
        utc_offset_hours,
        input.policy,
        &mut warnings,
    )?;

    let output = SolarEventOutput {
        event,
        date: input.date,
        utc_offset_hours,
        local: time.as_ref().map(|t| t.local),
        utc: time.as_ref().map(|t| t.utc),
        hour_angle: time.as_ref().map(|t| t.hour_angle),
        iterations,
        convergence,
        polar_condition,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Hour-angle fixed-point iteration, horizon at -0.833 deg",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn utc_offset(input: &DaylightInput, warnings: &mut Vec<String>) -> i32 {
    match input.utc_offset_hours {
        Some(offset) => offset,
        None => {
            let offset = estimate_utc_offset(input.longitude);
            warnings.push(format!(
                "UTC offset {offset:+} estimated from longitude; \
                 time-zone rules and daylight saving are ignored"
            ));
            offset
        }
    }
}

fn validate_daylight_input(
    input: &DaylightInput,
    warnings: &mut Vec<String>,
) -> FinSolarResult<()> {
    if !input.latitude.is_finite() {
        return Err(FinSolarError::InvalidInput {
            field: "latitude".into(),
            reason: "Latitude must be a finite number of degrees".into(),
        });
    }
    if !input.longitude.is_finite() {
        return Err(FinSolarError::InvalidInput {
            field: "longitude".into(),
            reason: "Longitude must be a finite number of degrees".into(),
        });
    }
    if let Some(offset) = input.utc_offset_hours {
        if !(-12..=14).contains(&offset) {
            return Err(FinSolarError::InvalidInput {
                field: "utc_offset_hours".into(),
                reason: format!("UTC offset must be between -12 and +14, got {offset}"),
            });
        }
    }
    if input.latitude.abs() > 90.0 {
        warnings.push(format!(
            "Latitude {} is outside [-90, 90]; result is not physically meaningful",
            input.latitude
        ));
    }
    if input.longitude.abs() > 180.0 {
        warnings.push(format!(
            "Longitude {} is outside [-180, 180]; result is not physically meaningful",
            input.longitude
        ));
    }
    Ok(())
}
