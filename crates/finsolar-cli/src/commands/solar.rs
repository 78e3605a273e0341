use chrono::{Local, NaiveDate};
use clap::Args;
use serde_json::Value;

use finsolar_core::convergence::ConvergencePolicy;
use finsolar_core::solar::daylight::{self, DaylightInput};
use finsolar_core::solar::events::SolarEvent;

/// Arguments for a single sunrise or sunset
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EventArgs {
    /// Latitude in degrees, north positive
    #[arg(long, alias = "lat")]
    pub latitude: f64,

    /// Longitude in degrees, east positive
    #[arg(long, alias = "lng")]
    pub longitude: f64,

    /// Day to compute for (YYYY-MM-DD); defaults to today's local date
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Whole-hour UTC offset of the reported local time; estimated from longitude if absent
    #[arg(long)]
    pub utc_offset: Option<i32>,

    /// Report polar day or night as a warning instead of an error
    #[arg(long)]
    pub best_effort: bool,
}

/// Arguments for sunrise, sunset and day length together
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DaylightArgs {
    #[command(flatten)]
    pub location: EventArgs,
}

impl EventArgs {
    fn to_input(&self) -> DaylightInput {
        DaylightInput {
            latitude: self.latitude,
            longitude: self.longitude,
            date: self.date.unwrap_or_else(|| Local::now().date_naive()),
            utc_offset_hours: self.utc_offset,
            policy: if self.best_effort {
                ConvergencePolicy::BestEffort
            } else {
                ConvergencePolicy::Strict
            },
        }
    }
}

pub fn run_event(args: EventArgs, event: SolarEvent) -> Result<Value, Box<dyn std::error::Error>> {
    let result = daylight::calculate_event(&args.to_input(), event)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_daylight(args: DaylightArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let result = daylight::calculate_daylight(&args.location.to_input())?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(latitude: f64, longitude: f64) -> EventArgs {
        EventArgs {
            latitude,
            longitude,
            date: NaiveDate::from_ymd_opt(2024, 3, 20),
            utc_offset: Some(0),
            best_effort: false,
        }
    }

    #[test]
    fn test_run_event_reports_local_time() {
        let value = run_event(args(0.0, 0.0), SolarEvent::Sunrise).unwrap();
        let local = value["result"]["local"].as_str().unwrap();
        assert!(local.starts_with("2024-03-20T06:0"), "got {local}");
    }

    #[test]
    fn test_run_daylight_polar_strict_fails() {
        let mut a = args(78.0, 15.0);
        a.date = NaiveDate::from_ymd_opt(2024, 6, 21);
        assert!(run_daylight(DaylightArgs { location: a }).is_err());
    }
}
