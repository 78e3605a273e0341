use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::annuity::rate::{self, AnnuityTerms};
use crate::convergence::{settle, ConvergencePolicy, ConvergenceStatus};
use crate::error::FinSolarError;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, PaymentTiming, Rate};
use crate::FinSolarResult;

/// Which annuity variable to solve for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TvmTarget {
    Payment,
    Periods,
    PresentValue,
    FutureValue,
    Rate,
}

/// Input for a single time-value-of-money calculation.
///
/// Every variable except the one named by `solve_for` must be supplied,
/// apart from `fv` which defaults to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmInput {
    pub solve_for: TvmTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmt: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pv: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fv: Option<Money>,
    #[serde(default)]
    pub timing: PaymentTiming,
    /// Seed for the rate search; only read when solving for the rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guess: Option<Rate>,
    #[serde(default)]
    pub policy: ConvergencePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmOutput {
    pub solve_for: TvmTarget,
    pub value: f64,
    /// Secant iterations used (rate only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvInput {
    pub rate: Rate,
    pub cash_flows: Vec<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvOutput {
    pub npv: Money,
    pub periods: usize,
}

/// Solve the annuity equation for the variable named by `input.solve_for`.
pub fn calculate_tvm(input: &TvmInput) -> FinSolarResult<ComputationOutput<TvmOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let fv = finite("fv", input.fv.unwrap_or(0.0))?;
    let timing = input.timing;

    let (value, iterations, convergence, methodology) = match input.solve_for {
        TvmTarget::Payment => {
            let r = require("rate", input.rate)?;
            let n = require_periods(input.nper, &mut warnings)?;
            let pv = require("pv", input.pv)?;
            let value = checked("PMT", time_value::pmt(r, n, pv, fv, timing))?;
            (value, None, None, "PMT closed form")
        }
        TvmTarget::Periods => {
            let r = require("rate", input.rate)?;
            let pmt = require("pmt", input.pmt)?;
            let pv = require("pv", input.pv)?;
            if r == 0.0 && pmt == 0.0 {
                return Err(FinSolarError::DivisionByZero {
                    context: "NPER with zero rate and zero payment".into(),
                });
            }
            let value = checked("NPER", time_value::nper(r, pmt, pv, fv, timing))?;
            if value < 0.0 {
                warnings.push(format!(
                    "Negative term ({value:.4}): check the sign convention of pmt, pv and fv"
                ));
            }
            (value, None, None, "NPER closed form (logarithmic)")
        }
        TvmTarget::PresentValue => {
            let r = require("rate", input.rate)?;
            let n = require_periods(input.nper, &mut warnings)?;
            let pmt = require("pmt", input.pmt)?;
            let value = checked("PV", time_value::pv(r, n, pmt, fv, timing))?;
            (value, None, None, "PV closed form")
        }
        TvmTarget::FutureValue => {
            let r = require("rate", input.rate)?;
            let n = require_periods(input.nper, &mut warnings)?;
            let pmt = require("pmt", input.pmt)?;
            let pv = require("pv", input.pv)?;
            let value = checked("FV", time_value::fv(r, n, pmt, pv, timing))?;
            (value, None, None, "FV closed form")
        }
        TvmTarget::Rate => {
            let terms = AnnuityTerms {
                nper: require_periods(input.nper, &mut warnings)?,
                pmt: require("pmt", input.pmt)?,
                pv: require("pv", input.pv)?,
                fv,
                timing,
            };
            let requested = input.guess.unwrap_or(rate::DEFAULT_GUESS);
            let guess = rate::effective_guess(requested);
            if guess != requested {
                warnings.push(format!(
                    "Guess {requested} is outside (0, 1); using {}",
                    rate::DEFAULT_GUESS
                ));
            }

            let report = rate::solve_rate(&terms, guess);
            let report = settle(report, "RATE", input.policy, &mut warnings)?;
            let value = report.state.rate;

            if value < 0.0 {
                warnings.push(format!("Negative periodic rate ({value:.6})"));
            } else if value > 1.0 {
                warnings.push(format!(
                    "Periodic rate above 100% ({value:.4}); verify the payment sign"
                ));
            }
            (
                value,
                Some(report.iterations),
                Some(report.status),
                "RATE via secant iteration",
            )
        }
    };

    let output = TvmOutput {
        solve_for: input.solve_for,
        value,
        iterations,
        convergence,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

/// Net present value with input checks.
pub fn calculate_npv(input: &NpvInput) -> FinSolarResult<ComputationOutput<NpvOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if input.cash_flows.is_empty() {
        return Err(FinSolarError::InvalidInput {
            field: "cash_flows".into(),
            reason: "NPV requires at least one cash flow".into(),
        });
    }
    if input.rate <= -1.0 {
        return Err(FinSolarError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    finite("rate", input.rate)?;
    for (i, cf) in input.cash_flows.iter().enumerate() {
        finite(&format!("cash_flows[{i}]"), *cf)?;
    }

    let output = NpvOutput {
        npv: time_value::npv(input.rate, &input.cash_flows),
        periods: input.cash_flows.len(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "NPV, flows at end of periods 1..n",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn require(field: &str, value: Option<f64>) -> FinSolarResult<f64> {
    let v = value.ok_or_else(|| FinSolarError::InvalidInput {
        field: field.into(),
        reason: "Required for this calculation".into(),
    })?;
    finite(field, v)
}

fn require_periods(nper: Option<f64>, warnings: &mut Vec<String>) -> FinSolarResult<f64> {
    let n = require("nper", nper)?;
    if n == 0.0 {
        return Err(FinSolarError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be non-zero".into(),
        });
    }
    if n.fract() != 0.0 {
        warnings.push(format!("Fractional number of periods ({n})"));
    }
    Ok(n)
}

fn finite(field: &str, value: f64) -> FinSolarResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FinSolarError::InvalidInput {
            field: field.into(),
            reason: format!("Must be a finite number, got {value}"),
        })
    }
}

fn checked(function: &str, value: f64) -> FinSolarResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FinSolarError::DomainError {
            function: function.into(),
            reason: format!("formula evaluated to {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input(solve_for: TvmTarget) -> TvmInput {
        TvmInput {
            solve_for,
            rate: Some(0.005),
            nper: Some(360.0),
            pmt: Some(-179.865_157_545_827_1),
            pv: Some(30_000.0),
            fv: None,
            timing: PaymentTiming::End,
            guess: None,
            policy: ConvergencePolicy::Strict,
        }
    }

    #[test]
    fn test_payment() {
        let result = calculate_tvm(&sample_input(TvmTarget::Payment)).unwrap();
        assert!((result.result.value - (-179.865_157_545_827_1)).abs() < 1e-9);
        assert!(result.result.iterations.is_none());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_rate_reports_iterations() {
        let result = calculate_tvm(&sample_input(TvmTarget::Rate)).unwrap();
        let out = &result.result;
        assert!((out.value - 0.005).abs() < 1e-6);
        assert_eq!(out.convergence, Some(ConvergenceStatus::Converged));
        assert!(out.iterations.unwrap() > 0);
        assert_eq!(result.methodology, "RATE via secant iteration");
    }

    #[test]
    fn test_present_value_inverts_payment() {
        let result = calculate_tvm(&sample_input(TvmTarget::PresentValue)).unwrap();
        assert!((result.result.value - 30_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_periods() {
        let result = calculate_tvm(&sample_input(TvmTarget::Periods)).unwrap();
        assert!((result.result.value - 360.0).abs() < 1e-6);
    }

    #[test]
    fn test_future_value_of_full_amortization_is_zero() {
        let result = calculate_tvm(&sample_input(TvmTarget::FutureValue)).unwrap();
        assert!(result.result.value.abs() < 1e-6);
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut input = sample_input(TvmTarget::Payment);
        input.pv = None;
        match calculate_tvm(&input).unwrap_err() {
            FinSolarError::InvalidInput { field, .. } => assert_eq!(field, "pv"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_zero_periods_rejected() {
        let mut input = sample_input(TvmTarget::Payment);
        input.nper = Some(0.0);
        assert!(matches!(
            calculate_tvm(&input),
            Err(FinSolarError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut input = sample_input(TvmTarget::Payment);
        input.rate = Some(f64::NAN);
        assert!(calculate_tvm(&input).is_err());
    }

    #[test]
    fn test_zero_rate_zero_payment_periods() {
        let mut input = sample_input(TvmTarget::Periods);
        input.rate = Some(0.0);
        input.pmt = Some(0.0);
        assert!(matches!(
            calculate_tvm(&input),
            Err(FinSolarError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_out_of_range_guess_warns() {
        let mut input = sample_input(TvmTarget::Rate);
        input.guess = Some(1.5);
        let result = calculate_tvm(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("Guess")));
        assert!((result.result.value - 0.005).abs() < 1e-6);

        let plain = rate::rate(
            360.0,
            -179.865_157_545_827_1,
            30_000.0,
            0.0,
            PaymentTiming::End,
            1.5,
        );
        assert_eq!(result.result.value.to_bits(), plain.to_bits());
    }

    #[test]
    fn test_fractional_periods_warns() {
        let mut input = sample_input(TvmTarget::Payment);
        input.nper = Some(12.5);
        let result = calculate_tvm(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("Fractional")));
    }

    #[test]
    fn test_npv_rejects_empty_flows() {
        let input = NpvInput {
            rate: 0.1,
            cash_flows: vec![],
        };
        assert!(calculate_npv(&input).is_err());
    }

    #[test]
    fn test_npv_rejects_rate_below_minus_one() {
        let input = NpvInput {
            rate: -1.0,
            cash_flows: vec![100.0],
        };
        assert!(calculate_npv(&input).is_err());
    }

    #[test]
    fn test_npv_envelope() {
        let input = NpvInput {
            rate: 0.1,
            cash_flows: vec![-1000.0, 300.0, 400.0, 500.0],
        };
        let result = calculate_npv(&input).unwrap();
        // first flow sits at the end of period 1
        let expected = -1000.0 / 1.1 + 300.0 / 1.21 + 400.0 / 1.331 + 500.0 / 1.4641;
        assert!((result.result.npv - expected).abs() < 1e-9);
        assert_eq!(result.result.periods, 4);
    }
}
