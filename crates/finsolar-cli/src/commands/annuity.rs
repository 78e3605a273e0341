use clap::Args;
use serde_json::Value;

use finsolar_core::annuity::tvm::{self, NpvInput, TvmInput, TvmTarget};
use finsolar_core::convergence::ConvergencePolicy;
use finsolar_core::PaymentTiming;

/// Arguments for the periodic payment
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PmtArgs {
    /// Periodic interest rate (e.g. 0.004167 for 5% a year paid monthly)
    #[arg(long)]
    pub rate: f64,

    /// Number of payment periods
    #[arg(long)]
    pub nper: f64,

    /// Present value (loan principal received is positive)
    #[arg(long)]
    pub pv: f64,

    /// Balance remaining after the last payment
    #[arg(long, default_value = "0")]
    pub fv: f64,

    /// Payments fall at the start of each period (annuity due)
    #[arg(long)]
    pub begin: bool,
}

/// Arguments for the number of periods
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NperArgs {
    /// Periodic interest rate
    #[arg(long)]
    pub rate: f64,

    /// Payment per period (outflows negative)
    #[arg(long)]
    pub pmt: f64,

    /// Present value
    #[arg(long)]
    pub pv: f64,

    /// Future value
    #[arg(long, default_value = "0")]
    pub fv: f64,

    /// Payments fall at the start of each period
    #[arg(long)]
    pub begin: bool,
}

/// Arguments for the present value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PvArgs {
    /// Periodic interest rate
    #[arg(long)]
    pub rate: f64,

    /// Number of payment periods
    #[arg(long)]
    pub nper: f64,

    /// Payment per period
    #[arg(long)]
    pub pmt: f64,

    /// Future value
    #[arg(long, default_value = "0")]
    pub fv: f64,

    /// Payments fall at the start of each period
    #[arg(long)]
    pub begin: bool,
}

/// Arguments for the future value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FvArgs {
    /// Periodic interest rate
    #[arg(long)]
    pub rate: f64,

    /// Number of payment periods
    #[arg(long)]
    pub nper: f64,

    /// Payment per period
    #[arg(long)]
    pub pmt: f64,

    /// Present value
    #[arg(long)]
    pub pv: f64,

    /// Payments fall at the start of each period
    #[arg(long)]
    pub begin: bool,
}

/// Arguments for net present value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NpvArgs {
    /// Discount rate per period
    #[arg(long)]
    pub rate: f64,

    /// Comma-separated cash flows; the first is discounted one period
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub cash_flows: Vec<f64>,
}

/// Arguments for the rate solver
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RateArgs {
    /// Number of payment periods
    #[arg(long)]
    pub nper: f64,

    /// Payment per period (outflows negative)
    #[arg(long)]
    pub pmt: f64,

    /// Present value
    #[arg(long)]
    pub pv: f64,

    /// Future value
    #[arg(long, default_value = "0")]
    pub fv: f64,

    /// Payments fall at the start of each period
    #[arg(long)]
    pub begin: bool,

    /// Starting estimate, used only when strictly between 0 and 1
    #[arg(long)]
    pub guess: Option<f64>,

    /// Report the last estimate with a warning instead of failing when the search does not converge
    #[arg(long)]
    pub best_effort: bool,
}

fn policy(best_effort: bool) -> ConvergencePolicy {
    if best_effort {
        ConvergencePolicy::BestEffort
    } else {
        ConvergencePolicy::Strict
    }
}

fn closed_form(solve_for: TvmTarget, begin: bool) -> TvmInput {
    TvmInput {
        solve_for,
        rate: None,
        nper: None,
        pmt: None,
        pv: None,
        fv: None,
        timing: PaymentTiming::from(begin),
        guess: None,
        policy: ConvergencePolicy::Strict,
    }
}

pub fn run_pmt(args: PmtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = TvmInput {
        rate: Some(args.rate),
        nper: Some(args.nper),
        pv: Some(args.pv),
        fv: Some(args.fv),
        ..closed_form(TvmTarget::Payment, args.begin)
    };
    let result = tvm::calculate_tvm(&input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_nper(args: NperArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = TvmInput {
        rate: Some(args.rate),
        pmt: Some(args.pmt),
        pv: Some(args.pv),
        fv: Some(args.fv),
        ..closed_form(TvmTarget::Periods, args.begin)
    };
    let result = tvm::calculate_tvm(&input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_pv(args: PvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = TvmInput {
        rate: Some(args.rate),
        nper: Some(args.nper),
        pmt: Some(args.pmt),
        fv: Some(args.fv),
        ..closed_form(TvmTarget::PresentValue, args.begin)
    };
    let result = tvm::calculate_tvm(&input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_fv(args: FvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = TvmInput {
        rate: Some(args.rate),
        nper: Some(args.nper),
        pmt: Some(args.pmt),
        pv: Some(args.pv),
        ..closed_form(TvmTarget::FutureValue, args.begin)
    };
    let result = tvm::calculate_tvm(&input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = NpvInput {
        rate: args.rate,
        cash_flows: args.cash_flows,
    };
    let result = tvm::calculate_npv(&input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rate(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = TvmInput {
        nper: Some(args.nper),
        pmt: Some(args.pmt),
        pv: Some(args.pv),
        fv: Some(args.fv),
        guess: args.guess,
        policy: policy(args.best_effort),
        ..closed_form(TvmTarget::Rate, args.begin)
    };
    let result = tvm::calculate_tvm(&input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_pmt_mortgage() {
        let args = PmtArgs {
            rate: 0.05 / 12.0,
            nper: 360.0,
            pv: 300_000.0,
            fv: 0.0,
            begin: false,
        };
        let value = run_pmt(args).unwrap();
        let payment = value["result"]["value"].as_f64().unwrap();
        assert!((payment - (-1610.46)).abs() < 0.01, "got {payment}");
    }

    #[test]
    fn test_run_rate_strict_error_surfaces() {
        let args = RateArgs {
            nper: 10.5,
            pmt: 100.0,
            pv: 1000.0,
            fv: 100.0,
            begin: false,
            guess: None,
            best_effort: false,
        };
        let err = run_rate(args).unwrap_err();
        assert!(err.to_string().contains("RATE"));
    }

    #[test]
    fn test_run_npv_rejects_empty_flows() {
        let args = NpvArgs {
            rate: 0.1,
            cash_flows: vec![],
        };
        let err = run_npv(args).unwrap_err();
        assert!(err.to_string().contains("cash_flows"), "got {err}");
    }
}
