
use crate::convergence::{iterate, ConvergenceCriteria, IterationReport, Step};
use crate::types::{Money, PaymentTiming, Rate};

pub const MAX_RATE_ITERATIONS: u32 = 128;
pub const RATE_PRECISION: f64 = 1e-9;
pub const DEFAULT_GUESS: Rate = 0.1;

const RATE_CRITERIA: ConvergenceCriteria = ConvergenceCriteria {
    max_iterations: MAX_RATE_ITERATIONS,
    tolerance: RATE_PRECISION,
};

/// The fixed inputs of the annuity balance equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnuityTerms {
    pub nper: f64,
    pub pmt: Money,
    pub pv: Money,
    pub fv: Money,
    pub timing: PaymentTiming,
}

impl AnnuityTerms {
    /// Balance of the annuity at `rate`; zero at the solution.
    ///
    /// Below `RATE_PRECISION` the compounding form divides by a vanishing
    /// rate, so the first-order expansion is used instead.
    pub fn residual(&self, rate: Rate) -> f64 {
        let t = self.timing.factor();
        if rate.abs() < RATE_PRECISION {
            self.pv * (1.0 + self.nper * rate) + self.pmt * (1.0 + rate * t) * self.nper + self.fv
        } else {
            let f = (1.0 + rate).powf(self.nper);
            self.pv * f + self.pmt * (1.0 / rate + t) * (f - 1.0) + self.fv
        }
    }

    /// Residual at a zero rate.
    fn zero_order_residual(&self) -> f64 {
        self.pv + self.pmt * self.nper + self.fv
    }
}

/// Two most recent secant points and the latest rate estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecantState {
    pub x0: Rate,
    pub x1: Rate,
    pub y0: f64,
    pub y1: f64,
    pub rate: Rate,
}

impl SecantState {
    fn seed(terms: &AnnuityTerms, guess: Rate) -> Self {
        SecantState {
            x0: 0.0,
            x1: guess,
            y0: terms.zero_order_residual(),
            y1: terms.residual(guess),
            rate: guess,
        }
    }

    fn advance(&self, terms: &AnnuityTerms) -> Self {
        let rate = (self.y1 * self.x0 - self.y0 * self.x1) / (self.y1 - self.y0);
        SecantState {
            x0: self.x1,
            x1: rate,
            y0: self.y1,
            y1: terms.residual(rate),
            rate,
        }
    }
}

/// Guesses outside (0, 1) are replaced by [`DEFAULT_GUESS`].
pub fn effective_guess(guess: Rate) -> Rate {
    if guess <= 0.0 || guess >= 1.0 || guess.is_nan() {
        DEFAULT_GUESS
    } else {
        guess
    }
}

/// Run the secant search from `guess` and return the full iteration report.
///
/// The guess is used as given; callers pass it through [`effective_guess`] first.
pub fn solve_rate(terms: &AnnuityTerms, guess: Rate) -> IterationReport<SecantState> {
    let seed = SecantState::seed(terms, guess);

    let report = iterate(
        seed,
        &RATE_CRITERIA,
        |s: &SecantState| (s.y0 - s.y1).abs(),
        |s: &SecantState| Step::Next(s.advance(terms)),
    );

    if report.converged() {
        log::debug!(
            "RATE converged to {} after {} iterations",
            report.state.rate,
            report.iterations
        );
    } else {
        log::warn!(
            "RATE stopped with status {:?} after {} iterations (delta {})",
            report.status,
            report.iterations,
            report.last_delta
        );
    }

    report
}

/// Periodic interest rate (RATE) of an annuity.
///
/// Best effort: the last secant estimate is returned whether or not the
/// search converged. Use [`solve_rate`] to inspect the outcome.
pub fn rate(
    nper: f64,
    pmt: Money,
    pv: Money,
    fv: Money,
    timing: PaymentTiming,
    guess: Rate,
) -> Rate {
    let terms = AnnuityTerms {
        nper,
        pmt,
        pv,
        fv,
        timing,
    };
    solve_rate(&terms, effective_guess(guess)).state.rate
}
