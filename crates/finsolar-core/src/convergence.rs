//! Bounded iteration driver shared by the rate and solar solvers.
//!
//! A solver supplies a seed state, a residual (how far the state is from
//! its fixed point or root) and a step function. The driver owns the
//! iteration counter, so every loop stops after `max_iterations` steps
//! whatever the residual does.

use serde::{Deserialize, Serialize};

use crate::error::FinSolarError;
use crate::FinSolarResult;

/// Stopping rule for a solver loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceCriteria {
    pub max_iterations: u32,
    pub tolerance: f64,
}

/// How a solver loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceStatus {
    Converged,
    MaxIterationsExceeded,
    /// A residual or intermediate value left the function's domain (NaN, inf,
    /// acos of something outside [-1, 1]).
    OutOfDomain,
}

/// What to do with a loop that did not converge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergencePolicy {
    /// Non-convergence is an error.
    #[default]
    Strict,
    /// Return the last estimate and record a warning.
    BestEffort,
}

/// Result of a single step.
pub enum Step<S> {
    Next(S),
    /// The step could not be evaluated; carries the offending state.
    OutOfDomain(S),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport<S> {
    pub state: S,
    pub status: ConvergenceStatus,
    pub iterations: u32,
    /// Residual of the final state.
    pub last_delta: f64,
    /// Residual of every state visited, seed first.
    pub deltas: Vec<f64>,
}

impl<S> IterationReport<S> {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// Drive `step` from `seed` until `residual` is within tolerance, a step
/// leaves the domain, or the iteration budget is spent.
pub fn iterate<S, R, F>(
    seed: S,
    criteria: &ConvergenceCriteria,
    residual: R,
    mut step: F,
) -> IterationReport<S>
where
    R: Fn(&S) -> f64,
    F: FnMut(&S) -> Step<S>,
{
    let mut state = seed;
    let mut deltas = Vec::new();
    let mut iterations = 0u32;

    loop {
        let delta = residual(&state);
        deltas.push(delta);

        let status = if !delta.is_finite() {
            Some(ConvergenceStatus::OutOfDomain)
        } else if delta <= criteria.tolerance {
            Some(ConvergenceStatus::Converged)
        } else if iterations >= criteria.max_iterations {
            Some(ConvergenceStatus::MaxIterationsExceeded)
        } else {
            None
        };

        if let Some(status) = status {
            return IterationReport {
                state,
                status,
                iterations,
                last_delta: delta,
                deltas,
            };
        }

        iterations += 1;
        match step(&state) {
            Step::Next(next) => state = next,
            Step::OutOfDomain(bad) => {
                return IterationReport {
                    state: bad,
                    status: ConvergenceStatus::OutOfDomain,
                    iterations,
                    last_delta: delta,
                    deltas,
                };
            }
        }
    }
}

/// Apply `policy` to a finished loop. Under `BestEffort` a non-converged
/// report is passed through with a warning; under `Strict` it becomes an error.
pub fn settle<S>(
    report: IterationReport<S>,
    function: &str,
    policy: ConvergencePolicy,
    warnings: &mut Vec<String>,
) -> FinSolarResult<IterationReport<S>> {
    match (report.status, policy) {
        (ConvergenceStatus::Converged, _) => Ok(report),
        (ConvergenceStatus::MaxIterationsExceeded, ConvergencePolicy::Strict) => {
            Err(FinSolarError::ConvergenceFailure {
                function: function.into(),
                iterations: report.iterations,
                last_delta: report.last_delta,
            })
        }
        (ConvergenceStatus::OutOfDomain, ConvergencePolicy::Strict) => {
            Err(FinSolarError::DomainError {
                function: function.into(),
                reason: format!(
                    "iteration left the function domain after {} iterations",
                    report.iterations
                ),
            })
        }
        (ConvergenceStatus::MaxIterationsExceeded, ConvergencePolicy::BestEffort) => {
            warnings.push(format!(
                "{function} stopped after {} iterations (delta {}); using last estimate",
                report.iterations, report.last_delta
            ));
            Ok(report)
        }
        (ConvergenceStatus::OutOfDomain, ConvergencePolicy::BestEffort) => {
            warnings.push(format!(
                "{function} left the function domain after {} iterations; result is not meaningful",
                report.iterations
            ));
            Ok(report)
        }
    }
}
