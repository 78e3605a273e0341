use serde::{Deserialize, Serialize};

/// Monetary amounts. Outflows are negative, inflows positive.
pub type Money = f64;

/// Rates expressed as decimals (0.05 = 5%) per payment period. Never as percentages.
pub type Rate = f64;

/// Angles at the public boundary are always degrees.
pub type Degrees = f64;

/// When in each period the annuity payment falls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTiming {
    /// Ordinary annuity: payment at the end of each period.
    #[default]
    End,
    /// Annuity due: payment at the start of each period.
    Begin,
}

impl PaymentTiming {
    /// 1.0 for payments at period start, 0.0 otherwise.
    pub fn factor(self) -> f64 {
        match self {
            PaymentTiming::End => 0.0,
            PaymentTiming::Begin => 1.0,
        }
    }

    pub fn is_begin(self) -> bool {
        self == PaymentTiming::Begin
    }
}

impl From<bool> for PaymentTiming {
    fn from(at_period_start: bool) -> Self {
        if at_period_start {
            PaymentTiming::Begin
        } else {
            PaymentTiming::End
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
