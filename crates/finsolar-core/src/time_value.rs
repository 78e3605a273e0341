//! Closed-form annuity formulas.
//!
//! These evaluate directly and return a plain `f64`: an argument outside a
//! formula's domain surfaces as NaN or infinity rather than an error. The
//! validated front door is [`crate::annuity::tvm`].

use crate::types::{Money, PaymentTiming, Rate};

/// `(1 + rate)` and the payment-timing multiplier: `1 + rate` for payments
/// at period start, `1` at period end.
fn growth_and_timing(rate: Rate, timing: PaymentTiming) -> (f64, f64) {
    let one_plus_r = 1.0 + rate;
    let timing_mult = if timing.is_begin() { one_plus_r } else { 1.0 };
    (one_plus_r, timing_mult)
}

/// Payment (PMT) per period for an annuity with the given present and future value.
pub fn pmt(rate: Rate, nper: f64, pv: Money, fv: Money, timing: PaymentTiming) -> Money {
    if rate == 0.0 {
        return -(fv + pv) / nper;
    }

    let (one_plus_r, timing_mult) = growth_and_timing(rate, timing);
    let factor = one_plus_r.powf(nper);

    (fv + pv * factor) * rate / (timing_mult * (1.0 - factor))
}

/// Number of periods (NPER) needed to move `pv` to `fv` with payment `pmt`.
pub fn nper(rate: Rate, pmt: Money, pv: Money, fv: Money, timing: PaymentTiming) -> f64 {
    if rate == 0.0 {
        return -(fv + pv) / pmt;
    }

    let (one_plus_r, timing_mult) = growth_and_timing(rate, timing);
    let scaled_pmt = timing_mult * pmt / rate;

    // ln((s - fv) / (s + pv)), taken on the negated pair when s - fv < 0
    let (num, den) = if scaled_pmt - fv < 0.0 {
        ((fv - scaled_pmt).ln(), (-pv - scaled_pmt).ln())
    } else {
        ((scaled_pmt - fv).ln(), (pv + scaled_pmt).ln())
    };

    (num - den) / one_plus_r.ln()
}

/// Net Present Value of cash flows at the end of periods 1, 2, ..., n.
///
/// The first flow is discounted by one full period.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Money {
    let one_plus_r = 1.0 + rate;
    let mut discount = one_plus_r;
    let mut result = 0.0;

    for cf in cash_flows {
        result += cf / discount;
        discount *= one_plus_r;
    }

    result
}

/// Present Value
pub fn pv(rate: Rate, nper: f64, pmt: Money, fv: Money, timing: PaymentTiming) -> Money {
    if rate == 0.0 {
        return -(nper * pmt + fv);
    }

    let (one_plus_r, timing_mult) = growth_and_timing(rate, timing);
    let factor = one_plus_r.powf(nper);

    (((1.0 - factor) / rate) * timing_mult * pmt - fv) / factor
}

/// Future Value
pub fn fv(rate: Rate, nper: f64, pmt: Money, pv: Money, timing: PaymentTiming) -> Money {
    if rate == 0.0 {
        return -(pv + nper * pmt);
    }

    let (one_plus_r, timing_mult) = growth_and_timing(rate, timing);
    let factor = one_plus_r.powf(nper);

    ((1.0 - factor) * timing_mult * pmt) / rate - pv * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    const END: PaymentTiming = PaymentTiming::End;
    const BEGIN: PaymentTiming = PaymentTiming::Begin;

    #[test]
    fn test_pmt_mortgage() {
        // 300k over 30 years at 5% nominal, monthly
        let result = pmt(0.05 / 12.0, 360.0, 300_000.0, 0.0, END);
        assert!((result - (-1610.4648690364195)).abs() < 1e-6);
    }

    #[test]
    fn test_pmt_annuity_due() {
        let result = pmt(0.05 / 4.0, 20.0, -10_000.0, 0.0, BEGIN);
        assert!((result - 561.1890334005388).abs() < 1e-9);
    }

    #[test]
    fn test_pmt_zero_rate_is_exact() {
        assert_eq!(pmt(0.0, 360.0, 30_000.0, 0.0, END), -30_000.0 / 360.0);
    }

    #[test]
    fn test_pv_basic() {
        let result = pv(0.08, 10.0, -100.0, 0.0, END);
        // 100 * (1 - 1/1.08^10) / 0.08 = ~671.008
        assert!((result - 671.0081).abs() < 1e-3);
    }

    #[test]
    fn test_pv_zero_rate() {
        assert_eq!(pv(0.0, 12.0, -100.0, -50.0, END), 1250.0);
    }

    #[test]
    fn test_fv_savings_plan() {
        // 500 deposit plus 200/month at start of month, 6% nominal, 10 years
        let result = fv(0.06 / 12.0, 120.0, -200.0, -500.0, BEGIN);
        assert!((result - 33_849.447_075).abs() < 1e-4);
    }

    #[test]
    fn test_fv_zero_rate_is_linear() {
        assert_eq!(fv(0.0, 10.0, -100.0, -1000.0, END), 2000.0);
    }

    #[test]
    fn test_nper_both_sign_conventions() {
        let borrower = nper(0.01, -100.0, 1000.0, 0.0, END);
        let lender = nper(0.01, 100.0, -1000.0, 0.0, END);
        assert!((borrower - 10.588_644_459).abs() < 1e-6);
        assert!((borrower - lender).abs() < 1e-12);
    }

    #[test]
    fn test_nper_zero_rate() {
        assert_eq!(nper(0.0, -250.0, 1000.0, 0.0, END), 4.0);
    }

    #[test]
    fn test_npv_discounts_first_flow() {
        let result = npv(0.10, &[110.0]);
        assert!((result - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_npv_zero_rate_sums() {
        assert_eq!(npv(0.0, &[-100.0, 50.0, 50.0, 50.0]), 50.0);
    }

    #[test]
    fn test_npv_empty() {
        assert_eq!(npv(0.05, &[]), 0.0);
    }

    #[test]
    fn test_pv_of_pmt_round_trips() {
        let payment = pmt(0.004, 240.0, 150_000.0, -10_000.0, BEGIN);
        let back = pv(0.004, 240.0, payment, -10_000.0, BEGIN);
        assert!((back - 150_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_base_fractional_power_is_nan() {
        assert!(pmt(-2.0, 2.5, 100.0, 0.0, END).is_nan());
    }
}
