use bigdecimal::BigDecimal;
use num_traits::{FromPrimitive, One, Zero};

/// Significant digits kept by every inexact division, e.g. `1 / 3`.
pub const DIVISION_PRECISION: u64 = 100;

/// A compounded gain within `10^-BREAK_EVEN_EXPONENT` of zero is left over from
/// rounded divisions, not profit. Rounding one rate costs at most
/// `10^-(DIVISION_PRECISION - 1)` relative error, so even a long cycle stays far
/// inside this bound.
pub const BREAK_EVEN_EXPONENT: u32 = 60;

/// Returns `10^exp` as an exact decimal.
pub fn pow10(exp: u32) -> BigDecimal {
    let ten = BigDecimal::from(10);
    (0..exp).fold(BigDecimal::one(), |acc, _| acc * &ten)
}

/// Converts a raw on-chain integer amount into whole token units.
pub fn scale_down(raw: &BigDecimal, decimals: u32) -> BigDecimal {
    raw / &pow10(decimals)
}

/// `numerator / denominator` rounded to `DIVISION_PRECISION` significant digits.
///
/// The caller guarantees a non-zero denominator.
pub fn divide(numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
    (numerator / denominator).with_prec(DIVISION_PRECISION)
}

/// Multiplies every rate together without intermediate rounding.
/// An empty iterator compounds to one.
pub fn compound<'a, I>(rates: I) -> BigDecimal
where
    I: IntoIterator<Item = &'a BigDecimal>,
{
    rates
        .into_iter()
        .fold(BigDecimal::one(), |product, rate| product * rate)
}

/// `10^-BREAK_EVEN_EXPONENT`
pub fn break_even_tolerance() -> BigDecimal {
    BigDecimal::one() / pow10(BREAK_EVEN_EXPONENT)
}

/// Net gain of a compounded rate, `compounded - 1`. Division residue inside
/// `break_even_tolerance()` collapses to exactly zero.
pub fn net_gain(compounded: &BigDecimal) -> BigDecimal {
    let gain = compounded - &BigDecimal::one();
    if gain.abs() <= break_even_tolerance() {
        BigDecimal::zero()
    } else {
        gain
    }
}

/// Renders `value` rounded to exactly `decimals` places, never in exponent form.
pub fn fixed_point(value: &BigDecimal, decimals: i64) -> String {
    let places = usize::try_from(decimals).unwrap_or(0);
    let rounded = value.round(decimals.max(0));

    if rounded.is_zero() {
        return match places {
            0 => "0".to_string(),
            _ => format!("0.{}", "0".repeat(places)),
        };
    }
    format!("{:.*}", places, rounded)
}

/// A usable conversion rate is strictly positive.
pub fn is_valid_rate(rate: &BigDecimal) -> bool {
    rate > &BigDecimal::zero()
}

/// `|a - b| <= tolerance`
pub fn approx_eq(a: &BigDecimal, b: &BigDecimal, tolerance: &BigDecimal) -> bool {
    (a - b).abs() <= *tolerance
}

/// Lifts a float into a decimal, refusing NaN and infinities.
pub fn decimal_from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_f64(value)
}
