use alloy::primitives::U256;

/// Blocks per year assuming a 15 second block time.
pub const BLOCKS_PER_YEAR: u64 = 2_102_400;
/// cToken balances carry 8 decimals.
pub const CTOKEN_DECIMALS: usize = 8;
pub const UNDERLYING_DECIMALS: usize = 18;

/// Renders a fixed-point amount as a decimal string.
///
/// Trailing zeros of the fraction are dropped but at least one fractional
/// digit is kept, so `0` renders as `"0.0"` and `10^decimals` as `"1.0"`.
/// With `decimals == 0` only the whole part is rendered.
pub fn format_units(amount: U256, decimals: usize) -> String {
    let digits = amount.to_string();
    if decimals == 0 {
        return digits;
    }
    let (whole, fraction) = if digits.len() <= decimals {
        ("0".to_string(), format!("{digits:0>decimals$}"))
    } else {
        let (whole, fraction) = digits.split_at(digits.len() - decimals);
        (whole.to_string(), fraction.to_string())
    };
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Annualized percentage of a per-block rate scaled by 1e18:
/// `rate * blocks_per_year / 1e18 * 100`.
pub fn annualized_percentage(rate: U256, blocks_per_year: u64) -> f64 {
    f64::from(rate) * blocks_per_year as f64 / 1e18 * 100.0
}

/// Rounds to 3 decimals for display, dropping trailing zeros.
///
/// Exact halves round away from zero (`1.0625` -> `1.063`).
pub fn format_percentage(value: f64) -> String {
    // `{:.3}` breaks exact ties to even. A double sits exactly halfway between
    // two thousandths only when 16 * value is an odd integer. Below 2^40 one
    // ulp is far smaller than a thousandth, so stepping past the tie is safe.
    let sixteenths = value * 16.0;
    let halfway = sixteenths.fract() == 0.0 && sixteenths % 2.0 != 0.0;
    let value = if halfway && value.abs() < (1u64 << 40) as f64 {
        f64::from_bits(value.to_bits() + 1)
    } else {
        value
    };
    let rounded = format!("{value:.3}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}
