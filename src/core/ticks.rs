//! Numeric tick math shared by the linear, sqrt and time scales.
//!
//! Step selection follows the familiar 1-2-5 progression: a raw step of
//! `span / count` is snapped to `{1, 2, 5, 10} * 10^k`.

const E10: f64 = 7.071_067_811_865_475; // sqrt(50)
const E5: f64 = 3.162_277_660_168_379_5; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Integer tick span `[i1, i2]` plus its increment.
///
/// A negative increment encodes `1 / -inc`, which keeps sub-unit steps exact.
fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let scaled = 10f64.powf(-power) / factor;
        i1 = (start * scaled).round();
        i2 = (stop * scaled).round();
        if i1 / scaled < start {
            i1 += 1.0;
        }
        if i2 / scaled > stop {
            i2 -= 1.0;
        }
        inc = -scaled;
    } else {
        let scaled = 10f64.powf(power) * factor;
        i1 = (start / scaled).round();
        i2 = (stop / scaled).round();
        if i1 * scaled < start {
            i1 += 1.0;
        }
        if i2 * scaled > stop {
            i2 -= 1.0;
        }
        inc = scaled;
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Raw tick increment for `[start, stop]`; negative values encode reciprocals.
#[must_use]
pub fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    tick_spec(start, stop, count).2
}

/// Signed tick step between `start` and `stop`.
#[must_use]
pub fn tick_step(start: f64, stop: f64, count: f64) -> f64 {
    let reverse = stop < start;
    let inc = if reverse {
        tick_increment(stop, start, count)
    } else {
        tick_increment(start, stop, count)
    };
    let magnitude = if inc < 0.0 { 1.0 / -inc } else { inc };
    if reverse { -magnitude } else { magnitude }
}

/// Roughly `count` round values spanning `[start, stop]`.
#[must_use]
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }

    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    let (i1, i2, inc) = tick_spec(lo, hi, count as f64);
    if !(i2 >= i1) {
        return Vec::new();
    }

    let n = (i2 - i1 + 1.0) as usize;
    let mut values: Vec<f64> = (0..n)
        .map(|i| {
            let k = i1 + i as f64;
            if inc < 0.0 { k / -inc } else { k * inc }
        })
        .collect();
    if reverse {
        values.reverse();
    }
    values
}

/// Extends `[start, stop]` outward to round tick boundaries.
///
/// Iterates until the increment is stable (at most ten passes).
#[must_use]
pub fn nice_domain(start: f64, stop: f64, count: usize) -> (f64, f64) {
    if !start.is_finite() || !stop.is_finite() || count == 0 || start == stop {
        return (start, stop);
    }

    let reverse = stop < start;
    let (mut lo, mut hi) = if reverse { (stop, start) } else { (start, stop) };
    let mut previous_step: Option<f64> = None;

    for _ in 0..10 {
        let step = tick_increment(lo, hi, count as f64);
        if previous_step == Some(step) {
            break;
        }
        if step > 0.0 {
            lo = (lo / step).floor() * step;
            hi = (hi / step).ceil() * step;
        } else if step < 0.0 {
            lo = (lo * step).ceil() / step;
            hi = (hi * step).floor() / step;
        } else {
            break;
        }
        previous_step = Some(step);
    }

    if reverse { (hi, lo) } else { (lo, hi) }
}

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "\u{b5}", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Formats `value` with `precision` significant digits and an SI suffix.
///
/// `1_500_000.0` becomes `1.5M`, `500_000.0` becomes `500k`, `0.0` becomes `0.0`.
#[must_use]
pub fn format_si(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let precision = precision.max(1);
    let negative = value < 0.0;
    let Some((digits, exponent)) = decimal_parts(value.abs(), precision) else {
        return value.to_string();
    };

    let prefix_exponent = (exponent.div_euclid(3)).clamp(-8, 8);
    let i = exponent - prefix_exponent * 3 + 1;
    let n = digits.len() as i32;

    let body = if i == n {
        digits
    } else if i > n {
        format!("{digits}{}", "0".repeat((i - n) as usize))
    } else if i > 0 {
        let split = i as usize;
        format!("{}.{}", &digits[..split], &digits[split..])
    } else {
        let shifted_precision = (precision as i32 + i - 1).max(0) as usize;
        let tail = decimal_parts(value.abs(), shifted_precision.max(1))
            .map(|(d, _)| d)
            .unwrap_or_default();
        format!("0.{}{tail}", "0".repeat((-i) as usize))
    };

    let suffix = SI_PREFIXES[(prefix_exponent + 8) as usize];
    let sign = if negative { "-" } else { "" };
    format!("{sign}{body}{suffix}")
}

/// Significant digits (no decimal point) and base-10 exponent of `value`.
fn decimal_parts(value: f64, precision: usize) -> Option<(String, i32)> {
    let formatted = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = formatted.split_once('e')?;
    let exponent = exponent.parse::<i32>().ok()?;
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    Some((digits, exponent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_follow_one_two_five_steps() {
        assert_eq!(ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn nice_domain_rounds_outward() {
        assert_eq!(nice_domain(0.0, 9_734.0, 10), (0.0, 10_000.0));
        assert_eq!(nice_domain(0.2, 0.97, 10), (0.2, 1.0));
        assert_eq!(nice_domain(0.0, 0.0, 10), (0.0, 0.0));
        assert_eq!(nice_domain(7.0, 7.0, 10), (7.0, 7.0));
    }

    #[test]
    fn si_format_uses_two_significant_digits() {
        assert_eq!(format_si(1_500_000.0, 2), "1.5M");
        assert_eq!(format_si(500_000.0, 2), "500k");
        assert_eq!(format_si(20_000.0, 2), "20k");
        assert_eq!(format_si(0.0, 2), "0.0");
    }
}
