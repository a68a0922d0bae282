use std::str::FromStr;

use num_traits::{AsPrimitive, Float};

/// Parse an integer leniently.
///
/// Surrounding whitespace is ignored. Text that is not an integer but is a finite number is rounded
/// half away from zero and saturated. Anything else yields `0`.
pub fn parse_int<T>(text: &str) -> T
where
    T: FromStr + Default + Copy + 'static,
    f64: AsPrimitive<T>,
{
    let text = text.trim();
    text.parse::<T>().unwrap_or_else(|_| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.round().as_())
            .unwrap_or_default()
    })
}

/// Parse a floating point number leniently: surrounding whitespace is ignored and anything
/// unparsable yields NaN.
pub fn parse_float<T: FromStr + Float>(text: &str) -> T {
    text.trim().parse::<T>().unwrap_or_else(|_| T::nan())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn saturates_out_of_range() {
        assert_eq!(parse_int::<u8>("300"), 255);
        assert_eq!(parse_int::<i8>("-1000.2"), -128);
        assert_eq!(parse_int::<u32>("-5"), 0);
    }

    #[test]
    fn nan_and_inf_text() {
        assert_eq!(parse_int::<i32>("NaN"), 0);
        assert_eq!(parse_int::<i32>("inf"), 0);
        assert!(parse_float::<f64>("inf").is_infinite());
        assert!(parse_float::<f64>("1.2.3").is_nan());
    }
}
