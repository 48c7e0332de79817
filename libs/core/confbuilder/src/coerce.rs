//! Conversion of raw environment strings into typed field values.

use crate::level::Level;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// A type that can be parsed from a single environment variable value.
///
/// Implement this (and invoke [`env_leaf!`](crate::env_leaf)) to let a
/// custom type appear as a leaf in an `EnvConfig` struct.
pub trait FromEnvValue: Sized + DeserializeOwned {
    /// Human readable kind used in error messages, e.g. `"duration"`.
    const KIND: &'static str;

    fn from_env_value(raw: &str) -> Result<Self, String>;

    /// Decode the value a config file holds for this leaf. Defaults to the
    /// type's serde representation.
    fn from_json_value(value: Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

impl FromEnvValue for String {
    const KIND: &'static str = "string";

    fn from_env_value(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

macro_rules! from_str_value {
    ($kind:literal => $($ty:ty),+ $(,)?) => {
        $(
            impl FromEnvValue for $ty {
                const KIND: &'static str = $kind;

                fn from_env_value(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )+
    };
}

from_str_value!("integer" => i8, i16, i32, i64, i128, isize);
from_str_value!("unsigned integer" => u8, u16, u32, u64, u128, usize);
from_str_value!("float" => f32, f64);

impl FromEnvValue for bool {
    const KIND: &'static str = "boolean";

    fn from_env_value(raw: &str) -> Result<Self, String> {
        match raw {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err("expected one of 1, t, true, 0, f, false".to_string()),
        }
    }
}

impl FromEnvValue for Duration {
    const KIND: &'static str = "duration";

    fn from_env_value(raw: &str) -> Result<Self, String> {
        parse_duration(raw)
    }

    /// Integer nanoseconds, a duration string such as `"30s"`, or serde's
    /// `{"secs": .., "nanos": ..}` form.
    fn from_json_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(Duration::from_nanos)
                .ok_or_else(|| format!("expected a non-negative integer of nanoseconds, found {n}")),
            Value::String(s) => parse_duration(&s),
            other => serde_json::from_value(other).map_err(|e| e.to_string()),
        }
    }
}

impl FromEnvValue for Level {
    const KIND: &'static str = "log level";

    fn from_env_value(raw: &str) -> Result<Self, String> {
        raw.parse().map_err(|e: crate::level::ParseLevelError| e.to_string())
    }
}

/// Comma separated list. Elements are trimmed; order, duplicates and empty
/// elements are kept.
impl FromEnvValue for Vec<String> {
    const KIND: &'static str = "string list";

    fn from_env_value(raw: &str) -> Result<Self, String> {
        Ok(raw.split(',').map(|part| part.trim().to_string()).collect())
    }
}

/// Optional leaf: any value present in the environment or a config file
/// becomes `Some`.
impl<T: FromEnvValue> FromEnvValue for Option<T> {
    const KIND: &'static str = T::KIND;

    fn from_env_value(raw: &str) -> Result<Self, String> {
        T::from_env_value(raw).map(Some)
    }

    fn from_json_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            value => T::from_json_value(value).map(Some),
        }
    }
}

fn unit_nanos(unit: &str) -> Option<u64> {
    Some(match unit {
        "ns" => 1,
        "us" | "\u{b5}s" | "\u{3bc}s" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 60 * 60 * 1_000_000_000,
        _ => return None,
    })
}

/// Parse a duration such as `"300ms"`, `"1.5h"` or `"2h45m10s"`.
///
/// The input is a sequence of decimal numbers, each with an optional
/// fraction and a mandatory unit (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`).
/// A bare `"0"` is accepted. Negative durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration {input:?}");
    let overflow = || format!("duration {input:?} is out of range");

    if input.starts_with('-') {
        return Err(format!("negative duration {input:?} is not supported"));
    }
    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, after) = rest.split_at(int_len);
        let (frac_digits, after) = match after.strip_prefix('.') {
            Some(after) => after.split_at(after.bytes().take_while(u8::is_ascii_digit).count()),
            None => ("", after),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        let unit_len = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        if unit.is_empty() {
            return Err(format!("missing unit in duration {input:?}"));
        }
        let scale =
            unit_nanos(unit).ok_or_else(|| format!("unknown unit {unit:?} in duration {input:?}"))?;

        let whole: u64 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        // Digits past the 18th cannot change the result at nanosecond scale
        let (mut frac, mut divisor) = (0u128, 1u128);
        for digit in frac_digits.bytes().take(18) {
            frac = frac * 10 + u128::from(digit - b'0');
            divisor *= 10;
        }
        let frac_nanos = u64::try_from(frac * u128::from(scale) / divisor).map_err(|_| overflow())?;
        nanos = nanos.checked_add(frac_nanos).ok_or_else(overflow)?;

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = after;
    }

    Ok(Duration::from_nanos(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_verbatim() {
        assert_eq!(String::from_env_value("  spaced  ").unwrap(), "  spaced  ");
    }

    #[test]
    fn test_integers() {
        assert_eq!(i32::from_env_value("9090").unwrap(), 9090);
        assert_eq!(i64::from_env_value("-42").unwrap(), -42);
        assert!(i32::from_env_value("9090x").is_err());
        assert!(i8::from_env_value("300").is_err());
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        assert_eq!(u32::from_env_value("500").unwrap(), 500);
        assert!(u32::from_env_value("-5").is_err());
        assert!(u64::from_env_value("five").is_err());
        assert!(u8::from_env_value("256").is_err());
    }

    #[test]
    fn test_floats() {
        assert_eq!(f64::from_env_value("2.5").unwrap(), 2.5);
        assert_eq!(f32::from_env_value("0.75").unwrap(), 0.75f32);
        assert_eq!(f64::from_env_value("1e3").unwrap(), 1000.0);
        assert!(f64::from_env_value("fast").is_err());
    }

    #[test]
    fn test_bool_grammar() {
        for raw in ["1", "t", "T", "true", "TRUE", "True"] {
            assert!(bool::from_env_value(raw).unwrap(), "{raw}");
        }
        for raw in ["0", "f", "F", "false", "FALSE", "False"] {
            assert!(!bool::from_env_value(raw).unwrap(), "{raw}");
        }
        for raw in ["yes", "no", "tRUE", "2", "on"] {
            assert!(bool::from_env_value(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_string_list_trims_and_keeps_everything() {
        assert_eq!(
            Vec::<String>::from_env_value(" tag1 , tag2 ").unwrap(),
            vec!["tag1", "tag2"]
        );
        assert_eq!(
            Vec::<String>::from_env_value("a,a,,b").unwrap(),
            vec!["a", "a", "", "b"]
        );
        assert_eq!(Vec::<String>::from_env_value("solo").unwrap(), vec!["solo"]);
    }

    #[test]
    fn test_level() {
        assert_eq!(Level::from_env_value("error").unwrap(), Level::ERROR);
        assert!(Level::from_env_value("BOGUS").unwrap_err().contains("BOGUS"));
    }

    #[test]
    fn test_option_wraps_inner_kind() {
        assert_eq!(<Option<u32>>::KIND, "unsigned integer");
        assert_eq!(<Option<u32>>::from_env_value("3").unwrap(), Some(3));
        assert!(<Option<u32>>::from_env_value("three").is_err());
        assert_eq!(<Option<u32>>::from_json_value(Value::Null).unwrap(), None);
    }

    #[test]
    fn test_duration_from_json_forms() {
        assert_eq!(
            Duration::from_json_value(json!(30_000_000_000u64)).unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            Duration::from_json_value(json!("1m30s")).unwrap(),
            Duration::from_secs(90)
        );
        assert_eq!(
            Duration::from_json_value(json!({"secs": 2, "nanos": 0})).unwrap(),
            Duration::from_secs(2)
        );
        assert!(Duration::from_json_value(json!(-1)).is_err());
        assert!(Duration::from_json_value(json!(1.5)).is_err());
        assert!(Duration::from_json_value(json!("soon")).is_err());
        assert!(Duration::from_json_value(json!(true)).is_err());
    }

    #[test]
    fn test_default_json_decoding_uses_serde() {
        assert_eq!(u16::from_json_value(json!(8080)).unwrap(), 8080);
        assert!(u16::from_json_value(json!("8080")).is_err());
        assert_eq!(Level::from_json_value(json!("WARN")).unwrap(), Level::WARN);
        assert_eq!(
            Vec::<String>::from_json_value(json!(["a", "b"])).unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_duration_simple_units() {
        assert_eq!(parse_duration("60s").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("10ms").unwrap(), Duration::from_millis(10));
        assert_eq!(parse_duration("5us").unwrap(), Duration::from_micros(5));
        assert_eq!(parse_duration("5µs").unwrap(), Duration::from_micros(5));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_duration_compound_and_fractional() {
        assert_eq!(
            parse_duration("2h45m10s").unwrap(),
            Duration::from_secs(2 * 3600 + 45 * 60 + 10)
        );
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1.s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("+3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_duration_rejects_malformed() {
        for raw in ["", "not-a-duration", "10", "s", ".s", "5 s", "3d", "-1s", "1.2.3s"] {
            assert!(parse_duration(raw).is_err(), "{raw:?} should fail");
        }
    }

    #[test]
    fn test_duration_missing_unit_message() {
        let err = parse_duration("10").unwrap_err();
        assert!(err.contains("missing unit"));
    }

    #[test]
    fn test_duration_overflow() {
        assert!(parse_duration("99999999999999999999h").is_err());
        assert!(parse_duration("9999999999999h").is_err());
    }
}
