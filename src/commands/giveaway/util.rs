use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, ErrorKind, Result};

lazy_static! {
    static ref DURATION_REGEX: Regex =
        Regex::new(r"(?P<value>\d+)\s*(?P<unit>w|d|h|m|s)").unwrap();
    static ref DURATION_FORMAT_REGEX: Regex =
        Regex::new(r"^\s*(\d+\s*(w|d|h|m|s)\s*)+$").unwrap();
}

// Parses the giveaway duration in the `1d 2h 30m 15s` format. Parts can
// go in any order and may be written without spaces (e.g. `1h30m`).
pub fn parse_duration(text: &str) -> Result<Duration> {
    let text = text.to_lowercase();
    if !DURATION_FORMAT_REGEX.is_match(&text) {
        let message = format!(
            "`{}` is not a valid duration. Use something like `1h30m` or `45s`.",
            text.trim()
        );
        return Err(Error::from(ErrorKind::InvalidArgument(message)));
    }

    let mut total_seconds: u64 = 0;
    for captures in DURATION_REGEX.captures_iter(&text) {
        let value = captures["value"].parse::<u64>().map_err(|_| {
            let message = format!("The `{}` value is too big.", &captures["value"]);
            Error::from(ErrorKind::InvalidArgument(message))
        })?;
        let multiplier = match &captures["unit"] {
            "w" => 7 * 24 * 60 * 60,
            "d" => 24 * 60 * 60,
            "h" => 60 * 60,
            "m" => 60,
            _ => 1,
        };

        total_seconds = value
            .checked_mul(multiplier)
            .and_then(|seconds| total_seconds.checked_add(seconds))
            .ok_or_else(|| {
                let message = "The giveaway duration is too long.".to_string();
                Error::from(ErrorKind::InvalidArgument(message))
            })?;
    }

    if total_seconds == 0 {
        let message = "The giveaway duration must be longer than zero.".to_string();
        return Err(Error::from(ErrorKind::InvalidArgument(message)));
    }

    Ok(Duration::from_secs(total_seconds))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::commands::giveaway::util::parse_duration;
    use crate::error::{Error, ErrorKind};

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_duration("45s"), Ok(Duration::from_secs(45)));
    }

    #[test]
    fn test_parse_compact_duration() {
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
    }

    #[test]
    fn test_parse_duration_with_spaces_and_uppercase() {
        assert_eq!(
            parse_duration(" 1D 2h 3M 4s "),
            Ok(Duration::from_secs(86400 + 7200 + 180 + 4))
        );
    }

    #[test]
    fn test_parse_weeks() {
        assert_eq!(parse_duration("2w"), Ok(Duration::from_secs(2 * 7 * 86400)));
    }

    #[test]
    fn test_get_error_for_empty_string() {
        assert_eq!(
            parse_duration(""),
            Err(Error::from(ErrorKind::InvalidArgument(
                "`` is not a valid duration. Use something like `1h30m` or `45s`.".to_string()
            )))
        );
    }

    #[test]
    fn test_get_error_for_unknown_unit() {
        assert_eq!(
            parse_duration("10 minutes"),
            Err(Error::from(ErrorKind::InvalidArgument(
                "`10 minutes` is not a valid duration. Use something like `1h30m` or `45s`."
                    .to_string()
            )))
        );
    }

    #[test]
    fn test_get_error_for_zero_duration() {
        assert_eq!(
            parse_duration("0m"),
            Err(Error::from(ErrorKind::InvalidArgument(
                "The giveaway duration must be longer than zero.".to_string()
            )))
        );
    }

    #[test]
    fn test_get_error_for_overflow() {
        assert_eq!(
            parse_duration("99999999999999999999w"),
            Err(Error::from(ErrorKind::InvalidArgument(
                "The `99999999999999999999` value is too big.".to_string()
            )))
        );
    }
}
