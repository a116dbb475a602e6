//! Assertion primitives
//!
//! Each check returns the confirmation line to print on success or an
//! [`Error::Assertion`] describing the mismatch. Operands arrive already
//! interpolated and path-resolved.

use crate::common::{Error, Result};

/// Substring check against the last result (`haystack` is `None`) or an
/// explicit haystack
pub fn contains(last_text: &str, last_response: &str, haystack: Option<&str>, needle: &str) -> Result<String> {
    match haystack {
        None => {
            if last_text.contains(needle) || last_response.contains(needle) {
                Ok(format!("last response contains {:?}", needle))
            } else {
                Err(Error::Assertion(format!(
                    "last response does not contain {:?}",
                    needle
                )))
            }
        }
        Some(haystack) => {
            if haystack.contains(needle) {
                Ok(format!("{:?} contains {:?}", haystack, needle))
            } else {
                Err(Error::Assertion(format!(
                    "{:?} does not contain {:?}",
                    haystack, needle
                )))
            }
        }
    }
}

/// Exact equality against the last result or between two operands
pub fn equals(last_text: &str, last_response: &str, a: &str, b: Option<&str>) -> Result<String> {
    match b {
        None => {
            if last_text == a || last_response == a {
                Ok(format!("last response equals {:?}", a))
            } else {
                Err(Error::Assertion(format!(
                    "expected exactly {:?}, but got {:?}",
                    a, last_text
                )))
            }
        }
        Some(b) => {
            if a == b {
                Ok(format!("{:?} == {:?}", a, b))
            } else {
                Err(Error::Assertion(format!("{:?} != {:?}", a, b)))
            }
        }
    }
}

pub fn is_number(value: &str) -> Result<String> {
    parse_number(value)
        .map(|_| format!("{:?} is a number", value))
        .ok_or_else(|| Error::Assertion(format!("{:?} is not a number", value)))
}

/// Strict numeric `a > b`
pub fn greater_than(a: &str, b: &str) -> Result<String> {
    let (Some(x), Some(y)) = (parse_number(a), parse_number(b)) else {
        return Err(Error::Assertion(format!(
            "assert_gt arguments must be numbers, got {:?} and {:?}",
            a, b
        )));
    };

    if x > y {
        Ok(format!("{} > {}", a, b))
    } else {
        Err(Error::Assertion(format!("{} is not greater than {}", a, b)))
    }
}

/// Inclusive byte-length bounds
pub fn string_length(value: &str, min: usize, max: usize) -> Result<String> {
    let len = value.len();
    if (min..=max).contains(&len) {
        Ok(format!("length {} is within [{}, {}]", len, min, max))
    } else {
        Err(Error::Assertion(format!(
            "length of {:?} is {}, expected between {} and {}",
            value, len, min, max
        )))
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_last_result() {
        assert!(contains("Echo: hi", "{}", None, "hi").is_ok());
        assert!(contains("", "{\"sum\": 5}", None, "sum").is_ok());
        let err = contains("Echo: hi", "{}", None, "bye").unwrap_err();
        assert!(matches!(err, Error::Assertion(_)));
    }

    #[test]
    fn test_contains_explicit() {
        assert!(contains("", "", Some("hello world"), "lo wo").is_ok());
        assert!(contains("", "", Some("hello"), "").is_ok());
        assert!(contains("hello", "hello", Some("abc"), "hello").is_err());
    }

    #[test]
    fn test_equals() {
        assert!(equals("5", "", "5", None).is_ok());
        assert!(equals("", "raw", "raw", None).is_ok());
        assert!(equals("6", "", "5", None).is_err());
        assert!(equals("", "", "a", Some("a")).is_ok());
        assert!(equals("a", "a", "a", Some("b")).is_err());
    }

    #[test]
    fn test_is_number() {
        for ok in ["42", "-1", "3.25", "1e3"] {
            assert!(is_number(ok).is_ok(), "{}", ok);
        }
        for bad in ["abc", "", "4two"] {
            assert!(is_number(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_greater_than() {
        assert!(greater_than("10", "5").is_ok());
        assert!(greater_than("5", "10").is_err());
        assert!(greater_than("10", "10").is_err());
        assert!(greater_than("2.5", "2.25").is_ok());

        let err = greater_than("ten", "5").unwrap_err();
        assert!(matches!(err, Error::Assertion(_)));
        assert!(err.to_string().contains("must be numbers"));
    }

    #[test]
    fn test_string_length() {
        assert!(string_length("hello", 5, 5).is_ok());
        assert!(string_length("hello", 1, 10).is_ok());
        assert!(string_length("", 0, 0).is_ok());
        assert!(string_length("hello", 6, 10).is_err());
        assert!(string_length("hello", 0, 4).is_err());
        // byte length, not characters
        assert!(string_length("é", 2, 2).is_ok());
    }
}
