//! Chilean national identity number (RUN / RUT).
//!
//! Customers type the number compactly (`19011022K`); the backend stores it
//! in the dotted form (`19.011.022-K`).

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a [`Run`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Not 7-8 digits followed by a digit or K.
    #[error("RUN must be 7-8 digits followed by a check digit or K (e.g. 19011022K)")]
    Format,
}

/// A RUN typed in compact form: 7 or 8 body digits followed by a check
/// character (`0-9` or `K`). The check character is stored uppercase.
///
/// Only the shape is validated; the modulo-11 check digit is not verified.
///
/// ```
/// use hazel_lab_core::Run;
///
/// let run = Run::parse("19011022k").unwrap();
/// assert_eq!(run.as_str(), "19011022K");
/// assert_eq!(run.formatted(), "19.011.022-K");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Run(String);

impl Run {
    /// Parse a compact RUN.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Format`] unless the input is exactly 7 or 8 ASCII
    /// digits followed by a digit, `k` or `K`.
    pub fn parse(s: &str) -> Result<Self, RunError> {
        let (body, check) = s.split_at_checked(s.len().saturating_sub(1)).ok_or(RunError::Format)?;

        let body_ok = (7..=8).contains(&body.len()) && body.bytes().all(|b| b.is_ascii_digit());
        let check_ok = matches!(check.as_bytes(), [b'0'..=b'9' | b'k' | b'K']);

        if body_ok && check_ok {
            Ok(Self(format!("{body}{}", check.to_ascii_uppercase())))
        } else {
            Err(RunError::Format)
        }
    }

    /// Returns the compact form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the dotted form, e.g. `19.011.022-K`.
    #[must_use]
    pub fn formatted(&self) -> String {
        format_rut(&self.0)
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Run {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Reformat any RUT-ish input as `12.345.678-9`.
///
/// Everything except digits and `k`/`K` is discarded. Inputs that keep fewer
/// than two characters are returned unchanged.
///
/// ```
/// use hazel_lab_core::format_rut;
///
/// assert_eq!(format_rut("12345678-9"), "12.345.678-9");
/// assert_eq!(format_rut("1.234.567k"), "1.234.567-K");
/// assert_eq!(format_rut("5"), "5");
/// ```
#[must_use]
pub fn format_rut(rut: &str) -> String {
    let clean: String = rut
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'k' | 'K'))
        .collect();

    let Some((body, check)) = clean
        .split_at_checked(clean.len().saturating_sub(1))
        .filter(|(body, _)| !body.is_empty())
    else {
        return rut.to_string();
    };

    let mut dotted = String::with_capacity(body.len() + body.len() / 3);
    for (i, c) in body.chars().enumerate() {
        if i > 0 && (body.len() - i) % 3 == 0 {
            dotted.push('.');
        }
        dotted.push(c);
    }

    format!("{dotted}-{}", check.to_ascii_uppercase())
}

/// Returns `true` if `rut` is already in dotted form (`1.234.567-8` or
/// `12.345.678-K`).
#[must_use]
pub fn is_formatted_rut(rut: &str) -> bool {
    let Some((body, check)) = rut.rsplit_once('-') else {
        return false;
    };
    let check_ok = matches!(check.as_bytes(), [b'0'..=b'9' | b'k' | b'K']);

    let groups: Vec<&str> = body.split('.').collect();
    let groups_ok = match groups.as_slice() {
        [head, mid, tail] => {
            (1..=2).contains(&head.len())
                && mid.len() == 3
                && tail.len() == 3
                && groups.iter().all(|g| g.bytes().all(|b| b.is_ascii_digit()))
        }
        _ => false,
    };

    check_ok && groups_ok
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_runs() {
        assert_eq!(Run::parse("19011022K").unwrap().as_str(), "19011022K");
        assert_eq!(Run::parse("1234567k").unwrap().as_str(), "1234567K");
        assert_eq!(Run::parse("123456789").unwrap().as_str(), "123456789");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for input in ["", "K", "123456K", "1234567890", "19.011.022-K", "1901102X", "ñ1234567"] {
            assert_eq!(Run::parse(input), Err(RunError::Format), "{input}");
        }
    }

    #[test]
    fn test_formatted() {
        assert_eq!(Run::parse("19011022K").unwrap().formatted(), "19.011.022-K");
        assert_eq!(Run::parse("12345678").unwrap().formatted(), "1.234.567-8");
    }

    #[test]
    fn test_format_rut_strips_noise() {
        assert_eq!(format_rut("19 011 022 k"), "19.011.022-K");
        assert_eq!(format_rut("19.011.022-K"), "19.011.022-K");
        assert_eq!(format_rut("x"), "x");
        assert_eq!(format_rut(""), "");
    }

    #[test]
    fn test_is_formatted_rut() {
        assert!(is_formatted_rut("12.345.678-9"));
        assert!(is_formatted_rut("1.234.567-K"));
        assert!(is_formatted_rut("1.234.567-k"));
        assert!(!is_formatted_rut("12345678-9"));
        assert!(!is_formatted_rut("123.456.789-0"));
        assert!(!is_formatted_rut("12.345.678"));
        assert!(!is_formatted_rut("12.34a.678-9"));
    }
}
