use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Error, Result};

/// A number with an optional unit, e.g. `0.5`, `-1`, `0.5 m`, `2'`.
static UNIT_VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?<number>[+-]?(?:\d+\.?\d*|\.\d+))\s*(?<unit>[A-Za-z'"]*)\s*$"#)
        .expect("Failed to compile unit value regex")
});

/// Whether a `cycleway:*:buffer` value denotes a buffer being present.
///
/// Bare flags are answered directly; anything else must be a number with an
/// optional unit and counts as a buffer when strictly positive.
pub fn parse_buffer(raw: Option<&str>) -> Result<bool> {
    let raw = match raw {
        None | Some("no") | Some("0") => return Ok(false),
        Some("yes") => return Ok(true),
        Some(raw) => raw,
    };

    let number = UNIT_VALUE_PATTERN
        .captures(raw)
        .and_then(|captures| captures.name("number"))
        .and_then(|number| number.as_str().parse::<f64>().ok())
        .ok_or_else(|| Error::MalformedBufferValue {
            value: raw.to_string(),
            feature: None,
        })?;

    Ok(number > 0.0)
}
