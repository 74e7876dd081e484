//! Validation helpers for DTOs.

use serde_json::Value;
use validator::ValidationError;

const MAX_COLOR_TOKEN_LEN: usize = 32;

/// Validates that a color token is a short lowercase identifier.
///
/// # Examples
///
/// ```ignore
/// validate_color_token("red")        // Ok
/// validate_color_token("sea-green")  // Ok
/// validate_color_token("Red")        // Err - uppercase
/// validate_color_token("")           // Err - empty
/// ```
pub fn validate_color_token(token: &str) -> Result<(), ValidationError> {
    if token.is_empty() || token.len() > MAX_COLOR_TOKEN_LEN {
        let mut err = ValidationError::new("color_length");
        err.message = Some(
            format!(
                "Color token must be 1 to {MAX_COLOR_TOKEN_LEN} characters (got {})",
                token.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !token
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        let mut err = ValidationError::new("color_format");
        err.message =
            Some("Color token must contain only lowercase letters, digits or dashes".into());
        return Err(err);
    }

    Ok(())
}

/// Read a stroke count out of raw score input.
///
/// Integers, integral floats and numeric strings yield a value; anything else
/// (blank text, `null`, fractions, objects) yields `None`, which clears the hole.
/// Range checks are left to the ledger.
pub fn parse_strokes(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() <= i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
