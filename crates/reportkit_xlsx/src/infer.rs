//! Semantic kind inference for loosely-typed text tokens.
//!
//! Accepted tokens consist of digits, at most one `.` and an optional
//! trailing `%`. Anything else stays plain text.

use crate::spec::{EnumCellKind, EnumTypedValue};

/// Classify a numeric-looking token.
///
/// Returns the inferred kind with its parsed value, or `None` when the token
/// must be rendered as plain text. Percent values are returned as ratios and
/// ratios greater than `1.0` are rejected.
pub fn classify_numeric_token(token: &str) -> Option<(EnumCellKind, f64)> {
    match parse_numeric_token(token)? {
        EnumTypedValue::Integer(val) => Some((EnumCellKind::Integer, val as f64)),
        EnumTypedValue::Numeric(val) => Some((EnumCellKind::Numeric, val)),
        EnumTypedValue::Percent(val) => Some((EnumCellKind::Percent, val)),
        _ => None,
    }
}

/// Infer a typed value from a text token, falling back to short text.
pub fn infer_typed_value(token: &str) -> EnumTypedValue {
    parse_numeric_token(token).unwrap_or_else(|| EnumTypedValue::ShortText(token.to_string()))
}

fn parse_numeric_token(token: &str) -> Option<EnumTypedValue> {
    let n_dots = token.matches('.').count();
    if n_dots > 1 {
        return None;
    }

    let if_has_percent = match token.find('%') {
        Some(n_pos) if n_pos + 1 == token.len() => true,
        Some(_) => return None,
        None => false,
    };

    if !token
        .chars()
        .all(|chr| chr.is_ascii_digit() || chr == '.' || chr == '%')
    {
        return None;
    }

    if if_has_percent {
        let c_number = &token[..token.len() - 1];
        let n_ratio = c_number.parse::<f64>().ok()? / 100.0;
        if n_ratio > 1.0 {
            return None;
        }
        return Some(EnumTypedValue::Percent(n_ratio));
    }

    if n_dots == 1 {
        return token.parse::<f64>().ok().map(EnumTypedValue::Numeric);
    }

    token.parse::<i64>().ok().map(EnumTypedValue::Integer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_tokens_are_integers() {
        assert_eq!(infer_typed_value("0"), EnumTypedValue::Integer(0));
        assert_eq!(infer_typed_value("42"), EnumTypedValue::Integer(42));
        assert_eq!(infer_typed_value("000123"), EnumTypedValue::Integer(123));
    }

    #[test]
    fn test_single_separator_tokens_are_numeric() {
        assert_eq!(infer_typed_value("3.25"), EnumTypedValue::Numeric(3.25));
        assert_eq!(infer_typed_value("10.0"), EnumTypedValue::Numeric(10.0));
    }

    #[test]
    fn test_percent_tokens_are_ratios() {
        assert_eq!(infer_typed_value("12.5%"), EnumTypedValue::Percent(0.125));
        assert_eq!(infer_typed_value("100.0%"), EnumTypedValue::Percent(1.0));
        assert_eq!(infer_typed_value("12%"), EnumTypedValue::Percent(0.12));
    }

    #[test]
    fn test_percent_above_one_is_text() {
        assert_eq!(
            infer_typed_value("150.0%"),
            EnumTypedValue::ShortText("150.0%".to_string())
        );
    }

    #[test]
    fn test_malformed_tokens_fall_back_to_text() {
        for token in ["12.5.3", "1%2", "%5", "abc", "-5", "1,000", "", "%", "1 2"] {
            assert_eq!(
                infer_typed_value(token),
                EnumTypedValue::ShortText(token.to_string()),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_large_integers_keep_full_precision() {
        assert_eq!(
            infer_typed_value("9007199254740993"),
            EnumTypedValue::Integer(9_007_199_254_740_993)
        );
        assert_eq!(
            infer_typed_value("9223372036854775807"),
            EnumTypedValue::Integer(i64::MAX)
        );
        assert_eq!(
            classify_numeric_token("42"),
            Some((EnumCellKind::Integer, 42.0))
        );
    }

    #[test]
    fn test_integer_overflow_is_text() {
        let c_token = "99999999999999999999999";
        assert_eq!(classify_numeric_token(c_token), None);
    }
}
