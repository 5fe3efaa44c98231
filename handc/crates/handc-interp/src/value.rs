//! Runtime values and their deterministic stringification.

use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// A runtime value. Integers are arbitrary precision; floats are
/// IEEE-754 doubles.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(BigInt),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl Value {
    pub fn int(n: i64) -> Value {
        Value::Int(BigInt::from(n))
    }

    /// Canonical type name, as used in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::Text(_) => "Text",
            Value::Null => "Null",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view for widening arithmetic. Precision loss past 2^53
    /// is accepted exactly as the host double arithmetic would.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => n.to_f64(),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Strict-type equality: values of different kinds are never
    /// equal, so `1 == 1.0` is false and `null == 0` is false.
    pub fn eq_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }

    /// Deterministic stringification: `null`, `true`/`false`, decimal
    /// integers, and floats under the `%.15g` rule.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_g15(*f),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Format a double with 15 significant digits, `%g` style: fixed
/// notation while the exponent lies in [-4, 15), scientific otherwise,
/// trailing zeros stripped. Ties round to even (the host float
/// formatter's correct rounding).
pub fn format_g15(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    const P: i32 = 15;
    let sci = format!("{:.*e}", (P - 1) as usize, value);
    let (mantissa, exp_str) = sci.split_once('e').expect("scientific form has an exponent");
    let exp: i32 = exp_str.parse().expect("float exponent is an integer");

    if exp < -4 || exp >= P {
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        let sign = if exp < 0 { "-" } else { "+" };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (P - 1 - exp).max(0) as usize;
        let fixed = format!("{value:.decimals$}");
        if fixed.contains('.') {
            fixed
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            fixed
        }
    }
}

/// Decode a quoted Text lexeme to its runtime string: surrounding
/// quotes drop, the escapes `\n \t \r \\ \"` translate, and unknown
/// escapes are preserved literally.
pub fn decode_text_literal(lexeme: &str) -> String {
    let inner = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::Null.render(), "null");
        assert_eq!(Value::Bool(true).render(), "true");
        assert_eq!(Value::Bool(false).render(), "false");
        assert_eq!(Value::int(42).render(), "42");
        assert_eq!(Value::Text("hola".into()).render(), "hola");
    }

    #[test]
    fn test_format_g15_integral_floats() {
        assert_eq!(format_g15(2.0), "2");
        assert_eq!(format_g15(-3.0), "-3");
        assert_eq!(format_g15(0.0), "0");
    }

    #[test]
    fn test_format_g15_plain_fractions() {
        assert_eq!(format_g15(2.5), "2.5");
        assert_eq!(format_g15(0.1), "0.1");
        assert_eq!(format_g15(123456.789), "123456.789");
    }

    #[test]
    fn test_format_g15_rounds_to_15_significant_digits() {
        assert_eq!(format_g15(0.1 + 0.2), "0.3");
        assert_eq!(format_g15(1.0 / 3.0), "0.333333333333333");
        assert_eq!(format_g15(2.0 / 3.0), "0.666666666666667");
    }

    #[test]
    fn test_format_g15_scientific_range() {
        assert_eq!(format_g15(1e16), "1e+16");
        assert_eq!(format_g15(1.23e-5), "1.23e-05");
        assert_eq!(format_g15(-2.5e20), "-2.5e+20");
        assert_eq!(format_g15(1e-4), "0.0001");
    }

    #[test]
    fn test_strict_equality() {
        assert!(Value::int(1).eq_value(&Value::int(1)));
        assert!(!Value::int(1).eq_value(&Value::Float(1.0)));
        assert!(!Value::Null.eq_value(&Value::int(0)));
        assert!(Value::Null.eq_value(&Value::Null));
        assert!(!Value::Text("1".into()).eq_value(&Value::int(1)));
    }

    #[test]
    fn test_big_integers_render_in_full() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(
            Value::Int(big).render(),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn test_decode_text_literal() {
        assert_eq!(decode_text_literal("\"hola\""), "hola");
        assert_eq!(decode_text_literal("\"a\\n\\\"b\""), "a\n\"b");
        assert_eq!(decode_text_literal("\"tab\\there\""), "tab\there");
        // Unknown escapes stay literal.
        assert_eq!(decode_text_literal("\"\\q\""), "\\q");
        assert_eq!(decode_text_literal("\"👨‍👩‍👧‍👦\""), "👨‍👩‍👧‍👦");
    }
}
