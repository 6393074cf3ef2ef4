use std::fmt;

/// Dynamically typed scalar carried by constants, node inputs and outputs
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
}

impl Value {
    /// Parse the string form produced by `Display`.
    ///
    /// The first successful parse wins, in the order vector3, vector2,
    /// number, boolean, text. Text that happens to look like a number or a
    /// vector therefore comes back as that type.
    pub fn sniff(raw: &str) -> Value {
        if let Some([x, y, z]) = parse_components::<3>(raw) {
            return Value::Vec3([x, y, z]);
        }
        if let Some([x, y]) = parse_components::<2>(raw) {
            return Value::Vec2([x, y]);
        }
        if let Ok(n) = raw.trim().parse::<f64>() {
            return Value::Number(n);
        }
        if let Ok(b) = raw.trim().parse::<bool>() {
            return Value::Bool(b);
        }
        Value::Text(raw.to_string())
    }

    /// Short type label used in error messages and traces
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Vec2(_) => "vec2",
            Value::Vec3(_) => "vec3",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn parse_components<const N: usize>(raw: &str) -> Option<[f64; N]> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.trim().parse().ok()?;
    }
    Some(out)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Vec2([x, y]) => write!(f, "{},{}", x, y),
            Value::Vec3([x, y, z]) => write!(f, "{},{},{}", x, y, z),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<[f64; 2]> for Value {
    fn from(v: [f64; 2]) -> Self {
        Value::Vec2(v)
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Value::Vec3(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_follows_cascade_order() {
        assert_eq!(Value::sniff("1,2,3"), Value::Vec3([1.0, 2.0, 3.0]));
        assert_eq!(Value::sniff("0.5, -2"), Value::Vec2([0.5, -2.0]));
        assert_eq!(Value::sniff("6"), Value::Number(6.0));
        assert_eq!(Value::sniff("true"), Value::Bool(true));
        assert_eq!(Value::sniff("hello, world"), Value::Text("hello, world".into()));
        assert_eq!(Value::sniff("1,2,x"), Value::Text("1,2,x".into()));
    }

    #[test]
    fn numeric_text_does_not_survive_as_text() {
        let original = Value::Text("1.0".into());
        assert_eq!(Value::sniff(&original.to_string()), Value::Number(1.0));
    }

    #[test]
    fn display_matches_sniff() {
        for value in [
            Value::Number(1.5),
            Value::Bool(false),
            Value::Vec2([3.0, 4.0]),
            Value::Vec3([-1.0, 0.25, 8.0]),
            Value::Text("plain words".into()),
        ] {
            assert_eq!(Value::sniff(&value.to_string()), value);
        }
    }
}
