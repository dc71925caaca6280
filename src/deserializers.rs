//! Custom deserializers for flexible parsing of notebook files and tool arguments.

use serde::{Deserialize, Deserializer};

/// Deserializes a notebook `source` field.
///
/// nbformat allows either a single string or a list of strings (one per line,
/// each keeping its trailing newline). Both forms collapse to one `String`.
///
/// ```json
/// { "source": "print(1)\nprint(2)" }
/// { "source": ["print(1)\n", "print(2)"] }
/// ```
pub fn de_multiline_source<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Array(arr) => {
            let mut out = String::new();
            for el in arr {
                match el {
                    serde_json::Value::String(s) => out.push_str(&s),
                    other => {
                        return Err(D::Error::custom(format!(
                            "invalid source line: {}",
                            other
                        )));
                    }
                }
            }
            Ok(out)
        }
        other => Err(D::Error::custom(format!(
            "invalid type for source: {}",
            other
        ))),
    }
}

/// Deserializes Option<usize> accepting integers, floats (rounded), and numeric strings.
/// Examples: 5, 5.0, "5", "5.7" -> 6
pub fn de_option_usize_forgiving<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let opt = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(v) = opt else { return Ok(None) };
    let from_f64 = |f: f64| -> Result<Option<usize>, D::Error> {
        if !f.is_finite() {
            return Err(D::Error::custom("non-finite numeric for usize"));
        }
        let r = f.round();
        Ok(Some(if r < 0.0 { 0 } else { r as usize }))
    };
    match v {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Some(u as usize))
            } else if let Some(i) = n.as_i64() {
                Ok(Some(if i < 0 { 0 } else { i as usize }))
            } else if let Some(f) = n.as_f64() {
                from_f64(f)
            } else {
                Err(D::Error::custom("invalid numeric for usize"))
            }
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if let Ok(i) = s.parse::<i64>() {
                Ok(Some(if i < 0 { 0 } else { i as usize }))
            } else if let Ok(f) = s.parse::<f64>() {
                from_f64(f)
            } else {
                Err(D::Error::custom(format!("invalid usize value: '{}'", s)))
            }
        }
        other => Err(D::Error::custom(format!("invalid type for usize: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Src {
        #[serde(deserialize_with = "de_multiline_source")]
        source: String,
    }

    #[derive(Deserialize)]
    struct TopK {
        #[serde(default, deserialize_with = "de_option_usize_forgiving")]
        top_k: Option<usize>,
    }

    #[test]
    fn source_accepts_string_and_line_list() {
        let a: Src = serde_json::from_str(r#"{"source": "a\nb"}"#).unwrap();
        let b: Src = serde_json::from_str(r#"{"source": ["a\n", "b"]}"#).unwrap();
        assert_eq!(a.source, "a\nb");
        assert_eq!(a.source, b.source);
    }

    #[test]
    fn source_rejects_non_string_lines() {
        assert!(serde_json::from_str::<Src>(r#"{"source": ["a", 1]}"#).is_err());
    }

    #[test]
    fn top_k_is_forgiving() {
        let cases = [
            (r#"{"top_k": 3}"#, Some(3)),
            (r#"{"top_k": "4"}"#, Some(4)),
            (r#"{"top_k": 5.7}"#, Some(6)),
            (r#"{"top_k": -2}"#, Some(0)),
            (r#"{"top_k": ""}"#, None),
            (r#"{}"#, None),
        ];
        for (json, expected) in cases {
            let parsed: TopK = serde_json::from_str(json).unwrap();
            assert_eq!(parsed.top_k, expected, "input {json}");
        }
        assert!(serde_json::from_str::<TopK>(r#"{"top_k": "many"}"#).is_err());
    }
}
