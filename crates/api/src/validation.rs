//! Argument validation against a workflow's declared `args_schema` (spec
//! §1: deliberately out of core scope, so it lives here at the HTTP
//! boundary rather than in `engine`). Constraint set per spec §6.1/§7:
//! minimum, maximum, max_length, pattern, max_items.

use std::collections::HashMap;

use engine::{ArgKind, ArgSchema};
use regex::Regex;
use serde_json::Value;

pub fn validate(schema: &HashMap<String, ArgSchema>, args: &Value) -> Result<(), String> {
    let obj = args.as_object().ok_or_else(|| "args must be a JSON object".to_string())?;

    for (key, spec) in schema {
        let Some(value) = obj.get(key) else { continue };

        match spec.kind {
            ArgKind::Integer => {
                let n = value.as_i64().ok_or_else(|| format!("'{key}' must be an integer"))?;
                check_range(key, n as f64, spec)?;
            }
            ArgKind::Float => {
                let n = value.as_f64().ok_or_else(|| format!("'{key}' must be a number"))?;
                check_range(key, n, spec)?;
            }
            ArgKind::String => {
                let s = value.as_str().ok_or_else(|| format!("'{key}' must be a string"))?;
                if let Some(max_length) = spec.max_length {
                    if s.chars().count() > max_length {
                        return Err(format!("'{key}' exceeds max_length {max_length}"));
                    }
                }
                if let Some(pattern) = &spec.pattern {
                    let re = Regex::new(pattern).map_err(|_| format!("'{key}' has a malformed pattern"))?;
                    if !re.is_match(s) {
                        return Err(format!("'{key}' does not match the required pattern"));
                    }
                }
            }
            ArgKind::Boolean => {
                value.as_bool().ok_or_else(|| format!("'{key}' must be a boolean"))?;
            }
            ArgKind::Array => {
                let arr = value.as_array().ok_or_else(|| format!("'{key}' must be an array"))?;
                if let Some(max_items) = spec.max_items {
                    if arr.len() > max_items {
                        return Err(format!("'{key}' exceeds max_items {max_items}"));
                    }
                }
            }
        }
    }

    Ok(())
}

fn check_range(key: &str, n: f64, spec: &ArgSchema) -> Result<(), String> {
    if let Some(minimum) = spec.minimum {
        if n < minimum {
            return Err(format!("'{key}' is below minimum {minimum}"));
        }
    }
    if let Some(maximum) = spec.maximum {
        if n > maximum {
            return Err(format!("'{key}' is above maximum {maximum}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(kind: ArgKind) -> HashMap<String, ArgSchema> {
        let mut m = HashMap::new();
        m.insert(
            "x".to_string(),
            ArgSchema { kind, minimum: None, maximum: None, max_length: None, pattern: None, max_items: None },
        );
        m
    }

    #[test]
    fn integer_out_of_range_is_rejected() {
        let mut s = schema(ArgKind::Integer);
        s.get_mut("x").unwrap().maximum = Some(10.0);
        let args = serde_json::json!({ "x": 20 });
        assert!(validate(&s, &args).is_err());
    }

    #[test]
    fn string_pattern_mismatch_is_rejected() {
        let mut s = schema(ArgKind::String);
        s.get_mut("x").unwrap().pattern = Some("^[a-z]+$".to_string());
        let args = serde_json::json!({ "x": "ABC" });
        assert!(validate(&s, &args).is_err());
    }

    #[test]
    fn missing_optional_key_is_allowed() {
        let s = schema(ArgKind::Boolean);
        let args = serde_json::json!({});
        assert!(validate(&s, &args).is_ok());
    }
}
