use serde_json::{Map, Number, Value};

pub type ActionPayload = Map<String, Value>;

const DATA_ATTRIBUTE_PREFIX: &str = "data-";
const ARGUMENT_PREFIX: &str = "arg";

/// Largest integer magnitude an IEEE double represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Maps an attribute name onto its dataset key (`data-action-event` ->
/// `actionEvent`). Returns `None` for attributes outside the `data-` namespace.
pub fn dataset_key(attribute_name: &str) -> Option<String> {
    let rest = attribute_name.strip_prefix(DATA_ATTRIBUTE_PREFIX)?;
    let mut key = String::with_capacity(rest.len());
    let mut chars = rest.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '-' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_lowercase) {
                key.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        key.push(ch);
    }

    Some(key)
}

/// Strips the argument prefix from a dataset key and lower-cases the first
/// remaining character. Keys that do not continue on a word boundary after the
/// prefix (`argumentX`, `arg`) are not arguments.
pub fn argument_key(dataset_key: &str) -> Option<String> {
    let rest = dataset_key.strip_prefix(ARGUMENT_PREFIX)?;
    let mut chars = rest.chars();
    let first = chars.next().filter(char::is_ascii_uppercase)?;

    let mut key = String::with_capacity(rest.len());
    key.push(first.to_ascii_lowercase());
    key.push_str(chars.as_str());
    Some(key)
}

/// Coerces one attribute string. `None` stands for `undefined`: the argument is
/// declared but carries no value, and is left out of the payload.
pub fn coerce_action_value(raw: &str) -> Option<Value> {
    match raw {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        "undefined" => return None,
        "" => return Some(Value::String(String::new())),
        _ => {}
    }

    if let Some(number) = canonical_number(raw) {
        return Some(Value::Number(number));
    }

    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(structured) = serde_json::from_str::<Value>(raw) {
            return Some(structured);
        }
    }

    Some(Value::String(raw.to_string()))
}

/// Builds the payload from a dataset view, keeping only argument entries.
pub fn extract_action_payload<I, K, V>(dataset: I) -> ActionPayload
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut payload = ActionPayload::new();

    for (dataset_key, raw_value) in dataset {
        let Some(key) = argument_key(dataset_key.as_ref()) else {
            continue;
        };

        match coerce_action_value(raw_value.as_ref()) {
            Some(value) => {
                payload.insert(key, value);
            }
            None => {
                payload.remove(&key);
            }
        }
    }

    payload
}

fn canonical_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    let parsed: f64 = trimmed.parse().ok()?;
    if !parsed.is_finite() || format_ecmascript_number(parsed) != trimmed {
        return None;
    }

    if parsed.fract() == 0.0 && parsed.abs() < MAX_EXACT_INTEGER {
        return Some(Number::from(parsed as i64));
    }

    Number::from_f64(parsed)
}

/// Renders a finite double the way ECMAScript `Number.prototype.toString` does:
/// shortest round-trip digits, plain notation for magnitudes in `[1e-6, 1e21)`,
/// exponent notation with an explicit sign otherwise.
pub fn format_ecmascript_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }

    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

#[cfg(test)]
#[path = "tests/payload_tests.rs"]
mod tests;
