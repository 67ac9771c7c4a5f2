pub mod acw_disposition;
pub mod agent_status;
pub mod call_session;
pub mod debug;
pub mod delivery_remarks;
pub mod order;
pub mod queue;
pub mod subscription_role;

use action_router::{action, ActionHandler, ActionRouter};
use legacy_runtime::CallAgentRuntimeClient;
use serde_json::{Number, Value};
use shared::payload::ActionPayload;

/// Slices backed by the call-agent runtime share one client.
pub fn register_call_agent_slices(router: &ActionRouter, runtime: &CallAgentRuntimeClient) {
    agent_status::register(router, runtime.clone());
    call_session::register(router, runtime.clone());
    queue::register(router, runtime.clone());
    acw_disposition::register(router, runtime.clone());
    debug::register(router, runtime.clone());
}

/// Handler that ignores its payload and makes one runtime call.
pub(crate) fn runtime_action<F>(runtime: &CallAgentRuntimeClient, call: F) -> ActionHandler
where
    F: Fn(&CallAgentRuntimeClient) + Send + Sync + 'static,
{
    let runtime = runtime.clone();
    action(move |_payload, _context| call(&runtime))
}

/// A payload value that counts as present: not missing, null, false, zero or
/// empty. Returned in the string form legacy code receives.
pub(crate) fn present_text(payload: &ActionPayload, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        _ => None,
    }
}

/// Numeric reading of a payload value, following the usual string-to-number
/// conversion: blanks read as zero, anything unparsable as not a number.
pub(crate) fn numeric_value(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64()?,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Null => 0.0,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0.0
            } else if trimmed.eq_ignore_ascii_case("inf")
                || trimmed.eq_ignore_ascii_case("infinity")
                || trimmed.eq_ignore_ascii_case("nan")
            {
                return None;
            } else {
                trimmed.parse::<f64>().ok()?
            }
        }
        Value::Array(_) | Value::Object(_) => return None,
    };
    number.is_finite().then_some(number)
}

/// Integral values travel as integers, everything else as floats.
pub(crate) fn json_number(value: f64) -> Option<Number> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

#[cfg(test)]
#[path = "../tests/slices_tests.rs"]
mod tests;
