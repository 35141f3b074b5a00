//! Interpretation of interpreter stdout.

use focusbridge_types::{ErrorInfo, ErrorKind, ScriptOutcome};
use serde_json::{Map, Value};

/// Turn successful-process stdout into an outcome.
///
/// Output is trimmed; empty output is an absence (`Null`) result, JSON is
/// decoded, and anything else is returned as a string. A decoded object that
/// is itself an outcome envelope is adopted, which is how scripts report
/// domain failures such as `NOT_FOUND`.
pub fn parse_output(stdout: &str) -> ScriptOutcome<Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return ScriptOutcome::ok(Some(Value::Null));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(object)) if is_envelope(&object) => adopt_envelope(object),
        Ok(value) => ScriptOutcome::ok(Some(value)),
        Err(_) => ScriptOutcome::ok(Some(Value::String(trimmed.to_string()))),
    }
}

fn is_envelope(object: &Map<String, Value>) -> bool {
    object.get("success").is_some_and(Value::is_boolean) && (object.contains_key("data") || object.contains_key("error"))
}

fn adopt_envelope(mut object: Map<String, Value>) -> ScriptOutcome<Value> {
    if object.get("success") == Some(&Value::Bool(true)) {
        return ScriptOutcome::ok(Some(object.remove("data").unwrap_or(Value::Null)));
    }
    let error = object.remove("error").unwrap_or(Value::Null);
    ScriptOutcome::failed(envelope_error(&error))
}

fn envelope_error(error: &Value) -> ErrorInfo {
    let text = |field: &str| error.get(field).and_then(Value::as_str).map(str::to_string);

    let kind = text("type").map(|kind| ErrorKind::from_wire(&kind)).unwrap_or(ErrorKind::Unknown);
    let code = text("code").unwrap_or_else(|| kind.code().to_string());
    let message = text("originalMessage")
        .or_else(|| text("message"))
        .or_else(|| error.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("script reported failure {}", code));
    ErrorInfo::with_code(code, kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusbridge_types::codes;
    use serde_json::json;

    #[test]
    fn empty_output_is_absence() {
        let outcome = parse_output("  \n");
        assert!(outcome.success);
        assert_eq!(outcome.data, Some(Value::Null));
    }

    #[test]
    fn json_is_decoded_after_trimming() {
        let outcome = parse_output("\n {\"items\": [1]} \n");
        assert_eq!(outcome.data, Some(json!({"items": [1]})));
        assert_eq!(parse_output("true").data, Some(json!(true)));
    }

    #[test]
    fn plain_text_is_returned_verbatim() {
        let outcome = parse_output("  OmniFocus 4.2  ");
        assert_eq!(outcome.data, Some(json!("OmniFocus 4.2")));
    }

    #[test]
    fn successful_envelope_is_unwrapped() {
        let outcome = parse_output(r#"{"success": true, "data": {"id": "t1"}}"#);
        assert!(outcome.success);
        assert_eq!(outcome.data, Some(json!({"id": "t1"})));
    }

    #[test]
    fn failed_envelope_keeps_script_code() {
        let outcome = parse_output(
            r#"{"success": false, "error": {"code": "NOT_FOUND", "type": "UNKNOWN", "originalMessage": "Task t9 not found"}}"#,
        );
        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert_eq!(error.code, codes::NOT_FOUND);
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert_eq!(error.message, "Task t9 not found");
    }

    #[test]
    fn envelope_error_falls_back_to_kind_code_and_message_field() {
        let outcome = parse_output(r#"{"success": false, "error": {"type": "SCRIPT_ERROR", "message": "bad filter"}}"#);
        let error = outcome.error.unwrap();
        assert_eq!(error.code, codes::SCRIPT_ERROR);
        assert_eq!(error.message, "bad filter");
    }

    #[test]
    fn objects_that_merely_have_success_are_data() {
        let outcome = parse_output(r#"{"success": true, "count": 3}"#);
        assert_eq!(outcome.data, Some(json!({"success": true, "count": 3})));
    }
}
