/// JSON-RPC envelopes for the login endpoint and session calls.
use serde_json::{json, Value};

pub const LOGIN_METHOD: &str = "global.login";
pub const KEEP_ALIVE_METHOD: &str = "global.keepAlive";
pub const LOGOUT_METHOD: &str = "global.logout";

/// Client-type tag the device's own web UI sends.
pub const CLIENT_TYPE: &str = "Web3.0";

/// `error.code` a device puts on the probe reply when it issues a challenge.
pub const LOGIN_CHALLENGE_CODE: i64 = 268632079;

/// Seconds the device is asked to hold the session on keep-alive.
pub const KEEP_ALIVE_TIMEOUT_SECS: u64 = 300;

/// First `global.login`: empty password, which makes the device answer with
/// a challenge instead of attempting authentication.
pub fn probe_request(username: &str, id: u64) -> Value {
    json!({
        "method": LOGIN_METHOD,
        "params": {
            "userName": username,
            "password": "",
            "clientType": CLIENT_TYPE,
        },
        "id": id,
    })
}

/// Second `global.login`. `session` sits at the top level, not in `params`.
pub fn authenticated_request(
    username: &str,
    password_hash: &str,
    encryption: &str,
    id: u64,
    session: &Value,
) -> Value {
    json!({
        "method": LOGIN_METHOD,
        "params": {
            "userName": username,
            "password": password_hash,
            "clientType": CLIENT_TYPE,
            "authorityType": encryption,
            "passwordType": encryption,
        },
        "id": id,
        "session": session,
    })
}

/// Any call bound to an established session.
pub fn session_request(method: &str, params: Value, id: u64, session: &Value) -> Value {
    json!({
        "method": method,
        "params": params,
        "id": id,
        "session": session,
    })
}

pub fn keep_alive_params() -> Value {
    json!({ "timeout": KEEP_ALIVE_TIMEOUT_SECS, "active": false })
}

/// True only for a top-level `"result": true` (not `"true"`, not `1`).
pub fn is_success(response: &Value) -> bool {
    matches!(response.get("result"), Some(Value::Bool(true)))
}

/// `error.code` of a reply, if present.
pub fn error_code(response: &Value) -> Option<i64> {
    response.get("error")?.get("code")?.as_i64()
}

/// `error.message` of a reply, if present.
pub fn error_message(response: &Value) -> Option<&str> {
    response.get("error")?.get("message")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_has_empty_password_and_client_type() {
        let req = probe_request("admin", 7);
        assert_eq!(req["method"], "global.login");
        assert_eq!(req["params"]["userName"], "admin");
        assert_eq!(req["params"]["password"], "");
        assert_eq!(req["params"]["clientType"], "Web3.0");
        assert_eq!(req["id"], 7);
        assert!(req.get("session").is_none(), "probe must not carry a session");
    }

    #[test]
    fn authenticated_request_puts_session_at_top_level() {
        let session = json!("abc123");
        let req = authenticated_request("admin", "HASH", "Default", 8, &session);
        assert_eq!(req["session"], "abc123");
        assert!(req["params"].get("session").is_none());
        assert_eq!(req["params"]["password"], "HASH");
        assert_eq!(req["params"]["authorityType"], "Default");
        assert_eq!(req["params"]["passwordType"], "Default");
        assert_eq!(req["params"]["clientType"], "Web3.0");
    }

    #[test]
    fn authenticated_request_keeps_numeric_session_numeric() {
        let session = json!(1234567);
        let req = authenticated_request("admin", "HASH", "Default", 8, &session);
        assert_eq!(req["session"], 1234567);
    }

    #[test]
    fn keep_alive_request_shape() {
        let req = session_request(KEEP_ALIVE_METHOD, keep_alive_params(), 3, &json!("s"));
        assert_eq!(req["method"], "global.keepAlive");
        assert_eq!(req["params"]["timeout"], 300);
        assert_eq!(req["params"]["active"], false);
        assert_eq!(req["session"], "s");
    }

    #[test]
    fn is_success_only_for_boolean_true() {
        assert!(is_success(&json!({ "result": true })));
        assert!(!is_success(&json!({ "result": false })));
        assert!(!is_success(&json!({ "result": "true" })));
        assert!(!is_success(&json!({ "result": 1 })));
        assert!(!is_success(&json!({ "params": {} })));
        assert!(!is_success(&json!([true])));
    }

    #[test]
    fn error_fields_extracted() {
        let reply = json!({ "error": { "code": 268632079, "message": "Component error: login challenge!" } });
        assert_eq!(error_code(&reply), Some(LOGIN_CHALLENGE_CODE));
        assert_eq!(error_message(&reply), Some("Component error: login challenge!"));
        assert_eq!(error_code(&json!({})), None);
    }
}
