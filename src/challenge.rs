/// Login challenge carried by the probe reply.
use serde_json::Value;

use crate::digest::EncryptionScheme;
use crate::error::{LoginError, LoginResult};

/// Server-issued challenge. Single use: valid for exactly one authenticated
/// request on the same `session`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginChallenge {
    pub random: String,
    pub realm: String,
    pub encryption: String,
    /// Opaque; echoed verbatim, string or number as the device sent it.
    pub session: Value,
}

impl LoginChallenge {
    /// Extract `params.{random,realm,encryption}` and top-level `session`.
    /// Every field must be present and non-empty.
    pub fn from_response(response: &Value) -> LoginResult<Self> {
        let params = response.get("params").unwrap_or(&Value::Null);
        let random = required_str(params, "random")?;
        let realm = required_str(params, "realm")?;
        let encryption = required_str(params, "encryption")?;

        let session = match response.get("session") {
            Some(Value::String(s)) if !s.is_empty() => Value::String(s.clone()),
            Some(n @ Value::Number(_)) => n.clone(),
            _ => return Err(missing("session")),
        };

        Ok(Self {
            random,
            realm,
            encryption,
            session,
        })
    }

    pub fn scheme(&self) -> EncryptionScheme {
        EncryptionScheme::parse(&self.encryption)
    }
}

fn required_str(params: &Value, field: &str) -> LoginResult<String> {
    match params.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> LoginError {
    LoginError::MalformedResponse(format!("challenge is missing `{field}`"))
}
