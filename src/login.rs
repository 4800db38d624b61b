/// Two-phase `global.login` handshake.
///
/// Probe with an empty password, read the challenge, derive the digest, and
/// resubmit it on the same session. Each attempt is independent: nothing from
/// one challenge survives into the next.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::challenge::LoginChallenge;
use crate::error::LoginResult;
use crate::rpc;
use crate::transport::{merge_cookies, RpcReply, Transport};

/// Keep-alive interval assumed when the device does not state one.
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;

#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a completed handshake. `success == false` means the device
/// rejected the credentials; transport and protocol failures are `LoginError`s.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub success: bool,
    /// Final reply as JSON. An unparsable body is kept as a JSON string.
    pub raw_response: Value,
    /// Session id the handshake ran on.
    pub session: Value,
    /// Cookie header to present on follow-up calls, if the device set any.
    pub cookie: Option<String>,
}

impl LoginOutcome {
    /// Session id as text, whether the device sent a string or a number.
    pub fn session_id(&self) -> Option<String> {
        match &self.session {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn keep_alive_interval(&self) -> u64 {
        self.raw_response
            .get("params")
            .and_then(|p| p.get("keepAliveInterval"))
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_KEEP_ALIVE_SECS)
    }

    /// Device's explanation for a rejected login.
    pub fn error_message(&self) -> Option<&str> {
        rpc::error_message(&self.raw_response)
    }
}

/// Where the handshake stands after the probe.
enum ProbeReply {
    /// Normal path: device issued a challenge.
    AwaitingResult {
        challenge: LoginChallenge,
        cookie: Option<String>,
    },
    /// Device accepted the empty-password probe outright.
    Accepted {
        response: Value,
        cookie: Option<String>,
    },
}

pub struct LoginEngine<T> {
    transport: T,
    next_id: AtomicU64,
}

impl<T: Transport> LoginEngine<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request ids increase across every call this engine makes.
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn attempt_login(
        &self,
        endpoint: &str,
        credential: &Credential,
    ) -> LoginResult<LoginOutcome> {
        let (challenge, probe_cookie) = match self.probe(endpoint, &credential.username).await? {
            ProbeReply::AwaitingResult { challenge, cookie } => (challenge, cookie),
            ProbeReply::Accepted { response, cookie } => {
                info!("{endpoint}: probe accepted without a challenge");
                let session = response.get("session").cloned().unwrap_or(Value::Null);
                return Ok(LoginOutcome {
                    success: true,
                    raw_response: response,
                    session,
                    cookie,
                });
            }
        };

        // Unsupported schemes stop here: no hashing, no second request.
        let secret = challenge
            .scheme()
            .derive(
                &credential.username,
                &credential.password,
                &challenge.realm,
                &challenge.random,
            )
            .inspect_err(|e| warn!("{endpoint}: {e}"))?;

        let request = rpc::authenticated_request(
            &credential.username,
            secret.response(),
            &challenge.encryption,
            self.next_id(),
            &challenge.session,
        );
        debug!("{endpoint}: sending authenticated global.login");
        let reply = self
            .transport
            .send(endpoint, &request, probe_cookie.as_deref())
            .await?;

        let cookie = merge_cookies(probe_cookie, reply.cookie_header());
        let raw_response = parse_final(&reply);
        let success = rpc::is_success(&raw_response);
        if success {
            info!("{endpoint}: logged in as {}", credential.username);
        } else {
            warn!(
                "{endpoint}: login rejected for {} (HTTP {}): {}",
                credential.username,
                reply.status,
                rpc::error_message(&raw_response).unwrap_or("no reason given")
            );
        }

        Ok(LoginOutcome {
            success,
            raw_response,
            session: challenge.session,
            cookie,
        })
    }

    async fn probe(&self, endpoint: &str, username: &str) -> LoginResult<ProbeReply> {
        let request = rpc::probe_request(username, self.next_id());
        debug!("{endpoint}: sending probe global.login");
        let reply = self.transport.send(endpoint, &request, None).await?;
        let cookie = reply.cookie_header();
        let response: Value = serde_json::from_str(&reply.body)?;

        if rpc::is_success(&response) {
            return Ok(ProbeReply::Accepted { response, cookie });
        }

        if let Some(code) = rpc::error_code(&response) {
            if code != rpc::LOGIN_CHALLENGE_CODE {
                debug!("{endpoint}: probe carried unexpected error code {code}");
            }
        }

        let challenge = LoginChallenge::from_response(&response)?;
        debug!(
            "{endpoint}: challenge realm={:?} encryption={}",
            challenge.realm, challenge.encryption
        );
        Ok(ProbeReply::AwaitingResult { challenge, cookie })
    }
}

/// The final reply is never an error: anything but JSON becomes a JSON string
/// holding the raw body, which `is_success` treats as a rejection.
fn parse_final(reply: &RpcReply) -> Value {
    serde_json::from_str(&reply.body).unwrap_or_else(|e| {
        warn!("final login reply is not JSON ({e}), treating as failure");
        Value::String(reply.body.clone())
    })
}
