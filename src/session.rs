/// Device client: runs the login handshake against a configured device and
/// tracks the resulting session for keep-alive and logout.
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::DeviceConfig;
use crate::error::{LoginError, LoginResult};
use crate::login::{Credential, LoginEngine, LoginOutcome};
use crate::rpc;
use crate::transport::{HttpTransport, Transport};

/// An authenticated session on one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: Value,
    pub host: String,
    pub username: String,
    pub keep_alive_interval: u64,
    cookie: Option<String>,
    open: bool,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.open
    }
}

pub struct DeviceClient<T> {
    config: DeviceConfig,
    engine: LoginEngine<T>,
}

impl DeviceClient<HttpTransport> {
    pub fn from_config(config: &DeviceConfig) -> LoginResult<Self> {
        let transport = HttpTransport::with_timeout(config.timeout())?;
        Ok(Self::new(config.clone(), transport))
    }
}

impl<T: Transport> DeviceClient<T> {
    pub fn new(config: DeviceConfig, transport: T) -> Self {
        Self {
            config,
            engine: LoginEngine::new(transport),
        }
    }

    pub fn engine(&self) -> &LoginEngine<T> {
        &self.engine
    }

    fn credential(&self) -> Credential {
        Credential::new(&self.config.username, &self.config.password)
    }

    /// One full handshake against the configured login endpoint.
    pub async fn login(&self) -> LoginResult<LoginOutcome> {
        self.engine
            .attempt_login(&self.config.login_url(), &self.credential())
            .await
    }

    /// Log in and keep the session. `Ok(None)` when the device rejected the
    /// credentials.
    pub async fn open_session(&self) -> LoginResult<Option<Session>> {
        let outcome = self.login().await?;
        if !outcome.success {
            return Ok(None);
        }
        if outcome.session_id().is_none() {
            return Err(LoginError::MalformedResponse(
                "login accepted without a session id".to_string(),
            ));
        }
        Ok(Some(Session {
            keep_alive_interval: outcome.keep_alive_interval(),
            session_id: outcome.session,
            host: self.config.base_url(),
            username: self.config.username.clone(),
            cookie: outcome.cookie,
            open: true,
        }))
    }

    /// `global.keepAlive`; true when the device confirmed the session.
    pub async fn keep_alive(&self, session: &Session) -> LoginResult<bool> {
        let response = self
            .session_call(session, rpc::KEEP_ALIVE_METHOD, rpc::keep_alive_params())
            .await?;
        Ok(rpc::is_success(&response))
    }

    /// `global.logout`. The session is closed locally whatever the device says.
    pub async fn logout(&self, session: &mut Session) -> LoginResult<()> {
        let result = self
            .session_call(session, rpc::LOGOUT_METHOD, json!({}))
            .await;
        session.open = false;
        info!("logged out of {}", session.host);
        result.map(|_| ())
    }

    async fn session_call(&self, session: &Session, method: &str, params: Value) -> LoginResult<Value> {
        if !session.open {
            return Err(LoginError::NotLoggedIn);
        }
        let request = rpc::session_request(method, params, self.engine.next_id(), &session.session_id);
        let endpoint = self.config.rpc_url();
        debug!("{endpoint}: {method}");
        let reply = self
            .engine
            .transport()
            .send(&endpoint, &request, session.cookie.as_deref())
            .await?;
        Ok(serde_json::from_str(&reply.body)?)
    }
}
