//! Challenge-response login for Dahua-style JSON-RPC device endpoints.
//!
//! A `global.login` probe with an empty password returns a realm, a random
//! and a session id; the password is then sent as
//! `MD5(user:random:MD5(user:realm:password))` in uppercase hex on that session.

pub mod challenge;
pub mod config;
pub mod digest;
pub mod error;
pub mod login;
pub mod rpc;
pub mod session;
pub mod transport;

pub use challenge::LoginChallenge;
pub use digest::{DerivedSecret, EncryptionScheme};
pub use error::{LoginError, LoginResult};
pub use login::{Credential, LoginEngine, LoginOutcome};
pub use session::{DeviceClient, Session};
pub use transport::{HttpTransport, RpcReply, Transport};

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT_TRACING: Once = Once::new();

/// Install a `fmt` subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
