/// Password digest chain for `global.login`.
///
/// The device's reference web client hashes with uppercase hex and compares
/// case-sensitively, so every digest here is emitted uppercase.
use std::fmt;

use crate::error::{LoginError, LoginResult};

/// Encryption scheme advertised in the probe response (`params.encryption`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionScheme {
    /// `MD5(user:random:MD5(user:realm:password))`
    Default,
    Unsupported(String),
}

impl EncryptionScheme {
    pub fn parse(name: &str) -> Self {
        match name {
            "Default" => Self::Default,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "Default",
            Self::Unsupported(name) => name,
        }
    }

    /// Derive the one-time password hash for this scheme.
    /// Fails before any hashing when the scheme is unsupported.
    pub fn derive(
        &self,
        username: &str,
        password: &str,
        realm: &str,
        random: &str,
    ) -> LoginResult<DerivedSecret> {
        match self {
            Self::Default => Ok(derive_default(username, password, realm, random)),
            Self::Unsupported(name) => Err(LoginError::Protocol(name.clone())),
        }
    }
}

/// The two chained digests. Only `response()` ever goes on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedSecret {
    realm_hash: String,
    response: String,
}

impl DerivedSecret {
    /// `g = MD5(username:realm:password)`
    pub fn realm_hash(&self) -> &str {
        &self.realm_hash
    }

    /// `h = MD5(username:random:g)`, sent as `params.password`.
    pub fn response(&self) -> &str {
        &self.response
    }
}

impl fmt::Debug for DerivedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSecret")
            .field("realm_hash", &"<redacted>")
            .field("response", &self.response)
            .finish()
    }
}

pub fn derive_default(username: &str, password: &str, realm: &str, random: &str) -> DerivedSecret {
    let realm_hash = hex_md5_upper(&[username, realm, password]);
    let response = hex_md5_upper(&[username, random, &realm_hash]);
    DerivedSecret {
        realm_hash,
        response,
    }
}

/// MD5 over `parts` joined with `:`, as 32 uppercase hex chars.
pub(crate) fn hex_md5_upper(parts: &[&str]) -> String {
    use md5::{Digest, Md5};
    let mut h = Md5::new();
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            h.update(b":");
        }
        h.update(p.as_bytes());
    }
    hex::encode_upper(h.finalize())
}
