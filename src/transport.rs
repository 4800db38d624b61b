/// JSON-over-HTTP exchange with the device.
///
/// HTTP error statuses are not errors here: devices answer failed logins with
/// a structured JSON body on 4xx/5xx, and the caller still has to read it.
/// Only failures below HTTP (DNS, connect, timeout) become `LoginError::Transport`.
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::Client;
use serde_json::Value;

use crate::error::LoginResult;

/// Raw reply: status, headers and the undecoded body.
#[derive(Debug, Clone)]
pub struct RpcReply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RpcReply {
    /// `Set-Cookie` values folded into a single `Cookie` request header
    /// (`name=value; name2=value2`). Attributes like `Path` are dropped.
    pub fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<&str> = self
            .headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

/// Fold a later `Cookie` header over an earlier one, keyed by cookie name.
/// A name set again takes the later value in its original position; new
/// names are appended.
pub fn merge_cookies(earlier: Option<String>, later: Option<String>) -> Option<String> {
    let (earlier, later) = match (earlier, later) {
        (Some(e), Some(l)) => (e, l),
        (e, l) => return l.or(e),
    };
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for pair in earlier.split(';').chain(later.split(';')) {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let name = pair.split('=').next().unwrap_or(pair).trim();
        match pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = pair,
            None => pairs.push((name, pair)),
        }
    }
    let joined: Vec<&str> = pairs.into_iter().map(|(_, pair)| pair).collect();
    Some(joined.join("; "))
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = LoginResult<RpcReply>> + Send + 'a>>;

/// Object-safe so the engine can run over a real client or a test double.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        endpoint: &'a str,
        body: &'a Value,
        cookie: Option<&'a str>,
    ) -> TransportFuture<'a>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send<'a>(
        &'a self,
        endpoint: &'a str,
        body: &'a Value,
        cookie: Option<&'a str>,
    ) -> TransportFuture<'a> {
        (**self).send(endpoint, body, cookie)
    }
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> LoginResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        endpoint: &'a str,
        body: &'a Value,
        cookie: Option<&'a str>,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let mut req = self.client.post(endpoint).json(body);
            if let Some(cookie) = cookie {
                req = req.header(COOKIE, cookie);
            }

            let resp = req.send().await?;
            let status = resp.status().as_u16();
            let headers = resp.headers().clone();
            if status >= 400 {
                tracing::debug!("{endpoint} answered HTTP {status}, reading body anyway");
            }
            let body = resp.text().await?;

            Ok(RpcReply {
                status,
                headers,
                body,
            })
        })
    }
}

// ── Test double ───────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn reply_with(cookies: &[&str]) -> RpcReply {
        let mut headers = HeaderMap::new();
        for c in cookies {
            headers.append(SET_COOKIE, HeaderValue::from_str(c).unwrap());
        }
        RpcReply {
            status: 200,
            headers,
            body: String::new(),
        }
    }

    #[test]
    fn cookie_header_none_without_set_cookie() {
        assert_eq!(reply_with(&[]).cookie_header(), None);
    }

    #[test]
    fn cookie_header_strips_attributes() {
        let reply = reply_with(&["WebClientSessionID=abc; Path=/; HttpOnly"]);
        assert_eq!(reply.cookie_header().as_deref(), Some("WebClientSessionID=abc"));
    }

    #[test]
    fn cookie_header_joins_multiple_cookies() {
        let reply = reply_with(&["a=1; Path=/", "b=2"]);
        assert_eq!(reply.cookie_header().as_deref(), Some("a=1; b=2"));
    }

    #[test]
    fn merge_cookies_keeps_earlier_names() {
        let merged = merge_cookies(Some("a=1".into()), Some("b=2".into()));
        assert_eq!(merged.as_deref(), Some("a=1; b=2"));
    }

    #[test]
    fn merge_cookies_later_value_wins_in_place() {
        let merged = merge_cookies(Some("a=1; b=2".into()), Some("a=9; c=3".into()));
        assert_eq!(merged.as_deref(), Some("a=9; b=2; c=3"));
    }

    #[test]
    fn merge_cookies_with_one_side_missing() {
        assert_eq!(merge_cookies(None, Some("a=1".into())).as_deref(), Some("a=1"));
        assert_eq!(merge_cookies(Some("a=1".into()), None).as_deref(), Some("a=1"));
        assert_eq!(merge_cookies(None, None), None);
    }

    #[tokio::test]
    async fn scripted_transport_records_calls_in_order() {
        let t = scripted::ScriptedTransport::new()
            .reply_json(serde_json::json!({ "n": 1 }))
            .reply_json(serde_json::json!({ "n": 2 }));
        let body = serde_json::json!({ "method": "x" });
        let first = t.send("http://dev/a", &body, None).await.unwrap();
        let second = t.send("http://dev/b", &body, Some("k=v")).await.unwrap();
        assert!(first.body.contains("1"));
        assert!(second.body.contains("2"));
        let calls = t.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].endpoint, "http://dev/b");
        assert_eq!(calls[1].cookie.as_deref(), Some("k=v"));
    }

    #[tokio::test]
    async fn scripted_transport_runs_dry() {
        let t = scripted::ScriptedTransport::new();
        let err = t.send("http://dev", &Value::Null, None).await.unwrap_err();
        assert!(matches!(err, crate::error::LoginError::Transport(_)));
    }
}
