use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Transport security expected of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

/// Identity of a reusable connection target.
///
/// Two connections are interchangeable if and only if their addresses are
/// equal: same scheme, same endpoint, same proxy hop. The pool never looks
/// deeper than this equality when matching a connection to a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    scheme: Scheme,
    host: String,
    port: u16,
    proxy: Option<SocketAddr>,
}

impl Address {
    /// Create an address for a direct connection.
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
            proxy: None,
        }
    }

    /// Route the connection through a proxy hop.
    ///
    /// Connections made through different proxies are never interchangeable,
    /// so the hop is part of the identity.
    pub fn via_proxy(mut self, proxy: SocketAddr) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn proxy(&self) -> Option<SocketAddr> {
        self.proxy
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        write!(f, "{}://{}:{}", scheme, self.host, self.port)?;
        if let Some(proxy) = self.proxy {
            write!(f, " via {}", proxy)?;
        }
        Ok(())
    }
}
