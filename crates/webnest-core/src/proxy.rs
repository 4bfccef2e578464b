//! Forward proxy endpoint formatting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Forward proxy endpoint for page traffic.
///
/// The host may be an IPv4 literal, an IPv6 literal or a resolvable
/// name. Unbracketed hosts containing a colon are bracketed when
/// formatted, so an IPv6 literal renders the way proxy switches
/// expect it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAddr {
    pub host: String,
    pub port: u16,
}

impl ProxyAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// True when no proxy has been configured.
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }
}

impl fmt::Display for ProxyAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
