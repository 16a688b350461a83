//! Parsing of `<host>[:port]` targets.

use crate::PinError;
use std::fmt;
use std::str::FromStr;

/// Port used when the target omits one.
pub const DEFAULT_PORT: u16 = 443;

/// A TLS server to connect to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostEndpoint {
    hostname: String,
    port: u16,
}

impl HostEndpoint {
    /// Build an endpoint from an already separated host and port.
    pub fn new(hostname: impl Into<String>, port: u16) -> Result<Self, PinError> {
        let hostname = hostname.into();
        if hostname.is_empty() || port == 0 {
            return Err(PinError::InvalidEndpoint(format!("{hostname}:{port}")));
        }
        Ok(Self { hostname, port })
    }

    /// Parse `<host>[:port]`.
    ///
    /// The port defaults to [`DEFAULT_PORT`]. IPv6 literals may be written
    /// bracketed (`[::1]:8443`) or bare (`::1`, which always takes the
    /// default port).
    pub fn parse(input: &str) -> Result<Self, PinError> {
        let invalid = || PinError::InvalidEndpoint(input.to_string());
        let input_trimmed = input.trim();

        let (host, port) = if let Some(rest) = input_trimmed.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
            let port = match after {
                "" => None,
                p => Some(p.strip_prefix(':').ok_or_else(invalid)?),
            };
            (host, port)
        } else if input_trimmed.matches(':').count() > 1 {
            (input_trimmed, None)
        } else {
            match input_trimmed.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (input_trimmed, None),
            }
        };

        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| invalid())?,
            None => DEFAULT_PORT,
        };
        if host.is_empty() || port == 0 {
            return Err(invalid());
        }

        Ok(Self {
            hostname: host.to_string(),
            port,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for HostEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname.contains(':') {
            write!(f, "[{}]:{}", self.hostname, self.port)
        } else {
            write!(f, "{}:{}", self.hostname, self.port)
        }
    }
}

impl FromStr for HostEndpoint {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HostEndpoint::parse(s)
    }
}
