//! pingen-lib: SPKI pin generation for the certificate chain a TLS server presents.
//!
//! Connects to a host, captures every certificate offered during the
//! handshake without validating any of them, and derives one
//! `<algorithm>/<base64 digest>` pin per certificate from its
//! SubjectPublicKeyInfo. Pins follow the format HTTP clients with public key
//! pinning support expect (e.g. OkHttp's `CertificatePinner`).
//!
//! This is a diagnostic tool. Run it over a network path you already trust:
//! the handshake accepts whatever chain it is given. The accept-all
//! verifier behind it is internal and cannot be reused elsewhere:
//!
//! ```compile_fail
//! use pingen_lib::InsecureChainCapturer;
//! ```

mod algorithm;
mod capture;
mod connect;
mod display;
mod endpoint;
mod fields;
mod generator;
mod oid;
mod parser;
mod pin;
mod util;

pub use algorithm::HashAlgorithm;
pub use connect::DEFAULT_TIMEOUT;
pub use display::{display_text, to_json};
pub use endpoint::{HostEndpoint, DEFAULT_PORT};
pub use fields::{CapturedCertificate, CertificateChain, DistinguishedName, Pin};
pub use generator::{PinConfig, PinEntry, PinGenerator, PinReport};
pub use parser::{chain_from_pem, extract_spki, extract_subject};
pub use pin::{compute_pin, compute_pins};

use std::time::Duration;

/// Errors returned by pingen-lib.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("Unsupported hash algorithm: {0} (use SHA-1, SHA-256, SHA-384 or SHA-512)")]
    UnsupportedAlgorithm(String),

    #[error("Invalid endpoint '{0}': expected <host>[:port]")]
    InvalidEndpoint(String),

    #[error("Connection to {endpoint} failed: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: ConnectionError,
    },

    #[error("Handshake with {0} completed but no certificates were captured")]
    EmptyChain(String),

    #[error("Certificate #{index} in the chain could not be parsed: {reason}")]
    InvalidCertificate { index: usize, reason: String },

    #[error("Invalid DER certificate: {0}")]
    DerError(String),

    #[error("Invalid PEM input: {0}")]
    PemError(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Transport-level causes of a failed handshake.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not resolve host: {0}")]
    Resolve(#[source] std::io::Error),

    #[error("host resolved to no addresses")]
    NoAddress,

    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[source] rustls::Error),
}

impl PinError {
    /// True when the failure was the handshake deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PinError::Connection {
                source: ConnectionError::Timeout(_),
                ..
            }
        )
    }
}
