//! The pin generation pipeline: resolve, connect, capture, compute.

use crate::algorithm::HashAlgorithm;
use crate::capture::InsecureChainCapturer;
use crate::connect::{connect, DEFAULT_TIMEOUT};
use crate::endpoint::HostEndpoint;
use crate::fields::{CertificateChain, Pin};
use crate::pin::compute_pins;
use crate::PinError;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// Per-run settings, passed in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// Record each certificate's subject DN for the report.
    pub debug: bool,
    /// Deadline for TCP connect plus TLS handshake.
    pub timeout: Duration,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            debug: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// One certificate's pin, with its subject when debug mode recorded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEntry {
    pub pin: Pin,
    pub subject: Option<String>,
}

/// Pins for every certificate the server presented, leaf first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinReport {
    pub endpoint: HostEndpoint,
    pub algorithm: HashAlgorithm,
    pub entries: Vec<PinEntry>,
}

impl PinReport {
    /// Pair each pin with the certificate it came from.
    pub fn from_chain(
        endpoint: HostEndpoint,
        algorithm: HashAlgorithm,
        chain: &CertificateChain,
    ) -> Result<Self, PinError> {
        let pins = compute_pins(chain, algorithm)?;
        let entries = pins
            .into_iter()
            .zip(chain)
            .map(|(pin, cert)| PinEntry {
                pin,
                subject: cert.subject.clone(),
            })
            .collect();
        Ok(Self {
            endpoint,
            algorithm,
            entries,
        })
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.entries.iter().map(|e| &e.pin)
    }
}

/// Generates pins for one endpoint.
///
/// The algorithm is resolved in [`PinGenerator::new`], so an unsupported
/// name fails before any socket is opened.
#[derive(Debug, Clone)]
pub struct PinGenerator {
    endpoint: HostEndpoint,
    algorithm: HashAlgorithm,
    config: PinConfig,
}

impl PinGenerator {
    pub fn new(endpoint: HostEndpoint, algorithm: &str, config: PinConfig) -> Result<Self, PinError> {
        let algorithm = HashAlgorithm::resolve(algorithm)?;
        Ok(Self::with_algorithm(endpoint, algorithm, config))
    }

    pub fn with_algorithm(endpoint: HostEndpoint, algorithm: HashAlgorithm, config: PinConfig) -> Self {
        Self {
            endpoint,
            algorithm,
            config,
        }
    }

    pub fn endpoint(&self) -> &HostEndpoint {
        &self.endpoint
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Handshake with the endpoint and pin every presented certificate.
    ///
    /// Single pass, no retries. A handshake that completes without
    /// delivering a chain is reported as [`PinError::EmptyChain`].
    pub fn run(&self) -> Result<PinReport, PinError> {
        let capturer = Arc::new(InsecureChainCapturer::new(self.config.debug));
        connect(&self.endpoint, &capturer, self.config.timeout)?;

        let chain = capturer
            .take_chain()
            .filter(|chain| !chain.is_empty())
            .ok_or_else(|| PinError::EmptyChain(self.endpoint.to_string()))?;
        debug!(
            "{} presented {} certificate(s)",
            self.endpoint,
            chain.len()
        );

        PinReport::from_chain(self.endpoint.clone(), self.algorithm, &chain)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fields::CapturedCertificate;

    #[test]
    fn default_config_matches_documented_values() {
        let config = PinConfig::default();
        assert!(!config.debug);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn unsupported_algorithm_fails_in_constructor() {
        let endpoint = HostEndpoint::parse("example.invalid").unwrap();
        let err = PinGenerator::new(endpoint, "md5", PinConfig::default()).unwrap_err();
        assert!(matches!(err, PinError::UnsupportedAlgorithm(ref n) if n == "md5"));
    }

    #[test]
    fn report_pairs_pins_with_subjects() {
        let key = rcgen::KeyPair::generate().unwrap();
        let der = rcgen::CertificateParams::new(vec!["r.test".to_string()])
            .unwrap()
            .self_signed(&key)
            .unwrap()
            .der()
            .to_vec();
        let chain = CertificateChain::from(vec![
            CapturedCertificate::with_subject(der.clone(), Some("CN = r.test".into())),
            CapturedCertificate::new(der),
        ]);
        let report = PinReport::from_chain(
            HostEndpoint::parse("r.test").unwrap(),
            HashAlgorithm::Sha256,
            &chain,
        )
        .unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries.first().unwrap().subject.as_deref(), Some("CN = r.test"));
        assert_eq!(report.entries.get(1).unwrap().subject, None);
        assert!(report.pins().all(|p| p.label() == "SHA256"));
    }
}
