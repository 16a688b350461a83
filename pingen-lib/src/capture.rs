//! Server certificate capture with verification switched off.
//!
//! [`InsecureChainCapturer`] is installed as the only certificate verifier
//! of the pinning handshake. It accepts every chain and every handshake
//! signature, and records the chain so pins can be computed from it.
//!
//! The type is crate-private and only reachable through the pin
//! generation handshake. It must never be used for a connection that
//! carries data or makes a trust decision: an interposed attacker's chain is accepted exactly like
//! the real server's. Pins produced through it are only as trustworthy as
//! the network path they were collected over.

use crate::fields::{CapturedCertificate, CertificateChain};
use crate::parser::extract_subject;
use log::trace;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::sync::{Arc, Mutex, PoisonError};

/// Every signature scheme a TLS 1.2 or 1.3 server may sign with.
///
/// Signatures are never checked, so advertising less than this would only
/// turn servers with uncommon keys (P-521, Ed448, SHA-1 signers) away
/// before their chain is seen.
const ALL_SCHEMES: [SignatureScheme; 13] = [
    SignatureScheme::ECDSA_NISTP256_SHA256,
    SignatureScheme::ECDSA_NISTP384_SHA384,
    SignatureScheme::ECDSA_NISTP521_SHA512,
    SignatureScheme::ED25519,
    SignatureScheme::ED448,
    SignatureScheme::RSA_PSS_SHA256,
    SignatureScheme::RSA_PSS_SHA384,
    SignatureScheme::RSA_PSS_SHA512,
    SignatureScheme::RSA_PKCS1_SHA256,
    SignatureScheme::RSA_PKCS1_SHA384,
    SignatureScheme::RSA_PKCS1_SHA512,
    SignatureScheme::RSA_PKCS1_SHA1,
    SignatureScheme::ECDSA_SHA1_Legacy,
];

/// Accept-anything verifier that records the presented chain.
///
/// One instance serves one handshake: the chain is taken out with
/// [`InsecureChainCapturer::take_chain`] once the handshake completes.
#[derive(Debug)]
pub(crate) struct InsecureChainCapturer {
    provider: Arc<CryptoProvider>,
    debug: bool,
    chain: Mutex<Option<CertificateChain>>,
}

impl InsecureChainCapturer {
    /// Create a capturer. With `debug` set, each certificate's subject DN
    /// is recorded alongside it.
    pub(crate) fn new(debug: bool) -> Self {
        Self {
            provider: Arc::new(rustls::crypto::ring::default_provider()),
            debug,
            chain: Mutex::new(None),
        }
    }

    /// Crypto provider the TLS client config should be built with.
    pub(crate) fn provider(&self) -> Arc<CryptoProvider> {
        Arc::clone(&self.provider)
    }

    /// Remove and return the captured chain, if a handshake delivered one.
    pub(crate) fn take_chain(&self) -> Option<CertificateChain> {
        self.chain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Store `end_entity` followed by `intermediates`, exactly as received.
    pub(crate) fn record<'c>(&self, end_entity: &CertificateDer<'c>, intermediates: &[CertificateDer<'c>]) {
        let certs: Vec<CapturedCertificate> = std::iter::once(end_entity)
            .chain(intermediates)
            .enumerate()
            .map(|(i, der)| {
                // A missing or undecodable subject is not an error.
                let subject = if self.debug {
                    extract_subject(der)
                        .ok()
                        .flatten()
                        .map(|dn| dn.to_oneline())
                } else {
                    None
                };
                trace!(
                    "captured certificate #{i} ({} bytes){}",
                    der.len(),
                    subject
                        .as_deref()
                        .map(|s| format!(": {s}"))
                        .unwrap_or_default()
                );
                CapturedCertificate::with_subject(der.to_vec(), subject)
            })
            .collect();

        *self.chain.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(CertificateChain::from(certs));
    }
}

impl ServerCertVerifier for InsecureChainCapturer {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        self.record(end_entity, intermediates);
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        ALL_SCHEMES.to_vec()
    }
}
