//! SPKI pin computation.

use crate::algorithm::HashAlgorithm;
use crate::fields::{CertificateChain, Pin};
use crate::parser::extract_spki;
use crate::util;
use crate::PinError;

/// Compute the pin for DER-encoded SubjectPublicKeyInfo bytes.
///
/// The digest is encoded as padded, standard-alphabet base64 on one line.
pub fn compute_pin(spki_der: &[u8], algorithm: HashAlgorithm) -> Pin {
    let digest = algorithm.digest(spki_der);
    Pin::new(algorithm, util::base64_standard(&digest))
}

/// Compute one pin per certificate, in chain order.
///
/// Pins are taken over each certificate's SPKI rather than the whole
/// certificate, so they survive renewal with the same key. An empty chain
/// yields no pins; rejecting it is the connector's job.
pub fn compute_pins(
    chain: &CertificateChain,
    algorithm: HashAlgorithm,
) -> Result<Vec<Pin>, PinError> {
    chain
        .iter()
        .enumerate()
        .map(|(index, cert)| {
            let spki = extract_spki(&cert.der).map_err(|e| match e {
                PinError::DerError(reason) => PinError::InvalidCertificate { index, reason },
                other => other,
            })?;
            Ok(compute_pin(spki, algorithm))
        })
        .collect()
}
