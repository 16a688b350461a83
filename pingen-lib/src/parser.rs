//! Extraction of the pieces of a certificate that pins are built from.

use crate::fields::{CapturedCertificate, CertificateChain, DistinguishedName};
use crate::oid;
use crate::util;
use crate::PinError;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

fn parse_der(input: &[u8]) -> Result<X509Certificate<'_>, PinError> {
    if input.is_empty() {
        return Err(PinError::DerError("empty input".into()));
    }
    // Trailing bytes after the certificate are ignored.
    let (_, x509) =
        X509Certificate::from_der(input).map_err(|e| PinError::DerError(format!("{}", e)))?;
    Ok(x509)
}

/// Return the DER-encoded SubjectPublicKeyInfo of a DER certificate.
///
/// The slice borrows from `cert_der` and includes the SPKI's own tag and
/// length, which is exactly what a pin is computed over.
pub fn extract_spki(cert_der: &[u8]) -> Result<&[u8], PinError> {
    let x509 = parse_der(cert_der)?;
    let raw = x509.tbs_certificate.subject_pki.raw;
    if raw.is_empty() {
        return Err(PinError::DerError("certificate has no public key".into()));
    }
    Ok(raw)
}

/// Return the subject DN of a DER certificate, or `None` when it is empty.
pub fn extract_subject(cert_der: &[u8]) -> Result<Option<DistinguishedName>, PinError> {
    let x509 = parse_der(cert_der)?;
    let dn = build_dn(x509.subject());
    Ok(if dn.is_empty() { None } else { Some(dn) })
}

fn build_dn(name: &X509Name) -> DistinguishedName {
    let components = name
        .iter_attributes()
        .map(|attr| {
            let value = attr.as_str().map_or_else(|_| "<binary>".to_string(), str::to_string);
            (oid::short_name(&attr.attr_type().to_id_string()), value)
        })
        .collect();
    DistinguishedName { components }
}

/// Load a chain from a PEM bundle (in file order) or a single DER certificate.
///
/// Every certificate must parse; subjects are filled in when present.
pub fn chain_from_pem(input: &[u8]) -> Result<CertificateChain, PinError> {
    if !util::is_pem(input) {
        let subject = extract_subject(input)?.map(|dn| dn.to_oneline());
        return Ok(CertificateChain::from(vec![CapturedCertificate::with_subject(
            input.to_vec(),
            subject,
        )]));
    }

    let mut certs = Vec::new();
    for pem in Pem::iter_from_buffer(input) {
        let pem = pem.map_err(|e| PinError::PemError(format!("{}", e)))?;
        if pem.label != "CERTIFICATE"
            && pem.label != "TRUSTED CERTIFICATE"
            && pem.label != "X509 CERTIFICATE"
        {
            return Err(PinError::PemError(format!(
                "expected CERTIFICATE, got {}",
                pem.label
            )));
        }
        let subject = extract_subject(&pem.contents)?.map(|dn| dn.to_oneline());
        certs.push(CapturedCertificate::with_subject(pem.contents, subject));
    }

    if certs.is_empty() {
        return Err(PinError::PemError("no certificates found".into()));
    }
    Ok(CertificateChain::from(certs))
}
