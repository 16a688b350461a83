//! Certificate chain and pin data types.

use crate::algorithm::HashAlgorithm;
use std::fmt;

/// One certificate as the server presented it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCertificate {
    /// DER encoding of the whole certificate.
    pub der: Vec<u8>,
    /// One-line subject DN. Only recorded in debug mode, and absent when
    /// the certificate has no subject or it cannot be decoded.
    pub subject: Option<String>,
}

impl CapturedCertificate {
    pub fn new(der: Vec<u8>) -> Self {
        Self { der, subject: None }
    }

    pub fn with_subject(der: Vec<u8>, subject: Option<String>) -> Self {
        Self { der, subject }
    }
}

/// Certificates in the order the server sent them, leaf first.
///
/// Never sorted or deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<CapturedCertificate>,
}

impl CertificateChain {
    pub fn new(certs: Vec<CapturedCertificate>) -> Self {
        Self { certs }
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// The end-entity certificate, if any.
    pub fn leaf(&self) -> Option<&CapturedCertificate> {
        self.certs.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CapturedCertificate> {
        self.certs.iter()
    }

    pub fn into_vec(self) -> Vec<CapturedCertificate> {
        self.certs
    }
}

impl From<Vec<CapturedCertificate>> for CertificateChain {
    fn from(certs: Vec<CapturedCertificate>) -> Self {
        Self::new(certs)
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a CapturedCertificate;
    type IntoIter = std::slice::Iter<'a, CapturedCertificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certs.iter()
    }
}

/// A public key pin: `<label>/<base64 digest>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pin {
    algorithm: HashAlgorithm,
    digest_base64: String,
}

impl Pin {
    pub(crate) fn new(algorithm: HashAlgorithm, digest_base64: String) -> Self {
        Self {
            algorithm,
            digest_base64,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Separator-free algorithm label, e.g. "SHA256".
    pub fn label(&self) -> &'static str {
        self.algorithm.label()
    }

    /// Standard base64 (padded, unwrapped) of the SPKI digest.
    pub fn digest_base64(&self) -> &str {
        &self.digest_base64
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.label(), self.digest_base64)
    }
}

/// Distinguished name with ordered components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName {
    /// Ordered (attribute type, value) pairs. Attribute types use short
    /// names where known ("CN", "O", "C"), dotted OIDs otherwise.
    pub components: Vec<(String, String)>,
}

impl DistinguishedName {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Format as "C = US, O = Org, CN = example.com".
    ///
    /// Backslashes, commas and equals signs inside values are escaped.
    pub fn to_oneline(&self) -> String {
        self.components
            .iter()
            .map(|(attr, value)| format!("{attr} = {}", escape_dn_value(value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn escape_dn_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | ',' | '=') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_oneline())
    }
}
