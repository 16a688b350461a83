//! Distinguished name attribute OIDs (RFC 4519 / X.520) and their short names.

pub const COMMON_NAME: &str = "2.5.4.3";
pub const SERIAL_NUMBER: &str = "2.5.4.5";
pub const COUNTRY: &str = "2.5.4.6";
pub const LOCALITY: &str = "2.5.4.7";
pub const STATE_OR_PROVINCE: &str = "2.5.4.8";
pub const ORGANIZATION: &str = "2.5.4.10";
pub const ORGANIZATIONAL_UNIT: &str = "2.5.4.11";
pub const EMAIL_ADDRESS: &str = "1.2.840.113549.1.9.1"; // PKCS#9
pub const DOMAIN_COMPONENT: &str = "0.9.2342.19200300.100.1.25";

/// Short attribute name for a dotted OID, or the OID itself when unknown.
pub fn short_name(oid: &str) -> String {
    let name = match oid {
        COMMON_NAME => "CN",
        SERIAL_NUMBER => "serialNumber",
        COUNTRY => "C",
        LOCALITY => "L",
        STATE_OR_PROVINCE => "ST",
        ORGANIZATION => "O",
        ORGANIZATIONAL_UNIT => "OU",
        EMAIL_ADDRESS => "emailAddress",
        DOMAIN_COMPONENT => "DC",
        other => other,
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_oids_get_short_names() {
        assert_eq!(short_name("2.5.4.3"), "CN");
        assert_eq!(short_name("2.5.4.6"), "C");
        assert_eq!(short_name(EMAIL_ADDRESS), "emailAddress");
    }

    #[test]
    fn unknown_oid_passes_through() {
        assert_eq!(short_name("1.2.3.4"), "1.2.3.4");
    }
}
