#![no_main]

use libfuzzer_sys::fuzz_target;
use pingen_lib::{
    chain_from_pem, compute_pin, compute_pins, extract_spki, extract_subject, CapturedCertificate,
    CertificateChain, HashAlgorithm,
};

fuzz_target!(|data: &[u8]| {
    // Whatever a server sends, pin computation must never panic.
    if let Ok(spki) = extract_spki(data) {
        assert!(spki.len() <= data.len());
        let pin = compute_pin(spki, HashAlgorithm::Sha256);
        assert!(pin.to_string().starts_with("SHA256/"));
    }
    let _ = extract_subject(data);

    let chain = CertificateChain::from(vec![CapturedCertificate::new(data.to_vec())]);
    if let Ok(pins) = compute_pins(&chain, HashAlgorithm::Sha1) {
        assert_eq!(pins.len(), 1);
    }

    let _ = chain_from_pem(data);

    if let Ok(name) = std::str::from_utf8(data) {
        let _ = HashAlgorithm::resolve(name);
        let _ = pingen_lib::HostEndpoint::parse(name);
    }
});
