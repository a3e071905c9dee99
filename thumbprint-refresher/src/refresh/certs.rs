use crate::refresh::errors::RefreshError;
use crate::refresh::thumbprints::fingerprint_of;
use x509_parser::prelude::*;

#[derive(Debug, Clone)]
/// Leaf certificate presented by a jwks endpoint, kept in its DER encoding.
pub struct PeerCertificate {
    pub der: Vec<u8>,
    pub subject: String,
    pub issuer: String,
    /// Not-valid-after as unix seconds.
    pub not_after: i64,
    pub not_after_display: String,
}

impl PeerCertificate {
    /// Decodes the DER certificate and captures the fields used in reports.
    pub fn from_der(der: Vec<u8>) -> Result<Self, RefreshError> {
        let (subject, issuer, not_after, not_after_display) = {
            let (_, cert) = parse_x509_certificate(&der)
                .map_err(|e| RefreshError::Certificate(format!("parse peer certificate: {e}")))?;
            let validity = cert.validity();
            (
                cert.subject().to_string(),
                cert.issuer().to_string(),
                validity.not_after.timestamp(),
                validity.not_after.to_string(),
            )
        };
        Ok(Self {
            der,
            subject,
            issuer,
            not_after,
            not_after_display,
        })
    }

    /// SHA-1 thumbprint of the DER encoding, 40 lowercase hex characters.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&self.der)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage() {
        let err = PeerCertificate::from_der(vec![0x30, 0x03, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, RefreshError::Certificate(_)));
    }

    #[test]
    fn decodes_generated_certificate() {
        let cert = rcgen::generate_simple_self_signed(vec!["jwks.example.test".into()]).unwrap();
        let der = cert.serialize_der().unwrap();
        let peer = PeerCertificate::from_der(der.clone()).unwrap();

        assert!(peer.subject.contains("rcgen"));
        assert_eq!(peer.subject, peer.issuer);
        assert!(peer.not_after > 0);
        assert_eq!(peer.fingerprint(), fingerprint_of(&der));
        assert_eq!(peer.fingerprint().len(), 40);
    }
}
