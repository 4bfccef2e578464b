//! Certificate allowlist encoding for the two engine families.
//!
//! The Chromium engine trusts extra authorities through a command line
//! switch that takes base64 SHA-256 digests of each certificate's
//! SubjectPublicKeyInfo. The reflective companion instead takes the
//! whole certificates, base64 encoded and semicolon separated. Both
//! encodings start from raw DER bytes supplied by the embedder.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const TAG_SEQUENCE: u8 = 0x30;
const TAG_CONTEXT_0: u8 = 0xa0;

/// A trusted certificate authority, carried as raw DER bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateAuthority {
    der: Vec<u8>,
}

impl CertificateAuthority {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self { der: der.into() }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

/// Builds the value for the Chromium `--ignore-certificate-errors-spki-list`
/// switch: base64 SHA-256 digests of each SubjectPublicKeyInfo, comma
/// separated with a trailing comma. Empty input gives an empty string.
pub fn chromium_spki_list(authorities: &[CertificateAuthority]) -> Result<String> {
    let mut out = String::new();
    for authority in authorities {
        let spki = subject_public_key_info(authority.der())?;
        out.push_str(&STANDARD.encode(Sha256::digest(spki)));
        out.push(',');
    }
    Ok(out)
}

/// Builds the blob handed to the reflective companion: each whole DER
/// certificate base64 encoded, semicolon separated with a trailing
/// semicolon. Empty input gives an empty string.
pub fn reflective_blob(authorities: &[CertificateAuthority]) -> String {
    let mut out = String::new();
    for authority in authorities {
        out.push_str(&STANDARD.encode(authority.der()));
        out.push(';');
    }
    out
}

/// Locates the SubjectPublicKeyInfo element of a DER encoded X.509
/// certificate and returns its complete encoding, tag and length
/// included.
///
/// Walks just far enough of the certificate structure to find the key:
/// the optional explicit version, then serial number, signature
/// algorithm, issuer, validity and subject all precede it inside
/// tbsCertificate.
pub fn subject_public_key_info(der: &[u8]) -> Result<&[u8]> {
    let mut certificate = DerCursor::new(der);
    let (tag, body) = certificate.read_element()?;
    if tag != TAG_SEQUENCE {
        return Err(Error::malformed_certificate("certificate is not a sequence"));
    }

    let mut outer = DerCursor::new(body);
    let (tag, tbs) = outer.read_element()?;
    if tag != TAG_SEQUENCE {
        return Err(Error::malformed_certificate(
            "tbsCertificate is not a sequence",
        ));
    }

    let mut fields = DerCursor::new(tbs);
    if fields.peek_tag()? == TAG_CONTEXT_0 {
        fields.read_element()?;
    }
    for _ in 0..5 {
        fields.read_element()?;
    }
    let spki = fields.read_raw()?;
    if spki.first() != Some(&TAG_SEQUENCE) {
        return Err(Error::malformed_certificate(
            "subjectPublicKeyInfo is not a sequence",
        ));
    }
    Ok(spki)
}

/// Minimal DER reader over a borrowed byte slice.
struct DerCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| Error::malformed_certificate("truncated element"))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn peek_tag(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::malformed_certificate("truncated element"))
    }

    /// Reads one element, returning its tag and content bytes.
    fn read_element(&mut self) -> Result<(u8, &'a [u8])> {
        let tag = self.take(1)?[0];
        let length = self.read_length()?;
        Ok((tag, self.take(length)?))
    }

    /// Reads one element, returning its complete encoding including the
    /// tag and length bytes.
    fn read_raw(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        self.read_element()?;
        Ok(&self.data[start..self.pos])
    }

    fn read_length(&mut self) -> Result<usize> {
        let first = self.take(1)?[0];
        if first < 0x80 {
            return Ok(first as usize);
        }
        // Long form: low bits give the count of length bytes. Lengths
        // wider than four bytes never occur in real certificates.
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 {
            return Err(Error::malformed_certificate("unsupported length encoding"));
        }
        let mut length = 0usize;
        for &byte in self.take(count)? {
            length = length << 8 | byte as usize;
        }
        Ok(length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        match body.len() {
            len if len < 0x80 => out.push(len as u8),
            len if len <= 0xff => out.extend_from_slice(&[0x81, len as u8]),
            len => out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]),
        }
        out.extend_from_slice(body);
        out
    }

    /// Builds a structurally valid certificate around the given key
    /// body, returning the certificate and the expected SPKI encoding.
    fn sample_certificate(with_version: bool, spki_body: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let spki = tlv(TAG_SEQUENCE, spki_body);
        let mut tbs_body = Vec::new();
        if with_version {
            tbs_body.extend_from_slice(&tlv(TAG_CONTEXT_0, &tlv(0x02, &[2])));
        }
        tbs_body.extend_from_slice(&tlv(0x02, &[1]));
        for _ in 0..4 {
            tbs_body.extend_from_slice(&tlv(TAG_SEQUENCE, &[]));
        }
        tbs_body.extend_from_slice(&spki);
        let tbs = tlv(TAG_SEQUENCE, &tbs_body);
        let cert = tlv(TAG_SEQUENCE, &tbs);
        (cert, spki)
    }

    #[test]
    fn test_spki_extraction() {
        let (cert, spki) = sample_certificate(true, &[0x02, 0x01, 0x05]);
        assert_eq!(subject_public_key_info(&cert).unwrap(), &spki[..]);
    }

    #[test]
    fn test_spki_extraction_without_version() {
        let (cert, spki) = sample_certificate(false, &[0x02, 0x01, 0x05]);
        assert_eq!(subject_public_key_info(&cert).unwrap(), &spki[..]);
    }

    #[test]
    fn test_spki_with_long_form_length() {
        let body = vec![0xab; 200];
        let (cert, spki) = sample_certificate(true, &body);
        assert!(spki.len() > 0x80);
        assert_eq!(subject_public_key_info(&cert).unwrap(), &spki[..]);
    }

    #[test]
    fn test_truncated_certificate_is_rejected() {
        let (cert, _) = sample_certificate(true, &[0x02, 0x01, 0x05]);
        let err = subject_public_key_info(&cert[..cert.len() - 3]).unwrap_err();
        assert!(matches!(err, Error::MalformedCertificate(_)));
    }

    #[test]
    fn test_non_sequence_is_rejected() {
        let err = subject_public_key_info(&[0x02, 0x01, 0x00]).unwrap_err();
        assert!(matches!(err, Error::MalformedCertificate(_)));
    }

    #[test]
    fn test_chromium_list_digests_each_key() {
        let (cert_a, spki_a) = sample_certificate(true, &[0x02, 0x01, 0x05]);
        let (cert_b, spki_b) = sample_certificate(false, &[0x02, 0x01, 0x07]);
        let authorities = [
            CertificateAuthority::from_der(cert_a),
            CertificateAuthority::from_der(cert_b),
        ];

        let list = chromium_spki_list(&authorities).unwrap();
        let expected = format!(
            "{},{},",
            STANDARD.encode(Sha256::digest(&spki_a)),
            STANDARD.encode(Sha256::digest(&spki_b)),
        );
        assert_eq!(list, expected);
    }

    #[test]
    fn test_chromium_list_keeps_trailing_comma() {
        let (cert, _) = sample_certificate(true, &[0x02, 0x01, 0x05]);
        let list = chromium_spki_list(&[CertificateAuthority::from_der(cert)]).unwrap();
        assert!(list.ends_with(','));
        assert_eq!(list.matches(',').count(), 1);
    }

    #[test]
    fn test_chromium_list_empty_input() {
        assert_eq!(chromium_spki_list(&[]).unwrap(), "");
    }

    #[test]
    fn test_reflective_blob_encodes_whole_certificates() {
        let a = CertificateAuthority::from_der(vec![1, 2, 3]);
        let b = CertificateAuthority::from_der(vec![4, 5, 6]);
        let blob = reflective_blob(&[a.clone(), b.clone()]);
        assert_eq!(
            blob,
            format!(
                "{};{};",
                STANDARD.encode(a.der()),
                STANDARD.encode(b.der())
            )
        );
    }

    #[test]
    fn test_reflective_blob_empty_input() {
        assert_eq!(reflective_blob(&[]), "");
    }
}
