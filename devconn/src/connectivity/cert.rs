//! Server certificate chain extraction

use std::io::{self, BufRead, Cursor};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rustls_pemfile::Item;
use tokio::fs;

use crate::connectivity::protocol::PEM_CERT_FILE_NAME;
use crate::connectivity::resource::Resource;
use crate::errors::ConnectivityError;

pub const BEGIN_CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----";
pub const END_CERTIFICATE: &str = "-----END CERTIFICATE-----";

const PEM_LINE_LENGTH: usize = 64;

// Tag byte of a constructed ASN.1 SEQUENCE, the outer type of every X.509 certificate
const ASN1_SEQUENCE: u8 = 0x30;

/// Re-encode every X.509 certificate found in `reader` as canonical PEM.
///
/// Keys, CRLs and other PEM objects are skipped. Each certificate is written
/// as base64 wrapped at 64 characters between the BEGIN/END markers. A
/// CERTIFICATE block whose content is not a DER SEQUENCE is rejected.
pub fn read_pem_certificates(reader: &mut dyn BufRead) -> Result<String, ConnectivityError> {
    let mut pem = String::new();
    for item in rustls_pemfile::read_all(reader) {
        if let Item::X509Certificate(cert) = item? {
            if cert.as_ref().first() != Some(&ASN1_SEQUENCE) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "CERTIFICATE block is not a DER encoded X.509 certificate",
                )
                .into());
            }
            append_certificate(&mut pem, cert.as_ref());
        }
    }
    Ok(pem)
}

/// Append one DER certificate to `pem`
pub fn append_certificate(pem: &mut String, der: &[u8]) {
    let encoded = STANDARD.encode(der);

    pem.push_str(BEGIN_CERTIFICATE);
    pem.push('\n');
    let mut index = 0;
    while index < encoded.len() {
        let end = (index + PEM_LINE_LENGTH).min(encoded.len());
        pem.push_str(&encoded[index..end]);
        pem.push('\n');
        index = end;
    }
    pem.push_str(END_CERTIFICATE);
    pem.push('\n');
}

/// Read a PEM file and keep only its certificates
pub async fn load_pem_file(path: &Path) -> Result<Resource, ConnectivityError> {
    let bytes = fs::read(path).await?;
    let pem = read_pem_certificates(&mut Cursor::new(bytes))?;
    Ok(Resource::new(PEM_CERT_FILE_NAME, pem))
}
