//! Client certificate loading for mutual-TLS connections.
//!
//! Every call reads the files again; nothing is cached between clients.

use std::path::{Path, PathBuf};

use crate::error::{HubbleError, Result};

const CERTIFICATE_MARKER: &str = "-----BEGIN CERTIFICATE-----";
const PRIVATE_KEY_MARKER: &str = "PRIVATE KEY-----";

/// TLS settings baked into a client's connection pool.
#[derive(Clone)]
pub struct TlsConfig {
    certificate_pem: Vec<u8>,
    bundle: Vec<u8>,
    certificate_path: PathBuf,
    insecure_skip_verify: bool,
}

impl TlsConfig {
    /// PEM bytes of the loaded client certificate.
    pub fn certificate_pem(&self) -> &[u8] {
        &self.certificate_pem
    }

    pub fn certificate_path(&self) -> &Path {
        &self.certificate_path
    }

    pub fn insecure_skip_verify(&self) -> bool {
        self.insecure_skip_verify
    }

    /// Client identity for the connection pool.
    pub(crate) fn identity(&self) -> Result<reqwest::Identity> {
        reqwest::Identity::from_pem(&self.bundle)
            .map_err(|e| load_error(&self.certificate_path, &e.to_string()))
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("certificate_path", &self.certificate_path)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish_non_exhaustive()
    }
}

/// Load an X.509 certificate and its private key from PEM files.
pub fn load_tls_config(
    certificate_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
    insecure_skip_verify: bool,
) -> Result<TlsConfig> {
    let certificate_path = certificate_path.as_ref();
    let key_path = key_path.as_ref();

    let certificate_pem = read_pem(certificate_path)?;
    let key_pem = read_pem(key_path)?;

    if !contains(&certificate_pem, CERTIFICATE_MARKER) {
        return Err(load_error(certificate_path, "no PEM certificate found"));
    }
    if !contains(&key_pem, PRIVATE_KEY_MARKER) {
        return Err(load_error(key_path, "no PEM private key found"));
    }

    let mut bundle = Vec::with_capacity(certificate_pem.len() + key_pem.len() + 1);
    bundle.extend_from_slice(&certificate_pem);
    if !bundle.ends_with(b"\n") {
        bundle.push(b'\n');
    }
    bundle.extend_from_slice(&key_pem);

    let identity = reqwest::Identity::from_pem(&bundle)
        .map_err(|e| load_error(certificate_path, &e.to_string()))?;

    // PEM parsing alone does not tie the key to the certificate; the TLS
    // backend rejects a mismatched pair when it is installed.
    reqwest::blocking::Client::builder()
        .use_rustls_tls()
        .identity(identity)
        .build()
        .map_err(|e| load_error(key_path, &format!("key does not match certificate: {}", e)))?;

    Ok(TlsConfig {
        certificate_pem,
        bundle,
        certificate_path: certificate_path.to_path_buf(),
        insecure_skip_verify,
    })
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| load_error(path, &e.to_string()))
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

pub(crate) fn load_error(path: &Path, reason: &str) -> HubbleError {
    HubbleError::CertificateLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
