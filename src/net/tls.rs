//! TLS identity discovery and loading.
//!
//! The secured listener is enabled by dropping a PKCS#12 bundle (certificate
//! plus private key, empty passphrase) at `<root>/ssl/PKCS12Cert.pfx`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use axum_server::tls_rustls::RustlsConfig;
use openssl::error::ErrorStack;
use openssl::pkcs12::Pkcs12;
use openssl::provider::Provider;
use thiserror::Error;

/// Directory under the application root holding the certificate.
pub const CERTIFICATE_DIR: &str = "ssl";

/// File name of the PKCS#12 bundle.
pub const CERTIFICATE_FILE: &str = "PKCS12Cert.pfx";

/// Legacy provider, loaded once and kept for the life of the process.
static LEGACY_PROVIDER: OnceLock<Option<Provider>> = OnceLock::new();

/// Errors raised while loading a certificate that is present.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read certificate {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("certificate path {0:?} is not a regular file")]
    NotAFile(PathBuf),

    #[error("certificate {path:?} is not a readable PKCS#12 bundle: {source}")]
    Pkcs12 {
        path: PathBuf,
        #[source]
        source: ErrorStack,
    },

    #[error("certificate {0:?} does not contain a private key")]
    MissingKey(PathBuf),

    #[error("certificate {0:?} does not contain a certificate")]
    MissingCertificate(PathBuf),

    #[error("certificate {path:?} was rejected by the TLS stack: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A loaded certificate chain and private key, ready for the TLS acceptor.
#[derive(Clone)]
pub struct TlsIdentity {
    path: PathBuf,
    subject: String,
    config: RustlsConfig,
}

impl TlsIdentity {
    /// File the identity was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subject of the leaf certificate, for logging.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn rustls_config(&self) -> RustlsConfig {
        self.config.clone()
    }
}

impl std::fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsIdentity")
            .field("path", &self.path)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// Location of the certificate for an application root.
pub fn certificate_path(root: &Path) -> PathBuf {
    root.join(CERTIFICATE_DIR).join(CERTIFICATE_FILE)
}

/// Look for the certificate under `root` and load it if present.
///
/// A missing file is the normal "TLS disabled" case and yields `Ok(None)`.
/// A file that exists but cannot be loaded is an error.
pub async fn probe(root: &Path) -> Result<Option<TlsIdentity>, TlsError> {
    let path = certificate_path(root);

    match tokio::fs::metadata(&path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = ?path, "No certificate installed");
            return Ok(None);
        }
        Err(source) => return Err(log_failure(TlsError::Read { path, source })),
        Ok(metadata) if !metadata.is_file() => {
            return Err(log_failure(TlsError::NotAFile(path)));
        }
        Ok(_) => {}
    }

    load_identity(&path).await.map(Some).map_err(log_failure)
}

/// Load a PKCS#12 bundle with an empty passphrase.
///
/// Both AES-protected bundles and the RC2/3DES bundles produced by Windows
/// certificate exports are accepted.
pub async fn load_identity(path: &Path) -> Result<TlsIdentity, TlsError> {
    enable_legacy_algorithms();

    let bytes = tokio::fs::read(path).await.map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let pkcs12_error = |source| TlsError::Pkcs12 {
        path: path.to_path_buf(),
        source,
    };
    let parsed = Pkcs12::from_der(&bytes)
        .and_then(|bundle| bundle.parse2(""))
        .map_err(pkcs12_error)?;

    let key = parsed
        .pkey
        .ok_or_else(|| TlsError::MissingKey(path.to_path_buf()))?;
    let cert = parsed
        .cert
        .ok_or_else(|| TlsError::MissingCertificate(path.to_path_buf()))?;

    let mut chain = vec![cert.to_der().map_err(pkcs12_error)?];
    if let Some(ca) = parsed.ca {
        for intermediate in ca.iter() {
            chain.push(intermediate.to_der().map_err(pkcs12_error)?);
        }
    }
    let key_der = key.private_key_to_pkcs8().map_err(pkcs12_error)?;

    let subject = cert
        .subject_name()
        .entries()
        .filter_map(|entry| entry.data().as_utf8().ok())
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let config = RustlsConfig::from_der(chain, key_der)
        .await
        .map_err(|source| TlsError::Config {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(path = ?path, subject = %subject, "Certificate loaded");

    Ok(TlsIdentity {
        path: path.to_path_buf(),
        subject,
        config,
    })
}

/// Make RC2 and 3DES available to the PKCS#12 reader.
///
/// The default provider stays loaded alongside the legacy one.
fn enable_legacy_algorithms() {
    LEGACY_PROVIDER.get_or_init(|| match Provider::try_load(None, "legacy", true) {
        Ok(provider) => Some(provider),
        Err(e) => {
            tracing::warn!(error = %e, "OpenSSL legacy provider unavailable, RC2/3DES certificates cannot be read");
            None
        }
    });
}

fn log_failure(err: TlsError) -> TlsError {
    tracing::error!(error = %err, "Failed to load certificate");
    err
}
