use std::sync::Arc;

use ::tracing::warn;
use anyhow::{anyhow, Result};
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;
use rustls_pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer};

use crate::config::{PemSource, TlsConfig};

/// Build the rustls configuration used by the HTTPS server.
pub(crate) async fn create_tls_config(tls_config: &TlsConfig) -> Result<RustlsConfig> {
    let cert_pem = read_pem(&tls_config.cert)
        .await
        .map_err(|e| anyhow!("Cannot read TLS certificate: {e}"))?;
    let key_pem = read_pem(&tls_config.key)
        .await
        .map_err(|e| anyhow!("Cannot read TLS key: {e}"))?;

    let (cert, key) = load_server_cert_and_key(&cert_pem, &key_pem)?;
    let server_config = build_tls_server_config(cert, key)?;

    Ok(RustlsConfig::from_config(Arc::new(server_config)))
}

async fn read_pem(source: &PemSource) -> Result<Vec<u8>> {
    match source {
        PemSource::Inline(pem) => Ok(pem.as_bytes().to_vec()),
        PemSource::File(path) => tokio::fs::read(path)
            .await
            .map_err(|e| anyhow!("{}: {e}", path.display())),
    }
}

fn build_tls_server_config(
    cert: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<ServerConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    Ok(ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert, key)?)
}

// Parse the server certificate chain and its key
fn load_server_cert_and_key(
    cert_contents: &[u8],
    key_contents: &[u8],
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(cert_contents)
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("Cannot parse certificate: {e}");
            }
            it.ok()
        })
        .collect();

    if certs.is_empty() {
        return Err(anyhow!("No certificate found in the TLS certificate"));
    }

    let keys: Vec<PrivateKeyDer<'static>> = PrivateKeyDer::pem_slice_iter(key_contents)
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("Cannot parse private key: {e}");
            }
            it.ok()
        })
        .collect();

    if keys.len() != 1 {
        return Err(anyhow!(
            "Expected exactly one key in the TLS key, found {}",
            keys.len()
        ));
    }

    Ok((certs, keys[0].clone_key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, KeyPair};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_cert(hostname: &str) -> (String, String) {
        let key_pair = KeyPair::generate().unwrap();
        let cert = CertificateParams::new(vec![hostname.to_owned()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap();

        (cert.pem(), key_pair.serialize_pem())
    }

    #[test]
    fn load_valid_pair() {
        let (cert, key) = create_cert("nodeselector-webhook.default.svc");

        let (certs, _key) = load_server_cert_and_key(cert.as_bytes(), key.as_bytes()).unwrap();
        assert_eq!(certs.len(), 1);
    }

    #[test]
    fn load_certificate_chain() {
        let (leaf, key) = create_cert("nodeselector-webhook.default.svc");
        let (intermediate, _) = create_cert("intermediate");
        let chain = format!("{leaf}{intermediate}");

        let (certs, _key) = load_server_cert_and_key(chain.as_bytes(), key.as_bytes()).unwrap();
        assert_eq!(certs.len(), 2);
    }

    #[test]
    fn reject_missing_certificate() {
        let (_, key) = create_cert("localhost");

        let error = load_server_cert_and_key(b"not a certificate", key.as_bytes()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "No certificate found in the TLS certificate"
        );
    }

    #[test]
    fn reject_multiple_keys() {
        let (cert, key) = create_cert("localhost");
        let (_, other_key) = create_cert("localhost");
        let keys = format!("{key}{other_key}");

        let error = load_server_cert_and_key(cert.as_bytes(), keys.as_bytes()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Expected exactly one key in the TLS key, found 2"
        );
    }

    #[tokio::test]
    async fn create_from_inline_and_file_sources() {
        let (cert, key) = create_cert("localhost");
        let mut key_file = NamedTempFile::new().unwrap();
        key_file.write_all(key.as_bytes()).unwrap();

        let tls_config = TlsConfig {
            cert: PemSource::Inline(cert),
            key: PemSource::File(key_file.path().to_path_buf()),
        };

        assert!(create_tls_config(&tls_config).await.is_ok());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let (cert, _) = create_cert("localhost");
        let tls_config = TlsConfig {
            cert: PemSource::Inline(cert),
            key: PemSource::File("/does/not/exist/tls.key".into()),
        };

        let error = create_tls_config(&tls_config).await.unwrap_err();
        assert!(error.to_string().starts_with("Cannot read TLS key"));
    }
}
