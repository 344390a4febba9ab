//! TLS negotiation and SSL material handling
//!
//! TLS is layered over the already-dialed TCP stream. The client identity
//! and trust anchors come from raw DER inputs handed over by the wallet
//! layer: certificates, PKCS#1 private keys and certificate requests. A
//! private key whose public part equals a certificate's public key forms a
//! client key-pair; the root pool is built lazily from every accumulated
//! certificate.

use std::sync::Arc;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::RsaPrivateKey;
use rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use x509_cert::der::{Decode, Encode};
use x509_cert::request::CertReq;
use x509_cert::Certificate;

use crate::error::{Error, Result};

/// Accumulated SSL materials for one session
#[derive(Default)]
pub struct SslMaterials {
    certificates: Vec<CertificateDer<'static>>,
    certificate_requests: Vec<CertReq>,
    tls_certificates: Vec<(CertificateDer<'static>, PrivateKeyDer<'static>)>,
    roots: Option<RootCertStore>,
}

impl SslMaterials {
    /// Ingest raw DER certificates, PKCS#1 private keys and certificate
    /// requests. A key matching a certificate's public key becomes a
    /// client key-pair.
    pub fn load_ssl_data(
        &mut self,
        certs: &[Vec<u8>],
        keys: &[Vec<u8>],
        cert_requests: &[Vec<u8>],
    ) -> Result<()> {
        for cert_der in certs {
            let cert = Certificate::from_der(cert_der)
                .map_err(|e| Error::Tls(format!("invalid certificate: {e}")))?;
            let cert_spki = cert
                .tbs_certificate
                .subject_public_key_info
                .to_der()
                .map_err(|e| Error::Tls(format!("invalid certificate key: {e}")))?;

            for key_der in keys {
                let key = RsaPrivateKey::from_pkcs1_der(key_der)
                    .map_err(|e| Error::Tls(format!("invalid private key: {e}")))?;
                let key_spki = key
                    .to_public_key()
                    .to_public_key_der()
                    .map_err(|e| Error::Tls(format!("invalid private key: {e}")))?;
                if key_spki.as_bytes() == cert_spki.as_slice() {
                    self.tls_certificates.push((
                        CertificateDer::from(cert_der.clone()),
                        PrivateKeyDer::Pkcs1(key_der.clone().into()),
                    ));
                }
            }
            self.certificates.push(CertificateDer::from(cert_der.clone()));
            self.roots = None;
        }

        for req_der in cert_requests {
            let req = CertReq::from_der(req_der)
                .map_err(|e| Error::Tls(format!("invalid certificate request: {e}")))?;
            self.certificate_requests.push(req);
        }
        Ok(())
    }

    /// Number of assembled client key-pairs
    pub fn key_pair_count(&self) -> usize {
        self.tls_certificates.len()
    }

    /// Number of stored certificate requests
    pub fn certificate_request_count(&self) -> usize {
        self.certificate_requests.len()
    }

    /// Root pool over all accumulated certificates, built on first use
    fn roots(&mut self) -> Result<RootCertStore> {
        if self.roots.is_none() {
            let mut roots = RootCertStore::empty();
            for cert in &self.certificates {
                roots
                    .add(cert.clone())
                    .map_err(|e| Error::Tls(format!("bad root certificate: {e}")))?;
            }
            self.roots = Some(roots);
        }
        Ok(self.roots.clone().unwrap_or_else(RootCertStore::empty))
    }

    fn client_config(&mut self, verify: bool) -> Result<ClientConfig> {
        let builder = ClientConfig::builder();
        let builder = if verify {
            builder.with_root_certificates(self.roots()?)
        } else {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerification))
        };

        let config = match self.tls_certificates.first() {
            Some((cert, key)) => builder
                .with_client_auth_cert(vec![cert.clone()], key.clone_key())
                .map_err(|e| Error::Tls(format!("client auth: {e}")))?,
            None => builder.with_no_client_auth(),
        };
        Ok(config)
    }

    /// Wrap `stream` in a TLS client session. `host` supplies the server
    /// name; verification is skipped when `verify` is off.
    pub async fn negotiate(
        &mut self,
        stream: TcpStream,
        host: &str,
        verify: bool,
    ) -> Result<TlsStream<TcpStream>> {
        let config = self.client_config(verify)?;
        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| Error::Tls(format!("invalid server name: {host}")))?;
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(Error::Io)?;
        Ok(tls)
    }
}

impl std::fmt::Debug for SslMaterials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SslMaterials")
            .field("certificates", &self.certificates.len())
            .field("certificate_requests", &self.certificate_requests.len())
            .field("tls_certificates", &self.tls_certificates.len())
            .finish()
    }
}

/// Accepts any server certificate, for targets dialed with verification
/// disabled.
#[derive(Debug)]
struct NoVerification;

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA1,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_materials() {
        let materials = SslMaterials::default();
        assert_eq!(materials.key_pair_count(), 0);
        assert_eq!(materials.certificate_request_count(), 0);
    }

    #[test]
    fn garbage_der_is_rejected() {
        let mut materials = SslMaterials::default();
        let err = materials
            .load_ssl_data(&[vec![0xDE, 0xAD]], &[], &[])
            .unwrap_err();
        assert!(matches!(err, Error::Tls(_)));
    }

    #[test]
    fn config_without_materials_builds() {
        let mut materials = SslMaterials::default();
        // skip-verify path needs no roots at all
        assert!(materials.client_config(false).is_ok());
    }
}
