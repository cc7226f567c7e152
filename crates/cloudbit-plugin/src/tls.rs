//! AutoMTLS between Terraform and the plugin
//!
//! Terraform generates a throwaway client certificate and hands it over in
//! `PLUGIN_CLIENT_CERT`. The plugin answers with its own self-signed
//! certificate in the handshake line. Both certificates are self-signed CA
//! certificates, so the client certificate is pinned instead of being
//! verified against a trust store.

use crate::error::{PluginError, Result};
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use rustls::client::danger::HandshakeSignatureValid;
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::{DigitallySignedStruct, DistinguishedName as TlsDistinguishedName, SignatureScheme};
use std::sync::Arc;

/// Certificate and key the plugin serves with
pub struct ServerCertificate {
    pub cert: CertificateDer<'static>,
    key: PrivateKeyDer<'static>,
}

impl ServerCertificate {
    /// Generate a self-signed ECDSA certificate for `localhost`
    pub fn generate() -> Result<Self> {
        let mut params = CertificateParams::new(vec!["localhost".to_string()])
            .map_err(|e| PluginError::Certificate(e.to_string()))?;

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "localhost");
        dn.push(DnType::OrganizationName, "HashiCorp");
        params.distinguished_name = dn;

        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
            KeyUsagePurpose::KeyCertSign,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];

        let key_pair = KeyPair::generate().map_err(|e| PluginError::Certificate(e.to_string()))?;
        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| PluginError::Certificate(e.to_string()))?;

        Ok(Self {
            cert: cert.der().clone(),
            key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der())),
        })
    }

    /// Server TLS configuration accepting only `client_cert`
    pub fn server_config(&self, client_cert: CertificateDer<'static>) -> Result<rustls::ServerConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = PinnedClientCertVerifier::new(client_cert, &provider);

        let mut config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_client_cert_verifier(Arc::new(verifier))
            .with_single_cert(vec![self.cert.clone()], self.key.clone_key())?;
        config.alpn_protocols = vec![b"h2".to_vec()];

        Ok(config)
    }
}

/// Parse the PEM certificate Terraform passes in `PLUGIN_CLIENT_CERT`
pub fn parse_client_cert(pem: &str) -> Result<CertificateDer<'static>> {
    CertificateDer::from_pem_slice(pem.as_bytes())
        .map_err(|e| PluginError::Certificate(format!("invalid client certificate: {}", e)))
}

/// Accepts exactly one client certificate
#[derive(Debug)]
pub struct PinnedClientCertVerifier {
    expected: CertificateDer<'static>,
    algorithms: WebPkiSupportedAlgorithms,
}

impl PinnedClientCertVerifier {
    pub fn new(expected: CertificateDer<'static>, provider: &CryptoProvider) -> Self {
        Self {
            expected,
            algorithms: provider.signature_verification_algorithms,
        }
    }
}

impl ClientCertVerifier for PinnedClientCertVerifier {
    fn root_hint_subjects(&self) -> &[TlsDistinguishedName] {
        &[]
    }

    fn verify_client_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: UnixTime,
    ) -> std::result::Result<ClientCertVerified, rustls::Error> {
        if end_entity.as_ref() == self.expected.as_ref() {
            Ok(ClientCertVerified::assertion())
        } else {
            Err(rustls::Error::InvalidCertificate(
                rustls::CertificateError::ApplicationVerificationFailure,
            ))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_certificate() {
        let cert = ServerCertificate::generate().unwrap();
        assert!(!cert.cert.as_ref().is_empty());
    }

    #[test]
    fn test_server_config_negotiates_h2() {
        let server = ServerCertificate::generate().unwrap();
        let client = ServerCertificate::generate().unwrap();

        let config = server.server_config(client.cert.clone()).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"h2".to_vec()]);
    }

    #[test]
    fn test_verifier_pins_certificate() {
        let provider = rustls::crypto::ring::default_provider();
        let trusted = ServerCertificate::generate().unwrap().cert;
        let other = ServerCertificate::generate().unwrap().cert;
        let verifier = PinnedClientCertVerifier::new(trusted.clone(), &provider);

        assert!(verifier.verify_client_cert(&trusted, &[], UnixTime::now()).is_ok());
        assert!(verifier.verify_client_cert(&other, &[], UnixTime::now()).is_err());
        assert!(verifier.root_hint_subjects().is_empty());
    }

    #[test]
    fn test_parse_client_cert_rejects_garbage() {
        assert!(parse_client_cert("not a certificate").is_err());
    }
}
