//! Plugin process lifecycle
//!
//! Performs the go-plugin handshake with Terraform, serves the provider,
//! health and controller services over gRPC and shuts down when Terraform
//! asks for it.

use crate::error::{PluginError, Result};
use crate::proto::plugin::{Empty, grpc_controller_server};
use crate::provider::Provider;
use crate::service::PluginService;
use crate::tls::{ServerCertificate, parse_client_cert};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use futures_util::StreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{info, warn};

pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

const CORE_PROTOCOL_VERSION: u32 = 1;
const PROTOCOL_VERSION: u32 = 6;

/// Options for [`serve`]
#[derive(Debug, Clone)]
pub struct ServeOpts {
    /// Registry address of the provider, e.g. `registry.terraform.io/org/name`
    pub address: String,
    /// Print reattach information instead of performing the handshake
    pub debug: bool,
}

/// Handshake parameters Terraform passes through the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub client_cert: Option<String>,
}

impl Handshake {
    pub fn from_env() -> Result<Self> {
        match std::env::var(MAGIC_COOKIE_KEY) {
            Ok(cookie) if cookie == MAGIC_COOKIE_VALUE => {}
            _ => return Err(PluginError::NotLaunchedByTerraform),
        }

        if let Ok(versions) = std::env::var("PLUGIN_PROTOCOL_VERSIONS") {
            let supported = versions
                .split(',')
                .any(|v| v.trim().parse::<u32>() == Ok(PROTOCOL_VERSION));
            if !supported {
                return Err(PluginError::UnsupportedProtocol(versions));
            }
        }

        let client_cert = std::env::var("PLUGIN_CLIENT_CERT")
            .ok()
            .filter(|pem| !pem.trim().is_empty());

        Ok(Self { client_cert })
    }

    /// The line announcing the listener to Terraform
    pub fn line(addr: SocketAddr, server_cert: Option<&[u8]>) -> String {
        let cert = server_cert
            .map(|der| STANDARD_NO_PAD.encode(der))
            .unwrap_or_default();
        format!(
            "{}|{}|tcp|{}|grpc|{}",
            CORE_PROTOCOL_VERSION, PROTOCOL_VERSION, addr, cert
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReattachConfig {
    protocol: &'static str,
    protocol_version: u32,
    pid: u32,
    test: bool,
    addr: ReattachAddr,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReattachAddr {
    network: &'static str,
    string: String,
}

/// `TF_REATTACH_PROVIDERS` value for a provider served in debug mode
pub fn reattach_config(address: &str, addr: SocketAddr) -> Result<String> {
    let mut providers = HashMap::new();
    providers.insert(
        address.to_string(),
        ReattachConfig {
            protocol: "grpc",
            protocol_version: PROTOCOL_VERSION,
            pid: std::process::id(),
            test: true,
            addr: ReattachAddr {
                network: "tcp",
                string: addr.to_string(),
            },
        },
    );
    Ok(serde_json::to_string(&providers)?)
}

/// go-plugin controller, lets Terraform shut the plugin down
struct Controller {
    shutdown: CancellationToken,
}

#[tonic::async_trait]
impl grpc_controller_server::GrpcController for Controller {
    async fn shutdown(
        &self,
        _request: tonic::Request<Empty>,
    ) -> std::result::Result<tonic::Response<Empty>, tonic::Status> {
        info!("shutdown requested by terraform");
        self.shutdown.cancel();
        Ok(tonic::Response::new(Empty {}))
    }
}

/// Serve a provider until Terraform shuts it down
pub async fn serve<P: Provider>(provider: P, opts: ServeOpts) -> Result<()> {
    let handshake = if opts.debug {
        None
    } else {
        Some(Handshake::from_env()?)
    };

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let shutdown = CancellationToken::new();
    let service = PluginService::new(provider);
    let stop = service.stop_token();

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_service_status("plugin", tonic_health::ServingStatus::Serving)
        .await;

    let router = Server::builder()
        .add_service(health_service)
        .add_service(grpc_controller_server::GrpcControllerServer::new(Controller {
            shutdown: shutdown.clone(),
        }))
        .add_service(service.into_server());

    let signal = {
        let shutdown = shutdown.clone();
        async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::signal::ctrl_c() => info!("interrupted"),
            }
            stop.cancel();
        }
    };

    let Some(handshake) = handshake else {
        let reattach = reattach_config(&opts.address, addr)?;
        println!(
            "Provider started. To attach Terraform CLI, set the TF_REATTACH_PROVIDERS environment variable with the following:\n\n\tTF_REATTACH_PROVIDERS='{}'\n",
            reattach
        );
        info!(%addr, address = %opts.address, "serving provider in debug mode");

        router
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal)
            .await?;
        return Ok(());
    };

    let Some(client_pem) = handshake.client_cert else {
        announce(&Handshake::line(addr, None))?;
        info!(%addr, "serving provider without TLS");

        router
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal)
            .await?;
        return Ok(());
    };

    let client_cert = parse_client_cert(&client_pem)?;
    let server_cert = ServerCertificate::generate()?;
    let acceptor = TlsAcceptor::from(std::sync::Arc::new(
        server_cert.server_config(client_cert)?,
    ));

    let incoming = Box::pin(TcpListenerStream::new(listener).filter_map(move |conn| {
        let acceptor = acceptor.clone();
        async move {
            let tcp = match conn {
                Ok(tcp) => tcp,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    return None;
                }
            };
            match acceptor.accept(tcp).await {
                Ok(tls) => Some(Ok::<_, std::io::Error>(tls)),
                Err(e) => {
                    warn!(error = %e, "TLS handshake failed");
                    None
                }
            }
        }
    }));

    announce(&Handshake::line(addr, Some(server_cert.cert.as_ref())))?;
    info!(%addr, "serving provider");

    router.serve_with_incoming_shutdown(incoming, signal).await?;
    Ok(())
}

fn announce(line: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn handshake_env(
        cookie: Option<&str>,
        versions: Option<&str>,
        cert: Option<&str>,
    ) -> Result<Handshake> {
        temp_env::with_vars(
            [
                (MAGIC_COOKIE_KEY, cookie),
                ("PLUGIN_PROTOCOL_VERSIONS", versions),
                ("PLUGIN_CLIENT_CERT", cert),
            ],
            Handshake::from_env,
        )
    }

    #[test]
    #[serial]
    fn test_missing_cookie_is_rejected() {
        let err = handshake_env(None, Some("6"), None).unwrap_err();
        assert!(matches!(err, PluginError::NotLaunchedByTerraform));

        let err = handshake_env(Some("wrong"), Some("6"), None).unwrap_err();
        assert!(matches!(err, PluginError::NotLaunchedByTerraform));
    }

    #[test]
    #[serial]
    fn test_protocol_version_negotiation() {
        let err = handshake_env(Some(MAGIC_COOKIE_VALUE), Some("4,5"), None).unwrap_err();
        assert!(matches!(err, PluginError::UnsupportedProtocol(_)));

        let handshake = handshake_env(Some(MAGIC_COOKIE_VALUE), Some("5,6"), None).unwrap();
        assert_eq!(handshake.client_cert, None);
    }

    #[test]
    #[serial]
    fn test_client_cert_is_picked_up() {
        let handshake =
            handshake_env(Some(MAGIC_COOKIE_VALUE), Some("6"), Some("-----BEGIN")).unwrap();
        assert_eq!(handshake.client_cert.as_deref(), Some("-----BEGIN"));
    }

    #[test]
    fn test_handshake_line() {
        let addr: SocketAddr = "127.0.0.1:40123".parse().unwrap();
        assert_eq!(
            Handshake::line(addr, None),
            "1|6|tcp|127.0.0.1:40123|grpc|"
        );
        assert_eq!(
            Handshake::line(addr, Some(&[0xde, 0xad, 0xbe, 0xef])),
            "1|6|tcp|127.0.0.1:40123|grpc|3q2+7w"
        );
    }

    #[test]
    fn test_reattach_config() {
        let addr: SocketAddr = "127.0.0.1:40123".parse().unwrap();
        let json = reattach_config("registry.terraform.io/cloudbit-ch/cloudbit", addr).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entry = &parsed["registry.terraform.io/cloudbit-ch/cloudbit"];

        assert_eq!(entry["Protocol"], "grpc");
        assert_eq!(entry["ProtocolVersion"], 6);
        assert_eq!(entry["Addr"]["Network"], "tcp");
        assert_eq!(entry["Addr"]["String"], "127.0.0.1:40123");
    }
}
