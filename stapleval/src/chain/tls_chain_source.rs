//! [`ChainSource`] implementation that performs a TLS handshake using tokio-rustls

use std::net::Ipv6Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

use crate::{get_connect_timeout, get_port, ChainSource, Error, Result, StapleSettings};

/// `TlsChainSource` connects to `host:port` and returns the chain presented during the handshake.
///
/// Trust is established using the Mozilla roots from the webpki-roots crate unless another root
/// store is supplied. No client certificate is offered. The TCP connection, the handshake and the
/// closing of the session are each bounded by `PS_CONNECT_TIMEOUT`.
#[derive(Clone)]
pub struct TlsChainSource {
    connector: TlsConnector,
    port: u16,
    connect_timeout: Duration,
}

impl TlsChainSource {
    /// Creates a new [`TlsChainSource`] using the port and timeout from `sts`.
    pub fn new(sts: &StapleSettings) -> Result<Self> {
        let root_store = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.into(),
        };
        Self::with_root_store(sts, root_store)
    }

    /// Creates a new [`TlsChainSource`] that trusts the anchors in `root_store`, e.g., for servers
    /// in a private PKI.
    pub fn with_root_store(sts: &StapleSettings, root_store: RootCertStore) -> Result<Self> {
        let config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Misconfiguration(format!("failed to prepare TLS client: {}", e)))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

        Ok(TlsChainSource {
            connector: TlsConnector::from(Arc::new(config)),
            port: get_port(sts),
            connect_timeout: get_connect_timeout(sts),
        })
    }
}

/// Joins `host` and `port` into an address for `TcpStream::connect`. IPv6 literals are bracketed.
fn host_port(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

#[async_trait]
impl ChainSource for TlsChainSource {
    async fn get_peer_chain(&self, host: &str) -> Result<Vec<Vec<u8>>> {
        let addr = host_port(host, self.port);
        let server_name = match ServerName::try_from(host.to_string()) {
            Ok(sn) => sn,
            Err(e) => return Err(Error::Connection(format!("{}: {}", addr, e))),
        };

        debug!("Connecting to {}", addr);
        let tcp = match timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(tcp)) => tcp,
            Ok(Err(e)) => return Err(Error::Connection(format!("{}: {}", addr, e))),
            Err(_) => {
                return Err(Error::Connection(format!(
                    "{}: connection timed out after {:?}",
                    addr, self.connect_timeout
                )))
            }
        };

        let mut tls = match timeout(
            self.connect_timeout,
            self.connector.connect(server_name, tcp),
        )
        .await
        {
            Ok(Ok(tls)) => tls,
            Ok(Err(e)) => return Err(Error::Connection(format!("{}: {}", addr, e))),
            Err(_) => {
                return Err(Error::Connection(format!(
                    "{}: TLS handshake timed out after {:?}",
                    addr, self.connect_timeout
                )))
            }
        };

        let chain: Vec<Vec<u8>> = {
            let (_, conn) = tls.get_ref();
            match conn.peer_certificates() {
                Some(certs) => certs.iter().map(|c| c.as_ref().to_vec()).collect(),
                None => vec![],
            }
        };

        // the stream is dropped (and the socket closed) when this function returns regardless of
        // whether close_notify could be sent
        match timeout(self.connect_timeout, tls.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Failed to shut down TLS session with {}: {}", addr, e),
            Err(_) => debug!("Timed out shutting down TLS session with {}", addr),
        }
        Ok(chain)
    }
}

#[test]
fn host_port_test() {
    assert_eq!("example.com:443", host_port("example.com", 443));
    assert_eq!("127.0.0.1:9", host_port("127.0.0.1", 9));
    assert_eq!("[::1]:443", host_port("::1", 443));
    assert_eq!("[2001:db8::1]:8443", host_port("2001:db8::1", 8443));
}

#[tokio::test]
async fn refused_connection() {
    let mut sts = StapleSettings::new();
    // nothing listens on the discard port on loopback in the test environment
    crate::set_port(&mut sts, 9);
    crate::set_connect_timeout(&mut sts, Duration::from_secs(2));
    let source = TlsChainSource::new(&sts).unwrap();
    match source.get_peer_chain("127.0.0.1").await {
        Err(Error::Connection(msg)) => assert!(msg.starts_with("127.0.0.1:9")),
        other => panic!("expected Connection error, got {:?}", other),
    }
}

#[test]
fn invalid_server_name() {
    let source = TlsChainSource::new(&StapleSettings::new()).unwrap();
    match tokio_test::block_on(source.get_peer_chain("not a host name")) {
        Err(Error::Connection(_)) => {}
        other => panic!("expected Connection error, got {:?}", other),
    }
}
