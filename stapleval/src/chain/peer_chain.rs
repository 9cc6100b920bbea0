//! The certificate chain presented by a TLS server and the [`ChainSource`] trait used to obtain it

use async_trait::async_trait;
use der::Decode;
use log::debug;
use x509_cert::Certificate;

use crate::{Error, Result};

/// `ChainSource` yields the certificates a server presents during a TLS handshake, as DER-encoded
/// buffers in the order presented (leaf first).
///
/// Implementations report dial, DNS and handshake failures as [`Error::Connection`] and must have
/// released any network resources by the time `get_peer_chain` returns.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Connects to `host` and returns the peer certificate chain.
    async fn get_peer_chain(&self, host: &str) -> Result<Vec<Vec<u8>>>;
}

/// `PeerChain` is a parsed certificate chain with at least two certificates: the leaf at index 0
/// and its issuer at index 1.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeerChain {
    certs: Vec<Certificate>,
}

impl PeerChain {
    /// Parses a DER-encoded chain, leaf first. Chains with fewer than two certificates are
    /// rejected with [`Error::ChainTooShort`] before any certificate is parsed. A certificate that
    /// cannot be parsed fails the connection, i.e., yields [`Error::Connection`].
    pub fn from_der_chain(chain: &[Vec<u8>]) -> Result<Self> {
        if chain.len() < 2 {
            return Err(Error::ChainTooShort(chain.len()));
        }
        let mut certs = Vec::with_capacity(chain.len());
        for (i, enc) in chain.iter().enumerate() {
            match Certificate::from_der(enc.as_slice()) {
                Ok(cert) => certs.push(cert),
                Err(e) => {
                    return Err(Error::Connection(format!(
                        "failed to parse certificate {} presented by server: {}",
                        i, e
                    )))
                }
            }
        }
        Ok(PeerChain { certs })
    }

    /// The end entity certificate presented by the server
    pub fn leaf(&self) -> &Certificate {
        &self.certs[0]
    }

    /// The certificate that issued the leaf
    pub fn issuer(&self) -> &Certificate {
        &self.certs[1]
    }

    /// All certificates in presentation order
    pub fn certs(&self) -> &[Certificate] {
        &self.certs
    }

    /// Number of certificates in the chain, always at least two
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Always false; present for symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

/// `extract_chain` obtains the chain `host` presents via `source` and parses it into a [`PeerChain`].
pub async fn extract_chain(source: &dyn ChainSource, host: &str) -> Result<PeerChain> {
    let chain = source.get_peer_chain(host).await?;
    debug!("{} presented {} certificate(s)", host, chain.len());
    PeerChain::from_der_chain(&chain)
}
