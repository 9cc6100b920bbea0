//! Connection to a TLS server and extraction of the certificate chain it presents

pub mod peer_chain;

#[cfg(feature = "remote")]
pub mod tls_chain_source;

pub use crate::chain::peer_chain::*;

#[cfg(feature = "remote")]
pub use crate::chain::tls_chain_source::*;
