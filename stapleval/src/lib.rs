#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod chain;
pub mod ocsp;
pub mod report;
pub mod settings;
pub mod util;

#[cfg(test)]
mod test_support;

// order of pub use statements below is intended to assure the list emitted by cargo doc on the main
// index.html page is in alphabetical order.
pub use crate::chain::*;
pub use crate::ocsp::*;
pub use crate::report::*;
pub use crate::settings::*;
pub use crate::util::*;
