//! OCSP request preparation, retrieval from responders and response interpretation

pub mod ocsp_client;
pub mod ocsp_request;
pub mod ocsp_response;

pub use crate::ocsp::{ocsp_client::*, ocsp_request::*, ocsp_response::*};
