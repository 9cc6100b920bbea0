//! Interpretation of OCSP responses retrieved from a responder

use const_oid::db::rfc5912::{ID_SHA_1, ID_SHA_256};
use const_oid::db::rfc6960::ID_PKIX_OCSP_BASIC;
use der::Decode;
use log::debug;
use sha2::{Digest, Sha256};
use x509_cert::Certificate;
use x509_ocsp::{BasicOcspResponse, OcspResponse, OcspResponseStatus, SingleResponse};

use crate::{get_key_hash, Error, Result, StapleLifetime, StapleTime};

/// `OcspValidity` is the validity window asserted by a parsed OCSP response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspValidity {
    /// Time at which the responder signed the response
    pub produced_at: StapleTime,
    /// thisUpdate from the reported SingleResponse
    pub this_update: StapleTime,
    /// nextUpdate from the reported SingleResponse, if the responder asserted one
    pub next_update: Option<StapleTime>,
}

impl OcspValidity {
    /// Returns the distance from producedAt to nextUpdate, or None when the response carries no
    /// nextUpdate.
    pub fn lifetime(&self) -> Option<StapleLifetime> {
        self.next_update
            .as_ref()
            .map(|nu| StapleLifetime::between(&self.produced_at, nu))
    }
}

/// Returns true if the issuer key hash in `sr` was computed over the key in `issuers_cert`
/// using SHA-1 or SHA-256.
fn issuer_key_hash_matches(sr: &SingleResponse, issuers_cert: &Certificate) -> bool {
    let cert_id = &sr.cert_id;
    let key_hash = if cert_id.hash_algorithm.oid == ID_SHA_1 {
        match get_key_hash(issuers_cert) {
            Ok(kh) => kh,
            Err(_) => return false,
        }
    } else if cert_id.hash_algorithm.oid == ID_SHA_256 {
        Sha256::digest(
            issuers_cert
                .tbs_certificate
                .subject_public_key_info
                .subject_public_key
                .raw_bytes(),
        )
        .to_vec()
    } else {
        return false;
    };
    cert_id.issuer_key_hash.as_bytes() == key_hash.as_slice()
}

/// `parse_ocsp_response` parses `enc_ocsp_resp`, a DER-encoded OCSPResponse, and returns the
/// validity window it asserts.
///
/// The response must have successful status and carry a basic response. When the basic response
/// contains more than one SingleResponse, the first one issued under `issuers_cert` is reported,
/// falling back to the first one. The signature is not verified and the certificate status is not
/// evaluated. All failures are reported as [`Error::Parse`].
pub fn parse_ocsp_response(enc_ocsp_resp: &[u8], issuers_cert: &Certificate) -> Result<OcspValidity> {
    let or = match OcspResponse::from_der(enc_ocsp_resp) {
        Ok(or) => or,
        Err(e) => {
            return Err(Error::Parse(format!(
                "failed to parse OCSPResponse with {}",
                e
            )))
        }
    };

    if or.response_status != OcspResponseStatus::Successful {
        return Err(Error::Parse(format!(
            "OCSPResponse indicates failure ({:?})",
            or.response_status
        )));
    }

    let rb = match &or.response_bytes {
        Some(rb) => rb,
        None => {
            return Err(Error::Parse(
                "OCSPResponse contained no response bytes".to_string(),
            ))
        }
    };

    if rb.response_type != ID_PKIX_OCSP_BASIC {
        return Err(Error::Parse(format!(
            "OCSPResponse contained response bytes other than basic type ({})",
            rb.response_type
        )));
    }

    let bor = match BasicOcspResponse::from_der(rb.response.as_bytes()) {
        Ok(bor) => bor,
        Err(e) => {
            return Err(Error::Parse(format!(
                "failed to parse BasicOCSPResponse with {}",
                e
            )))
        }
    };

    let rd = &bor.tbs_response_data;
    let sr = match rd
        .responses
        .iter()
        .find(|sr| issuer_key_hash_matches(sr, issuers_cert))
    {
        Some(sr) => sr,
        None => match rd.responses.first() {
            Some(sr) => {
                debug!("No SingleResponse matched the issuer; reporting the first one");
                sr
            }
            None => {
                return Err(Error::Parse(
                    "BasicOCSPResponse contained no SingleResponse".to_string(),
                ))
            }
        },
    };

    Ok(OcspValidity {
        produced_at: StapleTime::from(rd.produced_at.0),
        this_update: StapleTime::from(sr.this_update.0),
        next_update: sr.next_update.as_ref().map(|nu| StapleTime::from(nu.0)),
    })
}
