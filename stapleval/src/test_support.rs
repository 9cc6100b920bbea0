//! Builders for certificates, OCSP responses and mock collaborators used by unit tests

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_256, ID_AD_OCSP, ID_EC_PUBLIC_KEY, ID_PE_AUTHORITY_INFO_ACCESS, ID_SHA_1,
};
use const_oid::db::rfc6960::ID_PKIX_OCSP_BASIC;
use der::asn1::{BitString, GeneralizedTime, Ia5String, Null, OctetString};
use der::Encode;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{AccessDescription, AuthorityInfoAccessSyntax};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;
use x509_ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspGeneralizedTime, OcspResponse, OcspResponseStatus,
    ResponderId, ResponseBytes, ResponseData, SingleResponse, Version as OcspVersion,
};

use crate::{get_key_hash, get_subject_name_hash, ChainSource, Error, OcspTransport, Result};

pub(crate) const T0: u64 = 1704067200; // 2024-01-01T00:00:00Z
pub(crate) const WEEK: u64 = 7 * 24 * 3600;

pub(crate) fn generalized_time(secs: u64) -> GeneralizedTime {
    GeneralizedTime::from_unix_duration(Duration::from_secs(secs)).unwrap()
}

fn ecdsa_alg() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: ECDSA_WITH_SHA_256,
        parameters: None,
    }
}

/// Builds an unsigned (dummy signature) certificate. The public key is derived from `subject` so
/// distinct subjects have distinct key hashes.
pub(crate) fn make_cert(serial: &[u8], subject: &str, issuer: &str, ocsp_uris: &[&str]) -> Certificate {
    let mut key = vec![0x04];
    key.extend_from_slice(subject.as_bytes());

    let extensions = if ocsp_uris.is_empty() {
        None
    } else {
        let aia = AuthorityInfoAccessSyntax(
            ocsp_uris
                .iter()
                .map(|u| AccessDescription {
                    access_method: ID_AD_OCSP,
                    access_location: GeneralName::UniformResourceIdentifier(
                        Ia5String::new(u).unwrap(),
                    ),
                })
                .collect(),
        );
        Some(vec![Extension {
            extn_id: ID_PE_AUTHORITY_INFO_ACCESS,
            critical: false,
            extn_value: OctetString::new(aia.to_der().unwrap()).unwrap(),
        }])
    };

    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(serial).unwrap(),
        signature: ecdsa_alg(),
        issuer: Name::from_str(issuer).unwrap(),
        validity: Validity {
            not_before: Time::GeneralTime(generalized_time(T0 - WEEK)),
            not_after: Time::GeneralTime(generalized_time(T0 + 52 * WEEK)),
        },
        subject: Name::from_str(subject).unwrap(),
        subject_public_key_info: SubjectPublicKeyInfoOwned {
            algorithm: AlgorithmIdentifierOwned {
                oid: ID_EC_PUBLIC_KEY,
                parameters: None,
            },
            subject_public_key: BitString::from_bytes(&key).unwrap(),
        },
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions,
    };

    Certificate {
        tbs_certificate,
        signature_algorithm: ecdsa_alg(),
        signature: BitString::from_bytes(&[0x30, 0x00]).unwrap(),
    }
}

/// Returns a (leaf, issuer) pair where the leaf names `ocsp_uris` as its responders.
pub(crate) fn make_pair(ocsp_uris: &[&str]) -> (Certificate, Certificate) {
    let issuer = make_cert(&[0x02], "CN=Example Issuing CA,O=Example", "CN=Example Root,O=Example", &[]);
    let leaf = make_cert(
        &[0x01, 0x23, 0x45],
        "CN=example.com",
        "CN=Example Issuing CA,O=Example",
        ocsp_uris,
    );
    (leaf, issuer)
}

/// Replaces the value of the authority information access extension of `cert` with an OCTET
/// STRING, which does not decode as AuthorityInfoAccessSyntax.
pub(crate) fn corrupt_aia(cert: &mut Certificate) {
    if let Some(exts) = cert.tbs_certificate.extensions.as_mut() {
        for ext in exts.iter_mut() {
            if ext.extn_id == ID_PE_AUTHORITY_INFO_ACCESS {
                ext.extn_value = OctetString::new(vec![0x04, 0x01, 0x00]).unwrap();
            }
        }
    }
}

pub(crate) fn make_cert_id(leaf: &Certificate, issuer: &Certificate) -> CertId {
    CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: ID_SHA_1,
            parameters: None,
        },
        issuer_name_hash: OctetString::new(get_subject_name_hash(issuer).unwrap()).unwrap(),
        issuer_key_hash: OctetString::new(get_key_hash(issuer).unwrap()).unwrap(),
        serial_number: leaf.tbs_certificate.serial_number.clone(),
    }
}

/// Builds a DER-encoded successful OCSP response with one SingleResponse per `cert_ids` entry.
pub(crate) fn make_ocsp_response(
    cert_ids: Vec<CertId>,
    produced_at: u64,
    next_update: Option<u64>,
) -> Vec<u8> {
    let responses = cert_ids
        .into_iter()
        .map(|cert_id| SingleResponse {
            cert_id,
            cert_status: CertStatus::Good(Null),
            this_update: OcspGeneralizedTime(generalized_time(produced_at)),
            next_update: next_update.map(|nu| OcspGeneralizedTime(generalized_time(nu))),
            single_extensions: None,
        })
        .collect();

    let tbs_response_data = ResponseData {
        version: OcspVersion::V1,
        responder_id: ResponderId::ByKey(OctetString::new(vec![0x11; 20]).unwrap()),
        produced_at: OcspGeneralizedTime(generalized_time(produced_at)),
        responses,
        response_extensions: None,
    };
    let bor = BasicOcspResponse {
        tbs_response_data,
        signature_algorithm: ecdsa_alg(),
        signature: BitString::from_bytes(&[0x30, 0x00]).unwrap(),
        certs: None,
    };
    let or = OcspResponse {
        response_status: OcspResponseStatus::Successful,
        response_bytes: Some(ResponseBytes {
            response_type: ID_PKIX_OCSP_BASIC,
            response: OctetString::new(bor.to_der().unwrap()).unwrap(),
        }),
    };
    or.to_der().unwrap()
}

/// Builds a well-formed response for the pair produced by [`make_pair`] that is valid for one week
/// starting 2024-01-01T00:00:00Z.
pub(crate) fn make_week_response(leaf: &Certificate, issuer: &Certificate) -> Vec<u8> {
    make_ocsp_response(vec![make_cert_id(leaf, issuer)], T0, Some(T0 + WEEK))
}

/// `MockTransport` answers responder requests from a map keyed by the responder's base URI (the
/// request URI with the appended encoded request removed) and records each request URI.
#[derive(Default)]
pub(crate) struct MockTransport {
    answers: BTreeMap<String, core::result::Result<Vec<u8>, String>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn succeed(mut self, base: &str, body: Vec<u8>) -> Self {
        self.answers.insert(base.to_string(), Ok(body));
        self
    }

    pub(crate) fn fail(mut self, base: &str, reason: &str) -> Self {
        self.answers.insert(base.to_string(), Err(reason.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcspTransport for MockTransport {
    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(uri.to_string());
        for (base, answer) in &self.answers {
            if uri.starts_with(base.as_str()) {
                return match answer {
                    Ok(body) => Ok(body.clone()),
                    Err(reason) => Err(Error::ResponderRequest(format!("{}: {}", uri, reason))),
                };
            }
        }
        Err(Error::ResponderRequest(format!("{}: 404 Not Found", uri)))
    }
}

/// `MockChainSource` serves DER chains per host; unknown hosts fail with connection refused.
#[derive(Default)]
pub(crate) struct MockChainSource {
    chains: BTreeMap<String, Vec<Vec<u8>>>,
    calls: Mutex<Vec<String>>,
}

impl MockChainSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_chain(mut self, host: &str, certs: &[&Certificate]) -> Self {
        self.chains.insert(
            host.to_string(),
            certs.iter().map(|c| c.to_der().unwrap()).collect(),
        );
        self
    }

    /// Serves `chain` to `host` as given, e.g., to present buffers that are not certificates.
    pub(crate) fn with_der_chain(mut self, host: &str, chain: Vec<Vec<u8>>) -> Self {
        self.chains.insert(host.to_string(), chain);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainSource for MockChainSource {
    async fn get_peer_chain(&self, host: &str) -> Result<Vec<Vec<u8>>> {
        self.calls.lock().unwrap().push(host.to_string());
        match self.chains.get(host) {
            Some(chain) => Ok(chain.clone()),
            None => Err(Error::Connection(format!(
                "{}:443: Connection refused (os error 111)",
                host
            ))),
        }
    }
}
