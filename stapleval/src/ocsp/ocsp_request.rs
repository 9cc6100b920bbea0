//! Preparation of OCSP requests and discovery of OCSP responders

use const_oid::db::rfc5912::{ID_AD_OCSP, ID_PE_AUTHORITY_INFO_ACCESS, ID_SHA_1};
use der::asn1::OctetString;
use der::{Decode, Encode};
use sha1::{Digest, Sha1};
use spki::AlgorithmIdentifierOwned;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::AuthorityInfoAccessSyntax;
use x509_cert::Certificate;
use x509_ocsp::Version::V1;
use x509_ocsp::{CertId, OcspRequest, Request, TbsRequest};

use crate::Result;

/// `get_key_hash` returns the SHA-1 hash of the value of the subject public key BIT STRING from
/// `cert`, i.e., the issuerKeyHash of a CertID when `cert` is the issuer.
pub fn get_key_hash(cert: &Certificate) -> Result<Vec<u8>> {
    Ok(Sha1::digest(
        cert.tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .raw_bytes(),
    )
    .to_vec())
}

/// `get_subject_name_hash` returns the SHA-1 hash of the DER-encoded subject name from `cert`,
/// i.e., the issuerNameHash of a CertID when `cert` is the issuer.
pub fn get_subject_name_hash(cert: &Certificate) -> Result<Vec<u8>> {
    let enc_subject = cert.tbs_certificate.subject.to_der()?;
    Ok(Sha1::digest(enc_subject.as_slice()).to_vec())
}

/// `get_ocsp_responders` returns the URIs of the OCSP responders named in the authority
/// information access extension of `cert` in the order they appear. Duplicates are retained.
///
/// A certificate without an authority information access extension yields an empty list. Access
/// descriptions whose location is not a URI are ignored.
pub fn get_ocsp_responders(cert: &Certificate) -> Result<Vec<String>> {
    let mut retval = vec![];
    if let Some(exts) = &cert.tbs_certificate.extensions {
        for ext in exts {
            if ext.extn_id != ID_PE_AUTHORITY_INFO_ACCESS {
                continue;
            }
            let aias = AuthorityInfoAccessSyntax::from_der(ext.extn_value.as_bytes())?;
            for aia in aias.0 {
                if aia.access_method == ID_AD_OCSP {
                    if let GeneralName::UniformResourceIdentifier(uri) = &aia.access_location {
                        retval.push(uri.to_string());
                    }
                }
            }
        }
    }
    Ok(retval)
}

/// `prepare_ocsp_request` returns a DER-encoded, unsigned OCSPRequest for `target_cert` as issued
/// by `issuers_cert`.
///
/// The request contains a single CertID computed with SHA-1 and carries no extensions, i.e., no
/// nonce is sent, so the same request can be sent to each responder.
pub fn prepare_ocsp_request(target_cert: &Certificate, issuers_cert: &Certificate) -> Result<Vec<u8>> {
    let hash_algorithm = AlgorithmIdentifierOwned {
        oid: ID_SHA_1,
        parameters: None,
    };
    let issuer_name_hash = OctetString::new(get_subject_name_hash(issuers_cert)?)?;
    let issuer_key_hash = OctetString::new(get_key_hash(issuers_cert)?)?;

    let req_cert = CertId {
        hash_algorithm,
        issuer_name_hash,
        issuer_key_hash,
        serial_number: target_cert.tbs_certificate.serial_number.clone(),
    };
    let request_list = vec![Request {
        req_cert,
        single_request_extensions: None,
    }];
    let tbs_request = TbsRequest {
        version: V1,
        requestor_name: None,
        request_list,
        request_extensions: None,
    };
    let ocsp_req = OcspRequest {
        tbs_request,
        optional_signature: None,
    };
    Ok(ocsp_req.to_der()?)
}
