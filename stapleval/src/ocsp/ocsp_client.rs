//! Structures and functions to retrieve OCSP responses from the responders named in a certificate

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use log::debug;
use url::Url;
use x509_cert::Certificate;

use crate::{
    get_ocsp_responders, prepare_ocsp_request, Error, LogLevels, LogSink, Result,
};

cfg_if::cfg_if! {
    if #[cfg(feature = "remote")] {
        use core::time::Duration;
        use reqwest::StatusCode;
        use crate::{get_ocsp_timeout, StapleSettings};
    }
}

/// `OcspTransport` sends a single HTTP GET to an OCSP responder.
///
/// An attempt succeeds only when the responder answers with status 200 and the complete body
/// is read. Every other outcome is reported as [`Error::ResponderRequest`].
#[async_trait]
pub trait OcspTransport: Send + Sync {
    /// Retrieves the body returned for `uri`.
    async fn get(&self, uri: &str) -> Result<Vec<u8>>;
}

/// `HttpOcspTransport` implements [`OcspTransport`] using reqwest.
#[cfg(feature = "remote")]
#[derive(Clone, Debug)]
pub struct HttpOcspTransport {
    client: reqwest::Client,
}

#[cfg(feature = "remote")]
impl HttpOcspTransport {
    /// Creates a new [`HttpOcspTransport`] that bounds each request using `PS_OCSP_TIMEOUT` from `sts`.
    pub fn new(sts: &StapleSettings) -> Result<Self> {
        Self::with_timeout(get_ocsp_timeout(sts))
    }

    /// Creates a new [`HttpOcspTransport`] that bounds each request by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        match reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(timeout)
            .build()
        {
            Ok(client) => Ok(HttpOcspTransport { client }),
            Err(e) => Err(Error::Misconfiguration(format!(
                "failed to prepare OCSP client: {}",
                e
            ))),
        }
    }
}

#[cfg(feature = "remote")]
#[async_trait]
impl OcspTransport for HttpOcspTransport {
    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        let resp = match self.client.get(uri).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return Err(Error::ResponderRequest(format!(
                    "OCSP request to {} failed with {}",
                    uri, e
                )))
            }
        };

        if resp.status() != StatusCode::OK {
            return Err(Error::ResponderRequest(format!(
                "OCSP request to {} returned {}",
                uri,
                resp.status()
            )));
        }

        match resp.bytes().await {
            Ok(body) => Ok(body.to_vec()),
            Err(e) => Err(Error::ResponderRequest(format!(
                "failed to read OCSP response from {} with {}",
                uri, e
            ))),
        }
    }
}

/// `responder_get_uri` returns the URI used to send `b64_ocsp_req`, a base64-encoded OCSP request,
/// to `responder` via HTTP GET.
///
/// The encoded request is appended as a final path segment of the responder URI (a trailing slash
/// on the responder path is not doubled). The encoded request is not escaped further. Responder
/// URIs that cannot be parsed or that use a scheme other than http or https are rejected with
/// [`Error::ResponderUrl`].
pub fn responder_get_uri(responder: &str, b64_ocsp_req: &str) -> Result<String> {
    let mut url = match Url::parse(responder) {
        Ok(url) => url,
        Err(e) => {
            return Err(Error::ResponderUrl(format!(
                "failed to parse {} with {}",
                responder, e
            )))
        }
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::ResponderUrl(format!(
            "unsupported scheme in {}",
            responder
        )));
    }

    let path = format!("{}/{}", url.path().trim_end_matches('/'), b64_ocsp_req);
    url.set_path(&path);
    Ok(url.to_string())
}

/// `fetch_ocsp_response` returns the body of the first successful response to an OCSP request for
/// `target_cert` (as issued by `issuers_cert`) from the responders named in `target_cert`.
///
/// Responders are tried one at a time in the order the certificate lists them and the first
/// success ends the search. A responder whose URI is unusable or whose request fails is reported
/// to `sink` and skipped. The same request is sent to every responder.
///
/// Fails with [`Error::NoResponder`] without sending anything when the certificate names no
/// responders or its authority information access extension cannot be decoded, and with [`Error::NoOcspResponse`] when every responder has been tried.
pub async fn fetch_ocsp_response(
    target_cert: &Certificate,
    issuers_cert: &Certificate,
    transport: &dyn OcspTransport,
    sink: &dyn LogSink,
) -> Result<Vec<u8>> {
    let responders = match get_ocsp_responders(target_cert) {
        Ok(responders) => responders,
        Err(e) => {
            sink.log_message(
                &LogLevels::Warn,
                &format!("failed to read OCSP responders from certificate: {}", e),
            );
            return Err(Error::NoResponder);
        }
    };
    if responders.is_empty() {
        return Err(Error::NoResponder);
    }

    let enc_ocsp_req = prepare_ocsp_request(target_cert, issuers_cert)?;
    let b64_ocsp_req = Base64::encode_string(&enc_ocsp_req);

    for responder in &responders {
        let uri = match responder_get_uri(responder, &b64_ocsp_req) {
            Ok(uri) => uri,
            Err(e) => {
                sink.log_message(&LogLevels::Warn, &e.to_string());
                continue;
            }
        };

        debug!("Sending OCSP request to {}", responder);
        match transport.get(&uri).await {
            Ok(body) => {
                debug!(
                    "Received {} byte OCSP response from {}",
                    body.len(),
                    responder
                );
                return Ok(body);
            }
            Err(e) => sink.log_message(&LogLevels::Warn, &e.to_string()),
        }
    }
    Err(Error::NoOcspResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::MemorySink;

    #[test]
    fn get_uri_appends_request() {
        assert_eq!(
            "http://ocsp.example.com/MEUw+Q/A==",
            responder_get_uri("http://ocsp.example.com", "MEUw+Q/A==").unwrap()
        );
        assert_eq!(
            "http://ocsp.example.com/MEUw",
            responder_get_uri("http://ocsp.example.com/", "MEUw").unwrap()
        );
        assert_eq!(
            "http://ocsp.example.com/ocsp/MEUw",
            responder_get_uri("http://ocsp.example.com/ocsp/", "MEUw").unwrap()
        );
        assert_eq!(
            "https://ocsp.example.com:8080/a/b/MEUw",
            responder_get_uri("https://ocsp.example.com:8080/a/b", "MEUw").unwrap()
        );
    }

    #[test]
    fn get_uri_rejects() {
        match responder_get_uri("not a uri", "MEUw") {
            Err(Error::ResponderUrl(_)) => {}
            other => panic!("expected ResponderUrl, got {:?}", other),
        }
        match responder_get_uri("http://[::1", "MEUw") {
            Err(Error::ResponderUrl(_)) => {}
            other => panic!("expected ResponderUrl, got {:?}", other),
        }
        match responder_get_uri("ldap://ocsp.example.com", "MEUw") {
            Err(Error::ResponderUrl(msg)) => assert!(msg.contains("scheme")),
            other => panic!("expected ResponderUrl, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn no_responder_means_no_calls() {
        let (leaf, issuer) = make_pair(&[]);
        let transport = MockTransport::new().succeed("http://", vec![1, 2, 3]);
        let sink = MemorySink::new();
        assert_eq!(
            Err(Error::NoResponder),
            fetch_ocsp_response(&leaf, &issuer, &transport, &sink).await
        );
        assert!(transport.calls().is_empty());
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn undecodable_aia_means_no_responder() {
        let (mut leaf, issuer) = make_pair(&["http://ocsp.example.com"]);
        corrupt_aia(&mut leaf);
        let transport = MockTransport::new().succeed("http://", vec![1, 2, 3]);
        let sink = MemorySink::new();
        assert_eq!(
            Err(Error::NoResponder),
            fetch_ocsp_response(&leaf, &issuer, &transport, &sink).await
        );
        assert!(transport.calls().is_empty());
        assert_eq!(1, sink.messages_at(LogLevels::Warn).len());
    }

    #[tokio::test]
    async fn first_success_wins() {
        let (leaf, issuer) = make_pair(&[
            "http://a.example.com",
            "http://b.example.com",
            "http://c.example.com",
        ]);
        let transport = MockTransport::new()
            .fail("http://a.example.com/", "500 Internal Server Error")
            .succeed("http://b.example.com/", b"from b".to_vec())
            .succeed("http://c.example.com/", b"from c".to_vec());
        let sink = MemorySink::new();

        let body = fetch_ocsp_response(&leaf, &issuer, &transport, &sink)
            .await
            .unwrap();
        assert_eq!(b"from b".to_vec(), body);

        let calls = transport.calls();
        assert_eq!(2, calls.len());
        assert!(calls[0].starts_with("http://a.example.com/"));
        assert!(calls[1].starts_with("http://b.example.com/"));

        let warnings = sink.messages_at(LogLevels::Warn);
        assert_eq!(1, warnings.len());
        assert!(warnings[0].starts_with("ResponderRequestError"));
    }

    #[tokio::test]
    async fn same_request_to_each_responder() {
        let (leaf, issuer) = make_pair(&["http://a.example.com", "http://b.example.com/ocsp"]);
        let transport = MockTransport::new().fail("http://a.example.com/", "503 Service Unavailable");
        let sink = MemorySink::new();
        let _ = fetch_ocsp_response(&leaf, &issuer, &transport, &sink).await;

        let b64 = Base64::encode_string(&prepare_ocsp_request(&leaf, &issuer).unwrap());
        assert_eq!(
            vec![
                format!("http://a.example.com/{}", b64),
                format!("http://b.example.com/ocsp/{}", b64),
            ],
            transport.calls()
        );
    }

    #[tokio::test]
    async fn exhaustion() {
        let (leaf, issuer) = make_pair(&["http://a.example.com", "http://b.example.com"]);
        let transport = MockTransport::new()
            .fail("http://a.example.com/", "404 Not Found")
            .fail("http://b.example.com/", "connection reset");
        let sink = MemorySink::new();
        assert_eq!(
            Err(Error::NoOcspResponse),
            fetch_ocsp_response(&leaf, &issuer, &transport, &sink).await
        );
        assert_eq!(2, transport.calls().len());
        assert_eq!(2, sink.messages_at(LogLevels::Warn).len());
    }

    #[tokio::test]
    async fn malformed_uri_skipped() {
        let (leaf, issuer) = make_pair(&["http://[::1", "http://ok.example.com"]);
        let transport = MockTransport::new().succeed("http://ok.example.com/", b"ok".to_vec());
        let sink = MemorySink::new();
        let body = fetch_ocsp_response(&leaf, &issuer, &transport, &sink)
            .await
            .unwrap();
        assert_eq!(b"ok".to_vec(), body);
        assert_eq!(1, transport.calls().len());

        let warnings = sink.messages_at(LogLevels::Warn);
        assert_eq!(1, warnings.len());
        assert!(warnings[0].starts_with("ResponderURLError"));
    }

    #[tokio::test]
    async fn only_malformed_uris() {
        let (leaf, issuer) = make_pair(&["http://[::1", "ftp://ocsp.example.com"]);
        let transport = MockTransport::new();
        let sink = MemorySink::new();
        assert_eq!(
            Err(Error::NoOcspResponse),
            fetch_ocsp_response(&leaf, &issuer, &transport, &sink).await
        );
        assert!(transport.calls().is_empty());
        assert_eq!(2, sink.messages_at(LogLevels::Warn).len());
    }
}
