//! Error types

use core::fmt;

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// Error type
///
/// Each variant corresponds to a terminal (or, for [`Error::ResponderUrl`] and
/// [`Error::ResponderRequest`], a per-responder) outcome of processing a host.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Connection occurs when the TCP connection or TLS handshake with a host fails or times out.
    /// The payload carries the host and the underlying transport or TLS error message.
    Connection(String),
    /// ChainTooShort occurs when a server presents fewer than two certificates, i.e., no issuer
    /// is available to build an OCSP request. The payload is the number of certificates presented.
    ChainTooShort(usize),
    /// NoResponder occurs when the leaf certificate does not name any OCSP responder.
    NoResponder,
    /// ResponderUrl occurs when a responder URI cannot be parsed or uses a scheme other than
    /// http or https.
    ResponderUrl(String),
    /// ResponderRequest occurs when an HTTP request to a responder fails, returns a status other
    /// than 200 or the response body cannot be read.
    ResponderRequest(String),
    /// NoOcspResponse occurs when every responder named by the leaf certificate has been tried
    /// without success.
    NoOcspResponse,
    /// Parse occurs when a responder returned a body that could not be interpreted as a
    /// successful OCSP response.
    Parse(String),
    /// Asn1Error is used to propagate error information from the der and x509-cert crates.
    Asn1Error(der::Error),
    /// A configuration error was detected.
    Misconfiguration(String),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "ConnectionError: {}", e),
            Error::ChainTooShort(n) => write!(
                f,
                "ChainTooShortError: server presented {} certificate(s), at least 2 are required",
                n
            ),
            Error::NoResponder => write!(f, "NoResponderError: no OCSP responder provided"),
            Error::ResponderUrl(e) => write!(f, "ResponderURLError: {}", e),
            Error::ResponderRequest(e) => write!(f, "ResponderRequestError: {}", e),
            Error::NoOcspResponse => write!(f, "NoOCSPResponseError: no OCSP response"),
            Error::Parse(e) => write!(f, "ParseError: {}", e),
            Error::Asn1Error(e) => write!(f, "Asn1Error: {}", e),
            Error::Misconfiguration(e) => write!(f, "Misconfiguration: {}", e),
        }
    }
}

impl std::error::Error for Error {}

#[test]
fn error_test() {
    let s = format!("{}", Error::Connection("example.com:443: connection refused".to_string()));
    assert_eq!("ConnectionError: example.com:443: connection refused", s);
    let s = format!("{}", Error::ChainTooShort(1));
    assert!(s.starts_with("ChainTooShortError"));
    assert!(s.contains(" 1 "));
    assert!(format!("{}", Error::NoResponder).starts_with("NoResponderError"));
    assert!(format!("{}", Error::ResponderUrl("x".to_string())).starts_with("ResponderURLError"));
    assert!(format!("{}", Error::ResponderRequest("x".to_string()))
        .starts_with("ResponderRequestError"));
    assert!(format!("{}", Error::NoOcspResponse).starts_with("NoOCSPResponseError"));
    assert!(format!("{}", Error::Parse("x".to_string())).starts_with("ParseError"));
    assert!(format!("{}", Error::Misconfiguration("x".to_string())).starts_with("Misconfiguration"));

    let e: Error = der::Error::from(der::ErrorKind::Failed).into();
    assert!(format!("{}", e).starts_with("Asn1Error"));
}
