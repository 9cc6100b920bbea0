//! Structures and functions related to configuring OCSP staple retrieval

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use stapleprocmacros::*;

use crate::{Error, Result};

//-----------------------------------------------------------------------------------------------
// Type definitions used in the definition of staple settings
//-----------------------------------------------------------------------------------------------
/// `Strings` is a typedef for a vector of String values.
pub type Strings = Vec<String>;

/// `StapleSettings` is a typedef for a `BTreeMap` that maps arbitrary string values to a
/// variant map.
pub type StapleSettings = BTreeMap<String, StapleSettingsTypes>;

/// `StapleSettingsTypes` is used to define a variant map with types associated with
/// retrieving OCSP staples.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StapleSettingsTypes {
    /// Represents u16 values
    U16(u16),
    /// Represents vectors of Strings
    Strings(Strings),
    /// Represents duration or a timeout
    Duration(Duration),
}

//-----------------------------------------------------------------------------------------------
// Types of staple settings
//-----------------------------------------------------------------------------------------------
/// `PS_PORT` is used to retrieve the u16 TCP port used when connecting to each host. By default,
/// this setting is set to 443.
pub static PS_PORT: &str = "psPort";

/// `PS_PORT_DEFAULT` is the port used when `PS_PORT` is absent.
pub static PS_PORT_DEFAULT: u16 = 443;

/// `PS_CONNECT_TIMEOUT` is used to retrieve a Duration that bounds the TCP connection attempt and,
/// separately, the TLS handshake with each host.
pub static PS_CONNECT_TIMEOUT: &str = "psConnectTimeout";

/// `PS_CONNECT_TIMEOUT_DEFAULT` is used when `PS_CONNECT_TIMEOUT` is absent.
pub static PS_CONNECT_TIMEOUT_DEFAULT: Duration = Duration::from_secs(10);

/// `PS_OCSP_TIMEOUT` is used to retrieve a Duration that bounds each HTTP request sent to an OCSP
/// responder, including reading the response body.
pub static PS_OCSP_TIMEOUT: &str = "psOcspTimeout";

/// `PS_OCSP_TIMEOUT_DEFAULT` is used when `PS_OCSP_TIMEOUT` is absent.
pub static PS_OCSP_TIMEOUT_DEFAULT: Duration = Duration::from_secs(10);

/// `PS_HOSTS` is used to retrieve a Strings value listing hosts to process in addition to those
/// given on the command line. There is no default.
pub static PS_HOSTS: &str = "psHosts";

//-----------------------------------------------------------------------------------------------
// Getters/setters for settings
//-----------------------------------------------------------------------------------------------
sts_gets_and_sets_with_default!(PS_PORT, u16, PS_PORT_DEFAULT);
sts_gets_and_sets_with_default!(PS_CONNECT_TIMEOUT, Duration, PS_CONNECT_TIMEOUT_DEFAULT);
sts_gets_and_sets_with_default!(PS_OCSP_TIMEOUT, Duration, PS_OCSP_TIMEOUT_DEFAULT);
sts_gets_and_sets!(PS_HOSTS, Strings);

/// `read_settings` accepts a string containing the name of a file that notionally contains JSON data that
/// represents StapleSettings.
///
/// An absent file name or a file that does not exist yields an empty [`StapleSettings`], i.e., all
/// defaults apply. A file that exists but cannot be read or parsed yields [`Error::Misconfiguration`].
pub fn read_settings(fname: &Option<String>) -> Result<StapleSettings> {
    if let Some(fname) = fname {
        let p = Path::new(fname.as_str());
        if Path::exists(p) {
            let json = match std::fs::read(p) {
                Ok(json) => json,
                Err(e) => {
                    return Err(Error::Misconfiguration(format!(
                        "failed to read {}: {}",
                        fname, e
                    )))
                }
            };
            return match serde_json::from_slice::<StapleSettings>(&json) {
                Ok(sts) => Ok(sts),
                Err(e) => Err(Error::Misconfiguration(format!(
                    "failed to parse {}: {}",
                    fname, e
                ))),
            };
        }
    }
    Ok(StapleSettings::new())
}

#[test]
fn test_default_gets_sts() {
    let sts = StapleSettings::default();
    assert_eq!(443, get_port(&sts));
    assert_eq!(Duration::from_secs(10), get_connect_timeout(&sts));
    assert_eq!(Duration::from_secs(10), get_ocsp_timeout(&sts));
    assert!(get_hosts(&sts).is_none());
}

#[test]
fn test_sets_sts() {
    let mut sts = StapleSettings::default();
    set_port(&mut sts, 8443);
    set_connect_timeout(&mut sts, Duration::from_secs(3));
    set_ocsp_timeout(&mut sts, Duration::from_millis(1500));
    set_hosts(&mut sts, vec!["example.com".to_string()]);
    assert_eq!(8443, get_port(&sts));
    assert_eq!(Duration::from_secs(3), get_connect_timeout(&sts));
    assert_eq!(Duration::from_millis(1500), get_ocsp_timeout(&sts));
    assert_eq!(Some(vec!["example.com".to_string()]), get_hosts(&sts));

    // a value of the wrong type falls back to the default
    sts.insert(PS_PORT.to_string(), StapleSettingsTypes::Duration(Duration::from_secs(1)));
    assert_eq!(443, get_port(&sts));
}

#[test]
fn test_read_settings() {
    use std::io::Write;

    assert_eq!(StapleSettings::new(), read_settings(&None).unwrap());
    assert_eq!(
        StapleSettings::new(),
        read_settings(&Some("/no/such/settings.json".to_string())).unwrap()
    );

    let mut sts = StapleSettings::default();
    set_port(&mut sts, 10443);
    set_ocsp_timeout(&mut sts, Duration::from_secs(2));
    let json = serde_json::to_string(&sts).unwrap();

    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(json.as_bytes()).unwrap();
    let name = f.path().to_str().unwrap().to_string();
    let read = read_settings(&Some(name)).unwrap();
    assert_eq!(sts, read);
    assert_eq!(10443, get_port(&read));

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    bad.write_all(b"{ not json").unwrap();
    let name = bad.path().to_str().unwrap().to_string();
    match read_settings(&Some(name)) {
        Err(Error::Misconfiguration(_)) => {}
        other => panic!("expected Misconfiguration, got {:?}", other),
    }
}
