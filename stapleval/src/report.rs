//! Per-host processing: chain extraction, OCSP retrieval, response interpretation and reporting

use log::debug;

use crate::{
    extract_chain, fetch_ocsp_response, parse_ocsp_response, ChainSource, LogLevels, LogSink,
    OcspTransport, OcspValidity, Result,
};

/// `StapleReport` is the outcome of a successfully processed host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StapleReport {
    /// Host name as given by the caller
    pub host: String,
    /// Validity window asserted by the response retrieved for the host's certificate
    pub validity: OcspValidity,
}

impl StapleReport {
    /// Returns the ProducedAt, NextUpdate and Delta lines for this report. When the response
    /// asserts no nextUpdate, NextUpdate and Delta are reported as `none`.
    pub fn report_lines(&self) -> Vec<String> {
        let (next_update, delta) = match (&self.validity.next_update, self.validity.lifetime()) {
            (Some(nu), Some(l)) => (nu.to_string(), l.to_string()),
            _ => ("none".to_string(), "none".to_string()),
        };
        vec![
            format!("ProducedAt: {}", self.validity.produced_at),
            format!("NextUpdate: {}", next_update),
            format!("Delta: {}", delta),
        ]
    }
}

async fn process_host_internal(
    host: &str,
    chain_source: &dyn ChainSource,
    transport: &dyn OcspTransport,
    sink: &dyn LogSink,
) -> Result<StapleReport> {
    let chain = extract_chain(chain_source, host).await?;
    let enc_ocsp_resp = fetch_ocsp_response(chain.leaf(), chain.issuer(), transport, sink).await?;
    debug!("Parsing {} byte OCSP response for {}", enc_ocsp_resp.len(), host);
    let validity = parse_ocsp_response(&enc_ocsp_resp, chain.issuer())?;
    Ok(StapleReport {
        host: host.to_string(),
        validity,
    })
}

/// `process_host` retrieves and reports the OCSP response for the certificate `host` presents.
///
/// The host name is logged to `sink` first. On success the lines from
/// [`StapleReport::report_lines`] follow, plus a warning when nextUpdate is not after producedAt.
/// On failure exactly one error line of the form `<host>: <error>` is logged and the error is
/// returned. Per-responder failures appear as warnings before either.
pub async fn process_host(
    host: &str,
    chain_source: &dyn ChainSource,
    transport: &dyn OcspTransport,
    sink: &dyn LogSink,
) -> Result<StapleReport> {
    sink.log_message(&LogLevels::Info, host);
    match process_host_internal(host, chain_source, transport, sink).await {
        Ok(report) => {
            for line in report.report_lines() {
                sink.log_message(&LogLevels::Info, &line);
            }
            if let Some(l) = report.validity.lifetime() {
                if l.is_empty() {
                    sink.log_message(
                        &LogLevels::Warn,
                        &format!("{}: NextUpdate is not after ProducedAt", host),
                    );
                }
            }
            Ok(report)
        }
        Err(e) => {
            sink.log_message(&LogLevels::Error, &format!("{}: {}", host, e));
            Err(e)
        }
    }
}

/// `RunSummary` counts the outcomes of [`process_hosts`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Number of hosts for which a report was produced
    pub reported: usize,
    /// Number of hosts that ended in an error
    pub failed: usize,
}

impl RunSummary {
    /// Returns true when no host failed.
    pub fn all_reported(&self) -> bool {
        self.failed == 0
    }
}

/// `process_hosts` runs [`process_host`] for each of `hosts` one at a time, in order. A failure
/// for one host does not affect the others.
pub async fn process_hosts(
    hosts: &[String],
    chain_source: &dyn ChainSource,
    transport: &dyn OcspTransport,
    sink: &dyn LogSink,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for host in hosts {
        match process_host(host, chain_source, transport, sink).await {
            Ok(_) => summary.reported += 1,
            Err(_) => summary.failed += 1,
        }
    }
    summary
}
