//! Arguments for the staplecheck utility

use clap::Parser;

/// Reports the validity window of the OCSP response available for the certificate each host presents
#[derive(Parser, Debug, Default)]
#[command(arg_required_else_help(true))]
#[clap(author, version, about, long_about = None)]
pub struct StaplecheckArgs {
    /// Names of TLS servers to check (no scheme, no port). Hosts listed in the psHosts setting are
    /// processed after these.
    pub hosts: Vec<String>,

    /// Full path and filename of YAML-formatted configuration file for log4rs logging mechanism.
    /// See <https://docs.rs/log4rs/latest/log4rs/> for details.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub logging_config: Option<String>,

    /// Full path and filename of JSON-formatted StapleSettings file.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub settings: Option<String>,

    /// TCP port used when connecting to each host (overrides psPort, default 443).
    #[clap(short, long, help_heading = "NETWORK")]
    pub port: Option<u16>,

    /// Number of seconds to allow for connecting to a host and for each OCSP request (overrides
    /// psConnectTimeout and psOcspTimeout, default 10).
    #[clap(short, long, help_heading = "NETWORK")]
    pub timeout: Option<u64>,
}
