#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

mod args;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{debug, error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use stapleval::{
    get_hosts, process_hosts, read_settings, set_connect_timeout, set_ocsp_timeout, set_port,
    HttpOcspTransport, LogCrateSink, StapleSettings, TlsChainSource,
};

use crate::args::*;

fn configure_logging(args: &StaplecheckArgs) {
    let mut logging_configured = false;

    if let Some(logging_config) = &args.logging_config {
        if let Err(e) = log4rs::init_file(logging_config, Default::default()) {
            println!(
                "ERROR: failed to configure logging using {} with {:?}. Continuing without logging.",
                logging_config, e
            );
        } else {
            logging_configured = true;
        }
    }

    if !logging_configured {
        // if there's no config, prepare one using stdout
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{m}{n}")))
            .build();
        match Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        {
            Ok(config) => {
                let handle = log4rs::init_config(config);
                if let Err(e) = handle {
                    println!(
                        "ERROR: failed to configure logging for stdout with {:?}. Continuing without logging.",
                        e
                    );
                }
            }
            Err(e) => {
                println!("ERROR: failed to prepare default logging configuration with {:?}. Continuing without logging", e);
            }
        }
    }
}

/// Applies command line overrides to `sts` and returns the hosts to process, command line hosts
/// first.
fn prepare_settings(args: &StaplecheckArgs, sts: &mut StapleSettings) -> Vec<String> {
    if let Some(port) = args.port {
        set_port(sts, port);
    }
    if let Some(timeout) = args.timeout {
        set_connect_timeout(sts, Duration::from_secs(timeout));
        set_ocsp_timeout(sts, Duration::from_secs(timeout));
    }

    let mut hosts = args.hosts.clone();
    if let Some(more) = get_hosts(sts) {
        hosts.extend(more);
    }
    hosts
}

/// Point of entry for staplecheck application.
#[tokio::main]
async fn main() -> ExitCode {
    let args = StaplecheckArgs::parse();
    configure_logging(&args);
    debug!("staplecheck start");

    let mut sts = match read_settings(&args.settings) {
        Ok(sts) => sts,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };
    let hosts = prepare_settings(&args, &mut sts);

    let chain_source = match TlsChainSource::new(&sts) {
        Ok(cs) => cs,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };
    let transport = match HttpOcspTransport::new(&sts) {
        Ok(t) => t,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let summary = process_hosts(&hosts, &chain_source, &transport, &LogCrateSink).await;
    debug!(
        "staplecheck end: {} reported, {} failed",
        summary.reported, summary.failed
    );
    if summary.all_reported() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[test]
fn overrides_applied() {
    let args = StaplecheckArgs::parse_from([
        "staplecheck",
        "-p",
        "8443",
        "-t",
        "3",
        "a.example.com",
        "b.example.com",
    ]);
    let mut sts = StapleSettings::new();
    stapleval::set_hosts(&mut sts, vec!["c.example.com".to_string()]);
    let hosts = prepare_settings(&args, &mut sts);
    assert_eq!(
        vec![
            "a.example.com".to_string(),
            "b.example.com".to_string(),
            "c.example.com".to_string()
        ],
        hosts
    );
    assert_eq!(8443, stapleval::get_port(&sts));
    assert_eq!(Duration::from_secs(3), stapleval::get_connect_timeout(&sts));
    assert_eq!(Duration::from_secs(3), stapleval::get_ocsp_timeout(&sts));
}

#[test]
fn defaults_untouched() {
    let args = StaplecheckArgs::parse_from(["staplecheck", "example.com"]);
    let mut sts = StapleSettings::new();
    assert_eq!(vec!["example.com".to_string()], prepare_settings(&args, &mut sts));
    assert!(sts.is_empty());
    assert_eq!(443, stapleval::get_port(&sts));
}
