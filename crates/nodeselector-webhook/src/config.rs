use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::mutation::options::MutateOptions;

pub static SERVICE_NAME: &str = "nodeselector-webhook";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: TlsConfig,
    pub mutate_options: MutateOptions,
    pub verbose: bool,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

/// Where a PEM document comes from: inline (environment variable or flag)
/// or a file mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PemSource {
    Inline(String),
    File(PathBuf),
}

pub struct TlsConfig {
    pub cert: PemSource,
    pub key: PemSource,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;
        let mutate_options = mutate_options(matches)?;

        let verbose = matches
            .get_one::<bool>("verbose")
            .expect("clap should have set a default value")
            .to_owned();
        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            tls_config,
            mutate_options,
            verbose,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    let address = matches
        .get_one::<String>("address")
        .ok_or_else(|| anyhow!("error parsing arguments: missing bind address"))?;
    let port = matches
        .get_one::<String>("port")
        .ok_or_else(|| anyhow!("error parsing arguments: missing port"))?;

    format!("{address}:{port}")
        .parse()
        .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn pem_source(matches: &ArgMatches, inline: &str, file: &str) -> Option<PemSource> {
    matches
        .get_one::<String>(inline)
        .filter(|pem| !pem.is_empty())
        .map(|pem| PemSource::Inline(pem.to_owned()))
        .or_else(|| {
            matches
                .get_one::<String>(file)
                .filter(|path| !path.is_empty())
                .map(|path| PemSource::File(PathBuf::from(path)))
        })
}

fn tls_config(matches: &ArgMatches) -> Result<TlsConfig> {
    let cert = pem_source(matches, "tls-cert", "cert-file");
    let key = pem_source(matches, "tls-key", "key-file");

    match (cert, key) {
        (Some(cert), Some(key)) => Ok(TlsConfig { cert, key }),
        (None, None) => Err(anyhow!(
            "error parsing arguments: a TLS certificate and key must be provided (TLS_CERT/TLS_KEY or --cert-file/--key-file)"
        )),
        _ => Err(anyhow!(
            "error parsing arguments: both the TLS certificate and its key must be provided"
        )),
    }
}

fn mutate_options(matches: &ArgMatches) -> Result<MutateOptions> {
    let raw = matches
        .get_one::<String>("mutate-options")
        .ok_or_else(|| anyhow!("MUTATE_OPTIONS parse error: no value provided"))?;
    MutateOptions::from_json(raw)
}
