use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{App, Arg};
use config::{Config, Environment};

use crate::log::LogSettings;

/// default pushbullet endpoint
const DEFAULT_API_ADDR: &str = "https://api.pushbullet.com/v2/pushes";
/// default pushbullet channel tag
const DEFAULT_CHANNEL_TAG: &str = "santaclausgoeswild";
/// default listen port of the webhook receiver
const DEFAULT_PORT: u16 = 8080;

/// runtime configuration, resolved once at startup and passed into the
/// components that need it
#[derive(Debug, Clone)]
pub struct Settings {
    /// pushbullet pushes endpoint (`PUSHBULLETAPIADDR`)
    pub api_addr: String,
    /// pushbullet channel tag pushes are sent to (`PUSHBULLETCHANNELTAG`)
    pub channel_tag: String,
    /// pushbullet access token (`PUSHBULLETAPITOKEN`)
    pub api_token: String,
    /// path of a PEM file appended to the trust store (`CACERTFILE`)
    pub ca_cert_file: Option<PathBuf>,
    /// disable certificate validation on the outbound client
    /// (`INSECURESKIPVERIFY`)
    pub insecure_skip_verify: bool,
    /// listen port of the webhook receiver (`PORT`)
    pub port: u16,
    pub log: LogSettings,
}

impl Settings {
    /// loads settings from the process environment and applies command line
    /// overrides
    pub fn load() -> Result<Self> {
        let opts = App::new(clap::crate_name!())
            .version(clap::crate_version!())
            .about(clap::crate_description!())
            .arg(
                Arg::new("level")
                    .help("log level")
                    .possible_values(["Error", "Warn", "Info", "Debug", "Trace"])
                    .ignore_case(true)
                    .takes_value(true)
                    .long("log"),
            )
            .get_matches();

        let mut settings = Self::from_env()?;

        if let Some(level) = opts.value_of("level") {
            settings.log.level = level.to_string();
        }

        Ok(settings)
    }

    /// resolves settings from environment variables, falling back to the
    /// documented defaults when a variable is absent or empty
    ///
    /// Values are parsed best-effort: a skip-verify flag or port that does
    /// not parse falls back to its default instead of failing.
    pub fn from_env() -> Result<Self> {
        let env = Config::builder()
            .add_source(Environment::default())
            .build()
            .context("can't read process environment")?;

        // config lowercases environment keys; empty values count as unset
        let var = |key: &str| env.get_string(key).ok().filter(|v| !v.is_empty());

        Ok(Self {
            api_addr: var("pushbulletapiaddr").unwrap_or_else(|| DEFAULT_API_ADDR.to_string()),
            channel_tag: var("pushbulletchanneltag")
                .unwrap_or_else(|| DEFAULT_CHANNEL_TAG.to_string()),
            api_token: var("pushbulletapitoken").unwrap_or_default(),
            ca_cert_file: var("cacertfile").map(PathBuf::from),
            insecure_skip_verify: var("insecureskipverify")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            port: var("port")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            log: LogSettings::default(),
        })
    }

    /// socket address the webhook receiver binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// lenient bool parse, accepts the usual spellings and reads everything else
/// as false
fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "t" | "true")
}
