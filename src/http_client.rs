//! outbound http client construction with custom certificate trust
use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use reqwest::Certificate;

use crate::settings::Settings;

/// total request timeout of the outbound client
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// how the outbound client validates server certificates
///
/// Skip-verify takes precedence over a configured custom CA: with
/// verification disabled the trust store is never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    /// system trust roots only
    SystemRoots,
    /// system trust roots plus the certificates from this PEM file
    CustomCa(PathBuf),
    /// no certificate chain or hostname validation at all
    DisableVerification,
}

impl TrustPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.insecure_skip_verify {
            return Self::DisableVerification;
        }

        match &settings.ca_cert_file {
            Some(path) => Self::CustomCa(path.clone()),
            None => Self::SystemRoots,
        }
    }
}

/// Builds the client used for all pushbullet calls. An unreadable CA file is
/// a startup error; a CA file without a parseable certificate only logs a
/// warning and leaves the system roots in place.
pub fn build(settings: &Settings) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);

    match TrustPolicy::from_settings(settings) {
        TrustPolicy::SystemRoots => {}
        TrustPolicy::CustomCa(path) => {
            let pem = std::fs::read(&path)
                .with_context(|| format!("failed to read custom CA file {:?}", path))?;

            match Certificate::from_pem(&pem) {
                Ok(cert) => {
                    tracing::info!("custom CA certificate appended to trust store");
                    builder = builder.add_root_certificate(cert);
                }
                Err(err) => {
                    tracing::warn!(
                        "no certs appended from {:?}, using system certs only: {}",
                        path,
                        err
                    );
                }
            }
        }
        TrustPolicy::DisableVerification => {
            tracing::warn!("certificate verification is disabled");
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
    }

    builder.build().context("failed to build http client")
}
