//! prometheus alertmanager receiver that forwards alerts to pushbullet
//!
//! Features:
//! - forwards CRITICAL and WARNING alerts as pushes to a pushbullet channel
//! - custom CA trust store and skip-verify support for the outbound client
//! - configured entirely through environment variables

use anyhow::{Context, Result};

use crate::{pushbullet::Notifier, settings::Settings};

mod alert;
mod alertmanager_webhook_receiver;
mod http_client;
mod log;
mod metrics;
mod pushbullet;
mod settings;
mod severity;

/// exit the complete program if one thread panics
fn setup_panic_handler() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));
}

/// the entry point of the program
#[tokio::main]
pub async fn main() -> Result<()> {
    setup_panic_handler();

    let settings = Settings::load().context("could not load configuration")?;

    log::setup_logging(&settings.log).context("could not setup logging")?;

    let client = http_client::build(&settings).context("could not build outbound http client")?;
    let notifier = Notifier::new(client, &settings);

    tracing::info!(
        "starting alertmanager webhook receiver v{}",
        clap::crate_version!()
    );
    tracing::info!("listening on: {}", settings.listen_addr());

    alertmanager_webhook_receiver::run(&settings, notifier).await
}
