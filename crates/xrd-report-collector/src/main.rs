// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use xrd_report::config::Config;
use xrd_report::pipeline::Pipeline;
use xrd_report::server::ReportServer;

/// Process and report output from xrd.report messages.
#[derive(Debug, Parser)]
#[command(name = "xrd-report-collector")]
struct Args {
    /// Config file for observer connection params, etc.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable additional logging
    #[arg(short, long)]
    debug: bool,

    /// Send all logging to a dedicated file
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Also calculate derivatives between measurements
    #[arg(long)]
    deltas: bool,
}

#[tokio::main]
pub async fn main() {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let env_filter = format!("h2=off,hyper=off,reqwest=off,rustls=off,{log_level}");
    init_logging(&env_filter, args.log.as_deref());

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };
    config.deltas |= args.deltas;

    let pipeline = match Pipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!("failed to build pipeline: {err}");
            std::process::exit(1);
        }
    };
    info!(
        "configured observers:\n\t{}",
        pipeline.observers().descriptions().join("\n\t")
    );
    if pipeline.observers().is_empty() {
        info!("no observers enabled; records will be decoded and dropped");
    }

    let cancel_token = CancellationToken::new();
    let server = match ReportServer::bind(&config.server, Arc::new(pipeline), cancel_token.clone())
        .await
    {
        Ok(server) => server,
        Err(err) => {
            error!(
                "unable to bind {}:{}: {err}",
                config.server.address, config.server.port
            );
            std::process::exit(1);
        }
    };
    info!(
        "listening for reports on {}:{}",
        config.server.address, config.server.port
    );

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
        cancel_token.cancel();
    });

    server.spin().await;
    info!("server terminating");
}

fn init_logging(env_filter: &str, log_file: Option<&std::path::Path>) {
    #[allow(clippy::expect_used)]
    let filter =
        EnvFilter::try_new(env_filter).expect("could not parse log level in configuration");

    match log_file {
        Some(path) => {
            #[allow(clippy::expect_used)]
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("could not open log file");
            let subscriber = tracing_subscriber::fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .finish();
            #[allow(clippy::expect_used)]
            tracing::subscriber::set_global_default(subscriber)
                .expect("setting default subscriber failed");
        }
        None => {
            let subscriber = tracing_subscriber::fmt::Subscriber::builder()
                .with_env_filter(filter)
                .finish();
            #[allow(clippy::expect_used)]
            tracing::subscriber::set_global_default(subscriber)
                .expect("setting default subscriber failed");
        }
    }
}
