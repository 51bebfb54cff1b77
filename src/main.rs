/*
 * This file is part of sensorlog.
 *
 * Copyright (C) 2025 sensorlog contributors
 *
 * sensorlog is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * sensorlog is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with sensorlog. If not, see <https://www.gnu.org/licenses/>.
 */

use std::path::Path;

use chrono::Local;
use clap::Parser;
use tracing::{info, warn};

use sensorlog::app;
use sensorlog::cli::{Cli, Commands};
use sensorlog::service::{self, SHUTDOWN};
use sl_core::SensorTopology;

const JOURNAL_SOCKET: &str = "/run/systemd/journal/socket";

/// Journald when started by systemd, stderr otherwise
fn init_tracing(prefer_journald: bool) -> bool {
    let log_level = std::env::var("SENSORLOG_LOG").unwrap_or_else(|_| "info".to_string());

    let use_journald = prefer_journald
        && Path::new(JOURNAL_SOCKET).exists()
        && std::env::var_os("JOURNAL_STREAM").is_some();

    if use_journald {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(&log_level))
                    .init();
                return true;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stderr", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(&log_level)
        .init();
    false
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Commands::Run);
    let options = cli.options;

    let journald = init_tracing(command == Commands::Run);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        output = if journald { "systemd journal" } else { "stderr" },
        "sensorlog starting"
    );

    let mut producer = app::build_producer(&options)?;

    match command {
        Commands::List { json } => {
            let topology = SensorTopology::new(producer.tree().clone());
            let entries = app::list_sensors(&topology);
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", app::render_table(&entries));
            }
        }
        Commands::Once => {
            let sink = app::build_sink(&options)?;
            let mut logger = app::build_logger(&options, &producer, sink);
            let outcome = logger.tick(Local::now()).await;
            info!(?outcome, "Single tick complete");
        }
        Commands::Run => {
            let sink = app::build_sink(&options)?;
            let mut logger = app::build_logger(&options, &producer, sink);

            if let Err(e) = service::install_shutdown_handler() {
                warn!("Failed to set signal handler: {}. Stop with SIGKILL.", e);
            }

            service::run(&mut producer, &mut logger, options.poll(), &SHUTDOWN, None).await;
        }
    }

    Ok(())
}
