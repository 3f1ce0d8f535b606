// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! securestore - device-bound encrypted credential store.
//!
//! This is the binary entry point for provisioning and inspecting the vault.

mod commands;
mod doctor;

use std::path::PathBuf;

use clap::Parser;
use securestore_config::model::{BackendKind, SecureStoreConfig};
use securestore_core::{KvBackend, SecureStoreError};
use securestore_storage::{MemoryBackend, SqliteBackend};
use securestore_vault::{identity_from_config, SecureStore, StoreOptions, SystemEntropy};

use crate::commands::Command;

/// securestore - device-bound encrypted credential store.
#[derive(Parser, Debug)]
#[command(name = "securestore", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => securestore_config::load_and_validate_path(path),
        None => securestore_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            securestore_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let result = match cli.command {
        Command::Doctor { plain } => doctor::run_doctor(&config, cli.config.as_deref(), plain),
        command => run_command(&config, command),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Build the configured backend and vault, then run `command` against it.
fn run_command(config: &SecureStoreConfig, command: Command) -> Result<(), SecureStoreError> {
    match config.storage.backend {
        BackendKind::Sqlite => {
            let backend =
                SqliteBackend::open(&config.storage.database_path, config.storage.wal_mode)?;
            run_with(backend, config, command)
        }
        BackendKind::Memory => {
            tracing::warn!("memory backend selected, nothing will persist after exit");
            run_with(MemoryBackend::new(), config, command)
        }
    }
}

fn run_with<B: KvBackend>(
    backend: B,
    config: &SecureStoreConfig,
    command: Command,
) -> Result<(), SecureStoreError> {
    let identity = identity_from_config(&config.device)?;
    let store = SecureStore::new(
        backend,
        identity.as_ref(),
        SystemEntropy::new(),
        StoreOptions::from(&config.vault),
    )?;
    let stdout = std::io::stdout();
    commands::execute(&store, command, &mut stdout.lock())
}

/// Logs go to stderr so command output on stdout stays scriptable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("securestore={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
