// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `securestore doctor` command implementation.
//!
//! Runs diagnostic checks against the device environment: configuration,
//! hardware identifier, entropy, backend, and a full store/retrieve/delete
//! round trip with a probe record.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use securestore_config::model::{BackendKind, DeviceConfig, SecureStoreConfig, StorageConfig};
use securestore_core::{EntropySource, KvBackend, NamespaceHandle, SecureStoreError};
use securestore_storage::{MemoryBackend, SqliteBackend};
use securestore_vault::{identity_from_config, SecureStore, StoreOptions, SystemEntropy};

/// Record written and removed by the self-test.
const PROBE_NAME: &str = "_doctor_probe";

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `securestore doctor` command.
///
/// With `plain`, disables colored output. Fails when any check fails.
pub fn run_doctor(
    config: &SecureStoreConfig,
    config_path: Option<&Path>,
    plain: bool,
) -> Result<(), SecureStoreError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = vec![
        check_config(config_path),
        check_hardware_id(&config.device),
        check_entropy(),
        check_backend(&config.storage, &config.vault.namespace),
        check_self_test(config),
    ];

    println!();
    println!("  securestore doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }

    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }

    println!();

    if fail_count > 0 {
        return Err(SecureStoreError::Internal(format!(
            "{fail_count} diagnostic check(s) failed"
        )));
    }
    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Check configuration loads without errors.
fn check_config(config_path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match config_path {
        Some(path) => securestore_config::load_and_validate_path(path),
        None => securestore_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check the hardware identifier can be read.
fn check_hardware_id(device: &DeviceConfig) -> CheckResult {
    let start = Instant::now();
    let source = match &device.hardware_id {
        Some(_) => "config override".to_string(),
        None => format!("interface {}", device.interface),
    };
    match identity_from_config(device).and_then(|identity| identity.hardware_id()) {
        Ok(id) => CheckResult::new(
            "Hardware ID",
            CheckStatus::Pass,
            format!("{id:?} from {source}"),
            start,
        ),
        Err(e) => CheckResult::new("Hardware ID", CheckStatus::Fail, e.to_string(), start),
    }
}

/// Check the system random source produces output.
fn check_entropy() -> CheckResult {
    let start = Instant::now();
    let entropy = SystemEntropy::new();
    let mut first = [0u8; 32];
    let mut second = [0u8; 32];
    let filled = entropy
        .fill(&mut first)
        .and_then(|()| entropy.fill(&mut second));
    match filled {
        Err(e) => CheckResult::new("Entropy", CheckStatus::Fail, e.to_string(), start),
        Ok(()) if first == second => CheckResult::new(
            "Entropy",
            CheckStatus::Fail,
            "random source repeated its output",
            start,
        ),
        Ok(()) => CheckResult::new("Entropy", CheckStatus::Pass, "system CSPRNG", start),
    }
}

/// Check the configured backend can be opened.
fn check_backend(storage: &StorageConfig, namespace: &str) -> CheckResult {
    let start = Instant::now();
    match storage.backend {
        BackendKind::Memory => CheckResult::new(
            "Backend",
            CheckStatus::Warn,
            "in-memory (records are lost on exit)",
            start,
        ),
        BackendKind::Sqlite => {
            let path = Path::new(&storage.database_path);
            if !path.exists() {
                return CheckResult::new(
                    "Backend",
                    CheckStatus::Warn,
                    format!(
                        "not found: {} (will be created on first write)",
                        storage.database_path
                    ),
                    start,
                );
            }
            let opened = SqliteBackend::open(path, storage.wal_mode)
                .and_then(|backend| backend.open(namespace, true).map(NamespaceHandle::close));
            match opened {
                Ok(()) => CheckResult::new(
                    "Backend",
                    CheckStatus::Pass,
                    format!("sqlite {}", storage.database_path),
                    start,
                ),
                Err(e) => CheckResult::new("Backend", CheckStatus::Fail, e.to_string(), start),
            }
        }
    }
}

/// Store, read back, and delete a probe record through the full vault path.
fn check_self_test(config: &SecureStoreConfig) -> CheckResult {
    let start = Instant::now();
    let outcome = match config.storage.backend {
        BackendKind::Memory => round_trip(MemoryBackend::new(), config),
        BackendKind::Sqlite => {
            if !Path::new(&config.storage.database_path).exists() {
                return CheckResult::new(
                    "Self-test",
                    CheckStatus::Warn,
                    "skipped, database not created yet",
                    start,
                );
            }
            SqliteBackend::open(&config.storage.database_path, config.storage.wal_mode)
                .and_then(|backend| round_trip(backend, config))
        }
    };
    match outcome {
        Ok(()) => CheckResult::new(
            "Self-test",
            CheckStatus::Pass,
            format!("{} round trip ok", config.vault.format),
            start,
        ),
        Err(e) => CheckResult::new("Self-test", CheckStatus::Fail, e.to_string(), start),
    }
}

fn round_trip<B: KvBackend>(backend: B, config: &SecureStoreConfig) -> Result<(), SecureStoreError> {
    let identity = identity_from_config(&config.device)?;
    let store = SecureStore::new(
        backend,
        identity.as_ref(),
        SystemEntropy::new(),
        StoreOptions::from(&config.vault),
    )?;

    let mut nonce = [0u8; 8];
    SystemEntropy::new().fill(&mut nonce)?;
    let probe = hex::encode(nonce);

    store.store_secret(PROBE_NAME, &probe)?;
    let mut out = [0u8; 32];
    let read = store.retrieve_secret(PROBE_NAME, &mut out);
    let deleted = store.delete(PROBE_NAME);
    let len = read?;
    deleted?;

    if &out[..len] != probe.as_bytes() {
        return Err(SecureStoreError::Internal(
            "probe record read back different bytes".into(),
        ));
    }
    Ok(())
}
