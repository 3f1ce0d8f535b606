// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret management subcommands.
//!
//! Each command runs against an already constructed [`SecureStore`] and
//! writes its human-readable result to `out`.

use std::io::Write;
use std::path::PathBuf;

use clap::Subcommand;
use secrecy::{ExposeSecret, SecretString};
use securestore_core::{KvBackend, SecureStoreError};
use securestore_vault::{
    mask_secret, provision, read_secret_value, ConnectionCredentials, ProvisionManifest,
    SecureStore,
};

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encrypt and store a string secret.
    Set {
        name: String,
        /// Secret value. Prompted for (or read from SECURESTORE_SECRET_VALUE) when omitted.
        #[arg(long)]
        value: Option<String>,
    },
    /// Encrypt and store an integer.
    SetInt {
        name: String,
        #[arg(allow_hyphen_values = true)]
        value: i32,
    },
    /// Decrypt a string secret. Masked unless --reveal is given.
    Get {
        name: String,
        #[arg(long)]
        reveal: bool,
    },
    /// Decrypt an integer.
    GetInt { name: String },
    /// Report whether a secret exists.
    Exists { name: String },
    /// Delete a secret.
    Delete { name: String },
    /// Erase every secret in the namespace.
    Clear {
        /// Confirm the irreversible erase.
        #[arg(long)]
        yes: bool,
    },
    /// Write every entry of a TOML manifest into the vault.
    Provision {
        file: PathBuf,
        /// Erase the namespace before writing.
        #[arg(long)]
        clear: bool,
    },
    /// Re-encrypt legacy records in the v1 format.
    Upgrade {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Load and display the Wi-Fi and MQTT connection credentials.
    Credentials,
    /// Run diagnostic checks.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

/// Run `command` against `store`.
///
/// `Doctor` does not need a store and is dispatched by the caller.
pub fn execute<B: KvBackend, W: Write>(
    store: &SecureStore<B>,
    command: Command,
    out: &mut W,
) -> Result<(), SecureStoreError> {
    match command {
        Command::Set { name, value } => {
            let value = match value {
                Some(value) => SecretString::from(value),
                None => read_secret_value(&name)?,
            };
            store.store_secret(&name, value.expose_secret())?;
            emit(out, format_args!("stored `{name}`"))
        }
        Command::SetInt { name, value } => {
            store.store_int(&name, value)?;
            emit(out, format_args!("stored `{name}`"))
        }
        Command::Get { name, reveal } => {
            let secret = store.retrieve_string(&name)?;
            if reveal {
                emit(out, format_args!("{}", secret.expose_secret()))
            } else {
                emit(out, format_args!("{}", mask_secret(secret.expose_secret())))
            }
        }
        Command::GetInt { name } => {
            let value = store.retrieve_int(&name)?;
            emit(out, format_args!("{value}"))
        }
        Command::Exists { name } => {
            let found = store.exists(&name);
            emit(out, format_args!("{}", if found { "yes" } else { "no" }))
        }
        Command::Delete { name } => {
            store.delete(&name)?;
            emit(out, format_args!("deleted `{name}`"))
        }
        Command::Clear { yes } => {
            if !yes {
                return Err(SecureStoreError::Config(
                    "refusing to erase every secret without --yes".into(),
                ));
            }
            store.clear_all()?;
            emit(
                out,
                format_args!("cleared namespace `{}`", store.namespace()),
            )
        }
        Command::Provision { file, clear } => {
            let manifest = ProvisionManifest::load(&file)?;
            let report = provision(store, &manifest, clear)?;
            if report.cleared {
                emit(out, format_args!("cleared namespace `{}`", store.namespace()))?;
            }
            for name in &report.stored {
                emit(out, format_args!("stored `{name}`"))?;
            }
            if !report.is_complete() {
                return Err(SecureStoreError::Internal(format!(
                    "not found after provisioning: {}",
                    report.missing.join(", ")
                )));
            }
            emit(out, format_args!("{} secret(s) provisioned", report.stored.len()))
        }
        Command::Upgrade { names } => {
            for name in &names {
                let outcome = if store.upgrade(name)? {
                    "upgraded"
                } else {
                    "already v1"
                };
                emit(out, format_args!("{name}: {outcome}"))?;
            }
            Ok(())
        }
        Command::Credentials => {
            let creds = ConnectionCredentials::load(store)?;
            emit(out, format_args!("wifi_ssid   {}", creds.wifi_ssid))?;
            emit(
                out,
                format_args!("wifi_pass   {}", mask_secret(creds.wifi_pass.expose_secret())),
            )?;
            emit(
                out,
                format_args!("mqtt        {}:{}", creds.mqtt_server, creds.mqtt_port),
            )?;
            emit(out, format_args!("mqtt_user   {}", creds.mqtt_user))?;
            emit(
                out,
                format_args!("mqtt_pass   {}", mask_secret(creds.mqtt_pass.expose_secret())),
            )
        }
        Command::Doctor { .. } => Err(SecureStoreError::Internal(
            "doctor runs without a store".into(),
        )),
    }
}

fn emit<W: Write>(out: &mut W, line: std::fmt::Arguments<'_>) -> Result<(), SecureStoreError> {
    writeln!(out, "{line}")
        .map_err(|e| SecureStoreError::Internal(format!("cannot write output: {e}")))
}
