// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret value acquisition via TTY prompt or the SECURESTORE_SECRET_VALUE environment variable.

use secrecy::SecretString;
use securestore_core::SecureStoreError;
use zeroize::Zeroizing;

/// The environment variable providing a secret value non-interactively.
pub const SECRET_VALUE_ENV_VAR: &str = "SECURESTORE_SECRET_VALUE";

/// Get the value for secret `name` from the environment or a TTY prompt.
///
/// Priority:
/// 1. `SECURESTORE_SECRET_VALUE` (provisioning scripts, CI)
/// 2. Interactive prompt via `rpassword`, entered twice
///
/// Empty values are accepted from the environment, where they are deliberate,
/// but not from the prompt.
pub fn read_secret_value(name: &str) -> Result<SecretString, SecureStoreError> {
    if let Ok(value) = std::env::var(SECRET_VALUE_ENV_VAR) {
        return Ok(SecretString::from(value));
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let first = Zeroizing::new(prompt(&format!("Value for {name}: "))?);
        let second = Zeroizing::new(prompt(&format!("Confirm value for {name}: "))?);
        if *first != *second {
            return Err(SecureStoreError::Config("values do not match".into()));
        }
        if first.is_empty() {
            return Err(SecureStoreError::Config("empty value not allowed".into()));
        }
        return Ok(SecretString::from(first.to_string()));
    }

    Err(SecureStoreError::Config(format!(
        "No value provided for `{name}`. Pass --value, set {SECRET_VALUE_ENV_VAR}, or run interactively."
    )))
}

fn prompt(label: &str) -> Result<String, SecureStoreError> {
    rpassword::prompt_password(label)
        .map_err(|e| SecureStoreError::Config(format!("failed to read value: {e}")))
}
