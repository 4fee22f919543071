//! Canonical test configurations.

use rust_decimal_macros::dec;

use crate::application::ledger::LedgerConfig;

/// Faucet of 1000 points with a one-hour cooldown.
pub fn ledger() -> LedgerConfig {
    LedgerConfig {
        faucet_amount: dec!(1000),
        faucet_cooldown_secs: 3600,
        max_commit_retries: 3,
    }
}

/// Minimal TOML config pointing file storage at `dir`.
pub fn file_backed_toml(dir: &std::path::Path) -> String {
    format!(
        r#"
[storage]
backend = "file"
path = "{}"

[bus]
backend = "broadcast"

[logging]
level = "warn"
"#,
        dir.display().to_string().replace('\\', "/")
    )
}
