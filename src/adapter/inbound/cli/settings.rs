//! `pointbook settings` and `pointbook reset` handlers.

use std::sync::Arc;

use serde_json::json;

use super::command::{ResetArgs, SettingsAdminArgs, SettingsAllowArgs, SettingsMapArgs, Toggle};
use super::output;
use crate::application::ledger::Ledger;
use crate::domain::{Settings, WalletAddress};
use crate::error::{ConfigError, Result};
use crate::port::outbound::store::Storage;

type CliLedger = Ledger<Arc<dyn Storage>>;

fn print_settings(settings: &Settings) {
    output::field(
        "Admin mode",
        if settings.admin_mode {
            output::positive("on")
        } else {
            output::muted("off")
        },
    );
    let allowlist: Vec<String> = settings.allowlist.iter().map(ToString::to_string).collect();
    output::field(
        "Allowlist",
        if allowlist.is_empty() {
            output::muted("(empty)")
        } else {
            allowlist.join(", ")
        },
    );
    if settings.mappings.is_empty() {
        output::field("Mappings", output::muted("(none)"));
    }
    for (key, source) in &settings.mappings {
        output::field("Mapping", format!("{key} -> {}", output::highlight(source)));
    }
}

fn report(command: &str, settings: &Settings) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({ "command": command, "settings": settings }));
        return Ok(());
    }
    output::success("Settings updated");
    print_settings(settings);
    Ok(())
}

/// Display the current settings.
pub fn show(ledger: &CliLedger) -> Result<()> {
    let settings = ledger.store().get_settings();

    if output::is_json() {
        output::json_output(json!({ "command": "settings.show", "settings": settings }));
        return Ok(());
    }
    output::section("Settings");
    print_settings(&settings);
    Ok(())
}

/// Turn admin mode on or off.
pub fn admin(ledger: &CliLedger, args: SettingsAdminArgs) -> Result<()> {
    ledger.authorize(args.actor.address().as_ref())?;
    let enabled = matches!(args.mode, Toggle::On);
    let settings = ledger.update_settings(|settings| {
        settings.admin_mode = enabled;
        Ok(())
    })?;

    if settings.admin_mode && settings.allowlist.is_empty() && !output::is_json() {
        output::warning("admin mode is on with an empty allowlist; nobody can administer");
    }
    report("settings.admin", &settings)
}

/// Add or remove an allowlisted address.
pub fn allow(ledger: &CliLedger, args: SettingsAllowArgs) -> Result<()> {
    ledger.authorize(args.actor.address().as_ref())?;
    let address = WalletAddress::new(&args.address);
    let settings = ledger.update_settings(|settings| {
        if args.remove {
            settings.allowlist.remove(&address);
        } else {
            settings.allowlist.insert(address.clone());
        }
        Ok(())
    })?;
    report("settings.allow", &settings)
}

/// Add or remove a price-source mapping.
pub fn map(ledger: &CliLedger, args: SettingsMapArgs) -> Result<()> {
    ledger.authorize(args.actor.address().as_ref())?;
    let source = if args.remove {
        None
    } else {
        let source = args
            .source
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingField { field: "source" })?;
        Some(source)
    };
    let settings = ledger.update_settings(|settings| {
        match &source {
            Some(source) => settings.mappings.insert(args.key.clone(), source.clone()),
            None => settings.mappings.remove(&args.key),
        };
        Ok(())
    })?;
    report("settings.map", &settings)
}

/// Delete every persisted collection.
pub fn reset(ledger: &CliLedger, args: ResetArgs) -> Result<()> {
    ledger.authorize(args.actor.address().as_ref())?;
    if !args.yes {
        if output::is_json() {
            output::json_output(json!({ "command": "reset", "status": "unconfirmed" }));
        } else {
            output::warning("reset deletes all markets, trades, wallets, claims and settings");
            output::hint(&format!("re-run with {}", output::highlight("--yes")));
        }
        return Ok(());
    }

    ledger.store().reset()?;
    if output::is_json() {
        output::json_output(json!({ "command": "reset", "status": "done" }));
        return Ok(());
    }
    output::success("All state deleted");
    Ok(())
}
