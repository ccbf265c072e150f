//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Input, Select};

use bigsync_config::{self as config_file, Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "jobs = {}", cfg.defaults.jobs);
    let _ = writeln!(out, "interval = {}", cfg.defaults.interval);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "partition = \"{}\"", p.partition);
        let _ = writeln!(out, "auth = \"{}\"", p.auth);
        if let Some(ref user) = p.username {
            let _ = writeln!(out, "username = \"{user}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(jobs) = p.jobs {
            let _ = writeln!(out, "jobs = {jobs}");
        }
    }

    out.trim_end().to_owned()
}

/// Serialize config for the JSON formats, masking plaintext passwords.
fn redacted_value(cfg: &Config) -> Result<serde_json::Value, CliError> {
    let mut value = serde_json::to_value(cfg)?;
    if let Some(profiles) = value
        .get_mut("profiles")
        .and_then(serde_json::Value::as_object_mut)
    {
        for profile in profiles.values_mut() {
            if let Some(password) = profile.get_mut("password") {
                if !password.is_null() {
                    *password = serde_json::Value::String("****".into());
                }
            }
        }
    }
    Ok(value)
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt {
        reason: e.to_string(),
    }
}

/// Sorted ", "-joined profile names, or "(none)".
fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// The profile name config subcommands act on.
fn target_profile_name(explicit: Option<String>, global: &GlobalOpts, cfg: &Config) -> String {
    explicit
        .or_else(|| global.profile.clone())
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Prompt for a password and store it in the system keyring.
fn store_keyring_password(profile_name: &str) -> Result<(), CliError> {
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    config_file::store_password(profile_name, &password)?;
    eprintln!("   ✓ password stored in system keyring");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config_file::config_path();
            eprintln!("bigsync — configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let host: String = Input::new()
                .with_prompt("Device management URL")
                .default("https://192.0.2.1".into())
                .interact_text()
                .map_err(prompt_err)?;

            let partition: String = Input::new()
                .with_prompt("Partition")
                .default("Common".into())
                .interact_text()
                .map_err(prompt_err)?;

            let auth_choices = &["Token (recommended)", "Basic"];
            let auth_selection = Select::new()
                .with_prompt("Authentication scheme")
                .items(auth_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            let auth = if auth_selection == 0 { "token" } else { "basic" };

            let username: String = Input::new()
                .with_prompt("Username")
                .default("admin".into())
                .interact_text()
                .map_err(prompt_err)?;

            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }

            let storage_choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let storage = Select::new()
                .with_prompt("Where to store the password?")
                .items(storage_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let password_field = if storage == 0 {
                config_file::store_password(&profile_name, &password)?;
                eprintln!("   ✓ password stored in system keyring");
                None
            } else {
                Some(password)
            };

            let mut profile = Profile::new(host);
            profile.partition = partition;
            profile.auth = auth.to_owned();
            profile.username = Some(username);
            profile.password = password_field;

            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);
            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                profiles,
                ..Config::default()
            };
            config_file::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: bigsync status");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config_file::load_config_or_default();
            let out = match global.format {
                OutputFormat::Table => format_config_redacted(&cfg),
                OutputFormat::Json => output::render_json_pretty(&redacted_value(&cfg)?),
                OutputFormat::JsonCompact => output::render_json_compact(&redacted_value(&cfg)?),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config_file::load_config_or_default();
            let profile_name = target_profile_name(None, global, &cfg);
            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new()));

            match key.as_str() {
                "host" => profile.host = value,
                "partition" => profile.partition = value,
                "auth" => {
                    if !matches!(value.as_str(), "token" | "basic") {
                        return Err(CliError::Validation {
                            field: "auth".into(),
                            reason: "must be 'token' or 'basic'".into(),
                        });
                    }
                    profile.auth = value;
                }
                "username" => profile.username = Some(value),
                "password_env" | "password-env" => profile.password_env = Some(value),
                "insecure" => {
                    profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "insecure".into(),
                        reason: "must be 'true' or 'false'".into(),
                    })?);
                }
                "timeout" => {
                    profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "timeout".into(),
                        reason: "must be a number (seconds)".into(),
                    })?);
                }
                "jobs" => {
                    profile.jobs = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "jobs".into(),
                        reason: "must be a positive number".into(),
                    })?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: host, partition, \
                             auth, username, password_env, insecure, timeout, jobs"
                        ),
                    });
                }
            }

            config_file::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config_file::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: bigsync config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config_file::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config_file::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetCredentials ──────────────────────────────────────────
        ConfigCommand::SetCredentials { profile } => {
            let mut cfg = config_file::load_config_or_default();
            let profile_name = target_profile_name(profile, global, &cfg);
            let Some(entry) = cfg.profiles.get_mut(&profile_name) else {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name: profile_name,
                });
            };

            let current = entry.username.clone().unwrap_or_else(|| "admin".into());
            let username: String = Input::new()
                .with_prompt("Username")
                .default(current)
                .interact_text()
                .map_err(prompt_err)?;
            entry.username = Some(username);
            // The keyring copy supersedes any plaintext one.
            entry.password = None;

            store_keyring_password(&profile_name)?;
            config_file::save_config(&cfg)?;
            eprintln!("✓ Credentials updated for profile '{profile_name}'");
            Ok(())
        }
    }
}
