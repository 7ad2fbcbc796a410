//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};

use airdeploy_config::{self as cfgfile, Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Mask plaintext keys before anything is printed.
fn redact(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("********".into());
        }
    }
}

fn init() -> Result<(), CliError> {
    let config_path = cfgfile::config_path();
    eprintln!("airdeploy configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Controller URL
    let controller: String = Input::new()
        .with_prompt("Controller URL")
        .validate_with(|raw: &String| {
            cfgfile::parse_controller_url(raw)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    // 3. API key
    let key = Password::new()
        .with_prompt("API key")
        .interact()
        .map_err(prompt_err)?;
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }

    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the API key?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let api_key = if store_selection == 0 {
        cfgfile::store_api_key(&profile_name, &key)?;
        eprintln!("   API key stored in system keyring");
        None
    } else {
        Some(key)
    };

    // 4. Merge into any existing config
    let mut cfg = cfgfile::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            controller,
            api_key,
            api_key_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    cfgfile::save_config(&cfg)?;

    eprintln!("\nConfiguration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Try it: airdeploy deploy --ssid Test --security open --site <SITE> --dry-run");
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let mut cfg = cfgfile::load_config_or_default();
            redact(&mut cfg);
            let text = toml::to_string_pretty(&cfg).map_err(cfgfile::ConfigError::from)?;
            let out = output::render_single(&global.output, &cfg, |_| text.clone(), |_| {
                cfgfile::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let cfg = cfgfile::load_config_or_default();
            let store = global
                .store_dir
                .clone()
                .unwrap_or_else(|| cfgfile::store_dir(&cfg));
            println!("{}", cfgfile::config_path().display());
            if !global.quiet {
                eprintln!("store: {}", store.display());
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = cfgfile::load_config_or_default();
            let active = config::active_profile_name(global, &cfg);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: airdeploy config init");
                return Ok(());
            }
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            for name in names {
                let marker = if *name == active { " *" } else { "" };
                println!("{name}{marker}");
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = cfgfile::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            cfgfile::save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }
    }
}
