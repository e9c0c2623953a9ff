//! Config command - read and change user settings

use idepack_core::Settings;

use super::Context;
use crate::error::{CliError, Result};

const KEYS: &[&str] = &[
    "registry_url",
    "download_base_url",
    "timeout_secs",
    "user_agent",
    "self_command",
];

pub fn show(ctx: &Context) -> Result<()> {
    for key in KEYS {
        println!("{key}: {}", get_value(&ctx.settings, key)?);
    }
    Ok(())
}

pub fn get(ctx: &Context, key: &str) -> Result<()> {
    println!("{}", get_value(&ctx.settings, key)?);
    Ok(())
}

/// Change one key and write the settings file back
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut settings = ctx.settings.clone();
    set_value(&mut settings, key, value)?;
    settings.save_to(&ctx.layout.config_file())?;
    println!("{key} = {}", get_value(&settings, key)?);
    Ok(())
}

fn get_value(settings: &Settings, key: &str) -> Result<String> {
    let value = match key {
        "registry_url" => settings.registry_url.clone(),
        "download_base_url" => settings.download_base_url.clone().unwrap_or_default(),
        "timeout_secs" => settings.timeout_secs.to_string(),
        "user_agent" => settings.user_agent.clone(),
        "self_command" => settings.self_command.clone(),
        _ => return Err(unknown_key(key)),
    };
    Ok(value)
}

/// An empty `download_base_url` unsets it
fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key {
        "registry_url" => settings.registry_url = non_empty(key, value)?,
        "download_base_url" => {
            settings.download_base_url = (!value.is_empty()).then(|| value.to_string());
        }
        "timeout_secs" => {
            settings.timeout_secs = value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    CliError::input(format!("timeout_secs must be a positive integer, got '{value}'"))
                })?;
        }
        "user_agent" => settings.user_agent = non_empty(key, value)?,
        "self_command" => settings.self_command = non_empty(key, value)?,
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(CliError::input(format!("{key} must not be empty")));
    }
    Ok(value.to_string())
}

fn unknown_key(key: &str) -> CliError {
    CliError::validation_with_help(
        format!("unknown setting '{key}'"),
        format!("known settings: {}", KEYS.join(", ")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_parses_and_validates() {
        let mut settings = Settings::default();
        set_value(&mut settings, "timeout_secs", " 15 ").unwrap();
        assert_eq!(settings.timeout_secs, 15);
        assert!(set_value(&mut settings, "timeout_secs", "0").is_err());
        assert!(set_value(&mut settings, "timeout_secs", "soon").is_err());
        assert!(set_value(&mut settings, "registry_url", "").is_err());

        set_value(&mut settings, "download_base_url", "https://cdn.example.com").unwrap();
        assert_eq!(get_value(&settings, "download_base_url").unwrap(), "https://cdn.example.com");
        set_value(&mut settings, "download_base_url", "").unwrap();
        assert_eq!(settings.download_base_url, None);
    }

    #[test]
    fn test_unknown_key() {
        let mut settings = Settings::default();
        assert!(matches!(
            get_value(&settings, "colour"),
            Err(CliError::Validation { .. })
        ));
        assert!(set_value(&mut settings, "colour", "red").is_err());
    }
}
