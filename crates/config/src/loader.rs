use std::{path::Path, str::FromStr};

use anyhow::bail;
use indoc::formatdoc;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use toml::Value;

use crate::Config;

/// Fields that may be left out when the environment variable they reference
/// is not set.
const OPTIONAL_FIELDS: &[&str] = &["base_url", "model"];

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let raw_config: Value = toml::from_str(&content)?;

    from_value(raw_config)
}

pub(crate) fn from_value(mut raw_config: Value) -> anyhow::Result<Config> {
    expand_dynamic_strings(&mut Vec::new(), &mut raw_config)?;

    let config = Config::deserialize(raw_config)?;
    validate(&config)?;

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    if !config.llm.enabled() {
        log::warn!("The generation endpoint is disabled, only the health endpoint will be served");
        return Ok(());
    }

    let selector = config.llm.provider;

    let Some(provider) = config.llm.selected() else {
        bail!(formatdoc! {r#"
            The selected provider '{selector}' is not configured.

            Add a section for it, for example:

              [llm.providers.{selector}]
              api_key = "{{{{ env.{env}_API_KEY }}}}"
        "#, env = selector.as_str().to_uppercase()});
    };

    if provider.api_key.is_none() {
        bail!("The selected provider '{selector}' has no api_key configured");
    }

    if config.server.auth.is_none() {
        bail!(formatdoc! {r#"
            No identity provider configured. Every generation request must carry a bearer token,
            so the server needs a key set to validate it against:

              [server.auth]
              url = "https://auth.example.com/.well-known/jwks.json"
        "#});
    }

    Ok(())
}

fn expand_dynamic_strings(path: &mut Vec<String>, value: &mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => bail!("Failed to expand dynamic string at path '{}': {err}", path.join(".")),
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(format!("[{i}]"));
                let result = expand_dynamic_strings(path, value);
                path.pop();

                result?;
            }
        }
        Value::Table(map) => {
            let mut unresolved = Vec::new();

            for (key, value) in map.iter_mut() {
                path.push(key.clone());
                let result = expand_dynamic_strings(path, value);
                path.pop();

                match result {
                    Ok(()) => (),
                    Err(_) if value.is_str() && OPTIONAL_FIELDS.contains(&key.as_str()) => unresolved.push(key.clone()),
                    Err(err) => return Err(err),
                }
            }

            for key in unresolved {
                log::debug!("Removed optional field '{key}' due to a missing environment variable");
                map.remove(&key);
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
