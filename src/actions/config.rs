use anyhow::{anyhow, bail, Result};
use serde_json::{Map, Value};
use std::io::Write;

use super::first_device;
use crate::cli::Action;
use crate::dispatch::ActionHandler;
use crate::resolve::Resolvers;
use crate::{invariant_violation, Handle};

pub struct Config;

// Command-line values are JSON when they parse as JSON, plain strings otherwise
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Set `map[key]`, failing when `current` is not a keyed setting
fn with_key(setting: &str, current: Option<&Value>, key: &str, value: Value) -> Result<Value> {
    let mut map = match current {
        Some(Value::Object(map)) => map.clone(),
        None => Map::new(),
        Some(_) => bail!("{setting} is not a keyed setting"),
    };
    map.insert(key.to_string(), value);
    Ok(Value::Object(map))
}

impl ActionHandler for Config {
    fn name(&self) -> &'static str {
        "config"
    }

    fn execute(
        &self,
        handles: &[Handle],
        action: &Action,
        resolvers: Resolvers,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Action::Config {
            device,
            setting,
            value_key,
            extra_subkey,
            extra2,
        } = action
        else {
            return Err(invariant_violation!().into());
        };
        let dev = first_device(handles, resolvers, device)?;
        if !dev.ping() {
            bail!("{} is not online", dev.name());
        }

        let settings = dev.settings();
        let Some(setting) = setting else {
            if settings.is_empty() {
                writeln!(out, "{} has no settings", dev.name())?;
            }
            for (name, value) in &settings {
                writeln!(out, "{name} = {}", render(value))?;
            }
            return Ok(());
        };

        let (name, current) = settings
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(setting))
            .ok_or_else(|| anyhow!("{} has no setting named '{setting}'", dev.name()))?;

        let Some(value_key) = value_key else {
            writeln!(out, "{name} = {}", render(current))?;
            return Ok(());
        };

        let new_value = match (extra_subkey, extra2) {
            (None, _) => parse_value(value_key),
            (Some(value), None) => with_key(name, Some(current), value_key, parse_value(value))?,
            (Some(subkey), Some(value)) => {
                let inner = with_key(
                    name,
                    current.get(value_key.as_str()),
                    subkey,
                    parse_value(value),
                )?;
                with_key(name, Some(current), value_key, inner)?
            }
        };

        dev.write_setting(name, new_value.clone())?;
        writeln!(out, "{name} = {}", render(&new_value))?;
        Ok(())
    }
}
