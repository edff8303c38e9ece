use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;

use super::first_device;
use crate::cli::Action;
use crate::dispatch::ActionHandler;
use crate::resolve::Resolvers;
use crate::{invariant_violation, Handle};

pub struct Profiles;

impl ActionHandler for Profiles {
    fn name(&self) -> &'static str {
        "profiles"
    }

    fn execute(
        &self,
        handles: &[Handle],
        action: &Action,
        resolvers: Resolvers,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Action::Profiles { device, profiles } = action else {
            return Err(invariant_violation!().into());
        };
        let dev = first_device(handles, resolvers, device)?;
        if !dev.ping() {
            bail!("{} is not active", dev.name());
        }

        let Some(path) = profiles else {
            let Some(current) = dev.profiles() else {
                bail!("{} has no onboard profiles", dev.name());
            };
            let dump = serde_json::to_string_pretty(&current)
                .context("failed to serialize profiles")?;
            writeln!(out, "{dump}")?;
            return Ok(());
        };

        let path_str = path.to_string_lossy();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read profiles from {path_str}"))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON from {path_str}"))?;
        dev.write_profiles(value)
            .with_context(|| format!("failed to write profiles to {}", dev.name()))?;
        writeln!(out, "Wrote profiles from {path_str} to {}", dev.name())?;
        Ok(())
    }
}
