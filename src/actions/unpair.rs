use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;

use super::first_device;
use crate::cli::Action;
use crate::dispatch::ActionHandler;
use crate::resolve::Resolvers;
use crate::{invariant_violation, Handle};

pub struct Unpair;

impl ActionHandler for Unpair {
    fn name(&self) -> &'static str {
        "unpair"
    }

    fn execute(
        &self,
        handles: &[Handle],
        action: &Action,
        resolvers: Resolvers,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Action::Unpair { device } = action else {
            return Err(invariant_violation!().into());
        };
        let dev = first_device(handles, resolvers, device)?;

        let (Some(slot), Some(receiver_path)) = (dev.slot(), dev.receiver_path()) else {
            bail!("cannot unpair {}: it is not paired through a receiver", dev.name());
        };
        let receiver = handles
            .iter()
            .filter_map(Handle::as_receiver)
            .find(|r| r.path() == receiver_path)
            .ok_or_else(|| anyhow!("receiver {receiver_path} is not available"))?;

        receiver
            .unpair_device(slot)
            .with_context(|| format!("failed to unpair device {slot}"))?;
        writeln!(
            out,
            "Unpaired {slot}: {} ({}) [{}]",
            dev.name(),
            dev.codename(),
            dev.serial()
        )?;
        Ok(())
    }
}
