use anyhow::Result;
use std::io::Write;

use super::{select_receiver, write_receiver};
use crate::cli::Action;
use crate::dispatch::ActionHandler;
use crate::resolve::Resolvers;
use crate::{invariant_violation, Handle};

pub struct Probe;

impl ActionHandler for Probe {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn execute(
        &self,
        handles: &[Handle],
        action: &Action,
        resolvers: Resolvers,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Action::Probe { receiver } = action else {
            return Err(invariant_violation!().into());
        };
        let r = select_receiver(handles, resolvers, receiver.as_deref())?;

        write_receiver(out, r.as_ref())?;
        // Query every slot directly instead of trusting the paired count
        for slot in 1..=r.max_devices() {
            match r.device(slot) {
                Some(dev) => writeln!(
                    out,
                    "  Slot {slot}: {} ({}) [{}] {}",
                    dev.name(),
                    dev.codename(),
                    dev.serial(),
                    if dev.online() { "online" } else { "offline" }
                )?,
                None => writeln!(out, "  Slot {slot}: empty")?,
            }
        }
        Ok(())
    }
}
