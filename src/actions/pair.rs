use anyhow::{bail, Result};
use std::io::Write;

use super::{select_receiver, write_device};
use crate::cli::Action;
use crate::dispatch::ActionHandler;
use crate::resolve::Resolvers;
use crate::{invariant_violation, Handle};

pub struct Pair;

impl ActionHandler for Pair {
    fn name(&self) -> &'static str {
        "pair"
    }

    fn execute(
        &self,
        handles: &[Handle],
        action: &Action,
        resolvers: Resolvers,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Action::Pair { receiver } = action else {
            return Err(invariant_violation!().into());
        };
        let r = select_receiver(handles, resolvers, receiver.as_deref())?;

        if r.count() >= usize::from(r.max_devices()) {
            bail!(
                "{} is full: {} of {} slots in use",
                r.name(),
                r.count(),
                r.max_devices()
            );
        }

        writeln!(out, "Pairing: turn your new device on.")?;
        match r.pair_device()? {
            Some(dev) => {
                writeln!(out, "Paired device")?;
                write_device(out, dev.as_ref())?;
            }
            None => bail!("pairing failed: no device came up"),
        }
        Ok(())
    }
}
