use anyhow::{bail, Result};
use std::io::Write;

use super::{write_device, write_receiver};
use crate::cli::Action;
use crate::dispatch::ActionHandler;
use crate::resolve::Resolvers;
use crate::{invariant_violation, Handle};

pub struct Show;

impl ActionHandler for Show {
    fn name(&self) -> &'static str {
        "show"
    }

    fn execute(
        &self,
        handles: &[Handle],
        action: &Action,
        resolvers: Resolvers,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Action::Show { device } = action else {
            return Err(invariant_violation!().into());
        };

        if device.eq_ignore_ascii_case("all") {
            for handle in handles {
                match handle {
                    Handle::Receiver(r) => {
                        write_receiver(out, r.as_ref())?;
                        for dev in r.devices() {
                            writeln!(out)?;
                            write_device(out, dev.as_ref())?;
                        }
                    }
                    Handle::Device(d) => {
                        d.ping();
                        write_device(out, d.as_ref())?;
                    }
                }
                writeln!(out)?;
            }
            return Ok(());
        }

        let mut found = false;
        for dev in (resolvers.find_device)(handles, device)? {
            write_device(out, dev.as_ref())?;
            writeln!(out)?;
            found = true;
        }
        if !found {
            bail!("no device found matching '{device}'");
        }
        Ok(())
    }
}
