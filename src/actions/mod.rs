//! Built-in action handlers.
//!
//! Handlers only talk to hardware through the [`crate::Receiver`] and
//! [`crate::Device`] traits and only find their targets through the resolvers
//! they are given.

use anyhow::{anyhow, Result};
use std::io::Write;
use std::rc::Rc;

use crate::dispatch::ActionHandler;
use crate::resolve::Resolvers;
use crate::{Device, Handle, Receiver};

mod config;
mod pair;
mod probe;
mod profiles;
mod show;
mod unpair;

pub use config::Config;
pub use pair::Pair;
pub use probe::Probe;
pub use profiles::Profiles;
pub use show::Show;
pub use unpair::Unpair;

#[must_use]
pub fn builtin() -> Vec<Box<dyn ActionHandler>> {
    vec![
        Box::new(Show),
        Box::new(Probe),
        Box::new(Profiles),
        Box::new(Config),
        Box::new(Pair),
        Box::new(Unpair),
    ]
}

// First device matching `token`
fn first_device(handles: &[Handle], resolvers: Resolvers, token: &str) -> Result<Rc<dyn Device>> {
    (resolvers.find_device)(handles, token)?
        .next()
        .ok_or_else(|| anyhow!("no device found matching '{token}'"))
}

// Receiver named by `token`, or the first receiver when no token was given
fn select_receiver<'a>(
    handles: &'a [Handle],
    resolvers: Resolvers,
    token: Option<&str>,
) -> Result<&'a Rc<dyn Receiver>> {
    match token {
        Some(token) => (resolvers.find_receiver)(handles, token)?
            .ok_or_else(|| anyhow!("no receiver found matching '{token}'")),
        None => handles
            .iter()
            .find_map(Handle::as_receiver)
            .ok_or_else(|| anyhow!("no receiver found")),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn write_device(out: &mut dyn Write, dev: &dyn Device) -> Result<()> {
    match dev.slot() {
        Some(slot) => writeln!(out, "  {slot}: {}", dev.name())?,
        None => writeln!(out, "{}", dev.name())?,
    }
    if let Some(path) = dev.path() {
        writeln!(out, "     Device path  : {path}")?;
    }
    writeln!(out, "     Codename     : {}", dev.codename())?;
    writeln!(out, "     Kind         : {}", dev.kind())?;
    writeln!(out, "     Serial number: {}", dev.serial())?;
    writeln!(out, "     Online       : {}", yes_no(dev.online()))?;
    Ok(())
}

fn write_receiver(out: &mut dyn Write, r: &dyn Receiver) -> Result<()> {
    writeln!(out, "{}", r.name())?;
    writeln!(out, "  Device path  : {}", r.path())?;
    writeln!(out, "  Serial       : {}", r.serial().unwrap_or("unknown"))?;
    writeln!(
        out,
        "  Has {} paired device(s) out of a maximum of {}.",
        r.count(),
        r.max_devices()
    )?;
    Ok(())
}
