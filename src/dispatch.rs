use anyhow::Result;
use clap::CommandFactory;
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

use crate::cli::{Action, Cli};
use crate::enumerate::build_handles;
use crate::error::Error;
use crate::library::DeviceLibrary;
use crate::resolve::Resolvers;
use crate::{invariant_violation, Handle};

/// Entry point shared by every action.
pub trait ActionHandler {
    fn name(&self) -> &'static str;

    /// Run the action against the fully built handle list.
    ///
    /// # Errors
    ///
    /// Any failure is reported by the dispatcher and ends the invocation.
    fn execute(
        &self,
        handles: &[Handle],
        action: &Action,
        resolvers: Resolvers,
        out: &mut dyn Write,
    ) -> Result<()>;
}

// Action handlers keyed by action name
pub struct ActionRegistry {
    handlers: Vec<Box<dyn ActionHandler>>,
    lookup: HashMap<&'static str, usize>, // name -> index in handlers vector
}

impl ActionRegistry {
    #[must_use]
    pub fn new(handlers: Vec<Box<dyn ActionHandler>>) -> Self {
        let lookup = handlers
            .iter()
            .enumerate()
            .map(|(index, handler)| (handler.name(), index))
            .collect();
        Self { handlers, lookup }
    }

    // Registry with every action the CLI knows about
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(crate::actions::builtin())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ActionHandler> {
        self.lookup
            .get(name)
            .map(|&index| self.handlers[index].as_ref())
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }
}

/// Build the handle list for the requested action and hand it to its handler.
///
/// # Errors
///
/// Every failure of the invocation comes back as an [`Error`]; nothing is
/// retried.
pub fn run(
    cli: &Cli,
    library: &dyn DeviceLibrary,
    registry: &ActionRegistry,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let Some(action) = &cli.command else {
        return Err(Error::Usage {
            usage: Cli::command().render_usage().to_string(),
        });
    };

    let handler = registry
        .get(action.name())
        .ok_or_else(|| invariant_violation!())?;

    let handles = build_handles(library, action.enumeration_mode(), cli.hidraw.as_deref())?;
    if handles.is_empty() {
        return Err(Error::NoDevices);
    }

    debug!(
        action = action.name(),
        handles = handles.len(),
        "dispatching action"
    );
    handler
        .execute(&handles, action, Resolvers::default(), out)
        .map_err(Error::from_action)
}
