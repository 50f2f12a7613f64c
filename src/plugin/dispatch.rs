use crate::argv::ArgumentVector;
use crate::error::{Result, SkyuxError};
use crate::plugin::load::LoadedPlugin;
use crate::ui::Logger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub identity: String,
    pub answered: bool,
}

/// Invokes each admitted plugin once, in order. A plugin that cannot be
/// started counts as not answering; a fault raised by a plugin is returned
/// as-is and stops the remaining calls.
pub fn dispatch(
    plugins: &[&LoadedPlugin],
    command: &str,
    argv: &ArgumentVector,
    logger: &dyn Logger,
) -> Result<Vec<DispatchResult>> {
    let mut results = Vec::with_capacity(plugins.len());

    for plugin in plugins {
        let Some(handler) = plugin.handler() else {
            continue;
        };

        logger.verbose(&format!("Passing command to {}", plugin.identity));
        let answered = match handler.run_command(command, argv) {
            Ok(answered) => answered,
            Err(SkyuxError::PluginUnavailable { identity, reason }) => {
                logger.verbose(&format!("Unable to invoke module {}: {}", identity, reason));
                false
            }
            Err(err) => return Err(err),
        };
        results.push(DispatchResult {
            identity: plugin.identity.clone(),
            answered,
        });
    }

    Ok(results)
}
