use tracing::{info, warn};

use crate::actor::placer::Placer;
use crate::common::config::ConfigSource;
use crate::sys::host::{Host, HostError};

pub struct ConfigEventHandler;

impl ConfigEventHandler {
    /// Rebuilds the matcher registry from scratch. Windows already placed
    /// and placements already scheduled are left alone; the new matchers
    /// apply from their next classification on.
    pub fn handle_config_changed<H: Host, C: ConfigSource>(
        placer: &mut Placer<H, C>,
    ) -> Result<(), HostError> {
        match placer.source.matcher_strings() {
            Ok(matchers) => {
                placer.settings = placer.source.settings();
                let count = placer.matchers.rebuild(&matchers);
                info!(matchers = count, "reloaded matchers");
            }
            Err(err) => {
                placer.matchers.clear();
                warn!(%err, "configuration unavailable; no application will be placed");
            }
        }
        Ok(())
    }
}
