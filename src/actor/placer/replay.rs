use std::time::Duration;

use tracing::{debug_span, info};

use super::{Placer, PlacerError};
use crate::common::config::SharedConfig;
use crate::model::SlotIndex;
use crate::model::scenario::{Scenario, Step};
use crate::model::server::SlotData;
use crate::sys::virtual_host::VirtualHost;

/// Runs a scenario against an in-memory host and returns the final slots.
///
/// Every step is followed by a zero-length advance, so actions that are due
/// immediately run before the next step.
pub fn replay(scenario: &Scenario) -> Result<Vec<SlotData>, PlacerError> {
    let mut host = VirtualHost::new(scenario.slots)
        .with_primary_output(scenario.primary_output)
        .with_active_slot(SlotIndex::new(scenario.active_slot));
    for window in &scenario.windows {
        host.insert_window(window.to_info());
    }

    let config = SharedConfig::new(scenario.config.clone());
    let mut placer = Placer::new(host, config.clone());
    placer.enable()?;

    for (index, step) in scenario.steps.iter().enumerate() {
        let _span = debug_span!("replay::step", index).entered();
        let event = match step {
            Step::Map(window) => placer.host_mut().map_window(window.to_info()),
            Step::Destroy(window) => placer.host_mut().destroy_window(*window),
            Step::Minimize(window) => placer.host_mut().minimize_window(*window),
            Step::Wait(ms) => {
                placer.advance(Duration::from_millis(*ms));
                None
            }
            Step::ResolveApp { window, app_id } => {
                placer.host_mut().set_app_id(*window, app_id.clone());
                None
            }
            Step::SetApps(apps) => {
                config.update(|config| config.apps = apps.clone());
                placer.host().config_changed()
            }
            Step::SetPolicy(policy) => {
                config.update(|config| config.policy = *policy);
                None
            }
            Step::Disable => {
                placer.disable();
                None
            }
            Step::Enable => {
                placer.enable()?;
                None
            }
        };
        if let Some(event) = event {
            placer.handle_event(event);
        }
        placer.advance(Duration::ZERO);
    }

    info!(steps = scenario.steps.len(), elapsed = ?placer.now(), "replay finished");
    Ok(placer.snapshot())
}
