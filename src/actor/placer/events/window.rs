use tracing::{debug, trace};

use crate::actor::placer::Placer;
use crate::actor::placer::classifier::{Classification, classify};
use crate::common::config::ConfigSource;
use crate::model::WindowId;
use crate::sys::host::{Host, HostError};

pub struct WindowEventHandler;

impl WindowEventHandler {
    pub fn handle_window_mapped<H: Host, C: ConfigSource>(
        placer: &mut Placer<H, C>,
        window: WindowId,
    ) -> Result<(), HostError> {
        let Some(info) = placer.host.window(window) else {
            trace!(%window, "mapped window already gone");
            return Ok(());
        };
        // Our own moves can make the host report the window again.
        if placer.moved.is_handled(window) || placer.pending.contains(window) {
            trace!(%window, "window already handled");
            return Ok(());
        }

        match classify(&info, &placer.matchers) {
            Classification::Ineligible(reason) => {
                trace!(%window, %reason, "ignoring window");
                Ok(())
            }
            Classification::Transient(parent) => {
                placer.moved.mark_handled(window);
                placer.follow_parent(&info, parent)
            }
            _ => {
                // Application ids and titles are often still missing at map
                // time, so the real decision waits for the window to settle.
                let delay = placer.settings.settle_delay;
                debug!(%window, ?delay, "scheduling placement");
                placer.schedule_placement(window, delay, 0);
                Ok(())
            }
        }
    }

    pub fn handle_window_destroyed<H: Host, C: ConfigSource>(
        placer: &mut Placer<H, C>,
        window: WindowId,
    ) -> Result<(), HostError> {
        if let Some(key) = placer.pending.take(window) {
            trace!(%window, "cancelling pending placement");
            placer.scheduler.cancel(key);
        }
        let result = placer.release_window(window);
        placer.moved.forget(window);
        result
    }

    pub fn handle_window_minimized<H: Host, C: ConfigSource>(
        placer: &mut Placer<H, C>,
        window: WindowId,
    ) -> Result<(), HostError> {
        placer.release_window(window)
    }
}
