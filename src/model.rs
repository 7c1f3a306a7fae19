pub mod matcher;
pub mod moved;
pub mod scenario;
pub mod server;
pub mod window;

pub use matcher::{MatcherEntry, MatcherRegistry};
pub use moved::{MovedEntry, MovedRegistry};
pub use window::{OutputId, SlotChange, SlotIndex, WindowFlags, WindowId, WindowInfo, WindowKind};
