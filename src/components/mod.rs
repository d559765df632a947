//! Components that publish their own settings.
//!
//! Each component registers a constructor under a dotted key; the
//! application schema includes them by that key.

pub mod monitor;
pub mod notify;

use crate::settings::ComponentRegistry;

pub use monitor::Monitor;
pub use notify::WebhookServer;

/// Register every built-in component.
pub fn register_builtin(components: &mut ComponentRegistry) {
    components
        .register(notify::COMPONENT_KEY, notify::factory)
        .register(monitor::COMPONENT_KEY, monitor::factory);
}
