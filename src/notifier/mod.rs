// MIT License - Copyright (c) 2026 Peter Wright
// Event notifiers

pub mod console;
pub mod mqtt;

use async_trait::async_trait;

use crate::error::Result;
use crate::event::{Event, NameTables, TIMESTAMP_FORMAT};
use crate::registry::Registry;
use crate::storage::Storage;

pub use console::ConsoleNotifier;
pub use mqtt::MqttNotifier;

/// Layout used when a notifier is configured without one.
pub const DEFAULT_LAYOUT: &str = "[{timestamp}]: [{priority}] {event}";

/// A consumer that reacts to dispatched events.
///
/// Implementations compare the event priority against their own threshold
/// before doing anything externally visible. An `Err` is logged by the
/// pipeline and never stops delivery to other notifiers.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, event: &Event) -> Result<()>;
}

pub type NotifierRegistry = Registry<dyn Notifier>;

pub type StorageRegistry = Registry<dyn Storage>;

/// Substitute `{timestamp}`, `{priority}` and `{event}` in a layout string.
///
/// Placeholders are expanded in a single pass, so braces inside substituted
/// text (a zone named `{priority}`) come out as written. Unknown
/// placeholders are left alone.
pub fn render_layout(layout: &str, event: &Event, names: &NameTables) -> String {
    let mut out = String::with_capacity(layout.len() + 64);
    let mut rest = layout;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let placeholder = tail.find('}').map(|end| (&tail[1..end], end + 1));

        let value = match placeholder {
            Some(("timestamp", len)) => Some((event.timestamp_str(TIMESTAMP_FORMAT), len)),
            Some(("priority", len)) => Some((event.priority.as_str().to_string(), len)),
            Some(("event", len)) => Some((event.describe(names), len)),
            _ => None,
        };
        match value {
            Some((text, len)) => {
                out.push_str(&text);
                rest = &tail[len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandCatalog;
    use crate::decode::decode;

    #[test]
    fn test_render_layout() {
        let command = CommandCatalog::new().lookup("603");
        let decoded = decode(&command, "1005");
        let event = Event::new(command, "1005", decoded, crate::catalog::Priority::Critical, 0);

        let rendered = render_layout("[{priority}] {event}", &event, &NameTables::default());
        assert_eq!(rendered, "[Critical] Zone Tamper - Partition 1 - Zone 005");

        let rendered = render_layout(DEFAULT_LAYOUT, &event, &NameTables::default());
        assert!(rendered.starts_with('['));
        assert!(rendered.ends_with("[Critical] Zone Tamper - Partition 1 - Zone 005"));
    }

    #[test]
    fn test_render_layout_does_not_expand_substituted_text() {
        let command = CommandCatalog::new().lookup("609");
        let decoded = decode(&command, "005");
        let event = Event::new(command, "005", decoded, crate::catalog::Priority::Low, 0);
        let names = NameTables::new(
            [("005".to_string(), "{priority} {event}".to_string())].into(),
            Default::default(),
        );

        let rendered = render_layout("{priority}|{event}|{unknown}|{", &event, &names);
        assert_eq!(rendered, "Low|Zone Open - {priority} {event}|{unknown}|{");
    }
}
