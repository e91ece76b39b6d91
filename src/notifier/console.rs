// MIT License - Copyright (c) 2026 Peter Wright
// Console notifier

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::catalog::Priority;
use crate::error::{Result, TpiError};
use crate::event::{Event, NameTables};
use crate::notifier::{DEFAULT_LAYOUT, Notifier, render_layout};

/// Writes one formatted line per event to stdout (or any writer).
pub struct ConsoleNotifier {
    name: String,
    threshold: Priority,
    layout: String,
    names: Arc<NameTables>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleNotifier {
    pub fn new(
        name: impl Into<String>,
        threshold: Priority,
        layout: Option<String>,
        names: Arc<NameTables>,
    ) -> Self {
        Self::with_writer(name, threshold, layout, names, Box::new(std::io::stdout()))
    }

    pub fn with_writer(
        name: impl Into<String>,
        threshold: Priority,
        layout: Option<String>,
        names: Arc<NameTables>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            name: name.into(),
            threshold,
            layout: layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
            names,
            out: Mutex::new(out),
        }
    }

    pub fn format(&self, event: &Event) -> String {
        render_layout(&self.layout, event, &self.names)
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, event: &Event) -> Result<()> {
        if event.priority < self.threshold {
            return Ok(());
        }
        let line = self.format(event);
        let mut out = self.out.lock().await;
        writeln!(out, "{line}")
            .and_then(|_| out.flush())
            .map_err(|e| TpiError::notifier(&self.name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandCatalog;
    use crate::decode::decode;

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn event(code: &str, data: &str, priority: Priority) -> Event {
        let command = CommandCatalog::new().lookup(code);
        let decoded = decode(&command, data);
        Event::new(command, data, decoded, priority, 0)
    }

    #[tokio::test]
    async fn test_priority_threshold() {
        let buf = SharedBuf::default();
        let notifier = ConsoleNotifier::with_writer(
            "console",
            Priority::High,
            Some("{priority} {event}".to_string()),
            Arc::new(NameTables::default()),
            Box::new(buf.clone()),
        );

        notifier.notify(&event("652", "10", Priority::Medium)).await.unwrap();
        assert_eq!(buf.contents(), "");

        notifier.notify(&event("603", "1005", Priority::Critical)).await.unwrap();
        assert_eq!(buf.contents(), "Critical Zone Tamper - Partition 1 - Zone 005\n");
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let buf = SharedBuf::default();
        let notifier = ConsoleNotifier::with_writer(
            "console",
            Priority::High,
            Some("{event}".to_string()),
            Arc::new(NameTables::default()),
            Box::new(buf.clone()),
        );
        notifier.notify(&event("654", "1", Priority::High)).await.unwrap();
        assert_eq!(buf.contents(), "Partition In Alarm - Partition 1\n");
    }
}
