//! Debug panel: named scalars pushed by the simulation, shown as text.

use std::collections::HashMap;

/// Write-only sink for per-tick debug values.
pub trait TelemetrySink {
    fn report(&mut self, name: &str, value: String);
}

/// Ordered name/value table, the headless stand-in for the on-screen debug panel.
#[derive(Debug, Default)]
pub struct DebugPanel {
    index: HashMap<String, usize>,
    entries: Vec<(String, String)>,
}

impl DebugPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row with an empty value. Registering twice is a no-op.
    pub fn register_var(&mut self, name: &str) {
        if !self.index.contains_key(name) {
            self.index.insert(name.to_string(), self.entries.len());
            self.entries.push((name.to_string(), String::new()));
        }
    }

    /// Set a row's value, registering it first if needed.
    pub fn update_var(&mut self, name: &str, value: String) {
        self.register_var(name);
        let slot = self.index[name];
        self.entries[slot].1 = value;
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&slot| self.entries[slot].1.as_str())
    }

    /// Rows in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Single-line `name=value` summary for logging.
    pub fn summary(&self) -> String {
        self.entries()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TelemetrySink for DebugPanel {
    fn report(&mut self, name: &str, value: String) {
        self.update_var(name, value);
    }
}
