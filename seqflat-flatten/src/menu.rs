//! Explicit context-menu registration
//!
//! Host integrations build a registry at startup and ask it which entries to
//! show when a context menu opens. There is no global registry.

use std::collections::HashMap;

/// Host views that can show a context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuContext {
    Timeline,
    Spreadsheet,
}

/// Action titles registered per menu context, in registration order
#[derive(Debug, Clone, Default)]
pub struct ContextMenuRegistry {
    entries: HashMap<MenuContext, Vec<String>>,
}

impl ContextMenuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `title` for `context`. Returns `false` if it was already there.
    pub fn register(&mut self, context: MenuContext, title: &str) -> bool {
        let titles = self.entries.entry(context).or_default();
        if titles.iter().any(|existing| existing == title) {
            return false;
        }
        titles.push(title.to_string());
        true
    }

    /// Removes `title` from every context
    pub fn unregister(&mut self, title: &str) {
        for titles in self.entries.values_mut() {
            titles.retain(|existing| existing != title);
        }
    }

    /// Titles to insert when the menu for `context` opens
    pub fn entries_for(&self, context: MenuContext) -> &[String] {
        self.entries
            .get(&context)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
