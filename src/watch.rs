//! Watch rows and the reconciliation pass that keeps them in sync with the
//! debugger and the color pool.

use serde::Serialize;
use tracing::{debug, warn};

#[cfg(debug_assertions)]
use tracing::instrument;

use crate::color_pool::{ColorId, ColorIdPool, PoolError};
use crate::debugger::{Debugger, Evaluation};
use crate::theme::{Rgba, Theme};

/// One watched expression.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEntry {
    /// Expression text; empty for the trailing placeholder row
    pub text: String,
    /// Type reported by the last successful evaluation
    pub type_name: Option<String>,
    /// Palette slot held by this row, if one was assigned
    pub color_id: Option<ColorId>,
    /// Display color derived from the theme
    pub color: Rgba,
}

impl WatchEntry {
    pub fn new(
        text: impl Into<String>,
        type_name: Option<String>,
        color_id: Option<ColorId>,
        theme: &Theme,
    ) -> Self {
        Self {
            text: text.into(),
            type_name,
            color_id,
            color: theme.color_or_fallback(color_id),
        }
    }

    pub fn placeholder(theme: &Theme) -> Self {
        Self::new(String::new(), None, None, theme)
    }

    pub fn is_placeholder(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_resolved(&self) -> bool {
        self.type_name.is_some()
    }
}

/// Counters from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Rows sent to the debugger
    pub evaluated: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Color ids handed out during the pass
    pub colors_assigned: usize,
    /// Resolved rows left uncolored because the pool was empty
    pub exhausted: usize,
}

/// Ordered watch rows, always ending with the placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchList {
    entries: Vec<WatchEntry>,
}

impl WatchList {
    pub fn new(theme: &Theme) -> Self {
        Self {
            entries: vec![WatchEntry::placeholder(theme)],
        }
    }

    pub fn entries(&self) -> &[WatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WatchEntry> {
        self.entries.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Whether any row carries an expression.
    pub fn has_expressions(&self) -> bool {
        self.entries.iter().any(|e| !e.is_placeholder())
    }

    /// Replace the text of a row without evaluating it.
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Re-evaluate rows and rebuild every entry from the current theme.
    ///
    /// With `modified == Some(i)` only row `i` is evaluated; every other row
    /// keeps its stored type and color id. With `None` all rows are evaluated.
    #[cfg_attr(debug_assertions, instrument(skip(self, debugger, pool, theme)))]
    pub fn reconcile<D>(
        &mut self,
        modified: Option<usize>,
        debugger: &D,
        pool: &mut ColorIdPool,
        theme: &Theme,
    ) -> ReconcileReport
    where
        D: Debugger + ?Sized,
    {
        let mut report = ReconcileReport::default();

        for (index, entry) in self.entries.iter_mut().enumerate() {
            let mut type_name = entry.type_name.take();
            let mut color_id = entry.color_id;

            let update_required = modified.is_none_or(|m| m == index);
            if update_required && !entry.is_placeholder() {
                report.evaluated += 1;
                match debugger.evaluate(&entry.text) {
                    Evaluation::Valid { type_name: ty, .. } => {
                        report.resolved += 1;
                        debug!(index, expression = %entry.text, type_name = %ty, "Resolved");
                        type_name = Some(ty);
                        if color_id.is_none() {
                            match pool.allocate() {
                                Ok(id) => {
                                    report.colors_assigned += 1;
                                    color_id = Some(id);
                                }
                                Err(PoolError::Exhausted { capacity }) => {
                                    report.exhausted += 1;
                                    warn!(
                                        index,
                                        expression = %entry.text,
                                        capacity,
                                        "Palette exhausted, row left uncolored"
                                    );
                                }
                                Err(e) => warn!(index, error = %e, "Color allocation failed"),
                            }
                        }
                    }
                    Evaluation::Invalid { reason } => {
                        report.unresolved += 1;
                        debug!(index, expression = %entry.text, %reason, "Unresolved");
                        type_name = None;
                    }
                }
            }

            let text = std::mem::take(&mut entry.text);
            *entry = WatchEntry::new(text, type_name, color_id, theme);
        }

        report
    }

    /// Recompute display colors after a theme change without evaluating.
    pub fn recolor(&mut self, theme: &Theme) {
        for entry in &mut self.entries {
            entry.color = theme.color_or_fallback(entry.color_id);
        }
    }

    /// Remove one row, returning its color id to the pool.
    pub fn remove(&mut self, index: usize, pool: &mut ColorIdPool) -> Option<WatchEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        if let Some(id) = entry.color_id {
            let released = pool.release(id);
            debug_assert!(released.is_ok(), "row {index} held color id {id}: {released:?}");
            if let Err(e) = released {
                warn!(index, id, error = %e, "Failed to release color");
            }
        }
        Some(entry)
    }

    pub fn insert_placeholder(&mut self, index: usize, theme: &Theme) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, WatchEntry::placeholder(theme));
    }

    /// Remove a batch of rows, highest index first.
    ///
    /// A row is removed only if it is not the last row at the time of its
    /// removal; the length is re-read after every removal. Returns the number
    /// of rows removed.
    pub fn delete_rows(&mut self, indices: &[usize], pool: &mut ColorIdPool) -> usize {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        let mut removed = 0;
        for index in sorted {
            if index + 1 < self.entries.len() {
                self.remove(index, pool);
                removed += 1;
            } else {
                debug!(index, "Skipped delete of last row");
            }
        }
        removed
    }
}
