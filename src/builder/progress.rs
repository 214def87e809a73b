//! Compile and link progress tracking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;

/// Progress shared by every worker of a build.
///
/// Clones share the same counters and bar.
#[derive(Clone)]
pub struct BuildProgress {
    compiled: Arc<AtomicUsize>,
    linked: Arc<AtomicUsize>,
    total_compile: usize,
    total_link: usize,
    bar: ProgressBar,
}

impl BuildProgress {
    /// Create a new progress tracker with no visible bar.
    pub fn new(total_compile: usize, total_link: usize) -> Self {
        BuildProgress {
            compiled: Arc::new(AtomicUsize::new(0)),
            linked: Arc::new(AtomicUsize::new(0)),
            total_compile,
            total_link,
            bar: ProgressBar::hidden(),
        }
    }

    /// Report through `bar`.
    pub fn with_bar(mut self, bar: ProgressBar) -> Self {
        self.bar = bar;
        self
    }

    /// Record a completed compilation.
    pub fn compiled(&self, unit: &str) {
        self.compiled.fetch_add(1, Ordering::SeqCst);
        self.bar.set_message(unit.to_string());
        self.bar.inc(1);
    }

    /// Record a completed link.
    pub fn linked(&self, target: &str) {
        self.linked.fetch_add(1, Ordering::SeqCst);
        self.bar.set_message(target.to_string());
        self.bar.inc(1);
    }

    /// Get current compilation count.
    pub fn compile_count(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }

    /// Get current link count.
    pub fn link_count(&self) -> usize {
        self.linked.load(Ordering::SeqCst)
    }

    /// Get total expected steps (compile + link).
    pub fn total(&self) -> usize {
        self.total_compile + self.total_link
    }

    /// Check if build is complete.
    pub fn is_complete(&self) -> bool {
        self.compile_count() >= self.total_compile && self.link_count() >= self.total_link
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
