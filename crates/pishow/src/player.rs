//! The content loop.
//!
//! Each pass shows the stdin batch (when enabled) and then every entry of one
//! listing of the content path, holding each on screen for the dwell time.
//! The loop repeats until it is interrupted or, in single-pass mode, after the
//! first pass.

use std::future::Future;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::pin::Pin;
use tracing::{debug, info, warn};

use crate::config::RenderConfig;
use crate::content::{self, ContentEntry, ContentItem, StdinSource};
use crate::rendering::Canvas;

/// Resolves when the process has been asked to stop.
pub type Shutdown = Pin<Box<dyn Future<Output = ()>>>;

/// What happened during one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Items drawn and held for the dwell time.
    pub shown: usize,
    /// Entries gone by the time their turn came.
    pub skipped: usize,
    /// Items that failed to load or draw.
    pub failed: usize,
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Single-pass mode finished its pass.
    Completed,
    /// A shutdown signal arrived during a dwell.
    Interrupted,
}

/// Runs the content loop against one canvas.
pub struct Player<C: Canvas> {
    canvas: C,
    render: RenderConfig,
    content_path: PathBuf,
    once: bool,
    stdin: Option<StdinSource>,
    shutdown: Shutdown,
}

impl<C: Canvas> Player<C> {
    pub fn new(canvas: C, render: RenderConfig, content_path: PathBuf) -> Self {
        Self {
            canvas,
            render,
            content_path,
            once: false,
            stdin: None,
            shutdown: Box::pin(std::future::pending()),
        }
    }

    /// Stop after the first pass.
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Show text from standard input at the start of every pass.
    pub fn with_stdin(mut self, stdin: Option<StdinSource>) -> Self {
        self.stdin = stdin;
        self
    }

    /// Future that interrupts the loop during a dwell.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// Loops over the content until interrupted or the single pass is done.
    pub async fn run(&mut self) -> Exit {
        let mut pass = 0u64;
        loop {
            pass += 1;
            let summary = match self.run_pass().await {
                ControlFlow::Break(()) => {
                    info!("Interrupted, exiting");
                    return Exit::Interrupted;
                }
                ControlFlow::Continue(summary) => summary,
            };
            debug!(
                "Pass {} done: {} shown, {} skipped, {} failed",
                pass, summary.shown, summary.skipped, summary.failed
            );

            if self.once {
                info!("Single pass complete, exiting");
                return Exit::Completed;
            }

            // Nothing was held on screen, so wait out one dwell before rescanning.
            if summary.shown == 0 && self.idle().await.is_break() {
                info!("Interrupted, exiting");
                return Exit::Interrupted;
            }
        }
    }

    /// Runs one pass. Breaks if a shutdown arrives during a dwell.
    pub async fn run_pass(&mut self) -> ControlFlow<(), PassSummary> {
        let mut summary = PassSummary::default();

        let batch = self.stdin.as_mut().map(StdinSource::read_batch);
        if let Some(lines) = batch {
            if lines.is_empty() {
                debug!("No stdin input this pass");
            } else {
                self.show(&ContentItem::TextBlock { lines }, "stdin", &mut summary)
                    .await?;
            }
        }

        let entries = content::list(&self.content_path);
        debug!(
            "Listed {} entries in {}",
            entries.len(),
            self.content_path.display()
        );

        for entry in &entries {
            self.show_entry(entry, &mut summary).await?;
        }

        ControlFlow::Continue(summary)
    }

    async fn show_entry(
        &mut self,
        entry: &ContentEntry,
        summary: &mut PassSummary,
    ) -> ControlFlow<()> {
        let item = match entry.load() {
            Ok(Some(item)) => item,
            Ok(None) => {
                debug!("{} disappeared since listing, skipping", entry.path.display());
                summary.skipped += 1;
                return ControlFlow::Continue(());
            }
            Err(e) => {
                warn!("{}", e);
                summary.failed += 1;
                return ControlFlow::Continue(());
            }
        };

        let label = entry.path.display().to_string();
        self.show(&item, &label, summary).await
    }

    async fn show(
        &mut self,
        item: &ContentItem,
        label: &str,
        summary: &mut PassSummary,
    ) -> ControlFlow<()> {
        self.canvas.clear();
        let drawn = match item {
            ContentItem::TextBlock { lines } => self.canvas.draw_text_lines(lines, &self.render),
            ContentItem::ImageFile { path } => self.canvas.draw_image(path),
        };
        if let Err(e) = drawn.and_then(|()| self.canvas.flush()) {
            warn!("{}", e);
            self.canvas.release();
            summary.failed += 1;
            return ControlFlow::Continue(());
        }

        debug!("Showing {}", label);
        summary.shown += 1;
        self.dwell().await
    }

    /// Holds the flushed item on screen, then releases it.
    async fn dwell(&mut self) -> ControlFlow<()> {
        let flow = self.idle().await;
        self.canvas.release();
        flow
    }

    /// Sleeps for the dwell time unless a shutdown arrives first.
    async fn idle(&mut self) -> ControlFlow<()> {
        tokio::select! {
            _ = tokio::time::sleep(self.render.dwell) => ControlFlow::Continue(()),
            _ = &mut self.shutdown => ControlFlow::Break(()),
        }
    }
}
