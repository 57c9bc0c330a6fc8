//! Scripted documents for replaying saved pages
//!
//! A [`ScriptedDocument`] serves a sequence of HTML frames: each scroll
//! advances to the next frame, standing in for lazily loaded list pages.
//! Every call is recorded with a timestamp from the tokio clock, so paused
//! time tests can assert on scroll cadence.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

use super::config::ViewportConfig;
use super::document::{Document, PageOpener};
use super::harvest_error::{HarvestError, HarvestResult};

/// One operation invoked on a scripted document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentCall {
    ScrollBy(u32),
    ScrollToBottom,
    ViewportHeight,
    Content,
    Url,
}

impl DocumentCall {
    pub const fn is_scroll(self) -> bool {
        matches!(self, Self::ScrollBy(_) | Self::ScrollToBottom)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordedCall {
    pub call: DocumentCall,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct ScriptState {
    frame: usize,
    calls: Vec<RecordedCall>,
    detach_after: Option<usize>,
    operations: usize,
}

/// In-memory document driven by pre-rendered HTML frames
#[derive(Debug)]
pub struct ScriptedDocument {
    url: String,
    frames: Vec<String>,
    viewport_height: u32,
    state: Mutex<ScriptState>,
}

impl ScriptedDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self::with_frames(url, vec![html.into()])
    }

    /// Frames in load order; scrolling past the last frame keeps showing it
    pub fn with_frames(url: impl Into<String>, frames: Vec<String>) -> Self {
        Self {
            url: url.into(),
            frames,
            viewport_height: crate::infrastructure::config::defaults::VIEWPORT_HEIGHT,
            state: Mutex::new(ScriptState::default()),
        }
    }

    #[must_use]
    pub const fn with_viewport_height(mut self, height: u32) -> Self {
        self.viewport_height = height;
        self
    }

    /// Fail every operation after the first `operations` calls, like a closed tab
    #[must_use]
    pub fn detach_after(self, operations: usize) -> Self {
        self.lock().detach_after = Some(operations);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn scroll_calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.iter().copied().filter(|c| c.call.is_scroll()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call that needs no further state
    fn check_attached(&self, call: DocumentCall, operation: &str) -> HarvestResult<()> {
        self.record(call, operation).map(drop)
    }

    /// Record a call and fail it if the document has been detached
    fn record(&self, call: DocumentCall, operation: &str) -> HarvestResult<MutexGuard<'_, ScriptState>> {
        let mut state = self.lock();
        if state.detach_after.is_some_and(|limit| state.operations >= limit) {
            return Err(HarvestError::document_unavailable(operation, "document detached"));
        }
        state.operations += 1;
        state.calls.push(RecordedCall { call, at: Instant::now() });
        Ok(state)
    }

    fn advance_frame(&self, state: &mut ScriptState) {
        if state.frame + 1 < self.frames.len() {
            state.frame += 1;
        }
    }
}

#[async_trait]
impl Document for ScriptedDocument {
    async fn scroll_by(&self, pixels: u32) -> HarvestResult<()> {
        let mut state = self.record(DocumentCall::ScrollBy(pixels), "scroll_by")?;
        self.advance_frame(&mut state);
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> HarvestResult<()> {
        let mut state = self.record(DocumentCall::ScrollToBottom, "scroll_to_bottom")?;
        self.advance_frame(&mut state);
        Ok(())
    }

    async fn viewport_height(&self) -> HarvestResult<u32> {
        self.check_attached(DocumentCall::ViewportHeight, "viewport_height")?;
        Ok(self.viewport_height)
    }

    async fn content(&self) -> HarvestResult<String> {
        let state = self.record(DocumentCall::Content, "content")?;
        Ok(self.frames.get(state.frame).cloned().unwrap_or_default())
    }

    async fn url(&self) -> HarvestResult<String> {
        self.check_attached(DocumentCall::Url, "url")?;
        Ok(self.url.clone())
    }
}

/// Opens saved HTML frames instead of launching a browser
#[derive(Debug, Clone)]
pub struct ReplayOpener {
    frames: Vec<String>,
}

impl ReplayOpener {
    pub const fn new(frames: Vec<String>) -> Self {
        Self { frames }
    }
}

#[async_trait]
impl PageOpener for ReplayOpener {
    async fn open(&self, url: &str, viewport: &ViewportConfig) -> HarvestResult<Box<dyn Document>> {
        let document = ScriptedDocument::with_frames(url, self.frames.clone()).with_viewport_height(viewport.height);
        Ok(Box::new(document))
    }
}
