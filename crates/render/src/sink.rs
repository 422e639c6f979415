use std::sync::Arc;

use parking_lot::Mutex;

use crate::frame::RenderFrame;

/// Receives every frame the engine produces.
pub trait RenderSink: Send {
    fn present(&mut self, frame: &RenderFrame);
}

impl<F> RenderSink for F
where
    F: FnMut(&RenderFrame) + Send,
{
    fn present(&mut self, frame: &RenderFrame) {
        self(frame)
    }
}

/// Keeps every presented frame; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<RenderFrame>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<RenderFrame> {
        self.frames.lock().clone()
    }

    pub fn last(&self) -> Option<RenderFrame> {
        self.frames.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RenderSink for RecordingSink {
    fn present(&mut self, frame: &RenderFrame) {
        self.frames.lock().push(frame.clone());
    }
}
