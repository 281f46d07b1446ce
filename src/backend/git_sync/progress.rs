use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClonePhase {
    Receiving,
    Resolving,
    Checkout,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub phase: ClonePhase,
    pub received: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Cooperative cancellation flag shared between the caller and the transfer
/// callbacks of an in-flight git operation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sink for progress events. A dropped receiver never fails the operation;
/// events are simply discarded from then on.
pub struct ProgressSink {
    tx: Option<Sender<ProgressEvent>>,
}

impl ProgressSink {
    pub fn channel() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (ProgressSink { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        ProgressSink { tx: None }
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn emitting_after_receiver_drop_is_harmless() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.emit(ProgressEvent {
            phase: ClonePhase::Receiving,
            received: 1,
            total: 10,
            message: None,
        });
    }
}
