use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

/// The producing half of a one-shot result slot
///
/// `resolve` consumes the completion, so a slot can never be written twice. The reactor keeps
/// completions inside an `Option` and only resolves what it `take()`s out of it.
#[derive(Debug)]
pub(crate) struct Completion<T>(SyncSender<T>);

/// The waiting half of a one-shot result slot
#[derive(Debug)]
pub(crate) struct Pending<T>(Receiver<T>);

pub(crate) fn oneshot<T>() -> (Completion<T>, Pending<T>) {
    // A capacity of one means `resolve` never blocks the reactor thread
    let (tx, rx) = sync_channel(1);
    (Completion(tx), Pending(rx))
}

impl<T> Completion<T> {
    pub(crate) fn resolve(self, value: T) {
        // The waiter may have gone away. Nobody is left to tell.
        let _ = self.0.send(value);
    }
}

impl<T> Pending<T> {
    /// Blocks until the slot is resolved.
    ///
    /// Returns `None` if the completion was dropped without being resolved.
    pub(crate) fn wait(self) -> Option<T> {
        self.0.recv().ok()
    }
}
