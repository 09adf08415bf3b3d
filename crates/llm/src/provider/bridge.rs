//! Turns a push-style producer into a pull-style fragment stream.
//!
//! The producer runs as its own task and hands fragments over a channel with
//! room for a single item, so it is suspended until the consumer has taken
//! the previous one. Dropping the stream aborts the task.

use std::future::Future;

use futures::stream;
use tokio::sync::mpsc;
use tokio_util::task::AbortOnDropHandle;

use super::{Fragment, FragmentStream};
use crate::error::LlmError;

const BRIDGE_CAPACITY: usize = 1;

/// The producer's end of the bridge.
pub(crate) struct FragmentSink {
    sender: mpsc::Sender<crate::Result<Fragment>>,
}

impl FragmentSink {
    /// Hand over a fragment, waiting until the consumer has room for it.
    ///
    /// Returns false once the consumer is gone, the producer should stop.
    pub(crate) async fn emit(&self, fragment: Fragment) -> bool {
        self.sender.send(Ok(fragment)).await.is_ok()
    }

    /// Hand over the terminal error of the sequence.
    pub(crate) async fn fail(self, error: LlmError) {
        // nobody left to tell
        let _ = self.sender.send(Err(error)).await;
    }
}

/// Spawn the producer and return the consumer's end.
///
/// The stream ends when the producer returns and every handed over item has been taken.
pub(crate) fn bridge<F, Fut>(producer: F) -> FragmentStream
where
    F: FnOnce(FragmentSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(BRIDGE_CAPACITY);
    let task = AbortOnDropHandle::new(tokio::spawn(producer(FragmentSink { sender })));

    let fragments = stream::unfold((receiver, task), |(mut receiver, task)| async move {
        let item = receiver.recv().await?;
        Some((item, (receiver, task)))
    });

    Box::pin(fragments)
}
