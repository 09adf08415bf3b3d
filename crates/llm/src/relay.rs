//! Re-frames a fragment stream into an SSE response.
//!
//! The first fragment is awaited before any header is sent. Until then a
//! failure can still become a normal JSON error response. After the headers
//! are committed, a failure is reported as one inline `Error:` event and the
//! stream ends.

mod frame;

use std::{collections::VecDeque, convert::Infallible};

use axum::{
    body::Body,
    http::{
        HeaderValue,
        header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
    },
    response::Response,
};
use futures::{StreamExt, stream};

use self::frame::{OutboundEvent, reframe};
use crate::provider::FragmentStream;

pub(crate) struct Relay {
    /// None once the sequence has ended or failed.
    fragments: Option<FragmentStream>,
    /// Events of the current fragment not yet handed to the transport.
    pending: VecDeque<OutboundEvent>,
    committed: bool,
    completed: bool,
}

impl Relay {
    pub(crate) fn new(fragments: FragmentStream) -> Self {
        Self {
            fragments: Some(fragments),
            pending: VecDeque::new(),
            committed: false,
            completed: false,
        }
    }

    /// Wait for the first fragment, before anything is committed.
    ///
    /// An error here is the whole result of the request. A sequence without
    /// any fragment is not an error, it relays as an empty event stream.
    pub(crate) async fn prime(&mut self) -> crate::Result<()> {
        let Some(fragments) = self.fragments.as_mut() else {
            return Ok(());
        };

        match fragments.next().await {
            Some(Ok(fragment)) => self.pending.extend(reframe(&fragment)),
            Some(Err(error)) => {
                self.finish();
                return Err(error);
            }
            None => self.finish(),
        }

        Ok(())
    }

    /// Commit the status and headers, and stream the rest of the sequence.
    pub(crate) fn into_response(mut self) -> Response {
        self.committed = true;

        let events = stream::unfold(self, |mut relay| async move {
            let event = relay.next_event().await?;
            Some((Ok::<_, Infallible>(event.encode()), relay))
        });

        let mut response = Response::new(Body::from_stream(events));
        let headers = response.headers_mut();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("x-accel-buffering", HeaderValue::from_static("no"));

        response
    }

    /// The next event to write. Only pulls from upstream when the previous fragment is fully written.
    async fn next_event(&mut self) -> Option<OutboundEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            let fragments = self.fragments.as_mut()?;

            match fragments.next().await {
                Some(Ok(fragment)) => self.pending.extend(reframe(&fragment)),
                Some(Err(error)) => {
                    log::error!("Generation failed after the response was committed: {error}");
                    self.finish();

                    return Some(OutboundEvent::error(&error));
                }
                None => {
                    log::debug!("Generation stream completed");
                    self.finish();

                    return None;
                }
            }
        }
    }

    fn finish(&mut self) {
        self.fragments = None;
        self.completed = true;
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        if self.committed && !self.completed {
            log::debug!("Client disconnected before the stream completed, cancelling generation");
        }
    }
}
