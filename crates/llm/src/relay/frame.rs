use axum::body::Bytes;
use itertools::Itertools;

use crate::{error::LlmError, provider::Fragment};

/// One outbound SSE event. The payload never contains a line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutboundEvent(String);

impl OutboundEvent {
    fn data(line: &str) -> Self {
        Self(line.to_string())
    }

    /// The inline report of a failure after the response was committed.
    pub(crate) fn error(error: &LlmError) -> Self {
        let message = error
            .client_message()
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .join(" ");

        Self(format!("Error: {message}"))
    }

    #[cfg(test)]
    pub(crate) fn payload(&self) -> &str {
        &self.0
    }

    /// The wire form, `data: <payload>` followed by a blank line.
    pub(crate) fn encode(&self) -> Bytes {
        Bytes::from(format!("data: {}\n\n", self.0))
    }
}

/// Split a fragment into one event per line.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. An empty fragment is one empty event.
pub(crate) fn reframe(fragment: &Fragment) -> impl Iterator<Item = OutboundEvent> + '_ {
    fragment
        .as_str()
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
        .map(OutboundEvent::data)
}
