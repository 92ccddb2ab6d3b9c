use crate::record::EndRequest;
use std::borrow::Cow;

/// The outcome of [`Client::send_request`](crate::Client::send_request)
///
/// A response is only successful if the application sent `STDOUT` for the request before ending
/// it. Unsuccessful responses may still carry content, e.g. `STDERR` output, or `STDOUT` that
/// arrived before the deadline cut the request short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub(crate) success: bool,
    pub(crate) content: Vec<u8>,
    pub(crate) end_request: Option<EndRequest>,
}

impl Response {
    pub(crate) fn failed() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The content of the response's `STDOUT`/`STDERR` records
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// The application's `FCGI_END_REQUEST` record, if one arrived and was well formed
    pub fn end_request(&self) -> Option<&EndRequest> {
        self.end_request.as_ref()
    }
}
