//! Long-lived log stream over a chunked HTTP response.

use bytes::Bytes;

use crate::remote::{ApiFuture, LogStream, RemoteError};

/// Log stream backed by an open chunked response.
///
/// The response is dropped on end-of-stream and on interruption, so a
/// finished stream keeps answering `None` instead of re-polling a dead
/// connection.
pub(super) struct HttpLogStream {
    id: String,
    response: Option<reqwest::Response>,
}

impl HttpLogStream {
    pub(super) fn new(id: &str, response: reqwest::Response) -> Self {
        Self {
            id: id.to_owned(),
            response: Some(response),
        }
    }
}

impl LogStream for HttpLogStream {
    fn next_chunk(&mut self) -> ApiFuture<'_, Option<Bytes>> {
        Box::pin(async move {
            let Some(mut response) = self.response.take() else {
                return Ok(None);
            };
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    self.response = Some(response);
                    Ok(Some(chunk))
                }
                Ok(None) => Ok(None),
                Err(err) => Err(RemoteError::LogStreamInterrupted {
                    id: self.id.clone(),
                    detail: err.to_string(),
                }),
            }
        })
    }
}
