//! Job submission, status, and log endpoints.

use reqwest::StatusCode;
use serde::Deserialize;

use super::stream::HttpLogStream;
use super::{HttpRemoteService, failure_detail, parse_json};
use crate::remote::{FetchReceipt, FetchRequest, JobReceipt, LogStream, RemoteError, SubmitRequest};
use crate::status::JobStatus;

/// Wire shape of the status endpoint payload.
#[derive(Debug, Deserialize)]
struct StatusPayload {
    state: String,
}

impl HttpRemoteService {
    pub(super) async fn submit_job_request(
        &self,
        workbench: &str,
        request: &SubmitRequest,
    ) -> Result<JobReceipt, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{workbench}/run"));
        let response = self
            .send(self.client.post(url).json(request), "submit_job")
            .await?;
        if !response.status().is_success() {
            return Err(RemoteError::Submission {
                workbench: workbench.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "submit_job").await
    }

    pub(super) async fn fetch_by_url_request(
        &self,
        workbench: &str,
        request: &FetchRequest,
    ) -> Result<FetchReceipt, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{workbench}/upload/file-url"));
        let response = self
            .send(self.client.post(url).json(request), "fetch_by_url")
            .await?;
        if !response.status().is_success() {
            return Err(RemoteError::Submission {
                workbench: workbench.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "fetch_by_url").await
    }

    /// Queries a job's status. A 404 means the record is not visible on the
    /// service, which callers normalise to `NotStarted`; any other
    /// non-success status is a query failure.
    pub(super) async fn job_status_request(
        &self,
        id: &str,
    ) -> Result<Option<JobStatus>, RemoteError> {
        let url = self.endpoint(&format!("/jobs/{id}"));
        let response = self.send(self.client.get(url), "job_status").await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RemoteError::ExecutionQuery {
                id: id.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        let payload: StatusPayload = parse_json(response, "job_status").await?;
        Ok(Some(JobStatus::from_wire(&payload.state)?))
    }

    pub(super) async fn job_logs_request(&self, id: &str) -> Result<String, RemoteError> {
        let url = self.endpoint(&format!("/jobs/{id}/logs"));
        let response = self.send(self.client.get(url), "job_logs").await?;
        if !response.status().is_success() {
            return Err(RemoteError::LogRetrieval {
                id: id.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        response
            .text()
            .await
            .map_err(|err| RemoteError::LogRetrieval {
                id: id.to_owned(),
                detail: err.to_string(),
            })
    }

    pub(super) async fn stream_job_logs_request(
        &self,
        id: &str,
    ) -> Result<Box<dyn LogStream>, RemoteError> {
        let url = self.endpoint(&format!("/jobs/{id}/logs/stream"));
        let response = self
            .send(self.stream_client.get(url), "stream_job_logs")
            .await?;
        if !response.status().is_success() {
            return Err(RemoteError::LogRetrieval {
                id: id.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        Ok(Box::new(HttpLogStream::new(id, response)))
    }
}
