//! HTTP implementation of the remote service seam.
//!
//! Thin `reqwest` plumbing: every method formats an endpoint URL, attaches
//! the bearer credential, sends one request, and maps non-success responses
//! to the typed error for that operation. No retries anywhere.

mod files;
mod jobs;
mod stream;

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;

use crate::auth::Credential;
use crate::config::{ConfigError, ServiceConfig};
use crate::remote::{
    ApiFuture, DeletionReceipt, DirectoryReceipt, DownloadDescriptor, FetchReceipt, FetchRequest,
    FileEntry, JobReceipt, LogStream, MoveOutcome, MoveRequest, RemoteError, RemoteService,
    SubmitRequest, UploadReceipt, WorkbenchEntry, WorkbenchReceipt,
};
use crate::status::JobStatus;

/// Client for the workbench service HTTP API.
///
/// Two underlying clients are held: one with a generous total-request
/// deadline for ordinary calls, and one bounded only on connection
/// establishment so long-lived log streams are never cut off mid-flight.
#[derive(Clone, Debug)]
pub struct HttpRemoteService {
    client: reqwest::Client,
    stream_client: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl HttpRemoteService {
    /// Constructs a client from validated configuration and an explicit
    /// credential.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails validation or
    /// the underlying HTTP clients cannot be built.
    pub fn new(config: &ServiceConfig, credential: Credential) -> Result<Self, ConfigError> {
        config.validate()?;
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|err| ConfigError::Parse(err.to_string()))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|err| ConfigError::Parse(err.to_string()))?;
        Ok(Self {
            client,
            stream_client,
            base_url: config.trimmed_base_url().to_owned(),
            credential,
        })
    }

    /// Returns the credential this client presents.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(bearer) = self.credential.bearer() else {
            return request;
        };
        request.header(header::AUTHORIZATION, bearer)
    }

    /// Sends a request, mapping transport failures and auth-style
    /// rejections to [`RemoteError::RemoteOperation`]. Other non-success
    /// statuses are left for per-operation mapping.
    async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<reqwest::Response, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| RemoteError::RemoteOperation {
                operation: operation.to_owned(),
                detail: err.to_string(),
            })?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::RemoteOperation {
                operation: operation.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        Ok(response)
    }
}

/// Renders a non-success response as `HTTP <status>[: <body>]`.
async fn failure_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {trimmed}")
    }
}

/// Decodes a success payload, mapping decode failures to
/// [`RemoteError::RemoteOperation`].
async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T, RemoteError> {
    response
        .json::<T>()
        .await
        .map_err(|err| RemoteError::RemoteOperation {
            operation: operation.to_owned(),
            detail: format!("invalid response payload: {err}"),
        })
}

impl RemoteService for HttpRemoteService {
    fn create_workbench<'a>(&'a self, name: &'a str) -> ApiFuture<'a, WorkbenchReceipt> {
        Box::pin(self.create_workbench_request(name))
    }

    fn list_workbenches(&self) -> ApiFuture<'_, Vec<WorkbenchEntry>> {
        Box::pin(self.list_workbenches_request())
    }

    fn list_files<'a>(
        &'a self,
        workbench: &'a str,
        path: Option<&'a str>,
    ) -> ApiFuture<'a, Vec<FileEntry>> {
        Box::pin(self.list_files_request(workbench, path))
    }

    fn upload_file<'a>(
        &'a self,
        workbench: &'a str,
        destination: &'a str,
        payload: Vec<u8>,
    ) -> ApiFuture<'a, UploadReceipt> {
        Box::pin(self.upload_file_request(workbench, destination, payload))
    }

    fn fetch_by_url<'a>(
        &'a self,
        workbench: &'a str,
        request: &'a FetchRequest,
    ) -> ApiFuture<'a, FetchReceipt> {
        Box::pin(self.fetch_by_url_request(workbench, request))
    }

    fn download_file<'a>(
        &'a self,
        workbench: &'a str,
        file_path: &'a str,
    ) -> ApiFuture<'a, DownloadDescriptor> {
        Box::pin(self.download_file_request(workbench, file_path))
    }

    fn move_file<'a>(
        &'a self,
        workbench: &'a str,
        request: &'a MoveRequest,
    ) -> ApiFuture<'a, MoveOutcome> {
        Box::pin(self.move_file_request(workbench, request))
    }

    fn create_directory<'a>(
        &'a self,
        workbench: &'a str,
        path: &'a str,
    ) -> ApiFuture<'a, DirectoryReceipt> {
        Box::pin(self.create_directory_request(workbench, path))
    }

    fn delete_path<'a>(
        &'a self,
        workbench: &'a str,
        path: &'a str,
    ) -> ApiFuture<'a, DeletionReceipt> {
        Box::pin(self.delete_path_request(workbench, path))
    }

    fn submit_job<'a>(
        &'a self,
        workbench: &'a str,
        request: &'a SubmitRequest,
    ) -> ApiFuture<'a, JobReceipt> {
        Box::pin(self.submit_job_request(workbench, request))
    }

    fn job_status<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Option<JobStatus>> {
        Box::pin(self.job_status_request(id))
    }

    fn job_logs<'a>(&'a self, id: &'a str) -> ApiFuture<'a, String> {
        Box::pin(self.job_logs_request(id))
    }

    fn stream_job_logs<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Box<dyn LogStream>> {
        Box::pin(self.stream_job_logs_request(id))
    }
}

#[cfg(test)]
mod tests {
    use super::HttpRemoteService;
    use crate::auth::Credential;
    use crate::config::{ConfigError, ServiceConfig};

    fn config() -> ServiceConfig {
        ServiceConfig {
            base_url: String::from("https://api.example.test/"),
            request_timeout_secs: 300,
            connect_timeout_secs: 10,
        }
    }

    #[test]
    fn new_rejects_invalid_configuration() {
        let mut cfg = config();
        cfg.base_url = String::new();
        let err = HttpRemoteService::new(&cfg, Credential::absent())
            .err()
            .unwrap_or_else(|| panic!("blank base URL should be rejected"));
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn endpoint_joins_base_without_double_slash() {
        let service = HttpRemoteService::new(&config(), Credential::new("tok"))
            .unwrap_or_else(|err| panic!("client should build: {err}"));
        assert_eq!(
            service.endpoint("/workbench/demo/run"),
            "https://api.example.test/workbench/demo/run"
        );
    }
}
