//! Workbench provisioning and file operation endpoints.

use reqwest::multipart;

use super::{HttpRemoteService, failure_detail, parse_json};
use crate::remote::{
    DeletionReceipt, DirectoryReceipt, DownloadDescriptor, FileEntry, MoveOutcome, MoveRequest,
    RemoteError, UploadReceipt, WorkbenchEntry, WorkbenchReceipt,
};

impl HttpRemoteService {
    pub(super) async fn create_workbench_request(
        &self,
        name: &str,
    ) -> Result<WorkbenchReceipt, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{name}"));
        let response = self.send(self.client.post(url), "create_workbench").await?;
        if !response.status().is_success() {
            return Err(RemoteError::Provisioning {
                workbench: name.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "create_workbench").await
    }

    pub(super) async fn list_workbenches_request(
        &self,
    ) -> Result<Vec<WorkbenchEntry>, RemoteError> {
        let url = self.endpoint("/workbench/me");
        let response = self.send(self.client.get(url), "list_workbenches").await?;
        if !response.status().is_success() {
            return Err(RemoteError::Listing {
                scope: String::from("workbenches"),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "list_workbenches").await
    }

    pub(super) async fn list_files_request(
        &self,
        workbench: &str,
        path: Option<&str>,
    ) -> Result<Vec<FileEntry>, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{workbench}"));
        let mut request = self.client.get(url);
        if let Some(prefix) = path {
            request = request.query(&[("path", prefix)]);
        }
        let response = self.send(request, "list_files").await?;
        if !response.status().is_success() {
            return Err(RemoteError::Listing {
                scope: workbench.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "list_files").await
    }

    pub(super) async fn upload_file_request(
        &self,
        workbench: &str,
        destination: &str,
        payload: Vec<u8>,
    ) -> Result<UploadReceipt, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{workbench}/upload"));
        let part = multipart::Part::bytes(payload).file_name(destination.to_owned());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .send(self.client.post(url).multipart(form), "upload_file")
            .await?;
        if !response.status().is_success() {
            return Err(RemoteError::Upload {
                destination: destination.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "upload_file").await
    }

    pub(super) async fn download_file_request(
        &self,
        workbench: &str,
        file_path: &str,
    ) -> Result<DownloadDescriptor, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{workbench}/download"));
        let request = self.client.get(url).query(&[("file_path", file_path)]);
        let response = self.send(request, "download_file").await?;
        if !response.status().is_success() {
            return Err(RemoteError::Download {
                file_path: file_path.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "download_file").await
    }

    /// Moves a file. Non-success responses are folded into the returned
    /// [`MoveOutcome`] instead of raising, so reorganisation scripts can
    /// continue past individual misses.
    pub(super) async fn move_file_request(
        &self,
        workbench: &str,
        request: &MoveRequest,
    ) -> Result<MoveOutcome, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{workbench}/move-file"));
        let response = self
            .send(self.client.post(url).json(request), "move_file")
            .await?;
        if !response.status().is_success() {
            return Ok(MoveOutcome {
                message: failure_detail(response).await,
            });
        }
        parse_json(response, "move_file").await
    }

    pub(super) async fn create_directory_request(
        &self,
        workbench: &str,
        path: &str,
    ) -> Result<DirectoryReceipt, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{workbench}/create-directory"));
        let request = self.client.post(url).query(&[("path", path)]);
        let response = self.send(request, "create_directory").await?;
        if !response.status().is_success() {
            return Err(RemoteError::Directory {
                path: path.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "create_directory").await
    }

    pub(super) async fn delete_path_request(
        &self,
        workbench: &str,
        path: &str,
    ) -> Result<DeletionReceipt, RemoteError> {
        let url = self.endpoint(&format!("/workbench/{workbench}/delete-path"));
        let request = self.client.delete(url).query(&[("path", path)]);
        let response = self.send(request, "delete_path").await?;
        if !response.status().is_success() {
            return Err(RemoteError::Deletion {
                path: path.to_owned(),
                detail: failure_detail(response).await,
            });
        }
        parse_json(response, "delete_path").await
    }
}
