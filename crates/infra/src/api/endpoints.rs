//! REST endpoints: folders, files, role definitions and site users
//!
//! Each call builds a URL under `<host><site>_api/web` and hands a
//! descriptor to the engine. Paths are server-relative
//! (`/sites/dev/Shared Documents/report.pdf`).

use std::path::Path;

use serde_json::json;
use sprest_domain::constants::ODATA_VERBOSE_JSON;
use sprest_domain::{Result, RoleDefinition, User};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::client::SharePointClient;
use super::paths::{file_url, folder_url, odata_quote, split_server_relative};
use crate::engine::{RequestDescriptor, ResponsePayload};
use crate::transfer::{FileDownload, FileUpload};
use crate::xml;

const DELETE: &str = "DELETE";

impl SharePointClient {
    fn site_url(&self) -> &str {
        self.engine.site_url()
    }

    async fn get_text(&self, uri: String) -> Result<String> {
        Ok(self.engine.execute(RequestDescriptor::get(uri)).await?.into_text())
    }

    /// Create a folder; returns the service's JSON description of it.
    #[instrument(skip(self))]
    pub async fn create_folder(&self, path: &str) -> Result<String> {
        let body = json!({
            "__metadata": { "type": "SP.Folder" },
            "ServerRelativeUrl": path,
        });
        let descriptor = RequestDescriptor::post(format!("{}_api/web/folders", self.site_url()))
            .body_text(body.to_string(), Some(ODATA_VERBOSE_JSON))
            .with_digest();

        let created = self.engine.execute(descriptor).await?.into_text();
        info!("folder created");
        Ok(created)
    }

    /// Delete a file (POST with `X-HTTP-Method: DELETE`).
    #[instrument(skip(self))]
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let descriptor = RequestDescriptor::post(file_url(self.site_url(), path))
            .method_override(DELETE)
            .with_digest()
            .ignore_response();
        self.engine.execute(descriptor).await?;
        info!("file deleted");
        Ok(())
    }

    /// Delete a folder and everything in it.
    #[instrument(skip(self))]
    pub async fn delete_folder(&self, path: &str) -> Result<()> {
        let (parent, name) = split_server_relative(path);
        let uri = format!("{}/folders('{}')", folder_url(self.site_url(), parent), odata_quote(name));
        let descriptor =
            RequestDescriptor::post(uri).method_override(DELETE).with_digest().ignore_response();
        self.engine.execute(descriptor).await?;
        info!("folder deleted");
        Ok(())
    }

    /// Download a file's content into `local`; returns the bytes written.
    pub async fn download_file(&self, path: &str, local: impl AsRef<Path>) -> Result<u64> {
        self.download_file_cancellable(path, local, &CancellationToken::new()).await
    }

    #[instrument(skip(self, local, cancel), fields(local_path = %local.as_ref().display()))]
    pub async fn download_file_cancellable(
        &self,
        path: &str,
        local: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let consumer = FileDownload::new(local.as_ref())
            .with_chunk_size(self.config.transfer_chunk_size);
        let descriptor = RequestDescriptor::get(format!("{}/$value", file_url(self.site_url(), path)))
            .accept_compression()
            .consume_with(consumer)
            .timeout(self.config.transfer_timeout());

        let payload = self.engine.execute_cancellable(descriptor, cancel).await?;
        let bytes = match payload {
            ResponsePayload::Streamed { bytes } => bytes,
            _ => 0,
        };
        info!(bytes, "file downloaded");
        Ok(bytes)
    }

    /// Upload `local` to `path`, overwriting any existing file. Returns the
    /// service's description of the new file.
    pub async fn upload_file(&self, local: impl AsRef<Path>, path: &str) -> Result<String> {
        self.upload_file_cancellable(local, path, &CancellationToken::new()).await
    }

    #[instrument(skip(self, local, cancel), fields(local_path = %local.as_ref().display()))]
    pub async fn upload_file_cancellable(
        &self,
        local: impl AsRef<Path>,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let (parent, name) = split_server_relative(path);
        let uri = format!(
            "{}/files/add(url='{}',overwrite=true)",
            folder_url(self.site_url(), parent),
            odata_quote(name)
        );
        let producer =
            FileUpload::new(local.as_ref()).with_chunk_size(self.config.transfer_chunk_size);
        let descriptor = RequestDescriptor::post(uri)
            .body_producer(producer)
            .with_digest()
            .timeout(self.config.transfer_timeout());

        let uploaded = self.engine.execute_cancellable(descriptor, cancel).await?.into_text();
        info!("file uploaded");
        Ok(uploaded)
    }

    /// File metadata as returned by the service (Atom XML).
    #[instrument(skip(self))]
    pub async fn get_file(&self, path: &str) -> Result<String> {
        self.get_text(file_url(self.site_url(), path)).await
    }

    /// A single file property, e.g. `Length` or `TimeLastModified`.
    #[instrument(skip(self))]
    pub async fn get_file_property(&self, path: &str, property: &str) -> Result<String> {
        self.get_text(format!("{}/{property}", file_url(self.site_url(), path))).await
    }

    #[instrument(skip(self))]
    pub async fn get_files(&self, folder: &str) -> Result<String> {
        self.get_text(format!("{}/files", folder_url(self.site_url(), folder))).await
    }

    #[instrument(skip(self))]
    pub async fn get_folders(&self, folder: &str) -> Result<String> {
        self.get_text(format!("{}/folders", folder_url(self.site_url(), folder))).await
    }

    #[instrument(skip(self))]
    pub async fn role_definitions(&self) -> Result<Vec<RoleDefinition>> {
        let feed = self.get_text(format!("{}_api/web/roledefinitions", self.site_url())).await?;
        let roles = xml::role_definitions_from_feed(&feed)?;
        debug!(count = roles.len(), "role definitions decoded");
        Ok(roles)
    }

    #[instrument(skip(self))]
    pub async fn site_users(&self) -> Result<Vec<User>> {
        let feed = self.get_text(format!("{}_api/web/siteusers", self.site_url())).await?;
        let users = xml::users_from_feed(&feed)?;
        debug!(count = users.len(), "site users decoded");
        Ok(users)
    }
}
