use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sprest_domain::constants::TRANSFER_CHUNK_SIZE;
use sprest_domain::{Result, SpError};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;

use super::read_chunk;
use crate::engine::ResponseConsumer;

/// Writes a response body to a local file, creating or truncating it.
#[derive(Debug, Clone)]
pub struct FileDownload {
    path: PathBuf,
    chunk_size: usize,
}

impl FileDownload {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), chunk_size: TRANSFER_CHUNK_SIZE }
    }

    /// Chunk size in bytes (at least 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResponseConsumer for FileDownload {
    async fn consume(self: Box<Self>, source: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u64> {
        let io_error =
            |err: std::io::Error| SpError::Io(format!("writing {}: {err}", self.path.display()));

        let mut file = File::create(&self.path).await.map_err(io_error)?;
        let mut written = 0_u64;

        // Read failures come from the response stream, write failures from disk.
        while let Some(chunk) = read_chunk(source, self.chunk_size)
            .await
            .map_err(|err| SpError::transport(format!("response body interrupted: {err}")))?
        {
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;

        debug!(path = %self.path.display(), bytes = written, "download written");
        Ok(written)
    }
}
