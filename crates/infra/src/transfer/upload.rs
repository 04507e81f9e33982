use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use sprest_domain::constants::TRANSFER_CHUNK_SIZE;
use sprest_domain::{Result, SpError};
use tokio::fs::File;
use tracing::debug;

use super::read_chunk;
use crate::engine::{BodyProducer, ProducedBody};

/// Request body read from a local file
///
/// The file is opened only when the request is sent, and closed when the
/// body stream finishes or is dropped.
#[derive(Debug, Clone)]
pub struct FileUpload {
    path: PathBuf,
    chunk_size: usize,
}

impl FileUpload {
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
impl BodyProducer for FileUpload {
    async fn produce(self: Box<Self>) -> Result<ProducedBody> {
        let file = File::open(&self.path).await.map_err(|err| {
            SpError::Io(format!("cannot open {} for upload: {err}", self.path.display()))
        })?;
        let content_length = file
            .metadata()
            .await
            .map_err(|err| SpError::Io(format!("cannot stat {}: {err}", self.path.display())))?
            .len();
        debug!(path = %self.path.display(), content_length, "uploading local file");

        let chunk_size = self.chunk_size;
        let chunks = stream::try_unfold(file, move |mut file| async move {
            let next = read_chunk(&mut file, chunk_size).await?;
            Ok::<_, std::io::Error>(next.map(|chunk| (chunk, file)))
        });

        Ok(ProducedBody { content_length, stream: chunks.boxed() })
    }
}
