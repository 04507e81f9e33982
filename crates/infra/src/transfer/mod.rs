//! Streaming file transfers
//!
//! [`FileUpload`] streams a local file as a request body and
//! [`FileDownload`] writes a response body to a local file. Both move data
//! in fixed-size chunks so memory stays bounded regardless of file size.

pub mod download;
pub mod upload;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

pub use download::FileDownload;
pub use upload::FileUpload;

/// Read the next chunk of up to `chunk_size` bytes.
///
/// The chunk is only short at end of input; `None` means EOF.
pub(crate) async fn read_chunk<R>(reader: &mut R, chunk_size: usize) -> std::io::Result<Option<Bytes>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::zeroed(chunk_size);
    let mut filled = 0;
    while filled < chunk_size {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    if filled == 0 {
        return Ok(None);
    }
    buf.truncate(filled);
    Ok(Some(buf.freeze()))
}
