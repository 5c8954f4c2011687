use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Error;

/// Largest frame body accepted from a peer
pub const MAX_FRAME_LENGTH: u32 = 16 * 1024 * 1024;

/// Reads one length-prefixed frame, returning its body without the prefix
pub async fn read_frame<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Bytes, Error> {
    let length = stream.read_u32().await?;
    if length > MAX_FRAME_LENGTH {
        return Err(Error::BadMessage(format!(
            "frame of {length} bytes exceeds {MAX_FRAME_LENGTH}"
        )));
    }

    let mut buf = vec![0; length as usize];
    stream.read_exact(&mut buf).await?;

    Ok(Bytes::from(buf))
}

/// Writes an already framed envelope and flushes the stream
pub async fn write_frame<S: AsyncWrite + Unpin>(stream: &mut S, frame: &Bytes) -> Result<(), Error> {
    stream.write_all(frame).await?;
    stream.flush().await?;
    Ok(())
}
