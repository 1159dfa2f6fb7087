use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::envelope::{encode, Action};
use crate::Result;

/// Appends terminated records to an output stream, flushing after each one
/// so the downstream consumer sees every record before the call returns.
pub struct RecordWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write `record` followed by `\n`. `record` must not contain a terminator.
    pub async fn write_record(&mut self, record: &[u8]) -> Result<()> {
        let mut buf = Vec::with_capacity(record.len() + 1);
        buf.extend_from_slice(record);
        buf.push(b'\n');
        self.inner.write_all(&buf).await?;
        self.inner.flush().await?;
        Ok(())
    }

    pub async fn write_action(&mut self, action: &Action) -> Result<()> {
        let buf = encode(action)?;
        self.inner.write_all(&buf).await?;
        self.inner.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{decode, Success};
    use crate::AxError;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Sink that accepts writes but rejects every flush.
    struct FailingFlush(Vec<u8>);

    impl AsyncWrite for FailingFlush {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.0.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader gone")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn write_record_appends_terminator() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_record(b"{\"a\":1}").await.unwrap();
        writer.write_record(b"").await.unwrap();
        assert_eq!(writer.into_inner(), b"{\"a\":1}\n\n");
    }

    #[tokio::test]
    async fn write_action_emits_decodable_line() {
        let action = Action::response(2, &Success { success: true }).unwrap();
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_action(&action).await.unwrap();

        let out = writer.into_inner();
        assert!(out.ends_with(b"\n"));
        assert_eq!(decode(&out).unwrap(), action);
    }

    #[tokio::test]
    async fn flush_failure_is_io_error() {
        let mut writer = RecordWriter::new(FailingFlush(Vec::new()));
        let err = writer.write_record(b"x").await.unwrap_err();
        assert!(matches!(err, AxError::Io(_)));
    }
}
