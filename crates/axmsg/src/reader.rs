use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::envelope::{decode, Action};
use crate::{AxError, Result};

/// Forward-only reader pulling one `\n`-terminated record at a time.
pub struct RecordReader<R> {
    inner: R,
}

impl<R: AsyncBufRead + Unpin> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Block until a full record is available and return it without its
    /// terminator.
    ///
    /// Returns [`AxError::EndOfStream`] once the source is closed. A fragment
    /// left without terminator at close is dropped and reported the same way.
    pub async fn read_record(&mut self) -> Result<Vec<u8>> {
        let mut record = Vec::new();
        let n = self.inner.read_until(b'\n', &mut record).await?;
        if n == 0 {
            return Err(AxError::EndOfStream);
        }
        if record.pop() != Some(b'\n') {
            tracing::warn!(bytes = n, "input closed mid-record, fragment discarded");
            return Err(AxError::EndOfStream);
        }
        Ok(record)
    }

    /// Read the next non-blank record and decode it as an [`Action`].
    pub async fn read_action(&mut self) -> Result<Action> {
        loop {
            let record = self.read_record().await?;
            if record.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return decode(&record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, BufReader, ReadBuf};

    struct BrokenPipe;

    impl AsyncRead for BrokenPipe {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe broke")))
        }
    }

    #[tokio::test]
    async fn reads_records_in_order_without_terminator() {
        let mut reader = RecordReader::new(&b"one\ntwo\n\nthree\n"[..]);
        assert_eq!(reader.read_record().await.unwrap(), b"one");
        assert_eq!(reader.read_record().await.unwrap(), b"two");
        assert_eq!(reader.read_record().await.unwrap(), b"");
        assert_eq!(reader.read_record().await.unwrap(), b"three");
        assert!(reader.read_record().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn empty_source_is_end_of_stream() {
        let mut reader = RecordReader::new(&b""[..]);
        assert!(reader.read_record().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn unterminated_tail_is_end_of_stream() {
        let mut reader = RecordReader::new(&b"whole\npart"[..]);
        assert_eq!(reader.read_record().await.unwrap(), b"whole");
        assert!(reader.read_record().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn read_failure_is_io_error() {
        let mut reader = RecordReader::new(BufReader::new(BrokenPipe));
        let err = reader.read_record().await.unwrap_err();
        assert!(matches!(err, AxError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[tokio::test]
    async fn read_action_skips_blank_lines() {
        let input = b"\n  \n{\"axmsg\":1,\"responseId\":9,\"role\":\"ping\"}\n";
        let mut reader = RecordReader::new(&input[..]);
        let action = reader.read_action().await.unwrap();
        assert_eq!(action.role, "ping");
        assert_eq!(action.response_id, Some(9));
    }

    #[tokio::test]
    async fn read_action_reports_malformed_record() {
        let mut reader = RecordReader::new(&b"[1,2,3]\n"[..]);
        let err = reader.read_action().await.unwrap_err();
        assert!(matches!(err, AxError::Malformed { ref line, .. } if line == "[1,2,3]"));
    }
}
