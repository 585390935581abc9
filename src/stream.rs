use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::os::fd::{AsRawFd, RawFd};
use std::path::Path;
use std::process::Child;

use log::{trace, warn};

use crate::buffer::StreamBuffer;
use crate::errors::{Result, StreamError};
use crate::mode::OpenMode;

/// Direction of the data currently staged in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastOp {
    None,
    Read,
    Write,
}

/// Buffered stream over an exclusively owned descriptor.
///
/// All traffic goes through one fixed-capacity buffer whose direction
/// follows the last operation: a read after writes flushes the pending
/// bytes first, a write after reads abandons the lookahead. Seeking and
/// telling stay consistent with staged-but-not-yet-moved data.
///
/// A stream ends with exactly one [`Stream::close`] (or
/// [`Stream::pipe_close`] for command streams). Dropping a stream still
/// releases the descriptor and makes a best effort to flush pending
/// writes.
pub struct Stream {
    file: File,
    buf: StreamBuffer,
    last_op: LastOp,
    eof: bool,
    error: Option<io::ErrorKind>,
    child: Option<Child>,
}

impl Stream {
    /// Open the file at `path` with the given mode.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let file = mode.open(path)?;
        trace!(
            "opened {} as fd {} ({:?})",
            path.display(),
            file.as_raw_fd(),
            mode
        );
        Ok(Self::from_parts(file, None))
    }

    pub(crate) fn from_parts(file: File, child: Option<Child>) -> Self {
        Self {
            file,
            buf: StreamBuffer::new(),
            last_op: LastOp::None,
            eof: false,
            error: None,
            child,
        }
    }

    /// The raw descriptor behind this stream.
    pub fn fileno(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// Next byte of the stream, `None` once the source is exhausted.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        self.begin_read()?;
        if self.buf.is_drained() {
            let obtained = match self.buf.refill(&mut self.file) {
                Ok(obtained) => obtained,
                Err(e) => return Err(self.record(e)),
            };
            if obtained == 0 {
                self.eof = true;
                return Ok(None);
            }
            trace!("refilled {} bytes from fd {}", obtained, self.fileno());
        }
        Ok(self.buf.take_byte())
    }

    /// Stage one byte, flushing first if the buffer is full. Returns the
    /// byte on success; on a failed flush the byte is not staged.
    pub fn write_byte(&mut self, byte: u8) -> Result<u8> {
        self.begin_write();
        if self.buf.is_full() {
            self.flush_pending()?;
        }
        self.buf.put_byte(byte);
        Ok(byte)
    }

    /// Read up to `count` elements of `size` bytes each into `dest`,
    /// stopping at end-of-file or the first failure. Returns the number
    /// of whole elements transferred.
    pub fn read(
        &mut self,
        dest: &mut [u8],
        size: usize,
        count: usize,
    ) -> usize {
        let wanted = size.saturating_mul(count).min(dest.len());
        let mut copied = 0;
        while copied < wanted {
            match self.read_byte() {
                Ok(Some(byte)) => {
                    dest[copied] = byte;
                    copied += 1;
                }
                Ok(None) | Err(_) => break,
            }
        }
        if size == 0 {
            0
        } else {
            copied / size
        }
    }

    /// Stage up to `count` elements of `size` bytes each from `src`,
    /// stopping at the first failure.
    ///
    /// Returns the requested element count even when staging stopped
    /// early; short transfers are only visible through
    /// [`Stream::last_error`]. This keeps the contract of the classic
    /// block-write call.
    pub fn write(&mut self, src: &[u8], size: usize, count: usize) -> usize {
        let wanted = size.saturating_mul(count).min(src.len());
        for &byte in &src[..wanted] {
            if self.write_byte(byte).is_err() {
                break;
            }
        }
        count
    }

    /// Force staged write data down to the descriptor.
    ///
    /// Refused when the stream is not buffering writes; there is nothing
    /// to flush after reads or on a fresh stream.
    pub fn flush(&mut self) -> Result<()> {
        if self.last_op != LastOp::Write {
            return Err(StreamError::NotWriting);
        }
        self.flush_pending()
    }

    /// Reposition the descriptor, discarding lookahead or flushing
    /// pending writes first. Returns the new absolute position.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match self.last_op {
            LastOp::Read => self.buf.invalidate(),
            LastOp::Write => self.flush_pending()?,
            LastOp::None => {}
        }
        let at = self.file.seek(pos)?;
        trace!("fd {} repositioned to {}", self.fileno(), at);
        Ok(at)
    }

    /// Logical stream position: the descriptor offset corrected by the
    /// staged bytes. After reads the descriptor is ahead by the
    /// unconsumed lookahead; after writes the pending bytes are logically
    /// past the descriptor.
    pub fn tell(&mut self) -> Result<u64> {
        let at = self.file.stream_position()?;
        let logical = match self.last_op {
            LastOp::Read => at - self.buf.lookahead() as u64,
            LastOp::Write | LastOp::None => at + self.buf.pending() as u64,
        };
        Ok(logical)
    }

    /// Whether a read has hit the end of the source. Sticky; not cleared
    /// by seeking.
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Kind of the first underlying failure, if any. End-of-file is not
    /// recorded here; check [`Stream::eof`].
    pub fn last_error(&self) -> Option<io::ErrorKind> {
        self.error
    }

    /// Flush and release the descriptor.
    ///
    /// When the last operation was a write, the flush outcome is the
    /// close outcome, and a sticky error from an earlier failed flush is
    /// propagated even if the final flush succeeds.
    pub fn close(mut self) -> Result<()> {
        if self.child.is_some() {
            warn!(
                "closing a command stream without reaping its child, \
                 use pipe_close"
            );
        }
        self.close_inner()
    }

    /// Close logic shared with [`Stream::pipe_close`]. Disarms the drop
    /// flush; the descriptor itself is released when the stream drops.
    pub(crate) fn close_inner(&mut self) -> Result<()> {
        let was_writing = self.last_op == LastOp::Write;
        let flushed = if was_writing {
            self.flush_pending()
        } else {
            Ok(())
        };
        self.last_op = LastOp::None;
        if was_writing {
            if let Some(kind) = self.error {
                return Err(kind.into());
            }
        }
        flushed
    }

    pub(crate) fn take_child(&mut self) -> Option<Child> {
        self.child.take()
    }

    // write -> read switch needs the staged bytes on the descriptor first
    fn begin_read(&mut self) -> Result<()> {
        if self.last_op == LastOp::Write {
            self.flush_pending()?;
        }
        self.last_op = LastOp::Read;
        Ok(())
    }

    // read -> write switch abandons the lookahead
    fn begin_write(&mut self) {
        if self.last_op == LastOp::Read {
            self.buf.invalidate();
        }
        self.last_op = LastOp::Write;
    }

    fn flush_pending(&mut self) -> Result<()> {
        let pending = self.buf.pending();
        match self.buf.flush(&mut self.file) {
            Ok(()) => {
                if pending > 0 {
                    trace!(
                        "flushed {} bytes to fd {}",
                        pending,
                        self.fileno()
                    );
                }
                Ok(())
            }
            Err(e) => Err(self.record(e)),
        }
    }

    // The first failure sticks until the stream is reconstructed.
    fn record(&mut self, e: io::Error) -> StreamError {
        self.error.get_or_insert(e.kind());
        StreamError::Io(e)
    }
}

impl AsRawFd for Stream {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if self.last_op == LastOp::Write {
            if let Err(e) = self.buf.flush(&mut self.file) {
                warn!("stream dropped with unflushable bytes: {}", e);
            }
        }
    }
}
