use std::io::{self, Read, Write};

use crate::BUFFER_CAPACITY;

/// Fixed-capacity staging area between a stream's caller and its
/// descriptor.
///
/// One buffer serves both directions: reads consume the `pos..len`
/// lookahead left by [`StreamBuffer::refill`], writes accumulate the
/// `0..pos` pending range drained by [`StreamBuffer::flush`]. The owning
/// stream's last-operation tag decides which interpretation is live and
/// switches via [`StreamBuffer::invalidate`].
pub struct StreamBuffer {
    data: Box<[u8]>,
    /// Bytes of `data` holding valid content. Invariant: `pos <= len`.
    len: usize,
    /// Next byte to consume (reads) or to fill (writes).
    pos: usize,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self {
            data: vec![0; BUFFER_CAPACITY].into_boxed_slice(),
            len: 0,
            pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Discard all staged content and return to the fresh state.
    pub fn invalidate(&mut self) {
        self.pos = 0;
        self.len = 0;
        self.data.fill(0);
    }

    /// True when no unconsumed lookahead remains, including the fresh
    /// state.
    pub fn is_drained(&self) -> bool {
        self.pos >= self.len
    }

    /// True when another pending byte would not fit.
    pub fn is_full(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes staged for writing, awaiting a flush.
    pub fn pending(&self) -> usize {
        self.pos
    }

    /// Bytes read ahead of the caller, awaiting consumption.
    pub fn lookahead(&self) -> usize {
        self.len - self.pos
    }

    /// One underlying read of up to capacity bytes, replacing the buffer
    /// contents. Returns the number of bytes obtained; zero means the
    /// source is exhausted.
    pub fn refill(&mut self, src: &mut impl Read) -> io::Result<usize> {
        let obtained = src.read(&mut self.data)?;
        self.len = obtained;
        self.pos = 0;
        Ok(obtained)
    }

    /// Drain the pending range to `dst`, retrying short writes until the
    /// whole range is down. On success the buffer is invalidated; on
    /// failure it is left untouched and the bytes already written stay
    /// written.
    pub fn flush(&mut self, dst: &mut impl Write) -> io::Result<()> {
        let mut written = 0;
        while written < self.pos {
            match dst.write(&self.data[written..self.pos]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "descriptor accepted no bytes",
                    ));
                }
                Ok(accepted) => written += accepted,
                Err(e) => return Err(e),
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Consume the byte under the cursor, if any lookahead remains.
    pub fn take_byte(&mut self) -> Option<u8> {
        if self.pos < self.len {
            let byte = self.data[self.pos];
            self.pos += 1;
            Some(byte)
        } else {
            None
        }
    }

    /// Stage one byte under the cursor. The caller flushes first when the
    /// buffer is full.
    pub fn put_byte(&mut self, byte: u8) {
        debug_assert!(self.pos < self.data.len());
        self.data[self.pos] = byte;
        self.pos += 1;
        self.len = self.pos;
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}
