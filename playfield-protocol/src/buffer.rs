//! Fixed-capacity command line buffer.
//!
//! Holds the in-progress ASCII line plus any carried remainder between
//! reads. One byte of the capacity stays reserved, so a well-behaved peer
//! can always fit a 127-byte command plus its terminator; filling the
//! buffer without a terminator in sight is an unrecoverable protocol
//! violation and is surfaced by the parser, never silently truncated.

/// Capacity of the command line buffer in bytes.
pub const CMD_BUF_CAPACITY: usize = 128;

/// Line terminators accepted on the wire.
pub fn is_terminator(byte: u8) -> bool {
    matches!(byte, b'\n' | b'\r' | 0)
}

/// Owned line buffer with explicit read/write cursors.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    buf: [u8; CMD_BUF_CAPACITY],
    /// Occupied bytes, counted from the front.
    len: usize,
    /// Bytes already scanned for a terminator, so repeated scans across
    /// fragmented reads stay O(new bytes).
    scanned: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0; CMD_BUF_CAPACITY],
            len: 0,
            scanned: 0,
        }
    }

    /// Number of occupied bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free space available for appending. One byte stays reserved.
    pub fn free_space(&self) -> usize {
        CMD_BUF_CAPACITY - 1 - self.len
    }

    /// Append as many of `bytes` as fit, returning how many were taken.
    pub fn fill_from(&mut self, bytes: &[u8]) -> usize {
        let n = self.free_space().min(bytes.len());
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    /// Scan forward for a line terminator, resuming where the previous
    /// scan left off. Returns the terminator's offset if one is buffered.
    pub fn find_terminator(&mut self) -> Option<usize> {
        while self.scanned < self.len {
            if is_terminator(self.buf[self.scanned]) {
                return Some(self.scanned);
            }
            self.scanned += 1;
        }
        None
    }

    /// All occupied bytes.
    pub fn contents(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Drop the first `n` bytes and compact the remainder to the front,
    /// keeping the read/write cursors coherent for the next iteration.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len);
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
        self.scanned = self.scanned.saturating_sub(n);
    }
}
