//! Dual-mode byte-stream demultiplexer.
//!
//! Splits the incoming byte stream into discrete ASCII command lines and
//! exact-length binary blocks. In Ascii mode, bytes accumulate in the line
//! buffer until a terminator appears; the completed line is handed to the
//! host for dispatch. When a dispatch asks for a binary block, the parser
//! first drains any bytes already sitting in the remainder, then streams
//! further input straight to the destination until exactly the announced
//! length has been delivered, and drops back to Ascii mode. Bytes past the
//! block boundary belong to the next command.

use crate::buffer::LineBuffer;

/// Outcome of dispatching one command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Stay in Ascii mode and parse the next line.
    Continue,
    /// Switch to binary-block mode: the next `len` raw bytes belong to
    /// `channel`'s destination buffer.
    EnterBlob { channel: u8, len: usize },
}

/// Errors that abort parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// A line filled the buffer without a terminator. Fatal: a well-behaved
    /// peer never sends an unterminated line this long.
    LineOverflow,
}

/// Receiving side of the parser: command dispatch plus the binary-block
/// destination. Implemented by the firmware's service layer; the methods
/// may suspend the parser task but must not lose bytes.
pub trait CommandHost {
    /// Dispatch one complete command line (terminator stripped).
    async fn dispatch(&mut self, line: &[u8]) -> Action;

    /// Deliver a slice of the in-progress binary block for `channel`.
    async fn blob_write(&mut self, channel: u8, bytes: &[u8]);

    /// The binary block for `channel` is complete; hand it to its sink.
    async fn blob_done(&mut self, channel: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ascii,
    Blob { channel: u8, remaining: usize },
}

/// Stream parser state: the line/remainder buffer and the current mode.
#[derive(Debug)]
pub struct ProtocolParser {
    buf: LineBuffer,
    mode: Mode,
}

impl Default for ProtocolParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolParser {
    pub const fn new() -> Self {
        Self {
            buf: LineBuffer::new(),
            mode: Mode::Ascii,
        }
    }

    /// True while a binary block is being collected.
    pub fn in_blob_mode(&self) -> bool {
        matches!(self.mode, Mode::Blob { .. })
    }

    /// Feed freshly received bytes.
    ///
    /// Reads larger than the line buffer are folded in free-space-sized
    /// chunks, so a single read carrying many commands never overflows.
    /// Lossless for arbitrary fragmentation: feeding a stream byte-by-byte
    /// dispatches the same commands as feeding it whole.
    pub async fn feed<H: CommandHost>(
        &mut self,
        mut bytes: &[u8],
        host: &mut H,
    ) -> Result<(), ParseError> {
        loop {
            // Binary blocks bypass the line buffer entirely.
            if let Mode::Blob { channel, remaining } = self.mode {
                let n = remaining.min(bytes.len());
                if n > 0 {
                    host.blob_write(channel, &bytes[..n]).await;
                    bytes = &bytes[n..];
                }
                if remaining == n {
                    host.blob_done(channel).await;
                    self.mode = Mode::Ascii;
                } else {
                    self.mode = Mode::Blob {
                        channel,
                        remaining: remaining - n,
                    };
                    debug_assert!(bytes.is_empty());
                    return Ok(());
                }
            }

            let taken = self.buf.fill_from(bytes);
            bytes = &bytes[taken..];
            self.process_buffered(host).await?;

            if bytes.is_empty() && !self.in_blob_mode() {
                return Ok(());
            }
        }
    }

    /// Consume complete lines out of the buffer until none remain or the
    /// mode switches to a binary block.
    async fn process_buffered<H: CommandHost>(&mut self, host: &mut H) -> Result<(), ParseError> {
        while self.mode == Mode::Ascii {
            let Some(end) = self.buf.find_terminator() else {
                if self.buf.free_space() == 0 {
                    return Err(ParseError::LineOverflow);
                }
                return Ok(());
            };

            let action = if end == 0 {
                // Zero-length command, ignored silently
                Action::Continue
            } else {
                host.dispatch(&self.buf.contents()[..end]).await
            };
            self.buf.consume(end + 1);

            if let Action::EnterBlob { channel, len } = action {
                self.enter_blob(channel, len, host).await;
            }
        }
        Ok(())
    }

    /// Start a binary block: drain up to `len` bytes already buffered in
    /// the remainder, then leave the rest to be streamed by `feed`.
    async fn enter_blob<H: CommandHost>(&mut self, channel: u8, len: usize, host: &mut H) {
        let n = len.min(self.buf.len());
        if n > 0 {
            host.blob_write(channel, &self.buf.contents()[..n]).await;
            self.buf.consume(n);
        }
        if n == len {
            // Fully satisfied from the remainder; anything left over is
            // the next Ascii command.
            host.blob_done(channel).await;
        } else {
            debug_assert!(self.buf.is_empty());
            self.mode = Mode::Blob {
                channel,
                remaining: len - n,
            };
        }
    }
}
