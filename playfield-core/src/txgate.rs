//! Thread-safe transmit gateway.
//!
//! `send` is the single path onto the outgoing channel for every task. It
//! runs in a short critical section: mirror the payload to the debug
//! channel, then enqueue it atomically if the whole payload fits. If it
//! does not fit, the queue is flushed and the payload dropped - a
//! deliberate lossy-under-pressure policy; there is never a partial write
//! and the caller is never blocked. A drain task moves queued bytes to the
//! transport.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::Deque;

/// Default outgoing-queue capacity in bytes.
pub const TX_QUEUE_CAPACITY: usize = 1024;

pub struct TransmitGateway<M: RawMutex, const N: usize = TX_QUEUE_CAPACITY> {
    queue: Mutex<M, RefCell<Deque<u8, N>>>,
    ready: Signal<M, ()>,
}

impl<M: RawMutex, const N: usize> Default for TransmitGateway<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> TransmitGateway<M, N> {
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(Deque::new())),
            ready: Signal::new(),
        }
    }

    /// Enqueue `bytes` for transmission. Returns whether the payload was
    /// accepted; a rejected payload flushed the queue.
    pub fn send(&self, bytes: &[u8]) -> bool {
        let queued = self.queue.lock(|queue| {
            let mut queue = queue.borrow_mut();
            #[cfg(feature = "defmt")]
            defmt::trace!("tx: {=[u8]:a}", bytes);
            if N - queue.len() >= bytes.len() {
                for &byte in bytes {
                    let _ = queue.push_back(byte);
                }
                true
            } else {
                queue.clear();
                false
            }
        });
        if queued {
            self.ready.signal(());
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("tx queue full, flushed; dropped {=usize} bytes", bytes.len());
        }
        queued
    }

    /// Wait until data is queued, then move up to `buf.len()` bytes out.
    pub async fn drain(&self, buf: &mut [u8]) -> usize {
        loop {
            let n = self.queue.lock(|queue| {
                let mut queue = queue.borrow_mut();
                let mut n = 0;
                while n < buf.len() {
                    match queue.pop_front() {
                        Some(byte) => {
                            buf[n] = byte;
                            n += 1;
                        }
                        None => break,
                    }
                }
                n
            });
            if n > 0 {
                return n;
            }
            self.ready.wait().await;
        }
    }

    /// Bytes currently queued.
    pub fn len(&self) -> usize {
        self.queue.lock(|queue| queue.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_send_and_drain() {
        let gateway: TransmitGateway<NoopRawMutex, 16> = TransmitGateway::new();
        assert!(gateway.send(b"SW:00\n"));
        assert_eq!(gateway.len(), 6);
        let mut buf = [0u8; 16];
        let n = block_on(gateway.drain(&mut buf));
        assert_eq!(&buf[..n], b"SW:00\n");
        assert!(gateway.is_empty());
    }

    #[test]
    fn test_drain_in_small_chunks() {
        let gateway: TransmitGateway<NoopRawMutex, 16> = TransmitGateway::new();
        assert!(gateway.send(b"abcdef"));
        let mut buf = [0u8; 4];
        assert_eq!(block_on(gateway.drain(&mut buf)), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(block_on(gateway.drain(&mut buf)), 2);
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn test_flush_on_pressure_drops_payload_and_queue() {
        let gateway: TransmitGateway<NoopRawMutex, 8> = TransmitGateway::new();
        assert!(gateway.send(b"abcde"));
        // Five queued, three free: a six-byte payload cannot fit
        assert!(!gateway.send(b"fghijk"));
        // Queue was cleared and the payload not enqueued
        assert!(gateway.is_empty());
        // The gateway keeps working afterwards
        assert!(gateway.send(b"xyz"));
        assert_eq!(gateway.len(), 3);
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let gateway: TransmitGateway<NoopRawMutex, 8> = TransmitGateway::new();
        assert!(gateway.send(b"12345678"));
        assert_eq!(gateway.len(), 8);
    }
}
