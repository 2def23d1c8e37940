//! Single-slot asynchronous custom-I2C pipeline.
//!
//! The `I2C` command arms one hardware transaction at a time. Admission is
//! a capacity-1 channel used as a token: holding the slot means the channel
//! is full. Completion travels through a saturating [`Signal`], so the wake
//! from the driver's completion context can never be lost, nor stack beyond
//! one pending notification - which matches the at-most-one-in-flight
//! invariant. The reporter task formats the result, sends it, and only
//! then releases the slot.
//!
//! ```text
//! Idle --admit--> Armed --complete--> Completed --report+release--> Idle
//! ```

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};
use heapless::{String, Vec};

pub use playfield_protocol::command::{I2cRequest, I2C_BUF_LEN};

/// How long `submit` may wait for the previous transaction to be reported.
pub const I2C_ADMIT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Capacity of a formatted completion report.
pub const I2C_REPORT_CAPACITY: usize = I2C_BUF_LEN * 2 + 16;

/// Terminal status of a custom I2C transaction. A failing bus status is a
/// reportable result value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cStatus {
    Success,
    AddrNack,
    DataNack,
    ArbLost,
    Error,
}

impl I2cStatus {
    /// Wire token reported for this status.
    pub fn token(&self) -> &'static str {
        match self {
            I2cStatus::Success => "SUCCESS",
            I2cStatus::AddrNack => "ADDR_NACK",
            I2cStatus::DataNack => "DATA_NACK",
            I2cStatus::ArbLost => "ARB_LOST",
            I2cStatus::Error => "ERROR",
        }
    }
}

/// Completed transaction as captured by the driver's completion context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cCompletion {
    pub status: I2cStatus,
    /// Received bytes; meaningful only when `status` is `Success`.
    pub rx: Vec<u8, I2C_BUF_LEN>,
}

impl I2cCompletion {
    pub fn success(rx: Vec<u8, I2C_BUF_LEN>) -> Self {
        Self {
            status: I2cStatus::Success,
            rx,
        }
    }

    pub fn failed(status: I2cStatus) -> Self {
        Self {
            status,
            rx: Vec::new(),
        }
    }

    /// Wire report: `I2C:` + upper-hex received bytes on success, else
    /// `I2C:` + the status token.
    pub fn report(&self) -> String<I2C_REPORT_CAPACITY> {
        let mut out = String::new();
        // Capacity covers the largest receive buffer plus the longest token
        let _ = write!(out, "I2C:");
        match self.status {
            I2cStatus::Success => {
                for byte in &self.rx {
                    let _ = write!(out, "{:02X}", byte);
                }
            }
            status => {
                let _ = write!(out, "{}", status.token());
            }
        }
        let _ = writeln!(out);
        out
    }
}

/// Admission attempt outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdmitTimeout;

/// Producer/ISR/consumer handoff enforcing at-most-one in-flight
/// transaction.
pub struct I2cPipeline<M: RawMutex> {
    slot: Channel<M, (), 1>,
    completion: Signal<M, I2cCompletion>,
}

impl<M: RawMutex> Default for I2cPipeline<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> I2cPipeline<M> {
    pub const fn new() -> Self {
        Self {
            slot: Channel::new(),
            completion: Signal::new(),
        }
    }

    /// Take the admission slot without waiting.
    pub fn try_admit(&self) -> bool {
        self.slot.try_send(()).is_ok()
    }

    /// Take the admission slot, waiting up to `timeout` for the previous
    /// transaction to be reported. Blocks only the calling task. A timeout
    /// leaves no side effects.
    pub async fn admit(&self, timeout: Duration) -> Result<(), AdmitTimeout> {
        with_timeout(timeout, self.slot.send(()))
            .await
            .map_err(|_| AdmitTimeout)
    }

    /// True while a transaction is admitted but not yet reported.
    pub fn slot_held(&self) -> bool {
        self.slot.is_full()
    }

    /// Deliver a completion and wake the reporter. Safe from interrupt
    /// context: a status/buffer store and one wake signal, nothing else.
    pub fn complete(&self, completion: I2cCompletion) {
        self.completion.signal(completion);
    }

    /// Wait for the next completion (reporter task side).
    pub async fn completed(&self) -> I2cCompletion {
        self.completion.wait().await
    }

    /// Release the admission slot once the result has been reported.
    pub fn release(&self) {
        let _ = self.slot.try_receive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn rx(bytes: &[u8]) -> Vec<u8, I2C_BUF_LEN> {
        Vec::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_single_slot_admission() {
        let pipeline: I2cPipeline<NoopRawMutex> = I2cPipeline::new();
        assert!(pipeline.try_admit());
        assert!(pipeline.slot_held());
        // Second submit while one is pending is rejected
        assert!(!pipeline.try_admit());
        pipeline.release();
        assert!(!pipeline.slot_held());
        assert!(pipeline.try_admit());
    }

    #[test]
    fn test_release_is_idempotent() {
        let pipeline: I2cPipeline<NoopRawMutex> = I2cPipeline::new();
        pipeline.release();
        assert!(pipeline.try_admit());
        pipeline.release();
        pipeline.release();
        assert!(pipeline.try_admit());
    }

    #[test]
    fn test_admit_times_out_without_side_effects() {
        let pipeline: I2cPipeline<NoopRawMutex> = I2cPipeline::new();
        assert!(pipeline.try_admit());
        let result = block_on(pipeline.admit(Duration::from_millis(10)));
        assert_eq!(result, Err(AdmitTimeout));
        // The held slot is untouched
        assert!(pipeline.slot_held());
        pipeline.release();
        assert!(block_on(pipeline.admit(Duration::from_millis(10))).is_ok());
    }

    #[test]
    fn test_completion_handoff() {
        let pipeline: I2cPipeline<NoopRawMutex> = I2cPipeline::new();
        assert!(pipeline.try_admit());
        pipeline.complete(I2cCompletion::success(rx(&[0xBE, 0xEF])));
        let completion = block_on(pipeline.completed());
        assert_eq!(completion.status, I2cStatus::Success);
        assert_eq!(completion.rx.as_slice(), &[0xBE, 0xEF]);
    }

    #[test]
    fn test_completion_signal_saturates() {
        // A second signal before the reporter runs overwrites, not stacks
        let pipeline: I2cPipeline<NoopRawMutex> = I2cPipeline::new();
        pipeline.complete(I2cCompletion::failed(I2cStatus::ArbLost));
        pipeline.complete(I2cCompletion::failed(I2cStatus::Error));
        let completion = block_on(pipeline.completed());
        assert_eq!(completion.status, I2cStatus::Error);
    }

    #[test]
    fn test_report_success_hex_dump() {
        let completion = I2cCompletion::success(rx(&[0x0F, 0xE1]));
        assert_eq!(completion.report().as_str(), "I2C:0FE1\n");
    }

    #[test]
    fn test_report_empty_read() {
        let completion = I2cCompletion::success(rx(&[]));
        assert_eq!(completion.report().as_str(), "I2C:\n");
    }

    #[test]
    fn test_report_failure_tokens() {
        for (status, expected) in [
            (I2cStatus::AddrNack, "I2C:ADDR_NACK\n"),
            (I2cStatus::DataNack, "I2C:DATA_NACK\n"),
            (I2cStatus::ArbLost, "I2C:ARB_LOST\n"),
            (I2cStatus::Error, "I2C:ERROR\n"),
        ] {
            assert_eq!(I2cCompletion::failed(status).report().as_str(), expected);
        }
    }
}
