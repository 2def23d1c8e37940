//! Inter-task communication channels
//!
//! Defines the static channels, signals and shared state used for
//! communication between Embassy tasks. Uses embassy-sync primitives for
//! safe async communication.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;
use portable_atomic::AtomicBool;

use playfield_core::exec::{ConfiguredRule, LED_BLOB_MAX, MAX_QUICK_RULES};
use playfield_core::hwindex::{OutputTarget, SwitchPos};
use playfield_core::i2c::I2cPipeline;
use playfield_core::switches::SwitchState;
use playfield_core::txgate::TransmitGateway;
use playfield_protocol::command::I2cRequest;

/// LED channels with SPI hardware behind them on this board.
pub const N_PHYSICAL_LED_CHANNELS: usize = 2;

/// Channel capacity for output actions
const OUTPUT_CHANNEL_SIZE: usize = 8;

/// Channel capacity for LED bus commands
const LED_CHANNEL_SIZE: usize = 4;

/// Channel capacity for switch edge events from the sampling layer
const SWITCH_EVENT_SIZE: usize = 16;

/// Outgoing byte queue feeding the host UART
pub static GATEWAY: TransmitGateway<CriticalSectionRawMutex> = TransmitGateway::new();

/// Custom-I2C admission slot and completion handoff
pub static I2C_PIPELINE: I2cPipeline<CriticalSectionRawMutex> = I2cPipeline::new();

/// Admitted requests on their way to the bus engine. Capacity 1: the
/// pipeline slot guarantees at most one request is outstanding.
pub static I2C_REQUESTS: Channel<CriticalSectionRawMutex, I2cRequest, 1> = Channel::new();

/// Expander rescan requests (DISC)
pub static DISCOVER: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Output actions for the driver task
pub enum OutputAction {
    Drive {
        target: OutputTarget,
        pwm_low: u16,
        t_pulse_ms: u16,
        pwm_high: u16,
    },
}

pub static OUTPUT_ACTIONS: Channel<CriticalSectionRawMutex, OutputAction, OUTPUT_CHANNEL_SIZE> =
    Channel::new();

/// Commands for the LED string task
pub enum LedCommand {
    /// Reconfigure a channel's bus speed and frame format
    Configure {
        channel: u8,
        speed_hz: u32,
        frame_format: Option<u32>,
    },
    /// Send the channel's filled frame buffer to the string
    Blast { channel: u8 },
}

pub static LED_COMMANDS: Channel<CriticalSectionRawMutex, LedCommand, LED_CHANNEL_SIZE> =
    Channel::new();

/// Per-channel claim tokens for the LED frame buffers. Full while the
/// buffer belongs to the command task (filling) or the LED task
/// (sending); the LED task releases after the transfer completes.
pub static LED_CLAIMS: [Channel<CriticalSectionRawMutex, (), 1>; N_PHYSICAL_LED_CHANNELS] =
    [Channel::new(), Channel::new()];

/// Per-channel LED frame buffers, filled from the binary block stream
pub static LED_FRAMES: [Mutex<CriticalSectionRawMutex, RefCell<Vec<u8, LED_BLOB_MAX>>>;
    N_PHYSICAL_LED_CHANNELS] = [
    Mutex::new(RefCell::new(Vec::new())),
    Mutex::new(RefCell::new(Vec::new())),
];

/// One quick-fire rule slot.
#[derive(Clone, Copy)]
pub struct QuickRule {
    pub rule: ConfiguredRule,
    pub enabled: bool,
}

/// Rule table consumed by the rule engine. Slots stay disabled until
/// RULE enables them.
pub static RULES: Mutex<CriticalSectionRawMutex, RefCell<[Option<QuickRule>; MAX_QUICK_RULES]>> =
    Mutex::new(RefCell::new([None; MAX_QUICK_RULES]));

/// Debounced edge events from the switch sampling layer.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchEvent {
    pub pos: SwitchPos,
    pub closed: bool,
}

pub static SWITCH_EVENTS: Channel<CriticalSectionRawMutex, SwitchEvent, SWITCH_EVENT_SIZE> =
    Channel::new();

/// Debounced switch bitmap, updated by the event task, read by SW?
pub static SWITCH_STATE: Mutex<CriticalSectionRawMutex, RefCell<SwitchState>> =
    Mutex::new(RefCell::new(SwitchState::new()));

/// Inputs with the debounce filter enabled, consumed by the sampler
pub static DEBOUNCE_MASK: Mutex<CriticalSectionRawMutex, RefCell<SwitchState>> =
    Mutex::new(RefCell::new(SwitchState::new()));

/// Whether switch edge events are reported to the host (SWE)
pub static SWITCH_REPORTING: AtomicBool = AtomicBool::new(false);
