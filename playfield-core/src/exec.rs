//! Command executor.
//!
//! One match arm per command: validate every argument against the device
//! model first, then forward to the I/O layer through [`DeviceServices`].
//! Nothing is mutated before validation passes, so a rejected command has
//! no partial effect. Failures are echoed back on the command channel as
//! `[TAG] <offending line>`.

use core::fmt::Write;

use embassy_time::{with_timeout, Duration};
use heapless::String;
use playfield_protocol::command::{
    parse_line, Command, CommandError, I2cRequest, COMMAND_TABLE,
};
use playfield_protocol::parser::Action;

use crate::hwindex::{OutputTarget, SwitchPos};
use crate::switches::SwitchState;

/// Identity string sent in response to `*IDN?`.
pub const IDN_RESPONSE: &str = "PLAYFIELD-CONTROLLER V0.1\n";

/// Number of configurable quick-fire rule slots.
pub const MAX_QUICK_RULES: usize = 64;

/// Number of addressable-LED output channels.
pub const N_LED_CHANNELS: u8 = 3;

/// Most LEDs one channel drives.
pub const N_LEDS_MAX: usize = 512;

/// Largest accepted LED binary block: three bytes per LED.
pub const LED_BLOB_MAX: usize = N_LEDS_MAX * 3;

/// How long `LED` may wait for the channel's transmit buffer.
pub const LED_CLAIM_TIMEOUT: Duration = Duration::from_millis(1000);

/// A quick-fire rule with both hardware indices resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfiguredRule {
    pub id: u8,
    pub input: SwitchPos,
    pub output: OutputTarget,
    pub hold_off_ms: u16,
    pub t_pulse_ms: u16,
    pub pwm_on: u16,
    pub pwm_off: u16,
    pub pos_edge: bool,
}

/// Everything the executor asks of the I/O layer. Implemented by the
/// firmware on top of its channels and driver statics; mocked in host
/// tests.
pub trait DeviceServices {
    /// Queue `bytes` on the command channel. Lossy under pressure.
    fn send(&mut self, bytes: &[u8]) -> bool;

    /// Rescan the I2C busses for GPIO expanders.
    async fn discover(&mut self);

    /// Enable or disable switch-event reporting.
    fn set_switch_reporting(&mut self, on: bool);

    /// Enable or disable the debounce filter for one input.
    fn set_debounce(&mut self, input: SwitchPos, on: bool);

    /// Current debounced switch bitmap.
    fn switch_state(&mut self) -> SwitchState;

    /// Resolve an output hardware index to its physical location.
    fn resolve_output(&mut self, hw_index: u16) -> Option<OutputTarget>;

    /// Apply a level or pulse to a resolved output.
    async fn drive_output(
        &mut self,
        target: OutputTarget,
        pwm_low: u16,
        t_pulse_ms: u16,
        pwm_high: u16,
    );

    /// Install a validated rule in its slot.
    fn configure_rule(&mut self, rule: ConfiguredRule);

    /// Enable or disable a rule slot. False if the slot was never
    /// configured.
    fn enable_rule(&mut self, id: u8, on: bool) -> bool;

    /// Reconfigure an LED channel's bus speed and frame format.
    async fn configure_led_bus(&mut self, channel: u8, speed_hz: u32, frame_format: Option<u32>);

    /// Resolve once the LED channel's transmit buffer is free to fill.
    /// The executor bounds the wait with [`LED_CLAIM_TIMEOUT`].
    async fn claim_led_channel(&mut self, channel: u8);

    /// Hand a custom I2C request to the pipeline. False if admission
    /// timed out.
    async fn submit_i2c(&mut self, req: I2cRequest) -> bool;
}

/// Dispatch one complete command line: parse, execute, echo failures.
/// This is the parser host's dispatch body.
pub async fn dispatch_line<S: DeviceServices>(line: &[u8], services: &mut S) -> Action {
    let Ok(text) = core::str::from_utf8(line) else {
        echo_failure(CommandError::BadCommand, line, services);
        return Action::Continue;
    };
    let cmd = match parse_line(text) {
        Ok(Some(cmd)) => cmd,
        Ok(None) => return Action::Continue,
        Err(err) => {
            echo_failure(err, line, services);
            return Action::Continue;
        }
    };
    match execute(cmd, services).await {
        Ok(action) => action,
        Err(err) => {
            echo_failure(err, line, services);
            Action::Continue
        }
    }
}

/// Execute one parsed command. Validation happens here; side effects only
/// after it passes.
pub async fn execute<S: DeviceServices>(
    cmd: Command,
    services: &mut S,
) -> Result<Action, CommandError> {
    match cmd {
        Command::Help => {
            send_help(services);
        }
        Command::Identify => {
            services.send(IDN_RESPONSE.as_bytes());
        }
        Command::Discover => {
            services.discover().await;
        }
        Command::SwitchEvents { on } => {
            services.set_switch_reporting(on);
        }
        Command::Debounce { hw_index, on } => {
            let input = SwitchPos(hw_index);
            if !input.in_range() {
                return Err(CommandError::InvalidArg);
            }
            services.set_debounce(input, on);
        }
        Command::SwitchQuery => {
            if let Ok(report) = services.switch_state().report() {
                services.send(report.as_bytes());
            } else {
                // Nothing partial goes out
                #[cfg(feature = "defmt")]
                defmt::error!("switch report overflow");
            }
        }
        Command::Output {
            hw_index,
            pwm_low,
            t_pulse_ms,
            pwm_high,
        } => {
            let target = services
                .resolve_output(hw_index)
                .ok_or(CommandError::InvalidArg)?;
            if !target.pwm_in_range(pwm_low) || !target.pwm_in_range(pwm_high) {
                return Err(CommandError::InvalidArg);
            }
            services
                .drive_output(target, pwm_low, t_pulse_ms, pwm_high)
                .await;
        }
        Command::RuleConfig(params) => {
            if usize::from(params.id) >= MAX_QUICK_RULES {
                return Err(CommandError::InvalidArg);
            }
            let input = SwitchPos(params.input_index);
            if !input.in_range() {
                return Err(CommandError::InvalidArg);
            }
            let output = services
                .resolve_output(params.output_index)
                .ok_or(CommandError::InvalidArg)?;
            if !output.pwm_in_range(params.pwm_on) || !output.pwm_in_range(params.pwm_off) {
                return Err(CommandError::InvalidArg);
            }
            services.configure_rule(ConfiguredRule {
                id: params.id,
                input,
                output,
                hold_off_ms: params.hold_off_ms,
                t_pulse_ms: params.t_pulse_ms,
                pwm_on: params.pwm_on,
                pwm_off: params.pwm_off,
                pos_edge: params.pos_edge,
            });
        }
        Command::RuleEnable { id, on } => {
            if usize::from(id) >= MAX_QUICK_RULES || !services.enable_rule(id, on) {
                return Err(CommandError::InvalidArg);
            }
        }
        Command::LedBusConfig {
            channel,
            speed_hz,
            frame_format,
        } => {
            if channel >= N_LED_CHANNELS {
                return Err(CommandError::InvalidArg);
            }
            services
                .configure_led_bus(channel, speed_hz, frame_format)
                .await;
        }
        Command::LedBlob { channel, n_bytes } => {
            if channel >= N_LED_CHANNELS || n_bytes % 3 != 0 || n_bytes > LED_BLOB_MAX {
                return Err(CommandError::InvalidArg);
            }
            match with_timeout(LED_CLAIM_TIMEOUT, services.claim_led_channel(channel)).await {
                Ok(()) => {
                    return Ok(Action::EnterBlob {
                        channel,
                        len: n_bytes,
                    })
                }
                Err(_) => {
                    // The stream stays in Ascii mode; the peer's block
                    // bytes will bounce off the dispatcher.
                    #[cfg(feature = "defmt")]
                    defmt::warn!("LED channel {} busy, block refused", channel);
                }
            }
        }
        Command::I2cTransfer(req) => {
            if !services.submit_i2c(req).await {
                #[cfg(feature = "defmt")]
                defmt::warn!("I2C pipeline busy, request dropped");
            }
        }
    }
    Ok(Action::Continue)
}

/// `[TAG] <line>` echo, sent in three pieces so a non-UTF-8 line can be
/// reflected byte-for-byte.
fn echo_failure<S: DeviceServices>(err: CommandError, line: &[u8], services: &mut S) {
    let mut head: String<16> = String::new();
    let _ = write!(head, "[{}] ", err.tag());
    services.send(head.as_bytes());
    services.send(line);
    services.send(b"\n");
}

fn send_help<S: DeviceServices>(services: &mut S) {
    services.send(b"\nAvailable commands\n------------------\n");
    for spec in COMMAND_TABLE {
        let mut line: String<96> = String::new();
        let _ = writeln!(line, "{}{}", spec.name, spec.help);
        services.send(line.as_bytes());
    }
}
