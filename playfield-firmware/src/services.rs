//! Device services for the command executor
//!
//! Implements the executor's [`DeviceServices`] seam and the parser's
//! [`CommandHost`] seam on top of the firmware's static channels. This is
//! where abstract operations turn into messages for the driver tasks.

use defmt::*;
use portable_atomic::Ordering;

use playfield_core::exec::{dispatch_line, ConfiguredRule, DeviceServices};
use playfield_core::hwindex::{OutputTarget, SwitchPos};
use playfield_core::i2c::I2C_ADMIT_TIMEOUT;
use playfield_core::switches::SwitchState;
use playfield_protocol::command::I2cRequest;
use playfield_protocol::parser::{Action, CommandHost};

use crate::channels::{
    LedCommand, OutputAction, QuickRule, DEBOUNCE_MASK, DISCOVER, GATEWAY, I2C_PIPELINE,
    I2C_REQUESTS, LED_CLAIMS, LED_COMMANDS, LED_FRAMES, OUTPUT_ACTIONS, RULES, SWITCH_REPORTING,
    SWITCH_STATE,
};

/// Board's hardware index map: 0x000..0x100 are expander pins (64 per
/// I2C channel, 8 per PCF8574), 0x100..0x104 are hardware PWM channels.
fn resolve(hw_index: u16) -> Option<OutputTarget> {
    match hw_index {
        0x000..=0x0FF => Some(OutputTarget::ExpanderPin {
            channel: (hw_index / 64) as u8,
            address: 0x20 + ((hw_index % 64) / 8) as u8,
            pin: (hw_index % 8) as u8,
        }),
        0x100..=0x103 => Some(OutputTarget::HwPwm {
            channel: (hw_index - 0x100) as u8,
        }),
        _ => None,
    }
}

/// Stateless handle over the static channels.
pub struct Services;

impl DeviceServices for Services {
    fn send(&mut self, bytes: &[u8]) -> bool {
        GATEWAY.send(bytes)
    }

    async fn discover(&mut self) {
        DISCOVER.signal(());
    }

    fn set_switch_reporting(&mut self, on: bool) {
        SWITCH_REPORTING.store(on, Ordering::Relaxed);
    }

    fn set_debounce(&mut self, input: SwitchPos, on: bool) {
        DEBOUNCE_MASK.lock(|mask| mask.borrow_mut().set(input, on));
    }

    fn switch_state(&mut self) -> SwitchState {
        SWITCH_STATE.lock(|state| *state.borrow())
    }

    fn resolve_output(&mut self, hw_index: u16) -> Option<OutputTarget> {
        resolve(hw_index)
    }

    async fn drive_output(
        &mut self,
        target: OutputTarget,
        pwm_low: u16,
        t_pulse_ms: u16,
        pwm_high: u16,
    ) {
        OUTPUT_ACTIONS
            .send(OutputAction::Drive {
                target,
                pwm_low,
                t_pulse_ms,
                pwm_high,
            })
            .await;
    }

    fn configure_rule(&mut self, rule: ConfiguredRule) {
        RULES.lock(|rules| {
            rules.borrow_mut()[usize::from(rule.id)] = Some(QuickRule {
                rule,
                enabled: false,
            });
        });
        debug!("rule {} configured", rule.id);
    }

    fn enable_rule(&mut self, id: u8, on: bool) -> bool {
        RULES.lock(|rules| {
            match rules.borrow_mut()[usize::from(id)].as_mut() {
                Some(slot) => {
                    slot.enabled = on;
                    true
                }
                None => false,
            }
        })
    }

    async fn configure_led_bus(&mut self, channel: u8, speed_hz: u32, frame_format: Option<u32>) {
        LED_COMMANDS
            .send(LedCommand::Configure {
                channel,
                speed_hz,
                frame_format,
            })
            .await;
    }

    async fn claim_led_channel(&mut self, channel: u8) {
        match LED_CLAIMS.get(usize::from(channel)) {
            Some(claim) => claim.send(()).await,
            // No SPI behind this channel; the executor's timeout refuses
            // the block
            None => core::future::pending().await,
        }
    }

    async fn submit_i2c(&mut self, req: I2cRequest) -> bool {
        if I2C_PIPELINE.admit(I2C_ADMIT_TIMEOUT).await.is_err() {
            return false;
        }
        I2C_REQUESTS.send(req).await;
        true
    }
}

impl CommandHost for Services {
    async fn dispatch(&mut self, line: &[u8]) -> Action {
        dispatch_line(line, self).await
    }

    async fn blob_write(&mut self, channel: u8, bytes: &[u8]) {
        // The claim token makes this task the buffer's only writer
        if let Some(frame) = LED_FRAMES.get(usize::from(channel)) {
            frame.lock(|frame| {
                if frame.borrow_mut().extend_from_slice(bytes).is_err() {
                    warn!("LED frame buffer overrun on channel {}", channel);
                }
            });
        }
    }

    async fn blob_done(&mut self, channel: u8) {
        LED_COMMANDS.send(LedCommand::Blast { channel }).await;
    }
}
