//! Output driver task
//!
//! Applies OUT actions to the board's outputs. Hardware PWM channels are
//! driven directly; expander pins are handed to the soft-PWM engine that
//! services the I2C expanders.

use defmt::*;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::Timer;

use playfield_core::hwindex::{OutputTarget, MAX_HW_PWM};

use crate::channels::{OutputAction, OUTPUT_ACTIONS};

/// Hardware PWM channels populated on this board
pub const N_HW_PWM: usize = 2;

/// I/O task - consumes output actions from the executor
#[embassy_executor::task]
pub async fn io_task(mut pwms: [Pwm<'static>; N_HW_PWM]) {
    info!("I/O task started");

    // Counter top equals the wire duty range, so values map 1:1
    let mut cfg = PwmConfig::default();
    cfg.top = MAX_HW_PWM;

    loop {
        match OUTPUT_ACTIONS.receive().await {
            OutputAction::Drive {
                target,
                pwm_low,
                t_pulse_ms,
                pwm_high,
            } => match target {
                OutputTarget::HwPwm { channel } => {
                    let Some(pwm) = pwms.get_mut(usize::from(channel)) else {
                        warn!("OUT: no hardware PWM behind channel {}", channel);
                        continue;
                    };
                    if t_pulse_ms > 0 {
                        set_level(pwm, &mut cfg, pwm_high);
                        Timer::after_millis(u64::from(t_pulse_ms)).await;
                    }
                    set_level(pwm, &mut cfg, pwm_low);
                }
                OutputTarget::ExpanderPin {
                    channel,
                    address,
                    pin,
                } => {
                    // Expander soft-PWM engine attaches here
                    debug!(
                        "OUT: expander ch {} addr {=u8:#04x} pin {}: low {} pulse {} ms high {}",
                        channel, address, pin, pwm_low, t_pulse_ms, pwm_high
                    );
                }
            },
        }
    }
}

fn set_level(pwm: &mut Pwm<'static>, cfg: &mut PwmConfig, level: u16) {
    cfg.compare_a = level;
    pwm.set_config(cfg);
}
