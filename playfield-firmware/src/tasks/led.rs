//! LED string task
//!
//! Owns the transmit-only SPI buses behind the LED channels. Blasts
//! filled frame buffers to the strings and applies LEC bus settings.

use defmt::*;
use embassy_rp::spi::{Async, Spi};

use playfield_core::exec::LED_BLOB_MAX;

use crate::channels::{LedCommand, LED_CLAIMS, LED_COMMANDS, LED_FRAMES};

/// LED task - one transfer at a time per channel, serialized here
#[embassy_executor::task]
pub async fn led_task(mut spi0: Spi<'static, Async>, mut spi1: Spi<'static, Async>) {
    info!("LED task started");

    let mut frame = [0u8; LED_BLOB_MAX];

    loop {
        match LED_COMMANDS.receive().await {
            LedCommand::Configure {
                channel,
                speed_hz,
                frame_format,
            } => {
                let spi = match channel {
                    0 => &mut spi0,
                    1 => &mut spi1,
                    _ => {
                        warn!("LEC: no SPI behind channel {}", channel);
                        continue;
                    }
                };
                spi.set_frequency(speed_hz);
                // Wire format is fixed by the string hardware; the
                // frameFmt argument is accepted for compatibility
                info!(
                    "LED channel {}: {} Hz, frameFmt {}",
                    channel,
                    speed_hz,
                    frame_format.unwrap_or(0)
                );
            }
            LedCommand::Blast { channel } => {
                let spi = match channel {
                    0 => &mut spi0,
                    1 => &mut spi1,
                    _ => continue,
                };
                // Copy out under the lock, then transfer without it
                let len = LED_FRAMES[usize::from(channel)].lock(|buf| {
                    let mut buf = buf.borrow_mut();
                    let len = buf.len();
                    frame[..len].copy_from_slice(buf.as_slice());
                    buf.clear();
                    len
                });

                if let Err(e) = spi.write(&frame[..len]).await {
                    warn!("SPI write failed on channel {}: {:?}", channel, e);
                } else {
                    trace!("Blasted {} bytes to LED channel {}", len, channel);
                }

                // Buffer is free again for the next LED command
                let _ = LED_CLAIMS[usize::from(channel)].try_receive();
            }
        }
    }
}
