//! Switch event task
//!
//! Folds debounced edge events from the sampling layer into the switch
//! bitmap and, when SWE reporting is on, forwards each event to the
//! host.

use core::fmt::Write;

use defmt::*;
use heapless::String;
use portable_atomic::Ordering;

use crate::channels::{GATEWAY, SWITCH_EVENTS, SWITCH_REPORTING, SWITCH_STATE};

/// Switch report task - single writer of the switch bitmap
#[embassy_executor::task]
pub async fn switch_report_task() {
    info!("Switch report task started");

    loop {
        let event = SWITCH_EVENTS.receive().await;
        SWITCH_STATE.lock(|state| state.borrow_mut().set(event.pos, event.closed));

        if SWITCH_REPORTING.load(Ordering::Relaxed) {
            let mut line: String<16> = String::new();
            if write!(line, "SE:{:03x} {}\n", event.pos.0, u8::from(event.closed)).is_ok() {
                GATEWAY.send(line.as_bytes());
            }
        }
    }
}
