//! I2C completion reporter task
//!
//! Formats finished transactions for the host and releases the pipeline
//! slot so the next I2C command can be admitted.

use defmt::*;

use crate::channels::{GATEWAY, I2C_PIPELINE};

/// I2C report task - the only place the admission slot is released
#[embassy_executor::task]
pub async fn i2c_report_task() {
    info!("I2C report task started");

    loop {
        let completion = I2C_PIPELINE.completed().await;
        GATEWAY.send(completion.report().as_bytes());
        I2C_PIPELINE.release();
    }
}
