//! I2C bus engine task
//!
//! Executes admitted custom-I2C requests on the hardware buses and
//! produces the completion for the reporter. Also runs expander
//! discovery scans on request.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::i2c::{AbortReason, Async, Error, I2c};
use heapless::Vec;

use playfield_core::i2c::{I2cCompletion, I2cStatus};
use playfield_protocol::command::{I2cRequest, I2C_BUF_LEN};

use crate::channels::{DISCOVER, I2C_PIPELINE, I2C_REQUESTS};

/// Address range scanned for PCF8574 GPIO expanders
const EXPANDER_ADDR_FIRST: u8 = 0x20;
const EXPANDER_ADDR_LAST: u8 = 0x27;

/// I2C engine task - runs one admitted transaction at a time
#[embassy_executor::task]
pub async fn i2c_engine_task(mut bus0: I2c<'static, Async>, mut bus1: I2c<'static, Async>) {
    info!("I2C engine task started");

    loop {
        match select(I2C_REQUESTS.receive(), DISCOVER.wait()).await {
            Either::First(req) => {
                let completion = run_transfer(&mut bus0, &mut bus1, &req).await;
                I2C_PIPELINE.complete(completion);
            }
            Either::Second(()) => {
                discover(&mut bus0, 0).await;
                discover(&mut bus1, 1).await;
            }
        }
    }
}

async fn run_transfer(
    bus0: &mut I2c<'static, Async>,
    bus1: &mut I2c<'static, Async>,
    req: &I2cRequest,
) -> I2cCompletion {
    let bus = match req.channel {
        0 => bus0,
        1 => bus1,
        // Channels 2 and 3 are not populated on this board
        _ => return I2cCompletion::failed(I2cStatus::Error),
    };

    let mut rx_buf = [0u8; I2C_BUF_LEN];
    let rx = &mut rx_buf[..req.rx_count];

    let result = if req.rx_count > 0 {
        if req.tx.is_empty() {
            bus.read_async(req.addr, rx).await
        } else {
            bus.write_read_async(req.addr, req.tx.iter().copied(), rx).await
        }
    } else {
        bus.write_async(req.addr, req.tx.iter().copied()).await
    };

    match result {
        Ok(()) => I2cCompletion::success(Vec::from_slice(rx).unwrap_or_default()),
        Err(e) => {
            debug!("I2C transfer failed on channel {}", req.channel);
            I2cCompletion::failed(status_of(e))
        }
    }
}

/// Map driver errors to wire status tokens.
fn status_of(err: Error) -> I2cStatus {
    match err {
        Error::Abort(AbortReason::NoAcknowledge) => I2cStatus::AddrNack,
        Error::Abort(AbortReason::ArbitrationLoss) => I2cStatus::ArbLost,
        _ => I2cStatus::Error,
    }
}

/// Probe the expander address range with one-byte reads.
async fn discover(bus: &mut I2c<'static, Async>, channel: u8) {
    let mut found = 0;
    for addr in EXPANDER_ADDR_FIRST..=EXPANDER_ADDR_LAST {
        let mut probe = [0u8; 1];
        if bus.read_async(addr, &mut probe).await.is_ok() {
            info!("Expander at channel {} addr {=u8:#04x}", channel, addr);
            found += 1;
        }
    }
    info!("Discovery: {} expander(s) on channel {}", found, channel);
}
