//! Host UART transmit task
//!
//! Drains the transmit gateway onto the host UART.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::GATEWAY;

/// Chunk size moved from the gateway per write
const TX_CHUNK: usize = 64;

/// TX task - moves queued response bytes to the host
#[embassy_executor::task]
pub async fn tx_task(mut tx: BufferedUartTx<'static>) {
    info!("TX task started");

    let mut buf = [0u8; TX_CHUNK];

    loop {
        let n = GATEWAY.drain(&mut buf).await;
        if let Err(e) = tx.write_all(&buf[..n]).await {
            warn!("UART write error: {:?}", e);
        }
    }
}
