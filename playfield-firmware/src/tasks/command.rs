//! Host UART receive task
//!
//! Feeds received bytes through the protocol parser; complete lines are
//! dispatched and LED binary blocks stream into their frame buffers.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use playfield_protocol::parser::ProtocolParser;

use crate::services::Services;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Command task - parses and dispatches the host byte stream
#[embassy_executor::task]
pub async fn command_task(mut rx: BufferedUartRx<'static>) {
    info!("Command task started");

    let mut parser = ProtocolParser::new();
    let mut services = Services;
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                if let Err(e) = parser.feed(&buf[..n], &mut services).await {
                    error!("Command stream lost: {:?}", e);
                    break;
                }
            }
            Ok(_) => {
                // No bytes read, continue
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }

    // An unterminated overlong line means the framing is gone; stop
    // consuming until the link is reset
    core::future::pending::<()>().await;
}
