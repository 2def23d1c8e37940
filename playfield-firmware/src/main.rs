//! Playfield - Pinball I/O Controller Firmware
//!
//! Main firmware binary for RP2040-based playfield controller boards.
//! Speaks the ASCII command protocol (with raw binary LED payloads) over
//! the host UART and drives the board's I2C expanders, LED strings and
//! PWM outputs.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{Config as I2cConfig, I2c, InterruptHandler as I2cInterruptHandler};
use embassy_rp::peripherals::{I2C0, I2C1, UART0};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use playfield_core::hwindex::MAX_HW_PWM;

mod channels;
mod services;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
    I2C1_IRQ => I2cInterruptHandler<I2C1>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Default LED string bit rate, reconfigurable per channel with LEC
const LED_DEFAULT_HZ: u32 = 3_200_000;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Playfield firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Host link on UART0
    let uart_config = UartConfig::default(); // 115200 baud default
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("Host UART initialized");

    // I2C buses for the GPIO expanders and custom transactions
    let i2c0 = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, I2cConfig::default());
    let i2c1 = I2c::new_async(p.I2C1, p.PIN_3, p.PIN_2, Irqs, I2cConfig::default());

    info!("I2C buses initialized");

    // Transmit-only SPI for the LED strings
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = LED_DEFAULT_HZ;
    let spi0 = Spi::new_txonly(p.SPI0, p.PIN_18, p.PIN_19, p.DMA_CH0, spi_config.clone());
    let spi1 = Spi::new_txonly(p.SPI1, p.PIN_10, p.PIN_11, p.DMA_CH1, spi_config);

    info!("LED SPI initialized");

    // Hardware PWM outputs, counting to the wire duty range
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = MAX_HW_PWM;
    let pwm0 = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, pwm_config.clone());
    let pwm1 = Pwm::new_output_a(p.PWM_SLICE7, p.PIN_14, pwm_config);

    info!("PWM outputs initialized");

    // Spawn tasks
    spawner.spawn(tasks::command_task(rx)).unwrap();
    spawner.spawn(tasks::tx_task(tx)).unwrap();
    spawner.spawn(tasks::i2c_engine_task(i2c0, i2c1)).unwrap();
    spawner.spawn(tasks::i2c_report_task()).unwrap();
    spawner.spawn(tasks::led_task(spi0, spi1)).unwrap();
    spawner.spawn(tasks::io_task([pwm0, pwm1])).unwrap();
    spawner.spawn(tasks::switch_report_task()).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
