//! Board-agnostic command execution core for the playfield controller
//!
//! This crate contains the logic between the wire protocol and the I/O
//! layer that does not depend on specific hardware:
//!
//! - Command executor over the [`exec::DeviceServices`] collaborator seam
//! - Hardware-index targets and PWM ceilings
//! - Debounced switch bitmap and its wire report
//! - Single-slot asynchronous custom-I2C pipeline
//! - Thread-safe transmit gateway with the lossy-under-pressure policy

#![no_std]
#![deny(unsafe_code)]
#![allow(async_fn_in_trait)]

pub mod exec;
pub mod hwindex;
pub mod i2c;
pub mod switches;
pub mod txgate;
