//! Host command protocol for the Playfield controller
//!
//! This crate defines the serial protocol between the host PC and the
//! playfield I/O board. The link carries two kinds of traffic over a single
//! byte stream:
//!
//! - ASCII command lines, terminated by LF, CR, or NUL, with
//!   whitespace-delimited arguments (`OUT 0x0FE 1 1500 15`)
//! - raw binary blocks of a pre-announced exact length, requested by the
//!   `LED` command and streamed straight into a per-channel transmit buffer
//!
//! ```text
//! ... S W ? \n L E D   0   6 \n b0 b1 b2 b3 b4 b5 D I S C \n ...
//!     └───────┘ └─────────────┘ └───────────────┘ └────────┘
//!      Ascii        Ascii          binary block      Ascii
//! ```
//!
//! The parser guarantees zero byte loss and no byte duplication regardless
//! of how reads are fragmented by the transport.

#![no_std]
#![deny(unsafe_code)]
#![allow(async_fn_in_trait)]

pub mod buffer;
pub mod command;
pub mod hex;
pub mod parser;

pub use buffer::{LineBuffer, CMD_BUF_CAPACITY};
pub use command::{parse_line, Command, CommandError, I2cRequest, COMMAND_TABLE, I2C_BUF_LEN};
pub use parser::{Action, CommandHost, ParseError, ProtocolParser};
