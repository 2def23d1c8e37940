//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod command;
pub mod i2c_engine;
pub mod i2c_report;
pub mod io;
pub mod led;
pub mod switch_report;
pub mod tx;

pub use command::command_task;
pub use i2c_engine::i2c_engine_task;
pub use i2c_report::i2c_report_task;
pub use io::io_task;
pub use led::led_task;
pub use switch_report::switch_report_task;
pub use tx::tx_task;
