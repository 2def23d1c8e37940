//! Command grammar: tokenizer, ordered command table, and typed parsing.
//!
//! A completed line is split on whitespace, token\[0\] is resolved against
//! the static table by exact match, and the remaining tokens are parsed
//! into a typed [`Command`]. Each command validates its exact argument
//! count; numeric arguments accept decimal or `0x`-prefixed hex. Table
//! order is the help-listing order.

use heapless::Vec;

use crate::hex;

/// Capacity of the custom-I2C transmit and receive buffers in bytes.
pub const I2C_BUF_LEN: usize = 64;

/// Highest valid custom-I2C channel number.
pub const I2C_CHANNEL_MAX: u8 = 3;

/// Most tokens any command carries (`RUL` plus its eight arguments).
const MAX_TOKENS: usize = 9;

/// Protocol-level command failures, recovered locally and echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// token\[0\] did not match any table entry
    BadCommand,
    TooFewArgs,
    TooManyArgs,
    /// An argument failed numeric parsing or a protocol-level range check
    InvalidArg,
}

impl CommandError {
    /// Diagnostic tag echoed back with the offending input.
    pub fn tag(&self) -> &'static str {
        match self {
            CommandError::BadCommand => "BAD_CMD",
            CommandError::TooFewArgs => "TOO_FEW_ARGS",
            CommandError::TooManyArgs => "TOO_MANY_ARGS",
            CommandError::InvalidArg => "INVALID_ARG",
        }
    }
}

/// A custom I2C transaction request, decoded and bounds-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cRequest {
    /// Bus number, 0..=3
    pub channel: u8,
    /// 7-bit device address
    pub addr: u8,
    /// Bytes to transmit, decoded from hex text
    pub tx: Vec<u8, I2C_BUF_LEN>,
    /// Number of bytes to read back, 0..=64
    pub rx_count: usize,
}

/// Quick-fire rule parameters as given on the wire (indices unresolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuleParams {
    pub id: u8,
    pub input_index: u16,
    pub output_index: u16,
    pub hold_off_ms: u16,
    pub t_pulse_ms: u16,
    pub pwm_on: u16,
    pub pwm_off: u16,
    pub pos_edge: bool,
}

/// A fully parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `?` - list available commands
    Help,
    /// `*IDN?` - identity and version info
    Identify,
    /// `DISC` - rescan I2C expanders
    Discover,
    /// `SWE <onOff>` - switch-event reporting
    SwitchEvents { on: bool },
    /// `DEB <hwIndex> <onOff>` - per-input debounce filter
    Debounce { hw_index: u16, on: bool },
    /// `SW?` - dump the debounced switch bitmap
    SwitchQuery,
    /// `OUT <hwIndex> <pwmLow> [tPulse] [pwmHigh]`
    Output {
        hw_index: u16,
        pwm_low: u16,
        t_pulse_ms: u16,
        pwm_high: u16,
    },
    /// `RUL <id> <idIn> <idOut> <holdOff> <tPulse> <pwmOn> <pwmOff> <posEdge>`
    RuleConfig(RuleParams),
    /// `RULE <id> <onOff>`
    RuleEnable { id: u8, on: bool },
    /// `LEC <channel> <speedHz> [frameFmt]`
    LedBusConfig {
        channel: u8,
        speed_hz: u32,
        frame_format: Option<u32>,
    },
    /// `LED <channel> <nBytes>` followed by `nBytes` raw bytes
    LedBlob { channel: u8, n_bytes: usize },
    /// `I2C <channel> <addr> <hexTxData> <nBytesRx>`
    I2cTransfer(I2cRequest),
}

/// One entry of the static command table.
pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
    parse: fn(&[&str]) -> Result<Command, CommandError>,
}

/// The command table. Order is the `?` help-listing order.
pub static COMMAND_TABLE: &[CommandSpec] = &[
    CommandSpec {
        name: "?",
        help: ": Display list of commands",
        parse: parse_help,
    },
    CommandSpec {
        name: "*IDN?",
        help: ": Display ID and version info",
        parse: parse_idn,
    },
    CommandSpec {
        name: "DISC",
        help: ": Discover GPIO expanders on the I2C busses",
        parse: parse_disc,
    },
    CommandSpec {
        name: "SWE",
        help: ": <OnOff> En./Dis. reporting of switch events",
        parse: parse_swe,
    },
    CommandSpec {
        name: "DEB",
        help: ": <hwIndex> <OnOff> En./Dis. input debouncing",
        parse: parse_deb,
    },
    CommandSpec {
        name: "SW?",
        help: ": Return the state of ALL switches",
        parse: parse_sw,
    },
    CommandSpec {
        name: "OUT",
        help: ": <hwIndex> <PWMlow> [tPulse] [PWMhigh]",
        parse: parse_out,
    },
    CommandSpec {
        name: "RUL",
        help: ": <ID> <IDin> <IDout> <trHoldOff> <tPulse> <pwmOn> <pwmOff> <bPosEdge>",
        parse: parse_rul,
    },
    CommandSpec {
        name: "RULE",
        help: ": En./Dis a prev. def. rule: RULE <ID> <OnOff>",
        parse: parse_rule,
    },
    CommandSpec {
        name: "LEC",
        help: ": <channel> <speed [Hz]> [frameFmt]",
        parse: parse_lec,
    },
    CommandSpec {
        name: "LED",
        help: ": <channel> <nBytes>\\n<binary blob of nBytes>",
        parse: parse_led,
    },
    CommandSpec {
        name: "I2C",
        help: ": <channel> <I2Caddr> <sendData> <nBytesRx>",
        parse: parse_i2c,
    },
];

/// Parse one command line.
///
/// Returns `Ok(None)` for a line with no tokens (whitespace only), which
/// is ignored like a zero-length command.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let mut tokens: Vec<&str, MAX_TOKENS> = Vec::new();
    for token in line.split_ascii_whitespace() {
        tokens.push(token).map_err(|_| CommandError::TooManyArgs)?;
    }
    let Some(name) = tokens.first() else {
        return Ok(None);
    };
    let spec = COMMAND_TABLE
        .iter()
        .find(|spec| spec.name == *name)
        .ok_or(CommandError::BadCommand)?;
    (spec.parse)(&tokens[1..]).map(Some)
}

fn require_args(args: &[&str], n: usize) -> Result<(), CommandError> {
    use core::cmp::Ordering;
    match args.len().cmp(&n) {
        Ordering::Less => Err(CommandError::TooFewArgs),
        Ordering::Greater => Err(CommandError::TooManyArgs),
        Ordering::Equal => Ok(()),
    }
}

/// Parse a number in decimal or `0x` hex.
pub fn parse_u32(token: &str) -> Result<u32, CommandError> {
    let (digits, radix) = match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(rest) => (rest, 16),
        None => (token, 10),
    };
    u32::from_str_radix(digits, radix).map_err(|_| CommandError::InvalidArg)
}

fn parse_u16(token: &str) -> Result<u16, CommandError> {
    parse_u32(token)?
        .try_into()
        .map_err(|_| CommandError::InvalidArg)
}

fn parse_u8(token: &str) -> Result<u8, CommandError> {
    parse_u32(token)?
        .try_into()
        .map_err(|_| CommandError::InvalidArg)
}

/// On/off flags: any nonzero value is on.
fn parse_flag(token: &str) -> Result<bool, CommandError> {
    Ok(parse_u32(token)? != 0)
}

fn parse_help(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 0)?;
    Ok(Command::Help)
}

fn parse_idn(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 0)?;
    Ok(Command::Identify)
}

fn parse_disc(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 0)?;
    Ok(Command::Discover)
}

fn parse_swe(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 1)?;
    Ok(Command::SwitchEvents {
        on: parse_flag(args[0])?,
    })
}

fn parse_deb(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 2)?;
    Ok(Command::Debounce {
        hw_index: parse_u16(args[0])?,
        on: parse_flag(args[1])?,
    })
}

fn parse_sw(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 0)?;
    Ok(Command::SwitchQuery)
}

fn parse_out(args: &[&str]) -> Result<Command, CommandError> {
    // Two args is a steady level, four is pulse-then-hold
    match args.len() {
        2 => {
            let pwm_low = parse_u16(args[1])?;
            Ok(Command::Output {
                hw_index: parse_u16(args[0])?,
                pwm_low,
                t_pulse_ms: 0,
                pwm_high: pwm_low,
            })
        }
        4 => Ok(Command::Output {
            hw_index: parse_u16(args[0])?,
            pwm_low: parse_u16(args[1])?,
            t_pulse_ms: parse_u16(args[2])?,
            pwm_high: parse_u16(args[3])?,
        }),
        0..=3 => Err(CommandError::TooFewArgs),
        _ => Err(CommandError::TooManyArgs),
    }
}

fn parse_rul(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 8)?;
    Ok(Command::RuleConfig(RuleParams {
        id: parse_u8(args[0])?,
        input_index: parse_u16(args[1])?,
        output_index: parse_u16(args[2])?,
        hold_off_ms: parse_u16(args[3])?,
        t_pulse_ms: parse_u16(args[4])?,
        pwm_on: parse_u16(args[5])?,
        pwm_off: parse_u16(args[6])?,
        pos_edge: parse_flag(args[7])?,
    }))
}

fn parse_rule(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 2)?;
    Ok(Command::RuleEnable {
        id: parse_u8(args[0])?,
        on: parse_flag(args[1])?,
    })
}

fn parse_lec(args: &[&str]) -> Result<Command, CommandError> {
    match args.len() {
        2 | 3 => Ok(Command::LedBusConfig {
            channel: parse_u8(args[0])?,
            speed_hz: parse_u32(args[1])?,
            frame_format: args.get(2).map(|t| parse_u32(t)).transpose()?,
        }),
        0 | 1 => Err(CommandError::TooFewArgs),
        _ => Err(CommandError::TooManyArgs),
    }
}

fn parse_led(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 2)?;
    Ok(Command::LedBlob {
        channel: parse_u8(args[0])?,
        n_bytes: parse_u32(args[1])? as usize,
    })
}

fn parse_i2c(args: &[&str]) -> Result<Command, CommandError> {
    require_args(args, 4)?;
    let channel = parse_u8(args[0])?;
    if channel > I2C_CHANNEL_MAX {
        return Err(CommandError::InvalidArg);
    }
    let addr = parse_u8(args[1])?;
    if addr > 0x7F {
        return Err(CommandError::InvalidArg);
    }
    let tx = hex::decode(args[2]).map_err(|_| CommandError::InvalidArg)?;
    let rx_count = parse_u32(args[3])? as usize;
    if rx_count > I2C_BUF_LEN {
        return Err(CommandError::InvalidArg);
    }
    Ok(Command::I2cTransfer(I2cRequest {
        channel,
        addr,
        tx,
        rx_count,
    }))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        parse_line(line)
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse("FOO 1 2"), Err(CommandError::BadCommand));
    }

    #[test]
    fn test_whitespace_only_line_ignored() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("?"), Ok(Some(Command::Help)));
        assert_eq!(parse("*IDN?"), Ok(Some(Command::Identify)));
        assert_eq!(parse("DISC"), Ok(Some(Command::Discover)));
        assert_eq!(parse("SW?"), Ok(Some(Command::SwitchQuery)));
    }

    #[test]
    fn test_arity_checking() {
        assert_eq!(parse("SWE"), Err(CommandError::TooFewArgs));
        assert_eq!(parse("SWE 1 2"), Err(CommandError::TooManyArgs));
        assert_eq!(parse("DISC 1"), Err(CommandError::TooManyArgs));
        assert_eq!(parse("OUT 0x10"), Err(CommandError::TooFewArgs));
        assert_eq!(parse("OUT 0x10 1 2"), Err(CommandError::TooFewArgs));
        assert_eq!(parse("OUT 0x10 1 2 3 4"), Err(CommandError::TooManyArgs));
    }

    #[test]
    fn test_decimal_and_hex_numbers() {
        assert_eq!(
            parse("DEB 0x2A 1"),
            Ok(Some(Command::Debounce {
                hw_index: 42,
                on: true
            }))
        );
        assert_eq!(
            parse("DEB 42 0"),
            Ok(Some(Command::Debounce {
                hw_index: 42,
                on: false
            }))
        );
        assert_eq!(parse("DEB 4z 1"), Err(CommandError::InvalidArg));
    }

    #[test]
    fn test_out_short_form_is_steady_level() {
        assert_eq!(
            parse("OUT 0x0FE 2"),
            Ok(Some(Command::Output {
                hw_index: 0x0FE,
                pwm_low: 2,
                t_pulse_ms: 0,
                pwm_high: 2,
            }))
        );
    }

    #[test]
    fn test_out_pulse_form() {
        assert_eq!(
            parse("OUT 0x0FE 1 1500 15"),
            Ok(Some(Command::Output {
                hw_index: 0x0FE,
                pwm_low: 1,
                t_pulse_ms: 1500,
                pwm_high: 15,
            }))
        );
    }

    #[test]
    fn test_rul_full_form() {
        let cmd = parse("RUL 0 0x23 0x100 4 1 15 3 1").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::RuleConfig(RuleParams {
                id: 0,
                input_index: 0x23,
                output_index: 0x100,
                hold_off_ms: 4,
                t_pulse_ms: 1,
                pwm_on: 15,
                pwm_off: 3,
                pos_edge: true,
            })
        );
    }

    #[test]
    fn test_lec_optional_frame_format() {
        assert_eq!(
            parse("LEC 0 3200000"),
            Ok(Some(Command::LedBusConfig {
                channel: 0,
                speed_hz: 3_200_000,
                frame_format: None
            }))
        );
        assert_eq!(
            parse("LEC 0 3200000 2"),
            Ok(Some(Command::LedBusConfig {
                channel: 0,
                speed_hz: 3_200_000,
                frame_format: Some(2)
            }))
        );
    }

    #[test]
    fn test_i2c_transfer_decodes_hex_payload() {
        let cmd = parse("I2C 0 0x3C 0FE1 2").unwrap().unwrap();
        match cmd {
            Command::I2cTransfer(req) => {
                assert_eq!(req.channel, 0);
                assert_eq!(req.addr, 0x3C);
                assert_eq!(req.tx.as_slice(), &[0x0F, 0xE1]);
                assert_eq!(req.rx_count, 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_i2c_rx_count_bounds() {
        assert!(matches!(
            parse("I2C 0 0x3C 00 64"),
            Ok(Some(Command::I2cTransfer(_)))
        ));
        assert_eq!(parse("I2C 0 0x3C 00 65"), Err(CommandError::InvalidArg));
    }

    #[test]
    fn test_i2c_channel_and_addr_bounds() {
        assert_eq!(parse("I2C 4 0x3C 00 0"), Err(CommandError::InvalidArg));
        assert_eq!(parse("I2C 0 0x80 00 0"), Err(CommandError::InvalidArg));
    }

    #[test]
    fn test_i2c_tx_payload_bounds() {
        // 64 bytes of payload is fine, 65 is not
        let mut line: std::string::String = "I2C 0 0x3C ".into();
        for _ in 0..64 {
            line.push_str("AB");
        }
        line.push_str(" 0");
        assert!(matches!(
            parse(&line),
            Ok(Some(Command::I2cTransfer(_)))
        ));

        let mut line: std::string::String = "I2C 0 0x3C ".into();
        for _ in 0..65 {
            line.push_str("AB");
        }
        line.push_str(" 0");
        assert_eq!(parse(&line), Err(CommandError::InvalidArg));
    }

    #[test]
    fn test_i2c_malformed_hex_rejected() {
        assert_eq!(parse("I2C 0 0x3C 0F0 0"), Err(CommandError::InvalidArg));
        assert_eq!(parse("I2C 0 0x3C ZZ 0"), Err(CommandError::InvalidArg));
    }

    #[test]
    fn test_table_order_matches_help_listing() {
        let names: std::vec::Vec<&str> = COMMAND_TABLE.iter().map(|spec| spec.name).collect();
        assert_eq!(
            names,
            [
                "?", "*IDN?", "DISC", "SWE", "DEB", "SW?", "OUT", "RUL", "RULE", "LEC", "LED",
                "I2C"
            ]
        );
    }
}
