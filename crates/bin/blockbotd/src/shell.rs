//! Line-oriented block shell.
//!
//! Each stdin line is one block call against the configured device. Timed
//! blocks (`motor left 2`, `note C4 1`) wait for completion before the next
//! line is read, like a block script would.

use std::sync::Arc;

use blockbot_app::blocks::{
    BuzzerBlocks, LampBlocks, LightTouchBlocks, MatrixBlocks, MotorBlocks, ProximityBlocks,
};
use blockbot_app::channel::{PeripheralChannel, SendOutcome};
use blockbot_app::error::ChannelError;
use blockbot_app::ports::{GroupKeySource, TransportFactory};
use blockbot_domain::codec::motor::MotorDirection;
use blockbot_domain::device::DeviceKind;
use blockbot_domain::error::DomainError;
use blockbot_domain::payload::DiscoveredPeripheral;

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Scan,
    Connect(usize),
    Disconnect,
    Motor {
        direction: MotorDirection,
        secs: Option<f64>,
    },
    Lamp(Option<(i64, i64, i64)>),
    Matrix(MatrixArg),
    Note {
        name: String,
        beats: Option<f64>,
    },
    Alert(String),
    Light,
    Touch,
    Near,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixArg {
    Bits(String),
    Glyph(String),
    Clear,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown command {0:?}, try `help`")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("invalid motor direction {0:?}")]
    InvalidDirection(String),
}

/// Parse one input line.
///
/// # Errors
///
/// Returns [`ParseError`] for blank, unknown or malformed lines.
pub fn parse(line: &str) -> Result<ShellCommand, ParseError> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or(ParseError::Empty)?;
    let rest: Vec<&str> = words.collect();

    match command {
        "scan" => Ok(ShellCommand::Scan),
        "connect" => {
            let index = rest.first().ok_or(ParseError::MissingArgument("device number"))?;
            Ok(ShellCommand::Connect(number(index)?))
        }
        "disconnect" => Ok(ShellCommand::Disconnect),
        "motor" => {
            let raw = rest.first().ok_or(ParseError::MissingArgument("direction"))?;
            let direction = raw
                .parse()
                .map_err(|()| ParseError::InvalidDirection((*raw).to_string()))?;
            let secs = rest.get(1).map(|s| number(s)).transpose()?;
            Ok(ShellCommand::Motor { direction, secs })
        }
        "lamp" => match rest.as_slice() {
            ["off"] => Ok(ShellCommand::Lamp(None)),
            [r, g, b] => Ok(ShellCommand::Lamp(Some((number(r)?, number(g)?, number(b)?)))),
            _ => Err(ParseError::MissingArgument("`r g b` or `off`")),
        },
        "matrix" => match rest.as_slice() {
            ["clear"] => Ok(ShellCommand::Matrix(MatrixArg::Clear)),
            ["glyph", name @ ..] if !name.is_empty() => {
                Ok(ShellCommand::Matrix(MatrixArg::Glyph(name.join(" "))))
            }
            [bits] => Ok(ShellCommand::Matrix(MatrixArg::Bits((*bits).to_string()))),
            _ => Err(ParseError::MissingArgument("bitmap, `glyph <name>` or `clear`")),
        },
        "note" => {
            let (name, beats) = match rest.as_slice() {
                [] => return Err(ParseError::MissingArgument("note name")),
                [name @ .., last] if !name.is_empty() && last.parse::<f64>().is_ok() => {
                    (name.join(" "), Some(number(last)?))
                }
                words => (words.join(" "), None),
            };
            Ok(ShellCommand::Note { name, beats })
        }
        "alert" if !rest.is_empty() => Ok(ShellCommand::Alert(rest.join(" "))),
        "alert" => Err(ParseError::MissingArgument("alert name")),
        "light" => Ok(ShellCommand::Light),
        "touch" => Ok(ShellCommand::Touch),
        "near" => Ok(ShellCommand::Near),
        "help" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T, ParseError> {
    raw.parse().map_err(|_| ParseError::InvalidNumber(raw.to_string()))
}

/// Failure while executing a command.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Block(#[from] DomainError),
    #[error("no device #{0} in the last scan")]
    NoSuchDevice(usize),
    #[error("`{command}` does not apply to a {kind} device")]
    WrongDevice {
        command: &'static str,
        kind: DeviceKind,
    },
}

/// What the caller should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Say(String),
    Quit,
}

pub const HELP: &str = "\
scan | connect <n> | disconnect
motor <left|right|stop> [secs] | lamp <r> <g> <b> | lamp off
matrix <64 bits> | matrix glyph <name> | matrix clear
note <name> [beats] | alert <name>
light | touch | near | quit";

/// Executes parsed commands against one channel.
pub struct Shell<F: TransportFactory, K: GroupKeySource> {
    channel: Arc<PeripheralChannel<F, K>>,
    discovered: Vec<DiscoveredPeripheral>,
}

impl<F: TransportFactory, K: GroupKeySource> Shell<F, K> {
    pub fn new(channel: Arc<PeripheralChannel<F, K>>) -> Self {
        Self {
            channel,
            discovered: Vec::new(),
        }
    }

    /// Run one command.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError`] when a lifecycle call fails, the block input is
    /// invalid, or the command targets another device kind.
    pub async fn execute(&mut self, command: ShellCommand) -> Result<Reply, ShellError> {
        let kind = self.channel.kind();
        let reply = match command {
            ShellCommand::Scan => {
                self.discovered = self.channel.scan().await?;
                if self.discovered.is_empty() {
                    "no matching device found".to_string()
                } else {
                    self.discovered
                        .iter()
                        .enumerate()
                        .map(|(i, p)| {
                            format!(
                                "#{i} {} ({}) rssi={}",
                                p.local_name.as_deref().unwrap_or("?"),
                                p.id,
                                p.rssi.map_or_else(|| "?".to_string(), |r| r.to_string()),
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            ShellCommand::Connect(index) => {
                let peripheral = self
                    .discovered
                    .get(index)
                    .ok_or(ShellError::NoSuchDevice(index))?;
                self.channel.connect(&peripheral.id).await?;
                format!("connected to {}", peripheral.id)
            }
            ShellCommand::Disconnect => {
                self.channel.disconnect().await;
                "disconnected".to_string()
            }
            ShellCommand::Motor { direction, secs } => {
                expect_kind("motor", kind, &[DeviceKind::DcMotorA, DeviceKind::DcMotorB])?;
                let motor = MotorBlocks::new(Arc::clone(&self.channel));
                match secs {
                    Some(secs) => {
                        motor.run_for(direction, secs).finished().await;
                        "done".to_string()
                    }
                    None => outcome(motor.turn(direction)),
                }
            }
            ShellCommand::Lamp(rgb) => {
                expect_kind("lamp", kind, &[DeviceKind::RgbLamp])?;
                let lamp = LampBlocks::new(Arc::clone(&self.channel));
                outcome(match rgb {
                    Some((r, g, b)) => lamp.set(r, g, b),
                    None => lamp.off(),
                })
            }
            ShellCommand::Matrix(arg) => {
                expect_kind("matrix", kind, &[DeviceKind::DotMatrix])?;
                let matrix = MatrixBlocks::new(Arc::clone(&self.channel));
                outcome(match arg {
                    MatrixArg::Bits(bits) => matrix.show(&bits)?,
                    MatrixArg::Glyph(name) => matrix.show_glyph(&name)?,
                    MatrixArg::Clear => matrix.clear(),
                })
            }
            ShellCommand::Note { name, beats } => {
                expect_kind("note", kind, &[DeviceKind::Buzzer])?;
                let buzzer = BuzzerBlocks::new(Arc::clone(&self.channel));
                match beats {
                    Some(beats) => {
                        buzzer.play_for(&name, beats).finished().await;
                        "done".to_string()
                    }
                    None => outcome(buzzer.play(&name)),
                }
            }
            ShellCommand::Alert(name) => {
                expect_kind("alert", kind, &[DeviceKind::Buzzer])?;
                outcome(BuzzerBlocks::new(Arc::clone(&self.channel)).alert(&name)?)
            }
            ShellCommand::Light => {
                expect_kind("light", kind, &[DeviceKind::LightTouch])?;
                LightTouchBlocks::new(Arc::clone(&self.channel)).light().to_string()
            }
            ShellCommand::Touch => {
                expect_kind("touch", kind, &[DeviceKind::LightTouch])?;
                LightTouchBlocks::new(Arc::clone(&self.channel))
                    .is_touched()
                    .to_string()
            }
            ShellCommand::Near => {
                expect_kind("near", kind, &[DeviceKind::Proximity])?;
                ProximityBlocks::new(Arc::clone(&self.channel))
                    .is_near()
                    .to_string()
            }
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Say(reply))
    }
}

fn expect_kind(
    command: &'static str,
    kind: DeviceKind,
    allowed: &[DeviceKind],
) -> Result<(), ShellError> {
    if allowed.contains(&kind) {
        Ok(())
    } else {
        Err(ShellError::WrongDevice { command, kind })
    }
}

fn outcome(outcome: SendOutcome) -> String {
    match outcome {
        SendOutcome::Dispatched => "sent",
        SendOutcome::Busy => "dropped, previous write still in flight",
        SendOutcome::NotConnected => "dropped, not connected",
        SendOutcome::NotWritable => "dropped, device takes no commands",
    }
    .to_string()
}
