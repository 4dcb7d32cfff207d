//! Wire messages exchanged with the opponent through the relay.
//!
//! A message is a command tag followed by positional fields, joined by
//! commas on a single line: `MOVE,7,4`, `DRAW_REQUEST`, `CHAT,see you`.
//! Chat text is everything after the first comma, so it may itself
//! contain commas.

use crate::error::TransportError;
use derive_more::{Display, Error};
use std::fmt::{self, Debug};
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Field separator on the wire.
pub const SEPARATOR: char = ',';

/// Command tag of a wire message.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// A placed mark.
    Move,
    /// Sender claims victory.
    Win,
    /// Sender forfeits.
    Lose,
    /// Proposal to end the round in a draw.
    DrawRequest,
    /// Acceptance of the pending draw.
    DrawConfirm,
    /// Rejection of the pending draw.
    DrawRefuse,
    /// Sender abandons the session.
    LeftRoom,
    /// Free-form text.
    Chat,
    /// Sender started the next round of the match.
    Rematch,
}

/// A decoded wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A placed mark.
    Move {
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        col: usize,
    },
    /// Sender claims victory.
    Win,
    /// Sender forfeits.
    Lose,
    /// Proposal to end the round in a draw.
    DrawRequest,
    /// Acceptance of the pending draw.
    DrawConfirm,
    /// Rejection of the pending draw.
    DrawRefuse,
    /// Sender abandons the session.
    LeftRoom,
    /// Free-form text, not interpreted by the engine.
    Chat(String),
    /// Sender started the next round of the match.
    Rematch,
}

impl Message {
    /// Returns the command tag of this message.
    pub fn command(&self) -> Command {
        match self {
            Message::Move { .. } => Command::Move,
            Message::Win => Command::Win,
            Message::Lose => Command::Lose,
            Message::DrawRequest => Command::DrawRequest,
            Message::DrawConfirm => Command::DrawConfirm,
            Message::DrawRefuse => Command::DrawRefuse,
            Message::LeftRoom => Command::LeftRoom,
            Message::Chat(_) => Command::Chat,
            Message::Rematch => Command::Rematch,
        }
    }

    /// Encodes the message as a single wire line without the terminator.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decodes one wire line.
    #[instrument]
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (tag, rest) = match line.split_once(SEPARATOR) {
            Some((tag, rest)) => (tag, Some(rest)),
            None => (line, None),
        };
        let command = Command::from_str(tag.trim()).map_err(|_| ProtocolError::UnknownCommand {
            tag: tag.trim().to_string(),
        })?;

        let message = match command {
            Command::Chat => Message::Chat(rest.unwrap_or_default().to_string()),
            Command::Move => {
                let fields: Vec<&str> = rest.map(|r| r.split(SEPARATOR).collect()).unwrap_or_default();
                let [row, col] = fields.as_slice() else {
                    return Err(ProtocolError::FieldCount {
                        command,
                        expected: 2,
                        found: fields.len(),
                    });
                };
                Message::Move {
                    row: parse_coordinate(row)?,
                    col: parse_coordinate(col)?,
                }
            }
            Command::Win => no_fields(command, rest, Message::Win)?,
            Command::Lose => no_fields(command, rest, Message::Lose)?,
            Command::DrawRequest => no_fields(command, rest, Message::DrawRequest)?,
            Command::DrawConfirm => no_fields(command, rest, Message::DrawConfirm)?,
            Command::DrawRefuse => no_fields(command, rest, Message::DrawRefuse)?,
            Command::LeftRoom => no_fields(command, rest, Message::LeftRoom)?,
            Command::Rematch => no_fields(command, rest, Message::Rematch)?,
        };
        debug!(?message, "Decoded message");
        Ok(message)
    }
}

fn no_fields(command: Command, rest: Option<&str>, message: Message) -> Result<Message, ProtocolError> {
    match rest {
        None => Ok(message),
        Some(rest) => Err(ProtocolError::FieldCount {
            command,
            expected: 0,
            found: rest.split(SEPARATOR).count(),
        }),
    }
}

fn parse_coordinate(field: &str) -> Result<usize, ProtocolError> {
    field
        .trim()
        .parse()
        .map_err(|_| ProtocolError::BadCoordinate {
            field: field.to_string(),
        })
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag: &'static str = self.command().into();
        match self {
            Message::Move { row, col } => write!(f, "{tag}{SEPARATOR}{row}{SEPARATOR}{col}"),
            Message::Chat(text) => {
                let flat: String = text
                    .chars()
                    .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                    .collect();
                write!(f, "{tag}{SEPARATOR}{flat}")
            }
            _ => write!(f, "{tag}"),
        }
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::decode(s)
    }
}

/// A wire line that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ProtocolError {
    /// The command tag is not recognised.
    #[display("Unknown command {tag:?}")]
    UnknownCommand {
        /// Tag as received.
        tag: String,
    },
    /// The command carries the wrong number of fields.
    #[display("{command} expects {expected} field(s), found {found}")]
    FieldCount {
        /// Decoded command.
        command: Command,
        /// Fields required.
        expected: usize,
        /// Fields present.
        found: usize,
    },
    /// A coordinate is not a non-negative integer.
    #[display("Bad coordinate {field:?}")]
    BadCoordinate {
        /// Field as received.
        field: String,
    },
}

/// Sink for messages the engine sends to the opponent.
pub trait Outbound: Send + Debug {
    /// Hands a message to the transport.
    ///
    /// Failure is reported to the caller; it never undoes local state.
    fn send(&mut self, message: Message) -> Result<(), TransportError>;
}

impl Outbound for mpsc::UnboundedSender<Message> {
    fn send(&mut self, message: Message) -> Result<(), TransportError> {
        let command = message.command();
        mpsc::UnboundedSender::send(&*self, message)
            .map_err(|_| TransportError::new(format!("Outbound channel closed while sending {command}")))
    }
}
