//! Protocol-side building blocks of the bridge: the board mirror, UCI command
//! parsing and the engine option table. Nothing here touches the network.

pub mod board;
pub mod command;
pub mod options;

pub use board::{BoardError, BoardMirror, StartPosition};
pub use command::{Command, ParseError};
pub use options::{
    Button, OptionChange, OptionError, PlayAs, Settings, TimeControl, TimeMode, Variant,
};
