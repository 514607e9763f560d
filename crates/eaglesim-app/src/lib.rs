//! Shell surface for the eagle simulation: command parsing and the
//! day-by-day session loop, generic over input and output streams so tests
//! can script whole sessions.

pub mod command;
pub mod session;

pub use command::{ActionKind, ParseError, parse_action_kind, parse_flight, parse_rest};
pub use session::{SessionReport, run_session};
