//! Pure parsing of raw command strings into typed actions.
//!
//! Parsing is separated from turn resolution so the engine never sees text:
//! the session loop feeds these functions whatever the player typed and maps
//! errors to a forfeited day.

use eaglesim_core::TurnAction;
use thiserror::Error;

/// The two action verbs, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Fly,
    Rest,
}

/// Why a raw parameter string was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} values, got {got}")]
    WrongArity { expected: usize, got: usize },
    #[error("{token:?} is not an integer")]
    NotAnInteger { token: String },
    #[error("speed must be a positive integer, got {speed}")]
    NonPositiveSpeed { speed: i32 },
}

/// Recognizes the action verb. Anything but "fly"/"rest" is `None` and
/// costs the player the day.
#[must_use]
pub fn parse_action_kind(input: &str) -> Option<ActionKind> {
    match input.trim().to_ascii_lowercase().as_str() {
        "fly" => Some(ActionKind::Fly),
        "rest" => Some(ActionKind::Rest),
        _ => None,
    }
}

fn parse_int(token: &str) -> Result<i32, ParseError> {
    token.parse().map_err(|_| ParseError::NotAnInteger {
        token: token.to_owned(),
    })
}

/// Parses `x y speed` as three whitespace-separated integers. The engine
/// divides by speed, so non-positive speeds are rejected here rather than
/// clamped.
pub fn parse_flight(input: &str) -> Result<TurnAction, ParseError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(ParseError::WrongArity {
            expected: 3,
            got: tokens.len(),
        });
    }
    let x = parse_int(tokens[0])?;
    let y = parse_int(tokens[1])?;
    let speed = parse_int(tokens[2])?;
    if speed <= 0 {
        return Err(ParseError::NonPositiveSpeed { speed });
    }
    Ok(TurnAction::Fly { x, y, speed })
}

/// Parses the rest duration as one integer. Range checking stays with the
/// engine; this only rejects non-numeric input.
pub fn parse_rest(input: &str) -> Result<TurnAction, ParseError> {
    let trimmed = input.trim();
    let hours: i64 = trimmed.parse().map_err(|_| ParseError::NotAnInteger {
        token: trimmed.to_owned(),
    })?;
    Ok(TurnAction::Rest { hours })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_verbs_are_case_insensitive() {
        for input in ["fly", "FLY", "Fly", "  fLy  "] {
            assert_eq!(parse_action_kind(input), Some(ActionKind::Fly));
        }
        for input in ["rest", "REST", " Rest "] {
            assert_eq!(parse_action_kind(input), Some(ActionKind::Rest));
        }
        for input in ["walk", "", "fly now", "r est"] {
            assert_eq!(parse_action_kind(input), None);
        }
    }

    #[test]
    fn flight_requires_exactly_three_integers() {
        assert_eq!(
            parse_flight("3 4 1"),
            Ok(TurnAction::Fly { x: 3, y: 4, speed: 1 })
        );
        assert_eq!(
            parse_flight("-100 100 7"),
            Ok(TurnAction::Fly {
                x: -100,
                y: 100,
                speed: 7
            })
        );
        assert_eq!(
            parse_flight("3 4"),
            Err(ParseError::WrongArity {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            parse_flight("3 4 1 9"),
            Err(ParseError::WrongArity {
                expected: 3,
                got: 4
            })
        );
        assert_eq!(
            parse_flight("3 four 1"),
            Err(ParseError::NotAnInteger {
                token: "four".to_owned()
            })
        );
    }

    #[test]
    fn flight_rejects_non_positive_speed() {
        assert_eq!(
            parse_flight("3 4 0"),
            Err(ParseError::NonPositiveSpeed { speed: 0 })
        );
        assert_eq!(
            parse_flight("3 4 -2"),
            Err(ParseError::NonPositiveSpeed { speed: -2 })
        );
    }

    #[test]
    fn rest_parses_one_integer() {
        assert_eq!(parse_rest(" 5 "), Ok(TurnAction::Rest { hours: 5 }));
        assert_eq!(parse_rest("12"), Ok(TurnAction::Rest { hours: 12 }));
        assert_eq!(
            parse_rest("five"),
            Err(ParseError::NotAnInteger {
                token: "five".to_owned()
            })
        );
        assert_eq!(
            parse_rest(""),
            Err(ParseError::NotAnInteger {
                token: String::new()
            })
        );
    }
}
