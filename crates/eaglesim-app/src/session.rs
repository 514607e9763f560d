//! The interactive day-by-day session loop.
//!
//! Generic over `BufRead`/`Write` so end-to-end tests drive whole sessions
//! from scripted strings. A malformed or unrecognized command forfeits the
//! day but never ends the session; the only endings are death and the
//! reserved win day, and both save the score exactly once.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use chrono::Local;
use eaglesim_core::{ActionOutcome, DayStart, SessionOutcome, SimConfig, Simulation};
use eaglesim_ledger::{ScoreLedger, ScoreRecord};
use tracing::{debug, info, warn};

use crate::command::{self, ActionKind};

/// How a finished session went, for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub score: f64,
    pub days_played: u32,
    /// Leaderboard rank of the saved record; 0 is the best score.
    pub rank: usize,
}

fn read_line<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    let bytes = input.read_line(&mut line).context("reading player input")?;
    if bytes == 0 {
        bail!("input ended before the session finished");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn save_score<W: Write>(
    sim: &Simulation,
    ledger: &mut ScoreLedger,
    output: &mut W,
) -> Result<usize> {
    let record = ScoreRecord::from_eagle(sim.eagle(), Local::now().date_naive());
    let rank = ledger.save(record)?;
    writeln!(output, "Score saved!")?;
    info!(rank, "session score saved");
    Ok(rank)
}

/// Runs one complete session: name prompt (unless a name is supplied),
/// 25 playable days, and the terminal save.
pub fn run_session<R: BufRead, W: Write>(
    config: SimConfig,
    name: Option<String>,
    ledger: &mut ScoreLedger,
    input: &mut R,
    output: &mut W,
) -> Result<SessionReport> {
    let name = match name {
        Some(name) => name,
        None => {
            writeln!(
                output,
                "Welcome to the Game! What would you like to name your eagle?"
            )?;
            read_line(input)?.trim().to_owned()
        }
    };

    let mut sim = Simulation::new(config, name)?;
    let name = sim.eagle().name().to_owned();
    info!(eagle = %name, "session started");

    writeln!(output, "****All inputs are case insensitive!****")?;

    loop {
        let (day, spawned, active) = match sim.start_day() {
            DayStart::Win { score } => {
                writeln!(
                    output,
                    "Congratulations! You win with a score of {score:.2}. Great job!"
                )?;
                let rank = save_score(&sim, ledger, output)?;
                return Ok(SessionReport {
                    outcome: SessionOutcome::Won,
                    score,
                    days_played: sim.day() - 1,
                    rank,
                });
            }
            DayStart::Play {
                day,
                spawned,
                active,
            } => (day, spawned, active),
        };

        writeln!(
            output,
            "\nDay {day}\n ---------------------------------------------------------"
        )?;

        if let Some(resource) = spawned {
            writeln!(
                output,
                "Resource appeared at ({}, {}) with {} energy for {} rounds.",
                resource.x, resource.y, resource.energy, resource.duration
            )?;
        }
        if !active.is_empty() {
            writeln!(output, "Available resources:")?;
            for resource in &active {
                writeln!(
                    output,
                    "  - Location: ({}, {}), Energy: {}, Rounds left: {}",
                    resource.x, resource.y, resource.energy, resource.duration
                )?;
            }
        }

        writeln!(output, "Choose action: Fly or Rest")?;
        let verb = read_line(input)?;
        match command::parse_action_kind(&verb) {
            None => {
                // An unrecognized verb abandons the day outright: no status
                // report and no resource aging, but the day is spent.
                warn!(day, verb = %verb, "unrecognized action, day forfeited");
                writeln!(output, "Invalid action! Choose from: fly or rest")?;
                continue;
            }
            Some(ActionKind::Fly) => {
                writeln!(output, "Where would you like to fly? Format input as x y speed")?;
                let raw = read_line(input)?;
                match command::parse_flight(&raw) {
                    Ok(action) => {
                        let outcome = sim.apply(action);
                        if let ActionOutcome::Flew { flight, consumed } = outcome {
                            writeln!(
                                output,
                                "{name} flew {:.2} units to ({}, {}) at speed {}. Energy left: {:.2}",
                                flight.distance, flight.x, flight.y, flight.speed, flight.energy_left
                            )?;
                            for consumption in consumed {
                                writeln!(
                                    output,
                                    "{name} consumed resource at ({}, {}) and gained {} energy.",
                                    consumption.x, consumption.y, consumption.energy
                                )?;
                            }
                        }
                    }
                    Err(err) => {
                        debug!(day, %err, "flight input rejected");
                        writeln!(
                            output,
                            "Invalid input format. Please enter x, y, and speed as integers."
                        )?;
                    }
                }
            }
            Some(ActionKind::Rest) => {
                writeln!(output, "Enter the number of hours to rest (1-10): ")?;
                let raw = read_line(input)?;
                match command::parse_rest(&raw) {
                    Ok(action) => match sim.apply(action) {
                        ActionOutcome::Rested { hours, energy } => {
                            writeln!(
                                output,
                                "{name} rested for {hours} hours. Energy now: {energy}"
                            )?;
                        }
                        ActionOutcome::RestRejected { .. } => {
                            writeln!(output, "Resting hours should be between 1 and 10.")?;
                        }
                        ActionOutcome::Flew { .. } => unreachable!("rest never flies"),
                    },
                    Err(err) => {
                        debug!(day, %err, "rest input rejected");
                        writeln!(output, "Invalid input. Please enter a valid number of hours.")?;
                    }
                }
            }
        }

        let end = sim.finish_day();
        writeln!(
            output,
            "Day {}: Distance: {:.2}, Time: {:.2}, Energy: {:.2}",
            end.status.day, end.status.total_distance, end.status.total_time, end.status.energy
        )?;

        if !end.alive {
            writeln!(
                output,
                "{name} has exhausted all energy and the game is over. Final score: {:.2}",
                end.score
            )?;
            let rank = save_score(&sim, ledger, output)?;
            return Ok(SessionReport {
                outcome: SessionOutcome::Died,
                score: end.score,
                days_played: sim.day(),
                rank,
            });
        }

        writeln!(output, "Current score: {:.2}", end.score)?;
    }
}
