//! Terminal rendering of engine output.

use serde::Serialize;

use mathquiz_core::{Outcome, RoundError, RoundSnapshot, SessionEnd, StateObserver, Transition};

/// Prints snapshots as the game screen would show them.
pub struct ConsoleObserver;

impl StateObserver for ConsoleObserver {
    fn on_snapshot(&self, transition: Transition, snapshot: &RoundSnapshot) {
        match transition {
            Transition::Started | Transition::Advanced => {
                println!();
                println!(
                    "Score: {}  Lives: {}  Time: {:02}",
                    snapshot.score,
                    snapshot.lives,
                    snapshot.seconds_left()
                );
                println!("Question {}: {} = ?", snapshot.round, snapshot.problem);
            }
            Transition::Ticked => println!("Time: {:02}", snapshot.seconds_left()),
            Transition::Submitted | Transition::Expired => {
                let message = match snapshot.last_outcome {
                    Some(Outcome::Correct) => "Correct answer".to_string(),
                    Some(Outcome::Wrong) => format!(
                        "Wrong answer ({} = {})",
                        snapshot.problem, snapshot.problem.correct_answer
                    ),
                    Some(Outcome::Timeout) | None => "Sorry! Time is up!".to_string(),
                };
                println!("{message}");
                println!(
                    "Score: {}  Lives: {}  (type `next` to continue)",
                    snapshot.score, snapshot.lives
                );
            }
            Transition::GameOver => {}
        }
    }

    fn on_rejected(&self, error: &RoundError) {
        println!("{}", rejection_message(error));
    }

    fn on_game_over(&self, final_score: u32) {
        println!();
        println!("Game over! Final score: {final_score}");
    }
}

/// Player-facing text for a rejected intent.
pub fn rejection_message(error: &RoundError) -> &'static str {
    match error {
        e if e.is_empty_input() => "Please enter your answer",
        RoundError::InvalidInput { .. } => "Please enter a whole number",
        RoundError::DuplicateSubmission => "You already answered this question!",
        RoundError::OutOfOrder => "Answer the question or wait for the timer!",
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JsonLine<'a> {
    Snapshot {
        transition: Transition,
        snapshot: &'a RoundSnapshot,
    },
    Rejected {
        error: String,
    },
}

/// Prints one JSON object per line for machine consumption.
pub struct JsonObserver;

impl JsonObserver {
    fn print(line: &JsonLine<'_>) {
        match serde_json::to_string(line) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!("failed to serialize snapshot: {e}"),
        }
    }
}

impl StateObserver for JsonObserver {
    fn on_snapshot(&self, transition: Transition, snapshot: &RoundSnapshot) {
        Self::print(&JsonLine::Snapshot {
            transition,
            snapshot,
        });
    }

    fn on_rejected(&self, error: &RoundError) {
        Self::print(&JsonLine::Rejected {
            error: error.to_string(),
        });
    }
}

/// Result screen summary.
pub fn print_summary(end: &SessionEnd, mode: &str) {
    use comfy_table::{Cell, Table};

    let tally = end.tally();
    let mut table = Table::new();
    table.set_header(vec![
        "Mode",
        "Rounds",
        "Correct",
        "Wrong",
        "Timeouts",
        "Score",
    ]);
    table.add_row(vec![
        Cell::new(mode),
        Cell::new(tally.rounds()),
        Cell::new(tally.correct),
        Cell::new(tally.wrong),
        Cell::new(tally.timeouts),
        Cell::new(end.score()),
    ]);

    println!("\n{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages() {
        assert_eq!(
            rejection_message(&RoundError::InvalidInput { raw: String::new() }),
            "Please enter your answer"
        );
        assert_eq!(
            rejection_message(&RoundError::InvalidInput { raw: "ten".into() }),
            "Please enter a whole number"
        );
        assert_eq!(
            rejection_message(&RoundError::DuplicateSubmission),
            "You already answered this question!"
        );
        assert_eq!(
            rejection_message(&RoundError::OutOfOrder),
            "Answer the question or wait for the timer!"
        );
    }
}
