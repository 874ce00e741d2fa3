//! Core data model types for mathquiz.
//!
//! These are the values the round engine owns and hands out to hosts as
//! snapshots: operators, problems, phases, outcomes and the per-session tally.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The arithmetic operation a game is played with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
}

impl Operator {
    /// All operators, in menu order.
    pub const ALL: [Operator; 3] = [Operator::Add, Operator::Subtract, Operator::Multiply];

    /// Symbol used when rendering a problem.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "x",
        }
    }

    /// Human-readable game name.
    pub fn title(self) -> &'static str {
        match self {
            Operator::Add => "Addition",
            Operator::Subtract => "Subtraction",
            Operator::Multiply => "Multiplication",
        }
    }

    /// Apply the operation.
    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Add => write!(f, "add"),
            Operator::Subtract => write!(f, "subtract"),
            Operator::Multiply => write!(f, "multiply"),
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" | "addition" | "+" => Ok(Operator::Add),
            "subtract" | "sub" | "subtraction" | "-" => Ok(Operator::Subtract),
            "multiply" | "mul" | "multiplication" | "x" | "*" => Ok(Operator::Multiply),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// A generated arithmetic problem. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub operand1: i64,
    pub operand2: i64,
    pub operator: Operator,
    /// Fixed at generation time, never recomputed.
    pub correct_answer: i64,
}

impl Problem {
    pub fn new(operator: Operator, operand1: i64, operand2: i64) -> Self {
        Self {
            operand1,
            operand2,
            operator,
            correct_answer: operator.apply(operand1, operand2),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.operand1,
            self.operator.symbol(),
            self.operand2
        )
    }
}

/// The engine's discrete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Countdown active, accepting exactly one submission.
    Running,
    /// Answer recorded, countdown stopped, waiting for advance.
    Submitted,
    /// Countdown reached zero, waiting for advance.
    Expired,
    /// Lives exhausted. Terminal.
    GameOver,
}

impl Phase {
    /// Whether the round is resolved and `advance` is allowed.
    pub fn is_resolved(self) -> bool {
        matches!(self, Phase::Submitted | Phase::Expired)
    }
}

/// How a round was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Wrong,
    Timeout,
}

/// Per-session outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub correct: u32,
    pub wrong: u32,
    pub timeouts: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Wrong => self.wrong += 1,
            Outcome::Timeout => self.timeouts += 1,
        }
    }

    /// Number of resolved rounds.
    pub fn rounds(&self) -> u32 {
        self.correct + self.wrong + self.timeouts
    }
}

/// Everything a host needs to render the game.
///
/// The engine keeps one of these as its live state and hands out clones after
/// every accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub operator: Operator,
    pub score: u32,
    pub lives: u32,
    /// 1-based round counter.
    pub round: u32,
    pub problem: Problem,
    pub phase: Phase,
    pub remaining_ms: u64,
    pub last_outcome: Option<Outcome>,
    /// Set only once the phase is [`Phase::GameOver`].
    pub final_score: Option<u32>,
    pub tally: Tally,
}

impl RoundSnapshot {
    /// Whole seconds left, wrapped into 0..60 for a two-digit display.
    pub fn seconds_left(&self) -> u64 {
        (self.remaining_ms / 1000) % 60
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}
