//! mathquiz-core: the round engine, problem generator and countdown.
//!
//! This crate holds the whole game logic of the timed arithmetic quiz. Hosts
//! (such as the `mathquiz` terminal binary) only render snapshots and forward
//! player intents into a [`session::Session`].

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod mock;
pub mod model;
pub mod session;
pub mod timer;

pub use config::{load_config, load_config_from, QuizConfig};
pub use engine::{EngineConfig, NoopObserver, RoundEngine, StateObserver, Transition};
pub use error::RoundError;
pub use model::{Operator, Outcome, Phase, Problem, RoundSnapshot, Tally};
pub use session::{Intent, QuizEvent, Session, SessionEnd};
