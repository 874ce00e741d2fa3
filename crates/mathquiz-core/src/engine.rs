//! The round engine.
//!
//! Owns score, lives, the active problem and its countdown, and is the only
//! place any of them change. Hosts drive it through [`RoundEngine::start`],
//! [`RoundEngine::submit_answer`] and [`RoundEngine::advance`]; countdown
//! events arrive through [`RoundEngine::on_timer`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RoundError;
use crate::generator::{generate, RandomSource};
use crate::model::{Operator, Outcome, Phase, Problem, RoundSnapshot, Tally};
use crate::timer::{CountdownHandle, CountdownScheduler, TimerEvent, TimerId, TimerSignal};

/// Configuration for the round engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time allowed per round.
    pub time_limit: Duration,
    /// Countdown tick granularity.
    pub tick: Duration,
    /// Lives at the start of a game.
    pub starting_lives: u32,
    /// Points for a correct answer.
    pub points_per_correct: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(10),
            tick: Duration::from_secs(1),
            starting_lives: 3,
            points_per_correct: 10,
        }
    }
}

/// Which accepted event produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Started,
    Submitted,
    Ticked,
    Expired,
    Advanced,
    GameOver,
}

/// Receives engine output. Hosts render from here.
pub trait StateObserver: Send {
    fn on_snapshot(&self, transition: Transition, snapshot: &RoundSnapshot);
    fn on_rejected(&self, _error: &RoundError) {}
    fn on_game_over(&self, _final_score: u32) {}
}

/// No-op observer.
pub struct NoopObserver;

impl StateObserver for NoopObserver {
    fn on_snapshot(&self, _: Transition, _: &RoundSnapshot) {}
}

/// The round engine. One instance per play session.
pub struct RoundEngine {
    config: EngineConfig,
    rng: Box<dyn RandomSource>,
    scheduler: Box<dyn CountdownScheduler>,
    observers: Vec<Box<dyn StateObserver>>,
    state: Option<RoundSnapshot>,
    timer: Option<CountdownHandle>,
    abandoned: bool,
}

impl RoundEngine {
    pub fn new(
        config: EngineConfig,
        rng: Box<dyn RandomSource>,
        scheduler: Box<dyn CountdownScheduler>,
    ) -> Self {
        Self {
            config,
            rng,
            scheduler,
            observers: Vec::new(),
            state: None,
            timer: None,
            abandoned: false,
        }
    }

    /// Register an observer for snapshots and rejections.
    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current state, if a game has been started.
    pub fn snapshot(&self) -> Option<&RoundSnapshot> {
        self.state.as_ref()
    }

    /// Whether the host left the current game through [`RoundEngine::abandon`].
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Id of the countdown currently allowed to deliver events.
    pub fn active_timer(&self) -> Option<TimerId> {
        self.timer.as_ref().map(CountdownHandle::id)
    }

    /// Begin a new game with `operator`. Any previous game is discarded.
    pub fn start(&mut self, operator: Operator) -> RoundSnapshot {
        self.cancel_timer();
        let problem = self.next_problem(operator);
        let state = RoundSnapshot {
            operator,
            score: 0,
            lives: self.config.starting_lives,
            round: 1,
            problem,
            phase: Phase::Running,
            remaining_ms: self.window_ms(),
            last_outcome: None,
            final_score: None,
            tally: Tally::default(),
        };
        tracing::debug!(%operator, %problem, "game started");
        self.state = Some(state);
        self.abandoned = false;
        self.start_timer();
        self.emit(Transition::Started)
    }

    /// Record the player's answer for the running round.
    ///
    /// # Panics
    ///
    /// Panics if called before [`RoundEngine::start`].
    pub fn submit_answer(&mut self, raw: &str) -> Result<RoundSnapshot, RoundError> {
        let result = self.try_submit(raw);
        self.report(result)
    }

    /// Move on from a resolved round: next problem, or game over.
    ///
    /// # Panics
    ///
    /// Panics if called before [`RoundEngine::start`].
    pub fn advance(&mut self) -> Result<RoundSnapshot, RoundError> {
        let result = self.try_advance();
        self.report(result)
    }

    /// Handle a countdown event. Returns the new snapshot if it was accepted.
    ///
    /// Events from any countdown other than the active one are dropped.
    pub fn on_timer(&mut self, event: TimerEvent) -> Option<RoundSnapshot> {
        if self.active_timer() != Some(event.timer) {
            tracing::debug!("discarding stale event from {}", event.timer);
            return None;
        }
        let state = self.state.as_mut()?;
        if state.phase != Phase::Running {
            return None;
        }

        match event.signal {
            TimerSignal::Tick { remaining_ms } => {
                state.remaining_ms = state.remaining_ms.min(remaining_ms);
                tracing::trace!(remaining_ms = state.remaining_ms, "tick");
                Some(self.emit(Transition::Ticked))
            }
            TimerSignal::Expired => {
                self.cancel_timer();
                self.resolve(Outcome::Timeout);
                Some(self.emit(Transition::Expired))
            }
        }
    }

    /// End the current game because the host is leaving mid-game.
    ///
    /// The countdown stops and every later intent is rejected until the next
    /// [`RoundEngine::start`]. The last snapshot stays readable for summaries.
    pub fn abandon(&mut self) {
        self.cancel_timer();
        if let Some(state) = &self.state {
            tracing::debug!(score = state.score, round = state.round, "game abandoned");
            self.abandoned = true;
        }
    }

    fn try_submit(&mut self, raw: &str) -> Result<(), RoundError> {
        let Some(state) = self.state.as_ref() else {
            panic!("submit_answer called before start");
        };
        if self.abandoned || state.phase != Phase::Running {
            return Err(RoundError::DuplicateSubmission);
        }
        let expected = state.problem.correct_answer;
        let answer: i64 = raw.trim().parse().map_err(|_| RoundError::InvalidInput {
            raw: raw.to_string(),
        })?;

        self.cancel_timer();
        let outcome = if answer == expected {
            Outcome::Correct
        } else {
            Outcome::Wrong
        };
        tracing::debug!(answer, expected, ?outcome, "answer submitted");
        self.resolve(outcome);
        Ok(())
    }

    fn try_advance(&mut self) -> Result<(), RoundError> {
        let Some(state) = self.state.as_mut() else {
            panic!("advance called before start");
        };
        if self.abandoned || !state.phase.is_resolved() {
            return Err(RoundError::OutOfOrder);
        }

        if state.lives == 0 {
            state.phase = Phase::GameOver;
            state.final_score = Some(state.score);
            tracing::debug!(score = state.score, rounds = state.tally.rounds(), "game over");
            return Ok(());
        }

        let operator = state.operator;
        let problem = self.next_problem(operator);
        let window_ms = self.window_ms();
        if let Some(state) = self.state.as_mut() {
            state.round += 1;
            state.problem = problem;
            state.phase = Phase::Running;
            state.remaining_ms = window_ms;
            state.last_outcome = None;
            tracing::debug!(round = state.round, %problem, "next round");
        }
        self.start_timer();
        Ok(())
    }

    /// Apply a round outcome to score, lives and phase.
    fn resolve(&mut self, outcome: Outcome) {
        let points = self.config.points_per_correct;
        let Some(state) = self.state.as_mut() else {
            return;
        };
        debug_assert_eq!(state.phase, Phase::Running);

        match outcome {
            Outcome::Correct => state.score += points,
            Outcome::Wrong | Outcome::Timeout => state.lives = state.lives.saturating_sub(1),
        }
        state.phase = match outcome {
            Outcome::Timeout => {
                state.remaining_ms = 0;
                Phase::Expired
            }
            Outcome::Correct | Outcome::Wrong => Phase::Submitted,
        };
        state.last_outcome = Some(outcome);
        state.tally.record(outcome);

        debug_assert_eq!(state.score, state.tally.correct * points);
    }

    /// Emit a snapshot for an accepted intent or pass a rejection on.
    fn report(&mut self, result: Result<(), RoundError>) -> Result<RoundSnapshot, RoundError> {
        match result {
            Ok(()) => {
                let transition = match self.state.as_ref().map(|s| s.phase) {
                    Some(Phase::GameOver) => Transition::GameOver,
                    Some(Phase::Running) => Transition::Advanced,
                    _ => Transition::Submitted,
                };
                Ok(self.emit(transition))
            }
            Err(e) => {
                tracing::debug!("intent rejected: {e}");
                for observer in &self.observers {
                    observer.on_rejected(&e);
                }
                Err(e)
            }
        }
    }

    fn emit(&self, transition: Transition) -> RoundSnapshot {
        let Some(snapshot) = self.state.clone() else {
            unreachable!("emit called before start");
        };
        for observer in &self.observers {
            observer.on_snapshot(transition, &snapshot);
        }
        if transition == Transition::GameOver {
            for observer in &self.observers {
                observer.on_game_over(snapshot.score);
            }
        }
        snapshot
    }

    fn next_problem(&mut self, operator: Operator) -> Problem {
        generate(operator, self.rng.as_mut())
    }

    fn start_timer(&mut self) {
        self.cancel_timer();
        let handle = self
            .scheduler
            .start(TimerId::next(), self.config.time_limit, self.config.tick);
        self.timer = Some(handle);
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.cancel();
        }
    }

    fn window_ms(&self) -> u64 {
        u64::try_from(self.config.time_limit.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Drop for RoundEngine {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
