//! The serialized event loop.
//!
//! Player intents and countdown events share one queue and are applied to the
//! engine strictly one at a time, so whichever of "answered" and "time up"
//! is enqueued first wins.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::engine::RoundEngine;
use crate::model::{Operator, Tally};
use crate::timer::TimerEvent;

/// Something the player asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Submit(String),
    Advance,
    Abandon,
}

/// An entry on the host's event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    Intent(Intent),
    Timer(TimerEvent),
}

impl From<Intent> for QuizEvent {
    fn from(intent: Intent) -> Self {
        QuizEvent::Intent(intent)
    }
}

impl From<TimerEvent> for QuizEvent {
    fn from(event: TimerEvent) -> Self {
        QuizEvent::Timer(event)
    }
}

/// How a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Lives ran out and the player advanced past the last round.
    GameOver { final_score: u32, tally: Tally },
    /// The player left, or the event queue closed, before game over.
    Abandoned { score: u32, tally: Tally },
}

impl SessionEnd {
    pub fn score(&self) -> u32 {
        match self {
            SessionEnd::GameOver { final_score, .. } => *final_score,
            SessionEnd::Abandoned { score, .. } => *score,
        }
    }

    pub fn tally(&self) -> Tally {
        match self {
            SessionEnd::GameOver { tally, .. } | SessionEnd::Abandoned { tally, .. } => *tally,
        }
    }
}

/// One play session: an engine plus the loop that feeds it.
pub struct Session {
    engine: RoundEngine,
}

impl Session {
    pub fn new(engine: RoundEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RoundEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RoundEngine {
        &mut self.engine
    }

    /// Apply a single event. Returns `Some` once the session is over.
    ///
    /// Rejected intents are already reported to the engine's observers, so
    /// they are only logged here.
    pub fn dispatch(&mut self, event: QuizEvent) -> Option<SessionEnd> {
        match event {
            QuizEvent::Timer(event) => {
                self.engine.on_timer(event);
                None
            }
            QuizEvent::Intent(Intent::Submit(raw)) => {
                if let Err(e) = self.engine.submit_answer(&raw) {
                    tracing::debug!("submit rejected: {e}");
                }
                None
            }
            QuizEvent::Intent(Intent::Advance) => match self.engine.advance() {
                Ok(snapshot) => snapshot.final_score.map(|final_score| SessionEnd::GameOver {
                    final_score,
                    tally: snapshot.tally,
                }),
                Err(e) => {
                    tracing::debug!("advance rejected: {e}");
                    None
                }
            },
            QuizEvent::Intent(Intent::Abandon) => Some(self.abandon()),
        }
    }

    /// Start a game with `operator` and process events until it ends.
    pub async fn run(
        &mut self,
        operator: Operator,
        events: &mut UnboundedReceiver<QuizEvent>,
    ) -> SessionEnd {
        self.engine.start(operator);
        while let Some(event) = events.recv().await {
            if let Some(end) = self.dispatch(event) {
                tracing::info!(score = end.score(), "session finished");
                return end;
            }
        }
        tracing::debug!("event queue closed");
        self.abandon()
    }

    fn abandon(&mut self) -> SessionEnd {
        self.engine.abandon();
        let (score, tally) = self
            .engine
            .snapshot()
            .map(|s| (s.score, s.tally))
            .unwrap_or_default();
        SessionEnd::Abandoned { score, tally }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::mock::{ManualScheduler, ScriptedRandom};
    use crate::model::Phase;

    fn session(operands: &[u32]) -> Session {
        Session::new(RoundEngine::new(
            EngineConfig::default(),
            Box::new(ScriptedRandom::new(operands.iter().copied())),
            Box::new(ManualScheduler::default()),
        ))
    }

    #[test]
    fn earlier_event_wins_submit_first() {
        let mut session = session(&[2, 3]);
        session.engine_mut().start(Operator::Add);
        let id = session.engine().active_timer().unwrap();

        session.dispatch(Intent::Submit("5".into()).into());
        session.dispatch(TimerEvent::expired(id).into());

        let s = session.engine().snapshot().unwrap();
        assert_eq!(s.phase, Phase::Submitted);
        assert_eq!((s.score, s.lives), (10, 3));
    }

    #[test]
    fn earlier_event_wins_expiry_first() {
        let mut session = session(&[2, 3]);
        session.engine_mut().start(Operator::Add);
        let id = session.engine().active_timer().unwrap();

        session.dispatch(TimerEvent::expired(id).into());
        session.dispatch(Intent::Submit("5".into()).into());

        let s = session.engine().snapshot().unwrap();
        assert_eq!(s.phase, Phase::Expired);
        assert_eq!((s.score, s.lives), (0, 2));
    }

    #[test]
    fn abandon_reports_partial_score() {
        let mut session = session(&[2, 3]);
        session.engine_mut().start(Operator::Add);
        session.dispatch(Intent::Submit("5".into()).into());

        let end = session.dispatch(Intent::Abandon.into()).unwrap();
        assert_eq!(
            end,
            SessionEnd::Abandoned {
                score: 10,
                tally: Tally {
                    correct: 1,
                    wrong: 0,
                    timeouts: 0
                }
            }
        );
    }

    #[tokio::test]
    async fn run_until_game_over() {
        let mut session = session(&[]);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        for _ in 0..3 {
            tx.send(Intent::Submit("7".into()).into()).unwrap();
            tx.send(Intent::Advance.into()).unwrap();
        }

        let end = session.run(Operator::Add, &mut rx).await;
        assert_eq!(
            end,
            SessionEnd::GameOver {
                final_score: 0,
                tally: Tally {
                    correct: 0,
                    wrong: 3,
                    timeouts: 0
                }
            }
        );
    }

    #[tokio::test]
    async fn closed_queue_abandons() {
        let mut session = session(&[]);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(Intent::Submit("0".into()).into()).unwrap();
        drop(tx);

        let end = session.run(Operator::Multiply, &mut rx).await;
        assert_eq!(end.score(), 10);
        assert!(matches!(end, SessionEnd::Abandoned { .. }));
    }
}
