//! Test doubles for driving the engine deterministically.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::{StateObserver, Transition};
use crate::error::RoundError;
use crate::generator::RandomSource;
use crate::model::RoundSnapshot;
use crate::timer::{CountdownHandle, CountdownScheduler, TimerId};

/// A randomness source that replays a fixed sequence.
///
/// Values are reduced modulo the requested bound; once the script runs out
/// every draw returns 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<u32>,
    draws: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            draws: 0,
        }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for ScriptedRandom {
    fn next_int(&mut self, bound: u32) -> u32 {
        self.draws += 1;
        match self.values.pop_front() {
            Some(v) if bound > 0 => v % bound,
            _ => 0,
        }
    }
}

/// A scheduler that never fires on its own.
///
/// Tests read the started timer ids and feed
/// [`TimerEvent`](crate::timer::TimerEvent)s into the engine themselves.
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    started: Arc<Mutex<Vec<(CountdownHandle, Duration, Duration)>>>,
}

impl ManualScheduler {
    /// Ids of every countdown started, oldest first.
    pub fn started(&self) -> Vec<TimerId> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|(h, _, _)| h.id())
            .collect()
    }

    pub fn last_started(&self) -> Option<TimerId> {
        self.started().last().copied()
    }

    /// Duration and tick the countdown `id` was started with.
    pub fn settings(&self, id: TimerId) -> Option<(Duration, Duration)> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .find(|(h, _, _)| h.id() == id)
            .map(|(_, d, t)| (*d, *t))
    }

    pub fn is_cancelled(&self, id: TimerId) -> bool {
        self.started
            .lock()
            .unwrap()
            .iter()
            .any(|(h, _, _)| h.id() == id && h.is_cancelled())
    }
}

impl CountdownScheduler for ManualScheduler {
    fn start(&mut self, id: TimerId, duration: Duration, tick: Duration) -> CountdownHandle {
        let handle = CountdownHandle::new(id);
        self.started
            .lock()
            .unwrap()
            .push((handle.clone(), duration, tick));
        handle
    }
}

#[derive(Debug, Default)]
struct Recording {
    snapshots: Vec<(Transition, RoundSnapshot)>,
    rejections: Vec<RoundError>,
    game_over: Option<u32>,
}

/// Observer that records everything it is told. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingObserver {
    pub fn transitions(&self) -> Vec<Transition> {
        self.inner
            .lock()
            .unwrap()
            .snapshots
            .iter()
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn snapshots(&self) -> Vec<RoundSnapshot> {
        self.inner
            .lock()
            .unwrap()
            .snapshots
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }

    pub fn rejections(&self) -> Vec<RoundError> {
        self.inner.lock().unwrap().rejections.clone()
    }

    pub fn game_over(&self) -> Option<u32> {
        self.inner.lock().unwrap().game_over
    }
}

impl StateObserver for RecordingObserver {
    fn on_snapshot(&self, transition: Transition, snapshot: &RoundSnapshot) {
        self.inner
            .lock()
            .unwrap()
            .snapshots
            .push((transition, snapshot.clone()));
    }

    fn on_rejected(&self, error: &RoundError) {
        self.inner.lock().unwrap().rejections.push(error.clone());
    }

    fn on_game_over(&self, final_score: u32) {
        self.inner.lock().unwrap().game_over = Some(final_score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_random_replays_then_zeroes() {
        let mut rng = ScriptedRandom::new([7, 105]);
        assert_eq!(rng.next_int(100), 7);
        assert_eq!(rng.next_int(100), 5);
        assert_eq!(rng.next_int(100), 0);
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn manual_scheduler_shares_log_between_clones() {
        let scheduler = ManualScheduler::default();
        let mut clone = scheduler.clone();
        let id = TimerId::next();
        let handle = clone.start(id, Duration::from_secs(10), Duration::from_secs(1));

        assert_eq!(scheduler.started(), vec![id]);
        assert_eq!(
            scheduler.settings(id),
            Some((Duration::from_secs(10), Duration::from_secs(1)))
        );
        assert!(!scheduler.is_cancelled(id));
        handle.cancel();
        assert!(scheduler.is_cancelled(id));
    }
}
