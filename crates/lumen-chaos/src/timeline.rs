//! Virtual-time simulation of a chaos session.
//!
//! Runs [`ChaosScheduler`] against a timer queue instead of a clock, so a
//! whole session resolves instantly. Cancelled timers stay in the queue
//! and are rejected by the scheduler's token check when they come due,
//! exactly as a late wall-clock timer would be.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::Rng;

use crate::config::ChaosConfig;
use crate::scheduler::{ChaosScheduler, Effect, Event, Phase, TimerId, TimerKind};

/// A phase change at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Milliseconds since the session started.
    pub at_ms: u64,
    /// Phase entered.
    pub phase: Phase,
}

/// A volume re-target at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftMark {
    /// Milliseconds since the session started.
    pub at_ms: u64,
    /// New linear target.
    pub target: f32,
    /// Fade length.
    pub fade_ms: u64,
}

/// Result of [`simulate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    /// Every phase change, in order.
    pub transitions: Vec<Transition>,
    /// Every drift re-target, in order.
    pub drifts: Vec<DriftMark>,
    /// Time the simulation ended.
    pub end_ms: u64,
}

impl Timeline {
    /// Final phase, [`Phase::Idle`] if nothing happened.
    pub fn final_phase(&self) -> Phase {
        self.transitions.last().map_or(Phase::Idle, |t| t.phase)
    }

    /// `(phase, start_ms, end_ms)` spans between transitions; the last
    /// span ends at [`Self::end_ms`].
    pub fn segments(&self) -> Vec<(Phase, u64, u64)> {
        self.transitions
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let end = self.transitions.get(i + 1).map_or(self.end_ms, |n| n.at_ms);
                (t.phase, t.at_ms, end)
            })
            .collect()
    }
}

/// Pending timers ordered by deadline, then session before the rest,
/// then by arming order.
#[derive(Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<Reverse<(u64, bool, u64, TimerKind, u64)>>,
    seq: u64,
}

impl TimerQueue {
    pub(crate) fn push(&mut self, due_ms: u64, id: TimerId) {
        self.seq += 1;
        let deferred = id.kind != TimerKind::Session;
        self.heap.push(Reverse((due_ms, deferred, self.seq, id.kind, id.token)));
    }

    pub(crate) fn peek_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse((due, ..))| *due)
    }

    pub(crate) fn pop(&mut self) -> Option<(u64, TimerId)> {
        self.heap
            .pop()
            .map(|Reverse((due, _, _, kind, token))| (due, TimerId { kind, token }))
    }
}

/// Simulates a session until it stops or `horizon_ms` passes.
///
/// When timers fall due at the same instant the session timer fires
/// first, the rest in the order they were armed.
pub fn simulate<R: Rng + ?Sized>(config: &ChaosConfig, horizon_ms: u64, rng: &mut R) -> Timeline {
    let mut scheduler = ChaosScheduler::new(config);
    let mut queue = TimerQueue::default();
    let mut timeline = Timeline::default();

    let effects = scheduler.handle(Event::Start, 0, rng);
    record(&effects, 0, false, &mut queue, &mut timeline);

    while scheduler.phase() != Phase::Stopped {
        let Some((due, id)) = queue.pop() else {
            break;
        };
        if due > horizon_ms {
            break;
        }
        timeline.end_ms = due;
        let effects = scheduler.handle(Event::Timer(id), due, rng);
        record(&effects, due, id.kind == TimerKind::Drift, &mut queue, &mut timeline);
    }
    if scheduler.phase() != Phase::Stopped {
        timeline.end_ms = horizon_ms;
    }
    timeline
}

fn record(effects: &[Effect], now: u64, from_drift: bool, queue: &mut TimerQueue, timeline: &mut Timeline) {
    for effect in effects {
        match *effect {
            Effect::SetTimer { id, after_ms } => queue.push(now + after_ms, id),
            Effect::PhaseChanged(phase) => timeline.transitions.push(Transition { at_ms: now, phase }),
            Effect::Fade { fade, .. } if from_drift => timeline.drifts.push(DriftMark {
                at_ms: now,
                target: fade.to,
                fade_ms: fade.duration_ms,
            }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DurationSpec;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn ten_five_for_one_minute() {
        let cfg = ChaosConfig {
            duration_mins: 1,
            play: DurationSpec::Range { min_secs: 10, max_secs: 10 },
            pause: DurationSpec::Range { min_secs: 5, max_secs: 5 },
            ..ChaosConfig::default()
        };
        let tl = simulate(&cfg, u64::MAX, &mut StdRng::seed_from_u64(42));
        let got: Vec<_> = tl.transitions.iter().map(|t| (t.at_ms, t.phase)).collect();
        use Phase::*;
        assert_eq!(
            got,
            vec![
                (0, Playing),
                (10_000, Silent),
                (15_000, Playing),
                (25_000, Silent),
                (30_000, Playing),
                (40_000, Silent),
                (45_000, Playing),
                (55_000, Silent),
                (60_000, Stopped),
            ]
        );
        assert_eq!(tl.final_phase(), Stopped);
        assert_eq!(tl.end_ms, 60_000);
    }

    #[test]
    fn session_wins_a_tie() {
        let cfg = ChaosConfig {
            duration_mins: 1,
            play: DurationSpec::Range { min_secs: 60, max_secs: 60 },
            ..ChaosConfig::default()
        };
        let tl = simulate(&cfg, u64::MAX, &mut StdRng::seed_from_u64(3));
        let got: Vec<_> = tl.transitions.iter().map(|t| (t.at_ms, t.phase)).collect();
        assert_eq!(got, vec![(0, Phase::Playing), (60_000, Phase::Stopped)]);
    }

    #[test]
    fn drift_only_while_playing() {
        let cfg = ChaosConfig {
            duration_mins: 5,
            volume_frequency: 10,
            play: DurationSpec::Range { min_secs: 20, max_secs: 40 },
            pause: DurationSpec::Range { min_secs: 5, max_secs: 15 },
            ..ChaosConfig::default()
        };
        let tl = simulate(&cfg, u64::MAX, &mut StdRng::seed_from_u64(3));
        assert!(!tl.drifts.is_empty());
        let segments = tl.segments();
        for d in &tl.drifts {
            let (phase, _, _) = segments
                .iter()
                .rev()
                .find(|(_, start, _)| *start <= d.at_ms)
                .copied()
                .unwrap();
            assert_eq!(phase, Phase::Playing, "drift at {}", d.at_ms);
            assert!((0.2..=0.8).contains(&d.target));
        }
        for (phase, start, end) in segments {
            match phase {
                Phase::Playing => assert!((20_000..=40_000).contains(&(end - start)) || end == 300_000),
                Phase::Silent => assert!((5000..=15_000).contains(&(end - start)) || end == 300_000),
                Phase::Stopped => assert_eq!(start, 300_000),
                other => panic!("unexpected {other}"),
            }
        }
    }

    #[test]
    fn unbounded_session_runs_to_horizon() {
        let cfg = ChaosConfig {
            duration_mins: 0,
            ..ChaosConfig::default()
        };
        let tl = simulate(&cfg, 3_600_000, &mut StdRng::seed_from_u64(1));
        assert_ne!(tl.final_phase(), Phase::Stopped);
        assert_eq!(tl.end_ms, 3_600_000);
        assert!(tl.transitions.len() > 40);
    }

    #[test]
    fn level_durations() {
        let cfg = ChaosConfig {
            duration_mins: 10,
            play: DurationSpec::Level(1),
            pause: DurationSpec::Level(1),
            ..ChaosConfig::default()
        };
        let tl = simulate(&cfg, u64::MAX, &mut StdRng::seed_from_u64(9));
        for (phase, start, end) in tl.segments() {
            if phase != Phase::Stopped && end != 600_000 {
                assert!((5000..=15_000).contains(&(end - start)));
            }
        }
    }
}
