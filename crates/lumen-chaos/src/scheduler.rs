//! Phase state machine.
//!
//! [`ChaosScheduler`] owns no clock and no audio. Each call to
//! [`ChaosScheduler::handle`] takes an [`Event`] plus the current time and
//! returns the [`Effect`]s the driver must carry out: start or stop
//! output, run a fade, arm or cancel a timer. The same machine runs
//! against wall time in [`runner`](crate::runner) and against virtual time
//! in [`timeline`](crate::timeline).
//!
//! Every armed timer carries a fresh token. A timer event whose token no
//! longer matches the armed one (it was cancelled or re-armed in the
//! meantime) is ignored.
//!
//! ```text
//!   Idle --Start--> Playing <--phase timer--> Silent
//!                      |  \                   /  |
//!                    Pause  `--session timer-'  Pause
//!                      v          v              v
//!                   Paused      Stopped       Paused
//! ```

use std::fmt;

use rand::Rng;
use tracing::{debug, info, trace};

use crate::config::ChaosConfig;
use crate::volume::{DriftPlanner, FADE_IN_MS, FADE_OUT_MS, Fade};

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not started.
    Idle,
    /// Output audible, volume drifting.
    Playing,
    /// Output faded out and suspended.
    Silent,
    /// Manually paused; remaining times are held.
    Paused,
    /// Session over.
    Stopped,
}

impl Phase {
    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Playing => "playing",
            Phase::Silent => "silent",
            Phase::Paused => "paused",
            Phase::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three timers a session can have live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// End of the current Playing/Silent phase.
    Phase,
    /// Next volume re-target.
    Drift,
    /// End of the whole session.
    Session,
}

impl TimerKind {
    /// All kinds.
    pub const ALL: [TimerKind; 3] = [TimerKind::Phase, TimerKind::Drift, TimerKind::Session];

    /// Slot index.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Identifies one arming of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    /// Which timer.
    pub kind: TimerKind,
    /// Arming token.
    pub token: u64,
}

/// Input to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Begin (or restart) a session.
    Start,
    /// Hold the session, keeping remaining times.
    Pause,
    /// Continue a held session.
    Resume,
    /// End the session.
    Stop,
    /// A timer fired.
    Timer(TimerId),
}

/// Work for the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Start or continue audible output.
    ResumeOutput,
    /// Stop output (it may be resumed later).
    SuspendOutput,
    /// Set the linear volume immediately.
    SetLevel(f32),
    /// Ramp the linear volume, replacing any running fade.
    Fade {
        /// The ramp.
        fade: Fade,
        /// Suspend output once the ramp completes.
        suspend_after: bool,
    },
    /// Abandon the running fade where it is.
    CancelFade,
    /// Fire `id` after `after_ms`, replacing any timer of the same kind.
    SetTimer {
        /// Timer to deliver back as [`Event::Timer`].
        id: TimerId,
        /// Delay from now.
        after_ms: u64,
    },
    /// Drop the pending timer of this kind.
    CancelTimer(TimerKind),
    /// The scheduler entered a new phase.
    PhaseChanged(Phase),
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    token: u64,
    deadline_ms: u64,
}

/// Pure chaos session state machine.
#[derive(Debug, Clone)]
pub struct ChaosScheduler {
    config: ChaosConfig,
    planner: DriftPlanner,
    phase: Phase,
    paused_in: Option<Phase>,
    level: f32,
    timers: [Option<Armed>; 3],
    next_token: u64,
    drift_budget_ms: u64,
    held_phase_ms: u64,
    held_session_ms: Option<u64>,
}

impl ChaosScheduler {
    /// Idle scheduler for `config` (normalized here).
    pub fn new(config: &ChaosConfig) -> Self {
        let config = config.normalized();
        Self {
            planner: DriftPlanner::new(config.volume_frequency),
            level: config.initial_volume(),
            config,
            phase: Phase::Idle,
            paused_in: None,
            timers: [None; 3],
            next_token: 0,
            drift_budget_ms: 0,
            held_phase_ms: 0,
            held_session_ms: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Phase that was interrupted by a pause.
    pub fn paused_phase(&self) -> Option<Phase> {
        self.paused_in
    }

    /// Linear volume the output returns to when audible. Silent fades do
    /// not change it.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Normalized configuration.
    pub fn config(&self) -> &ChaosConfig {
        &self.config
    }

    /// `true` while Playing, Silent or Paused.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Playing | Phase::Silent | Phase::Paused)
    }

    /// Absolute deadline of the armed timer of `kind`.
    pub fn deadline_ms(&self, kind: TimerKind) -> Option<u64> {
        self.timers[kind.index()].map(|t| t.deadline_ms)
    }

    /// Phase time held by a pause.
    pub fn held_phase_ms(&self) -> Option<u64> {
        (self.phase == Phase::Paused).then_some(self.held_phase_ms)
    }

    /// Session time held by a pause, `None` when unbounded or not paused.
    pub fn held_session_ms(&self) -> Option<u64> {
        if self.phase == Phase::Paused { self.held_session_ms } else { None }
    }

    /// Applies `event` at `now_ms`.
    pub fn handle<R: Rng + ?Sized>(&mut self, event: Event, now_ms: u64, rng: &mut R) -> Vec<Effect> {
        let mut fx = Vec::new();
        match event {
            Event::Start => self.start(now_ms, rng, &mut fx),
            Event::Pause => self.pause(now_ms, &mut fx),
            Event::Resume => self.resume(now_ms, rng, &mut fx),
            Event::Stop => self.stop(&mut fx),
            Event::Timer(id) => {
                if !self.take_timer(id) {
                    trace!(kind = ?id.kind, token = id.token, "stale timer ignored");
                    return fx;
                }
                trace!(kind = ?id.kind, now_ms, "timer fired");
                match id.kind {
                    TimerKind::Phase => match self.phase {
                        Phase::Playing => self.enter_silent(now_ms, rng, &mut fx),
                        Phase::Silent => self.enter_playing(now_ms, rng, &mut fx),
                        _ => {}
                    },
                    TimerKind::Drift => self.drift(now_ms, rng, &mut fx),
                    TimerKind::Session => self.stop(&mut fx),
                }
            }
        }
        fx
    }

    fn start<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R, fx: &mut Vec<Effect>) {
        if self.is_active() {
            self.cancel_all(fx);
        }
        self.paused_in = None;
        self.level = self.config.initial_volume();
        info!(
            duration_mins = self.config.duration_mins,
            frequency = self.config.volume_frequency,
            "chaos session started"
        );
        self.enter_playing(now_ms, rng, fx);
        if let Some(ms) = self.config.session_ms() {
            self.arm(TimerKind::Session, ms, now_ms, fx);
        }
    }

    fn enter_playing<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R, fx: &mut Vec<Effect>) {
        self.cancel(TimerKind::Drift, fx);
        self.phase = Phase::Playing;
        let duration = self.config.play.sample_ms(rng);
        fx.push(Effect::ResumeOutput);
        fx.push(Effect::Fade {
            fade: Fade::new(0.0, self.level, FADE_IN_MS),
            suspend_after: false,
        });
        self.arm(TimerKind::Phase, duration, now_ms, fx);
        // Drift takes over once the fade-in is done.
        if FADE_IN_MS < duration {
            self.drift_budget_ms = duration - FADE_IN_MS;
            self.arm(TimerKind::Drift, FADE_IN_MS, now_ms, fx);
        }
        info!(phase = %Phase::Playing, duration_ms = duration, "phase");
        fx.push(Effect::PhaseChanged(Phase::Playing));
    }

    fn enter_silent<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R, fx: &mut Vec<Effect>) {
        self.cancel(TimerKind::Drift, fx);
        self.phase = Phase::Silent;
        let duration = self.config.pause.sample_ms(rng);
        fx.push(Effect::Fade {
            fade: Fade::new(self.level, 0.0, FADE_OUT_MS),
            suspend_after: true,
        });
        self.arm(TimerKind::Phase, duration, now_ms, fx);
        info!(phase = %Phase::Silent, duration_ms = duration, "phase");
        fx.push(Effect::PhaseChanged(Phase::Silent));
    }

    fn drift<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R, fx: &mut Vec<Effect>) {
        if self.phase != Phase::Playing {
            return;
        }
        let step = self
            .planner
            .plan(rng, self.config.min_volume, self.config.max_volume);
        debug!(target = step.target, fade_ms = step.fade_ms, next_ms = step.next_ms, "volume drift");
        fx.push(Effect::Fade {
            fade: Fade::new(self.level, step.target, step.fade_ms),
            suspend_after: false,
        });
        self.level = step.target;
        if step.next_ms < self.drift_budget_ms {
            self.drift_budget_ms -= step.next_ms;
            self.arm(TimerKind::Drift, step.next_ms, now_ms, fx);
        }
    }

    fn pause(&mut self, now_ms: u64, fx: &mut Vec<Effect>) {
        if !matches!(self.phase, Phase::Playing | Phase::Silent) {
            return;
        }
        let remaining = |slot: Option<Armed>| slot.map(|t| t.deadline_ms.saturating_sub(now_ms));
        self.held_phase_ms = remaining(self.timers[TimerKind::Phase.index()]).unwrap_or(0);
        self.held_session_ms = remaining(self.timers[TimerKind::Session.index()]);
        self.paused_in = Some(self.phase);
        self.cancel_all(fx);
        self.phase = Phase::Paused;
        info!(held_phase_ms = self.held_phase_ms, held_session_ms = ?self.held_session_ms, "paused");
        fx.push(Effect::PhaseChanged(Phase::Paused));
    }

    fn resume<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R, fx: &mut Vec<Effect>) {
        if self.phase != Phase::Paused {
            return;
        }
        let Some(was) = self.paused_in.take() else {
            return;
        };
        if let Some(ms) = self.held_session_ms.take() {
            self.arm(TimerKind::Session, ms, now_ms, fx);
        }
        let remaining = self.held_phase_ms;
        self.phase = was;
        self.arm(TimerKind::Phase, remaining, now_ms, fx);
        if was == Phase::Playing {
            fx.push(Effect::ResumeOutput);
            fx.push(Effect::SetLevel(self.level));
            self.drift_budget_ms = remaining;
            self.drift(now_ms, rng, fx);
        }
        info!(phase = %was, remaining_ms = remaining, "resumed");
        fx.push(Effect::PhaseChanged(was));
    }

    fn stop(&mut self, fx: &mut Vec<Effect>) {
        if self.phase == Phase::Stopped {
            return;
        }
        self.cancel_all(fx);
        self.paused_in = None;
        self.held_session_ms = None;
        self.phase = Phase::Stopped;
        info!("chaos session stopped");
        fx.push(Effect::PhaseChanged(Phase::Stopped));
    }

    fn cancel_all(&mut self, fx: &mut Vec<Effect>) {
        for kind in TimerKind::ALL {
            self.cancel(kind, fx);
        }
        fx.push(Effect::CancelFade);
        fx.push(Effect::SuspendOutput);
    }

    fn arm(&mut self, kind: TimerKind, after_ms: u64, now_ms: u64, fx: &mut Vec<Effect>) {
        self.next_token += 1;
        let id = TimerId {
            kind,
            token: self.next_token,
        };
        self.timers[kind.index()] = Some(Armed {
            token: id.token,
            deadline_ms: now_ms + after_ms,
        });
        fx.push(Effect::SetTimer { id, after_ms });
    }

    fn cancel(&mut self, kind: TimerKind, fx: &mut Vec<Effect>) {
        if self.timers[kind.index()].take().is_some() {
            fx.push(Effect::CancelTimer(kind));
        }
    }

    fn take_timer(&mut self, id: TimerId) -> bool {
        let slot = &mut self.timers[id.kind.index()];
        match slot {
            Some(armed) if armed.token == id.token => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DurationSpec;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fixed(play: u32, pause: u32, mins: u32) -> ChaosConfig {
        ChaosConfig {
            duration_mins: mins,
            play: DurationSpec::Range { min_secs: play, max_secs: play },
            pause: DurationSpec::Range { min_secs: pause, max_secs: pause },
            ..ChaosConfig::default()
        }
    }

    fn timer(fx: &[Effect], kind: TimerKind) -> Option<(TimerId, u64)> {
        fx.iter().rev().find_map(|e| match e {
            Effect::SetTimer { id, after_ms } if id.kind == kind => Some((*id, *after_ms)),
            _ => None,
        })
    }

    #[test]
    fn start_enters_playing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = ChaosScheduler::new(&fixed(10, 5, 1));
        let fx = s.handle(Event::Start, 0, &mut rng);
        assert_eq!(s.phase(), Phase::Playing);
        assert!((s.level() - 0.5).abs() < 1e-6);
        assert_eq!(fx.first(), Some(&Effect::ResumeOutput));
        assert!(fx.contains(&Effect::Fade {
            fade: Fade::new(0.0, s.level(), FADE_IN_MS),
            suspend_after: false,
        }));
        assert_eq!(timer(&fx, TimerKind::Phase).map(|t| t.1), Some(10_000));
        assert_eq!(timer(&fx, TimerKind::Drift).map(|t| t.1), Some(FADE_IN_MS));
        assert_eq!(timer(&fx, TimerKind::Session).map(|t| t.1), Some(60_000));
        assert_eq!(fx.last(), Some(&Effect::PhaseChanged(Phase::Playing)));
    }

    #[test]
    fn phase_timer_alternates() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = ChaosScheduler::new(&fixed(10, 5, 0));
        let fx = s.handle(Event::Start, 0, &mut rng);
        let (id, _) = timer(&fx, TimerKind::Phase).unwrap();

        let fx = s.handle(Event::Timer(id), 10_000, &mut rng);
        assert_eq!(s.phase(), Phase::Silent);
        assert!(fx.contains(&Effect::CancelTimer(TimerKind::Drift)));
        assert!(fx.contains(&Effect::Fade {
            fade: Fade::new(s.level(), 0.0, FADE_OUT_MS),
            suspend_after: true,
        }));
        let (id, after) = timer(&fx, TimerKind::Phase).unwrap();
        assert_eq!(after, 5000);

        s.handle(Event::Timer(id), 15_000, &mut rng);
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.deadline_ms(TimerKind::Phase), Some(25_000));
    }

    #[test]
    fn silent_fade_keeps_level() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = ChaosScheduler::new(&fixed(10, 5, 0));
        let fx = s.handle(Event::Start, 0, &mut rng);
        let (phase, _) = timer(&fx, TimerKind::Phase).unwrap();
        let (drift, _) = timer(&fx, TimerKind::Drift).unwrap();
        s.handle(Event::Timer(drift), 1000, &mut rng);
        let level = s.level();
        assert!((0.2..=0.8).contains(&level));

        let fx = s.handle(Event::Timer(phase), 10_000, &mut rng);
        assert!(fx.contains(&Effect::Fade {
            fade: Fade::new(level, 0.0, FADE_OUT_MS),
            suspend_after: true,
        }));
        assert_eq!(s.level(), level);
        // The next fade-in returns to the drifted level, not to zero.
        let (phase, _) = timer(&fx, TimerKind::Phase).unwrap();
        let fx = s.handle(Event::Timer(phase), 15_000, &mut rng);
        assert!(fx.contains(&Effect::Fade {
            fade: Fade::new(0.0, level, FADE_IN_MS),
            suspend_after: false,
        }));
    }

    #[test]
    fn pause_resume_preserves_remaining_time() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = ChaosScheduler::new(&fixed(10, 5, 1));
        s.handle(Event::Start, 0, &mut rng);

        let fx = s.handle(Event::Pause, 4000, &mut rng);
        assert_eq!(s.phase(), Phase::Paused);
        assert_eq!(s.paused_phase(), Some(Phase::Playing));
        assert_eq!(s.held_phase_ms(), Some(6000));
        assert_eq!(s.held_session_ms(), Some(56_000));
        for kind in TimerKind::ALL {
            assert!(fx.contains(&Effect::CancelTimer(kind)));
            assert_eq!(s.deadline_ms(kind), None);
        }
        assert!(fx.contains(&Effect::SuspendOutput));

        // A long pause does not eat into the session.
        let level = s.level();
        let fx = s.handle(Event::Resume, 100_000, &mut rng);
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(timer(&fx, TimerKind::Phase).map(|t| t.1), Some(6000));
        assert_eq!(timer(&fx, TimerKind::Session).map(|t| t.1), Some(56_000));
        assert_eq!(s.deadline_ms(TimerKind::Session), Some(156_000));
        assert!(fx.contains(&Effect::ResumeOutput));
        assert!(fx.contains(&Effect::SetLevel(level)));
    }

    #[test]
    fn pause_during_silence_resumes_silent() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut s = ChaosScheduler::new(&fixed(10, 5, 0));
        let fx = s.handle(Event::Start, 0, &mut rng);
        let (id, _) = timer(&fx, TimerKind::Phase).unwrap();
        s.handle(Event::Timer(id), 10_000, &mut rng);
        s.handle(Event::Pause, 11_500, &mut rng);
        assert_eq!(s.held_session_ms(), None);

        let fx = s.handle(Event::Resume, 20_000, &mut rng);
        assert_eq!(s.phase(), Phase::Silent);
        assert_eq!(timer(&fx, TimerKind::Phase).map(|t| t.1), Some(3500));
        assert!(!fx.contains(&Effect::ResumeOutput));
        assert!(timer(&fx, TimerKind::Drift).is_none());
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut s = ChaosScheduler::new(&fixed(10, 5, 0));
        let fx = s.handle(Event::Start, 0, &mut rng);
        let (old, _) = timer(&fx, TimerKind::Phase).unwrap();
        s.handle(Event::Pause, 2000, &mut rng);
        s.handle(Event::Resume, 3000, &mut rng);

        assert!(s.handle(Event::Timer(old), 10_000, &mut rng).is_empty());
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.deadline_ms(TimerKind::Phase), Some(11_000));
    }

    #[test]
    fn session_timer_stops_from_any_phase() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = ChaosScheduler::new(&fixed(10, 5, 1));
        let fx = s.handle(Event::Start, 0, &mut rng);
        let (session, _) = timer(&fx, TimerKind::Session).unwrap();
        let fx = s.handle(Event::Timer(session), 60_000, &mut rng);
        assert_eq!(s.phase(), Phase::Stopped);
        assert_eq!(fx.last(), Some(&Effect::PhaseChanged(Phase::Stopped)));
        assert!(fx.contains(&Effect::CancelTimer(TimerKind::Phase)));
        assert!(s.handle(Event::Stop, 60_001, &mut rng).is_empty());
        assert!(s.handle(Event::Resume, 60_002, &mut rng).is_empty());
    }

    #[test]
    fn pause_and_resume_are_noops_when_not_applicable() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut s = ChaosScheduler::new(&ChaosConfig::default());
        assert!(s.handle(Event::Pause, 0, &mut rng).is_empty());
        assert!(s.handle(Event::Resume, 0, &mut rng).is_empty());
        s.handle(Event::Start, 0, &mut rng);
        assert!(s.handle(Event::Resume, 10, &mut rng).is_empty());
        s.handle(Event::Pause, 20, &mut rng);
        assert!(s.handle(Event::Pause, 30, &mut rng).is_empty());
    }

    #[test]
    fn drift_respects_budget() {
        let mut rng = StdRng::seed_from_u64(9);
        // Frequency 10: base 3 s, so several re-targets fit in 60 s.
        let cfg = ChaosConfig {
            volume_frequency: 10,
            ..fixed(60, 5, 0)
        };
        let mut s = ChaosScheduler::new(&cfg);
        let fx = s.handle(Event::Start, 0, &mut rng);
        let (mut id, mut after) = timer(&fx, TimerKind::Drift).unwrap();
        let mut now = 0;
        let mut fired = 0;
        loop {
            now += after;
            let fx = s.handle(Event::Timer(id), now, &mut rng);
            fired += 1;
            assert!(fx.iter().any(|e| matches!(e, Effect::Fade { .. })));
            match timer(&fx, TimerKind::Drift) {
                Some(next) => (id, after) = next,
                None => break,
            }
        }
        assert!(now < 60_000);
        assert!(fired >= 8, "{fired}");
    }

    #[test]
    fn restart_cancels_previous_session() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut s = ChaosScheduler::new(&fixed(10, 5, 1));
        s.handle(Event::Start, 0, &mut rng);
        let fx = s.handle(Event::Start, 5000, &mut rng);
        assert!(fx.contains(&Effect::CancelTimer(TimerKind::Session)));
        assert_eq!(s.deadline_ms(TimerKind::Session), Some(65_000));
    }
}
