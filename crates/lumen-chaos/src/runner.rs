//! Wall-clock driver for [`ChaosScheduler`].
//!
//! [`ChaosRunner::spawn`] moves the scheduler onto a named worker thread
//! that owns the [`AudioSink`]. The caller keeps a [`ChaosHandle`] that
//! sends pause/resume/stop over a channel and reads the current phase.
//! The worker sleeps on the channel with a timeout set to the earliest
//! pending timer or fade step, so there is one thread per session and no
//! polling.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::ChaosConfig;
use crate::error::{ChaosError, ChaosResult};
use crate::scheduler::{ChaosScheduler, Effect, Event, Phase, TimerId, TimerKind};
use crate::volume::{FADE_STEPS, Fade, perceptual_gain};

/// Audio output controlled by a runner.
///
/// Gains are already shaped by [`perceptual_gain`].
pub trait AudioSink: Send + 'static {
    /// Start or continue playback.
    fn resume(&mut self);
    /// Stop playback, keeping the position.
    fn suspend(&mut self);
    /// Output gain in `[0, 1]`.
    fn set_gain(&mut self, gain: f32);
}

enum Control {
    Pause,
    Resume,
    Stop,
}

/// Fade in progress.
struct ActiveFade {
    fade: Fade,
    started: Instant,
    /// Next step to apply; `FADE_STEPS + 1` is completion.
    next_step: u32,
    suspend_after: bool,
}

impl ActiveFade {
    fn due(&self) -> Instant {
        let offset = if self.next_step > FADE_STEPS {
            self.fade.total_ms()
        } else {
            self.fade.step_offset_ms(self.next_step)
        };
        self.started + Duration::from_millis(offset)
    }
}

/// Worker-side state of a running session.
pub struct ChaosRunner<S: AudioSink> {
    scheduler: ChaosScheduler,
    sink: S,
    rx: Receiver<Control>,
    phase: Arc<Mutex<Phase>>,
    epoch: Instant,
    timers: [Option<(TimerId, Instant)>; 3],
    fade: Option<ActiveFade>,
}

impl<S: AudioSink> ChaosRunner<S> {
    /// Starts a session on a new thread.
    pub fn spawn(config: &ChaosConfig, sink: S) -> ChaosResult<ChaosHandle> {
        let (tx, rx) = mpsc::channel();
        let phase = Arc::new(Mutex::new(Phase::Idle));
        let runner = ChaosRunner {
            scheduler: ChaosScheduler::new(config),
            sink,
            rx,
            phase: Arc::clone(&phase),
            epoch: Instant::now(),
            timers: [None; 3],
            fade: None,
        };
        let worker = thread::Builder::new()
            .name("chaos-runner".into())
            .spawn(move || runner.run())?;
        Ok(ChaosHandle {
            tx,
            phase,
            worker: Some(worker),
        })
    }

    fn run(mut self) {
        let mut rng = rand::rng();
        self.epoch = Instant::now();
        self.dispatch(Event::Start, &mut rng);

        while self.scheduler.phase() != Phase::Stopped {
            let msg = match self.next_wake() {
                Some(at) => self.rx.recv_timeout(at.saturating_duration_since(Instant::now())),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match msg {
                Ok(Control::Pause) => self.dispatch(Event::Pause, &mut rng),
                Ok(Control::Resume) => self.dispatch(Event::Resume, &mut rng),
                Ok(Control::Stop) => self.dispatch(Event::Stop, &mut rng),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("handle dropped, stopping session");
                    self.dispatch(Event::Stop, &mut rng);
                }
            }
            self.advance_fade();
            self.fire_due_timers(&mut rng);
        }
        debug!("chaos runner exiting");
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn next_wake(&self) -> Option<Instant> {
        let timers = self.timers.iter().flatten().map(|(_, at)| *at);
        let fade = self.fade.as_ref().map(ActiveFade::due);
        timers.chain(fade).min()
    }

    fn dispatch<R: Rng + ?Sized>(&mut self, event: Event, rng: &mut R) {
        let now_ms = self.now_ms();
        let effects = self.scheduler.handle(event, now_ms, rng);
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ResumeOutput => self.sink.resume(),
            Effect::SuspendOutput => self.sink.suspend(),
            Effect::SetLevel(level) => self.sink.set_gain(perceptual_gain(level)),
            Effect::Fade { fade, suspend_after } => {
                self.fade = Some(ActiveFade {
                    fade,
                    started: Instant::now(),
                    next_step: 1,
                    suspend_after,
                });
                self.advance_fade();
            }
            Effect::CancelFade => self.fade = None,
            Effect::SetTimer { id, after_ms } => {
                self.timers[id.kind.index()] = Some((id, Instant::now() + Duration::from_millis(after_ms)));
            }
            Effect::CancelTimer(kind) => self.timers[kind.index()] = None,
            Effect::PhaseChanged(phase) => *self.phase.lock() = phase,
        }
    }

    /// Applies every fade step that has come due.
    fn advance_fade(&mut self) {
        let now = Instant::now();
        while let Some(active) = self.fade.as_mut() {
            if active.due() > now {
                return;
            }
            if active.next_step > FADE_STEPS {
                let suspend = active.suspend_after;
                self.fade = None;
                if suspend {
                    self.sink.suspend();
                }
                return;
            }
            let level = active.fade.level_at_step(active.next_step);
            active.next_step += 1;
            self.sink.set_gain(perceptual_gain(level));
        }
    }

    fn fire_due_timers<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        loop {
            let now = Instant::now();
            let due = self
                .timers
                .iter()
                .flatten()
                .filter(|(_, at)| *at <= now)
                .min_by_key(|(id, at)| (*at, id.kind != TimerKind::Session))
                .map(|(id, _)| *id);
            let Some(id) = due else {
                return;
            };
            self.timers[id.kind.index()] = None;
            self.dispatch(Event::Timer(id), rng);
            if self.scheduler.phase() == Phase::Stopped {
                return;
            }
        }
    }
}

/// Caller side of a running session.
///
/// Dropping the handle stops the session and waits for the worker.
pub struct ChaosHandle {
    tx: Sender<Control>,
    phase: Arc<Mutex<Phase>>,
    worker: Option<JoinHandle<()>>,
}

impl ChaosHandle {
    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Holds the session.
    pub fn pause(&self) -> ChaosResult<()> {
        self.send(Control::Pause)
    }

    /// Continues a held session.
    pub fn resume(&self) -> ChaosResult<()> {
        self.send(Control::Resume)
    }

    /// Ends the session. The worker exits shortly after.
    pub fn stop(&self) -> ChaosResult<()> {
        self.send(Control::Stop)
    }

    /// `true` once the worker thread has returned.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the session to end on its own (session timer or stop).
    pub fn join(mut self) -> ChaosResult<()> {
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| ChaosError::Panicked),
            None => Ok(()),
        }
    }

    fn send(&self, msg: Control) -> ChaosResult<()> {
        self.tx.send(msg).map_err(|_| ChaosError::Disconnected)
    }
}

impl Drop for ChaosHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.tx.send(Control::Stop);
            if worker.join().is_err() {
                warn!("chaos runner panicked");
            }
        }
    }
}
