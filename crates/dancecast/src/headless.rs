//! Headless playback surface
//!
//! A software clock stands in for a media element: it advances while
//! playing, at the requested rate, and reports time updates and seeks as
//! [`MediaEvent`]s on a channel the command driver consumes.

use dancecast_core::{MediaBackend, MediaError, MediaEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, trace};

#[derive(Debug)]
struct ClockState {
    source: Option<String>,
    playing: bool,
    position: f64,
    rate: f64,
    duration: Option<f64>,
}

/// Media backend driven by a software clock
#[derive(Debug, Clone)]
pub struct ClockBackend {
    state: Arc<Mutex<ClockState>>,
    events: UnboundedSender<MediaEvent>,
}

impl ClockBackend {
    /// Create a stopped clock reporting to `events`
    pub fn new(events: UnboundedSender<MediaEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                source: None,
                playing: false,
                position: 0.0,
                rate: 1.0,
                duration: None,
            })),
            events,
        }
    }

    /// Stop the clock at `duration`, as a media file of that length would
    #[cfg(test)]
    pub fn with_duration(self, duration: f64) -> Self {
        self.state.lock().duration = Some(duration);
        self
    }

    /// Advance the clock every `tick` and emit a time update
    pub fn spawn_ticker(&self, tick: Duration) -> JoinHandle<()> {
        let clock = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let elapsed = now.duration_since(last).as_secs_f64();
                last = now;
                if let Some(position) = clock.advance(elapsed) {
                    if clock.events.send(MediaEvent::TimeUpdate { position }).is_err() {
                        debug!("Media event receiver dropped, stopping clock");
                        break;
                    }
                }
            }
        })
    }

    /// Move the clock forward by `elapsed` seconds of wall time.
    ///
    /// Returns the new position when a source is playing.
    fn advance(&self, elapsed: f64) -> Option<f64> {
        let mut state = self.state.lock();
        if !state.playing || state.source.is_none() {
            return None;
        }
        let mut position = state.position + elapsed * state.rate;
        if let Some(duration) = state.duration {
            if position >= duration {
                position = duration;
                state.playing = false;
            }
        }
        state.position = position;
        trace!("Clock at {:.3}", position);
        Some(position)
    }

    fn emit(&self, event: MediaEvent) {
        if self.events.send(event).is_err() {
            trace!("Media event dropped, receiver gone");
        }
    }

    /// Whether the clock is running
    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }
}

impl MediaBackend for ClockBackend {
    fn set_source(&mut self, url: Option<&str>) {
        let mut state = self.state.lock();
        state.source = url.map(str::to_string);
        state.position = 0.0;
        state.playing = false;
        let duration = state.duration;
        drop(state);

        if url.is_some() {
            if let Some(duration) = duration {
                self.emit(MediaEvent::LoadedMetadata { duration });
            }
        }
    }

    fn play(&mut self) -> Result<(), MediaError> {
        {
            let mut state = self.state.lock();
            if state.source.is_none() {
                return Err(MediaError::SourceUnavailable("no source".to_string()));
            }
            state.playing = true;
        }
        self.emit(MediaEvent::Playing);
        Ok(())
    }

    fn pause(&mut self) {
        let was_playing = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.playing, false)
        };
        if was_playing {
            self.emit(MediaEvent::Paused);
        }
    }

    fn seek(&mut self, seconds: f64) {
        {
            let mut state = self.state.lock();
            let upper = state.duration.unwrap_or(f64::INFINITY);
            state.position = seconds.clamp(0.0, upper);
        }
        self.emit(MediaEvent::Seeked);
    }

    fn set_rate(&mut self, rate: f64) {
        self.state.lock().rate = rate;
    }

    fn position(&self) -> f64 {
        self.state.lock().position
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }
}
