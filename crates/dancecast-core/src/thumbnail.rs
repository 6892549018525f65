//! Visibility-driven thumbnail scheduler
//!
//! Preview loads start only for entries that became visible, at most `limit`
//! at a time, and only while the catalog is the active view. Every load is
//! issued as a [`LoadTicket`] tagged with the scheduler generation; teardown
//! bumps the generation so late completions are recognised and dropped.

use crate::CatalogEntry;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Concurrent preview loads used by the clients
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Identifies a job inside one scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(usize);

impl JobHandle {
    /// Position of the job in registration order
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Lifecycle of a preview load
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Not started
    Pending,
    /// Load in flight
    Loading,
    /// Still frame ready
    Loaded,
    /// Load failed
    Failed(String),
}

/// How entries become eligible for loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityMode {
    /// The host reports visibility per entry
    Observed,
    /// No visibility signal; every entry is queued in catalog order
    Eager,
}

/// Preview load of one catalog entry
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    entry: CatalogEntry,
    state: JobState,
    queued: bool,
    still_frame: Option<f64>,
}

impl ThumbnailJob {
    /// The entry being previewed
    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    /// Current state
    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Position chosen for the still frame, once the duration was known
    pub fn still_frame(&self) -> Option<f64> {
        self.still_frame
    }
}

/// Instruction to the host to start a preview load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    /// Job the load belongs to
    pub handle: JobHandle,
    /// Scheduler generation the load was issued under
    pub generation: u64,
    /// Resource path of the entry
    pub path: String,
}

/// Terminal result of a preview load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A frame is displayed
    Loaded,
    /// The resource failed
    Failed(String),
}

/// Bounded, cancelable preview loader
#[derive(Debug)]
pub struct ThumbnailScheduler {
    jobs: Vec<ThumbnailJob>,
    queue: VecDeque<JobHandle>,
    in_flight: usize,
    limit: usize,
    generation: u64,
    active: bool,
    mode: VisibilityMode,
}

impl Default for ThumbnailScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY, VisibilityMode::Observed)
    }
}

impl ThumbnailScheduler {
    /// Create an active scheduler running at most `limit` loads at once
    pub fn new(limit: usize, mode: VisibilityMode) -> Self {
        Self {
            jobs: Vec::new(),
            queue: VecDeque::new(),
            in_flight: 0,
            limit: limit.max(1),
            generation: 0,
            active: true,
            mode,
        }
    }

    /// Create a pending job for an entry
    pub fn register(&mut self, entry: CatalogEntry) -> JobHandle {
        let handle = JobHandle(self.jobs.len());
        trace!("Registered thumbnail job {} for {}", handle.0, entry.path);
        self.jobs.push(ThumbnailJob {
            entry,
            state: JobState::Pending,
            queued: false,
            still_frame: None,
        });
        handle
    }

    /// Drop every job, e.g. before rendering a new catalog
    pub fn clear(&mut self) {
        self.generation += 1;
        self.jobs.clear();
        self.queue.clear();
        self.in_flight = 0;
    }

    /// An entry became visible. Queues it if it has not started yet.
    pub fn on_visible(&mut self, handle: JobHandle) -> Vec<LoadTicket> {
        if self.enqueue(handle) {
            self.pump()
        } else {
            Vec::new()
        }
    }

    /// Queue every pending job in catalog order
    pub fn enqueue_all(&mut self) -> Vec<LoadTicket> {
        for index in 0..self.jobs.len() {
            self.enqueue(JobHandle(index));
        }
        self.pump()
    }

    /// Seek target for the still frame of a running load.
    ///
    /// Returns `None` for stale tickets.
    pub fn on_duration_known(&mut self, ticket: &LoadTicket, duration: f64) -> Option<f64> {
        if !self.is_current(ticket) {
            return None;
        }
        let target = still_frame_target(duration);
        let job = self.jobs.get_mut(ticket.handle.0)?;
        job.still_frame = Some(target);
        Some(target)
    }

    /// A load finished. Stale tickets are discarded; otherwise the job takes
    /// its terminal state and the next queued jobs are started.
    pub fn finish(&mut self, ticket: &LoadTicket, outcome: LoadOutcome) -> Vec<LoadTicket> {
        if !self.is_current(ticket) {
            debug!(
                "Discarding thumbnail result for {} from generation {}",
                ticket.path, ticket.generation
            );
            return Vec::new();
        }

        let Some(job) = self.jobs.get_mut(ticket.handle.0) else {
            return Vec::new();
        };
        if job.state != JobState::Loading {
            return Vec::new();
        }

        job.state = match outcome {
            LoadOutcome::Loaded => JobState::Loaded,
            LoadOutcome::Failed(message) => {
                debug!("Thumbnail for {} failed: {}", job.entry.path, message);
                JobState::Failed(message)
            }
        };
        self.in_flight = self.in_flight.saturating_sub(1);
        self.pump()
    }

    /// Stop all work because the catalog is no longer shown.
    ///
    /// Pending and running loads are canceled, the queue is emptied and every
    /// job goes back to `Pending`. Returns the jobs whose resources the host
    /// must release.
    pub fn teardown(&mut self) -> Vec<JobHandle> {
        self.generation += 1;
        self.active = false;
        self.queue.clear();
        self.in_flight = 0;

        let mut released = Vec::new();
        for (index, job) in self.jobs.iter_mut().enumerate() {
            if job.state != JobState::Pending {
                released.push(JobHandle(index));
            }
            job.state = JobState::Pending;
            job.queued = false;
            job.still_frame = None;
        }
        debug!(
            "Thumbnail scheduler torn down, {} resources released",
            released.len()
        );
        released
    }

    /// The catalog is shown again. In eager mode every entry is queued again;
    /// in observed mode the host reports visibility anew.
    pub fn resume(&mut self) -> Vec<LoadTicket> {
        self.active = true;
        match self.mode {
            VisibilityMode::Eager => self.enqueue_all(),
            VisibilityMode::Observed => self.pump(),
        }
    }

    fn enqueue(&mut self, handle: JobHandle) -> bool {
        let Some(job) = self.jobs.get_mut(handle.0) else {
            return false;
        };
        if job.queued || job.state != JobState::Pending {
            return false;
        }
        job.queued = true;
        self.queue.push_back(handle);
        true
    }

    fn pump(&mut self) -> Vec<LoadTicket> {
        let mut started = Vec::new();
        while self.active && self.in_flight < self.limit {
            let Some(handle) = self.queue.pop_front() else {
                break;
            };
            let job = &mut self.jobs[handle.0];
            job.queued = false;
            job.state = JobState::Loading;
            self.in_flight += 1;
            started.push(LoadTicket {
                handle,
                generation: self.generation,
                path: job.entry.path.clone(),
            });
        }
        started
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Job by handle
    pub fn job(&self, handle: JobHandle) -> Option<&ThumbnailJob> {
        self.jobs.get(handle.0)
    }

    /// All jobs in registration order
    pub fn jobs(&self) -> &[ThumbnailJob] {
        &self.jobs
    }

    /// Loads currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Jobs waiting for a slot
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Concurrency limit
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Current generation token
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether loads may start
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Visibility mode
    pub fn mode(&self) -> VisibilityMode {
        self.mode
    }
}

/// Position of a representative still frame.
///
/// One second in, or half the clip when it is shorter, never closer than
/// 0.1 s to the end of the stream.
pub fn still_frame_target(duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    let target = if duration >= 1.0 { 1.0 } else { duration * 0.5 };
    target.min((duration - 0.1).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler_with(count: usize) -> (ThumbnailScheduler, Vec<JobHandle>) {
        let mut scheduler = ThumbnailScheduler::new(3, VisibilityMode::Observed);
        let handles = (0..count)
            .map(|i| {
                scheduler.register(CatalogEntry::new(
                    format!("{i}.mp4"),
                    format!("/videos/{i}.mp4"),
                ))
            })
            .collect();
        (scheduler, handles)
    }

    #[test]
    fn test_still_frame_target() {
        assert_eq!(still_frame_target(30.0), 1.0);
        assert!((still_frame_target(1.0) - 0.9).abs() < 1e-9);
        assert!((still_frame_target(0.6) - 0.3).abs() < 1e-9);
        assert!((still_frame_target(0.15) - 0.05).abs() < 1e-9);
        assert_eq!(still_frame_target(0.05), 0.0);
        assert_eq!(still_frame_target(f64::NAN), 0.0);
    }

    #[test]
    fn test_visible_job_starts_once() {
        let (mut scheduler, handles) = scheduler_with(1);
        let started = scheduler.on_visible(handles[0]);
        assert_eq!(started.len(), 1);
        assert!(scheduler.on_visible(handles[0]).is_empty());
        assert_eq!(scheduler.job(handles[0]).unwrap().state(), &JobState::Loading);
    }

    #[test]
    fn test_fifo_refill_after_finish() {
        let (mut scheduler, handles) = scheduler_with(5);
        let mut running = Vec::new();
        for handle in &handles {
            running.extend(scheduler.on_visible(*handle));
        }
        assert_eq!(running.len(), 3);
        assert_eq!(scheduler.queued(), 2);

        let next = scheduler.finish(&running[1], LoadOutcome::Failed("404".to_string()));
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].handle, handles[3]);
        assert_eq!(
            scheduler.job(handles[1]).unwrap().state(),
            &JobState::Failed("404".to_string())
        );
        assert_eq!(scheduler.in_flight(), 3);
    }

    #[test]
    fn test_inactive_scheduler_only_queues() {
        let (mut scheduler, handles) = scheduler_with(2);
        scheduler.teardown();
        assert!(scheduler.on_visible(handles[0]).is_empty());
        assert_eq!(scheduler.queued(), 1);

        let started = scheduler.resume();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].handle, handles[0]);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let (mut scheduler, handles) = scheduler_with(1);
        let ticket = scheduler.on_visible(handles[0]).remove(0);
        let released = scheduler.teardown();
        assert_eq!(released, vec![handles[0]]);

        assert!(scheduler.on_duration_known(&ticket, 10.0).is_none());
        assert!(scheduler.finish(&ticket, LoadOutcome::Loaded).is_empty());
        assert_eq!(scheduler.job(handles[0]).unwrap().state(), &JobState::Pending);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn test_duration_sets_still_frame() {
        let (mut scheduler, handles) = scheduler_with(1);
        let ticket = scheduler.on_visible(handles[0]).remove(0);
        assert_eq!(scheduler.on_duration_known(&ticket, 12.0), Some(1.0));
        assert_eq!(scheduler.job(handles[0]).unwrap().still_frame(), Some(1.0));
    }

    #[test]
    fn test_eager_mode_queues_in_catalog_order() {
        let mut scheduler = ThumbnailScheduler::new(2, VisibilityMode::Eager);
        for i in 0..4 {
            scheduler.register(CatalogEntry::new(format!("{i}"), format!("/v/{i}.mp4")));
        }
        let started = scheduler.enqueue_all();
        let paths: Vec<_> = started.iter().map(|t| t.path.as_str()).collect();
        assert_eq!(paths, vec!["/v/0.mp4", "/v/1.mp4"]);

        scheduler.teardown();
        let restarted = scheduler.resume();
        assert_eq!(restarted.len(), 2);
        assert_eq!(restarted[0].path, "/v/0.mp4");
    }

    #[test]
    fn test_zero_limit_is_raised_to_one() {
        let scheduler = ThumbnailScheduler::new(0, VisibilityMode::Observed);
        assert_eq!(scheduler.limit(), 1);
    }
}
