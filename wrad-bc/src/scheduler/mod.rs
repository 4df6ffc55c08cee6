//! Radio scheduler: the single owner of "what is on air"
//!
//! Every mutation of playback state (timer wake-up, forced skip, reload
//! application, counter refresh) runs under one async mutex, and every
//! broadcast is issued while that mutex is held, so listeners observe
//! transitions in the order they happened. Catalog I/O is always performed
//! before the lock is taken.

mod counters;
mod state;
mod timer;

pub use counters::CounterRefresh;
pub use state::{CurrentTrack, PlaybackState};
pub use timer::WakeTimer;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use wrad_common::{NowPlaying, RadioEvent, Track};

use crate::catalog::PlaylistSource;
use crate::config::RadioSettings;
use crate::hub::{BroadcastHub, SubscriberId, Subscription};
use crate::playlist::{self, PlaylistCache, PlaylistSnapshot, ReloadDecision};
use crate::rotation;

/// Result of one `reload()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Rotation restarted from index 0 with this track
    Restarted { track_id: String },
    /// Same track set: snapshot swapped, playback untouched
    Refreshed,
    /// Source failed or returned nothing playable; nothing changed
    Skipped,
}

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Playing,
}

/// Operator view of the scheduler
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub phase: Phase,
    pub playlist: String,
    pub track_count: usize,
    pub played_in_cycle: usize,
    pub subscribers: usize,
    /// Seconds until the pending wake-up fires (None when idle)
    pub wakeup_in_secs: Option<f64>,
    pub last_reload_at: Option<DateTime<Utc>>,
}

struct EngineState {
    snapshot: Arc<PlaylistSnapshot>,
    playback: PlaybackState,
    wakeup: WakeTimer,
    last_reload: Option<DateTime<Utc>>,
}

/// The radio engine
pub struct RadioScheduler {
    me: Weak<RadioScheduler>,
    cache: PlaylistCache,
    hub: BroadcastHub,
    settings: RadioSettings,
    state: Mutex<EngineState>,
    /// Serializes whole reloads (fetch + apply)
    reload_lock: Mutex<()>,
    /// Set by `SchedulerTasks::shutdown`; no reload, advance or wake-up after it
    stopped: AtomicBool,
}

impl RadioScheduler {
    /// Create an idle scheduler
    ///
    /// Nothing plays until the first successful `reload()` (done by `start()`).
    /// Out-of-range periods are clamped rather than rejected; `Config::validate`
    /// is where startup refuses bad values.
    pub fn new(source: Arc<dyn PlaylistSource>, settings: RadioSettings) -> Arc<Self> {
        if let Err(e) = settings.validate() {
            warn!("Radio settings out of range, clamping where needed: {}", e);
        }
        let cache = PlaylistCache::new(
            source,
            settings.playlist_name.clone(),
            settings.fallback_duration_secs,
        );
        let hub = BroadcastHub::new(settings.subscriber_buffer);

        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            cache,
            hub,
            settings,
            state: Mutex::new(EngineState {
                snapshot: Arc::new(PlaylistSnapshot::empty()),
                playback: PlaybackState::default(),
                wakeup: WakeTimer::new(),
                last_reload: None,
            }),
            reload_lock: Mutex::new(()),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn settings(&self) -> &RadioSettings {
        &self.settings
    }

    /// True once the background tasks have been shut down
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Spawn the reload and heartbeat loops
    ///
    /// The first reload runs immediately. Must be called from within a tokio
    /// runtime.
    pub fn start(self: &Arc<Self>) -> SchedulerTasks {
        info!(
            "Starting radio scheduler: playlist '{}', reload every {}s, heartbeat every {}s",
            self.settings.playlist_name,
            self.settings.reload_interval_secs,
            self.settings.heartbeat_interval_secs
        );

        let reloader = {
            let scheduler = Arc::clone(self);
            let period = self.settings.reload_interval();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    scheduler.reload().await;
                }
            })
        };

        let heartbeat = {
            let scheduler = Arc::clone(self);
            let period = self.settings.heartbeat_interval();
            tokio::spawn(async move {
                let first_tick = tokio::time::Instant::now() + period;
                let mut ticker = tokio::time::interval_at(first_tick, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    scheduler.heartbeat().await;
                }
            })
        };

        SchedulerTasks {
            scheduler: Arc::clone(self),
            handles: vec![reloader, heartbeat],
        }
    }

    /// Pull the active playlist and apply it
    ///
    /// A failing or empty source leaves snapshot and playback untouched.
    pub async fn reload(&self) -> ReloadOutcome {
        if self.is_stopped() {
            return ReloadOutcome::Skipped;
        }
        let _reloading = self.reload_lock.lock().await;

        let next = match self.cache.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Playlist reload skipped, keeping previous snapshot: {}", e);
                return ReloadOutcome::Skipped;
            }
        };

        let mut state = self.state.lock().await;
        // Shutdown may have landed while the fetch was in flight
        if self.is_stopped() {
            debug!("Scheduler stopped, discarding reloaded playlist");
            return ReloadOutcome::Skipped;
        }
        state.last_reload = Some(wrad_common::time::now());

        match playlist::classify(&state.snapshot, &next, state.playback.is_playing()) {
            ReloadDecision::Restart => {
                state.wakeup.cancel();
                state.snapshot = Arc::new(next);
                state.playback.clear_played();

                let Some(first) = state.snapshot.get(0).cloned() else {
                    // load() never yields an empty snapshot
                    return ReloadOutcome::Skipped;
                };
                let track_id = first.id.clone();
                info!(
                    "Playlist '{}' loaded ({} tracks), rotation restarts with '{}'",
                    self.cache.playlist_name(),
                    state.snapshot.len(),
                    first.title
                );
                self.transition(&mut state, first);
                ReloadOutcome::Restarted { track_id }
            }
            ReloadDecision::Refresh => {
                state.snapshot = Arc::new(next);
                let EngineState {
                    snapshot, playback, ..
                } = &mut *state;
                playback.purge_missing(snapshot);
                let mut rearm = false;
                if let Some(current) = playback.current.as_mut() {
                    if let Some(fresh) = snapshot.find(&current.track.id) {
                        rearm = fresh.duration_secs != current.track.duration_secs;
                        current.track = fresh.clone();
                    }
                }
                if rearm {
                    // Same track, new length: only the wake-up moves
                    self.arm(&mut state);
                }
                debug!(
                    "Playlist '{}' unchanged, snapshot refreshed",
                    self.cache.playlist_name()
                );
                ReloadOutcome::Refreshed
            }
        }
    }

    /// Administrative skip
    ///
    /// Same effect as the wake-up firing now. Returns the new current track,
    /// or None when there is nothing to play.
    pub async fn force_advance(&self) -> Option<NowPlaying> {
        let mut state = self.state.lock().await;
        let started = self.advance(&mut state)?;
        info!("Forced skip to '{}'", started.title);
        state.playback.current.as_ref().map(CurrentTrack::now_playing)
    }

    /// What is playing and how far in, if anything
    pub async fn current_state_snapshot(&self) -> Option<NowPlaying> {
        let state = self.state.lock().await;
        state.playback.current.as_ref().map(CurrentTrack::now_playing)
    }

    /// The track rotation would pick next, without advancing
    pub async fn upcoming_track(&self) -> Option<Track> {
        let state = self.state.lock().await;
        Self::peek_next(&state)
    }

    /// Register a live listener
    ///
    /// The subscription starts with a `connected` frame, followed by a
    /// `snapshot` of the current track when one is playing.
    pub async fn subscribe(&self) -> Subscription {
        let state = self.state.lock().await;
        let catch_up = state.playback.current.as_ref().map(|current| {
            let now_playing = current.now_playing();
            RadioEvent::Snapshot {
                track: now_playing.track,
                elapsed: now_playing.elapsed,
                started_at: now_playing.started_at,
                up_next: Self::peek_next(&state),
            }
        });
        self.hub.subscribe(catch_up)
    }

    /// Remove a listener; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Push a drift-correction heartbeat (no-op when idle)
    pub async fn heartbeat(&self) {
        let state = self.state.lock().await;
        if let Some(current) = state.playback.current.as_ref() {
            self.hub.broadcast(RadioEvent::Heartbeat {
                track_id: current.track.id.clone(),
                elapsed: wrad_common::time::round_secs(current.elapsed_secs()),
            });
        }
    }

    pub async fn phase(&self) -> Phase {
        if self.state.lock().await.playback.is_playing() {
            Phase::Playing
        } else {
            Phase::Idle
        }
    }

    pub async fn status(&self) -> SchedulerStatus {
        let state = self.state.lock().await;
        SchedulerStatus {
            phase: if state.playback.is_playing() {
                Phase::Playing
            } else {
                Phase::Idle
            },
            playlist: self.cache.playlist_name().to_string(),
            track_count: state.snapshot.len(),
            played_in_cycle: state.playback.played_in_cycle(&state.snapshot),
            subscribers: self.hub.subscriber_count(),
            wakeup_in_secs: state
                .wakeup
                .remaining()
                .map(|d| wrad_common::time::round_secs(d.as_secs_f64())),
            last_reload_at: state.last_reload,
        }
    }

    /// Wake-up entry point, called from the timer task
    async fn on_wake(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if !state.wakeup.take_fired(generation) {
            debug!("Ignoring superseded wake-up #{}", generation);
            return;
        }
        if let Some(started) = self.advance(&mut state) {
            info!("Now playing '{}' by {}", started.title, started.artist);
        }
    }

    /// Move to the next track (or to idle), re-arm and broadcast
    fn advance(&self, state: &mut EngineState) -> Option<Track> {
        state.wakeup.cancel();
        if self.is_stopped() {
            return None;
        }

        let current_index = state
            .playback
            .current_id()
            .and_then(|id| state.snapshot.position_of(id));

        let Some(decision) =
            rotation::next_index(&state.snapshot, &state.playback.played, current_index)
        else {
            if state.playback.is_playing() {
                info!("No tracks to play, radio is idle");
            }
            state.playback.go_idle();
            return None;
        };

        if decision.starts_new_cycle() {
            debug!("Rotation cycle complete, starting a new one");
            state.playback.clear_played();
        }

        let next = state.snapshot.get(decision.index()).cloned()?;
        self.transition(state, next.clone());

        if rotation::cycle_nearly_complete(&state.snapshot, &state.playback.played) {
            self.spawn_reload();
        }
        Some(next)
    }

    /// Put `track` on air, arm its wake-up and announce it
    fn transition(&self, state: &mut EngineState, track: Track) {
        let previous_track = state.playback.start(track);
        self.arm(state);

        let Some(current) = state.playback.current.as_ref() else {
            return;
        };
        let event = RadioEvent::TrackChange {
            track: current.track.clone(),
            previous_track,
            elapsed: 0.0,
            started_at: current.started_at,
            up_next: Self::peek_next(state),
        };
        self.hub.broadcast(event);
    }

    /// (Re)arm the wake-up for the current track's remaining time
    fn arm(&self, state: &mut EngineState) {
        if self.is_stopped() {
            state.wakeup.cancel();
            return;
        }
        let Some(current) = state.playback.current.as_ref() else {
            state.wakeup.cancel();
            return;
        };

        let delay_secs = current.remaining_secs() + self.settings.wake_grace_secs;
        let delay = wrad_common::time::secs_to_duration(delay_secs);
        let me = self.me.clone();
        let generation = state.wakeup.arm(delay, move |generation| async move {
            if let Some(scheduler) = me.upgrade() {
                scheduler.on_wake(generation).await;
            }
        });
        debug!(
            "Wake-up #{} armed in {:.3}s for '{}'",
            generation,
            delay.as_secs_f64(),
            current.track.id
        );
    }

    /// Out-of-band reload, so the next cycle starts from fresh data
    fn spawn_reload(&self) {
        if self.is_stopped() {
            return;
        }
        let Some(scheduler) = self.me.upgrade() else {
            return;
        };
        debug!("Cycle nearly complete, refreshing playlist early");
        tokio::spawn(async move {
            scheduler.reload().await;
        });
    }

    fn peek_next(state: &EngineState) -> Option<Track> {
        let current_index = state
            .playback
            .current_id()
            .and_then(|id| state.snapshot.position_of(id));
        rotation::next_index(&state.snapshot, &state.playback.played, current_index)
            .and_then(|decision| state.snapshot.get(decision.index()).cloned())
    }
}

/// Handles of the background loops spawned by `start()`
pub struct SchedulerTasks {
    scheduler: Arc<RadioScheduler>,
    handles: Vec<JoinHandle<()>>,
}

impl SchedulerTasks {
    /// Stop both loops and cancel the pending wake-up
    ///
    /// An early reload still in flight finds the scheduler stopped and
    /// discards its result.
    pub async fn shutdown(self) {
        self.scheduler.stopped.store(true, Ordering::SeqCst);
        for handle in &self.handles {
            handle.abort();
        }
        self.scheduler.state.lock().await.wakeup.cancel();
        info!("Radio scheduler stopped");
    }
}
