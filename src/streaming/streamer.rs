//! Viewer-driven chunk streaming
//!
//! `ChunkStreamer::tick` is the per-frame entry point. It applies settings
//! changes, delivers finished background work, updates colliders when the
//! viewer moved, and rescans the chunk neighbourhood once the viewer has
//! travelled past the move threshold. Events produced during the tick are
//! published to listeners at the end of it.
//!
//! A settings change that alters the chunk layout (chunk size, mesh scale,
//! flat shading or the LOD table) discards every chunk and starts a new
//! session, since chunks of different sizes cannot tile. Other changes only
//! apply to chunks created afterwards.

use super::chunk::{ChunkEnv, TerrainChunk};
use super::coord::ChunkCoord;
use super::error::StreamingErrorContext;
use super::events::ChunkEvent;
use super::lod::LodInfo;
use crate::config::{SettingsChanged, SettingsStore, TerrainSettings};
use crate::error::TerrainResult;
use crate::event_system::{EventHandler, SubscriptionId, Subscribers};
use crate::heightmap::{GenerationContext, HeightGrid};
use crate::mesh::MeshBuffer;
use crate::thread_pool::{ComputeError, ComputeQueue, ComputeQueueStats, SpawnStrategy};
use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// State that background continuations run against. Owned by the streamer
/// and only touched on the thread that ticks it.
pub struct StreamState {
    pub(crate) chunks: FxHashMap<ChunkCoord, TerrainChunk>,
    pub(crate) viewer: Vec2,
    pub(crate) events: Vec<ChunkEvent>,
    pub(crate) env: ChunkEnv,
}

impl StreamState {
    pub(crate) fn new(env: ChunkEnv) -> Self {
        Self {
            chunks: FxHashMap::default(),
            viewer: Vec2::ZERO,
            events: Vec::new(),
            env,
        }
    }

    pub(crate) fn create_chunk(&mut self, coord: ChunkCoord, settings: Arc<TerrainSettings>) {
        let mut chunk = TerrainChunk::new(coord, settings);
        chunk.load(self.viewer, &self.env, &mut self.events);
        self.chunks.insert(coord, chunk);
    }

    pub(crate) fn update_chunk(&mut self, coord: ChunkCoord) {
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.update(self.viewer, &self.env, &mut self.events);
        }
    }

    pub(crate) fn update_collision(&mut self, coord: ChunkCoord) {
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.update_collision_mesh(self.viewer, &self.env, &mut self.events);
        }
    }

    /// False for results of jobs submitted before the last session reset
    pub(crate) fn is_current_session(&self, session: u64, coord: ChunkCoord) -> bool {
        if session == self.env.session {
            return true;
        }
        log::debug!(
            "[ChunkStreamer] Ignoring result for {} from session {} (now {})",
            coord,
            session,
            self.env.session
        );
        false
    }

    pub(crate) fn deliver_height(&mut self, coord: ChunkCoord, result: Result<HeightGrid, ComputeError>) {
        match self.chunks.get_mut(&coord).streaming_context(&coord.to_string()) {
            Ok(chunk) => chunk.on_height_ready(result, self.viewer, &self.env, &mut self.events),
            Err(e) => log::error!("[ChunkStreamer] Dropping height result: {}", e),
        }
    }

    pub(crate) fn deliver_mesh(
        &mut self,
        coord: ChunkCoord,
        lod_index: usize,
        result: Result<MeshBuffer, ComputeError>,
    ) {
        match self.chunks.get_mut(&coord).streaming_context(&coord.to_string()) {
            Ok(chunk) => chunk.on_mesh_ready(lod_index, result, self.viewer, &self.env, &mut self.events),
            Err(e) => log::error!("[ChunkStreamer] Dropping mesh result: {}", e),
        }
    }
}

/// Counters kept across ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamerStats {
    pub ticks: u64,
    /// Ticks skipped because no settings were published
    pub skipped_ticks: u64,
    pub full_refreshes: u64,
    pub chunks_created: u64,
    pub results_delivered: u64,
    pub events_published: u64,
    /// Chunk sets discarded because the chunk layout changed
    pub session_resets: u64,
}

/// Settings that decide where chunk borders fall
#[derive(Debug, Clone, PartialEq)]
struct ChunkLayout {
    vertices_per_line: usize,
    world_size: f32,
    lods: Vec<LodInfo>,
}

impl ChunkLayout {
    fn of(settings: &TerrainSettings) -> Self {
        Self {
            vertices_per_line: settings.mesh.vertices_per_line(),
            world_size: settings.mesh.mesh_world_size(),
            lods: settings.lods.clone(),
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub delivered: usize,
    pub refreshed: bool,
    pub chunks_created: usize,
    pub events: usize,
}

pub struct ChunkStreamer {
    store: Arc<SettingsStore>,
    settings_subscription: SubscriptionId,
    settings_dirty: Arc<AtomicBool>,
    settings: Option<Arc<TerrainSettings>>,
    settings_version: u64,
    /// Layout of the chunks in `state`
    layout: Option<ChunkLayout>,
    generation: Arc<GenerationContext>,
    queue: Arc<ComputeQueue<StreamState>>,
    state: StreamState,
    visible: Vec<ChunkCoord>,
    last_viewer: Option<Vec2>,
    last_refresh_viewer: Option<Vec2>,
    listeners: Subscribers<ChunkEvent>,
    stats: StreamerStats,
    missing_settings_logged: bool,
}

impl ChunkStreamer {
    pub fn new(store: Arc<SettingsStore>, strategy: SpawnStrategy) -> TerrainResult<Self> {
        let queue = Arc::new(ComputeQueue::new(strategy)?);
        let generation = Arc::new(GenerationContext::new());

        let settings_dirty = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&settings_dirty);
        let settings_subscription = store.subscribe(move |_: &SettingsChanged| {
            flag.store(true, Ordering::Release);
        });

        log::info!("[ChunkStreamer] Created with {:?} job spawning", strategy);
        Ok(Self {
            store,
            settings_subscription,
            settings_dirty,
            settings: None,
            settings_version: 0,
            layout: None,
            state: StreamState::new(ChunkEnv::new(Arc::clone(&queue), Arc::clone(&generation))),
            generation,
            queue,
            visible: Vec::new(),
            last_viewer: None,
            last_refresh_viewer: None,
            listeners: Subscribers::new(),
            stats: StreamerStats::default(),
            missing_settings_logged: false,
        })
    }

    /// Use the spawn strategy named by the store's current settings
    pub fn from_store(store: Arc<SettingsStore>) -> TerrainResult<Self> {
        let strategy = store
            .current()
            .map(|settings| settings.streaming.spawn_strategy)
            .unwrap_or_default();
        Self::new(store, strategy)
    }

    pub fn tick(&mut self, viewer: Vec2) -> TickSummary {
        self.stats.ticks += 1;
        self.refresh_settings();

        let Some(settings) = self.settings.clone() else {
            if !self.missing_settings_logged {
                log::warn!("[ChunkStreamer] No terrain settings published, streaming is paused");
                self.missing_settings_logged = true;
            }
            self.stats.skipped_ticks += 1;
            return TickSummary::default();
        };

        let mut summary = TickSummary::default();
        self.state.viewer = viewer;
        summary.delivered = self.queue.drain(&mut self.state);
        self.stats.results_delivered += summary.delivered as u64;

        if self.last_viewer != Some(viewer) {
            for &coord in &self.visible {
                self.state.update_collision(coord);
            }
            self.last_viewer = Some(viewer);
        }

        let threshold = settings.streaming.viewer_move_threshold;
        let needs_refresh = self
            .last_refresh_viewer
            .map_or(true, |last| (last - viewer).length_squared() > threshold * threshold);
        if needs_refresh {
            self.last_refresh_viewer = Some(viewer);
            summary.chunks_created = self.full_refresh(&settings, viewer);
            summary.refreshed = true;
        }

        summary.events = self.dispatch_events();
        summary
    }

    fn refresh_settings(&mut self) {
        if !self.settings_dirty.swap(false, Ordering::AcqRel) {
            return;
        }
        let (settings, version) = self.store.snapshot();
        if version == self.settings_version && settings.is_some() == self.settings.is_some() {
            return;
        }

        self.generation.on_settings_changed(version);
        if let Some(settings) = &settings {
            self.missing_settings_logged = false;
            log::info!("[ChunkStreamer] Using terrain settings v{}", version);

            let layout = ChunkLayout::of(settings);
            if self.layout.as_ref().is_some_and(|current| *current != layout) {
                self.reset_session();
            }
            self.layout = Some(layout);
        }
        self.settings = settings;
        self.settings_version = version;
        // Rescan with the new snapshot on the next tick that has settings
        self.last_refresh_viewer = None;
    }

    /// Hide and drop every chunk. Jobs still in flight finish, but their
    /// results are ignored.
    fn reset_session(&mut self) {
        for coord in std::mem::take(&mut self.visible) {
            self.state
                .events
                .push(ChunkEvent::VisibilityChanged { coord, visible: false });
        }
        let dropped = self.state.chunks.len();
        self.state.chunks.clear();
        self.state.env.session += 1;
        self.stats.session_resets += 1;
        log::info!(
            "[ChunkStreamer] Chunk layout changed, dropped {} chunks and started session {}",
            dropped,
            self.state.env.session
        );
    }

    /// Update the visible chunks, then every chunk in the view radius,
    /// creating the ones that do not exist yet
    fn full_refresh(&mut self, settings: &Arc<TerrainSettings>, viewer: Vec2) -> usize {
        self.stats.full_refreshes += 1;
        let world_size = settings.mesh.mesh_world_size();

        let mut updated = FxHashSet::default();
        for &coord in self.visible.iter().rev() {
            updated.insert(coord);
            self.state.update_chunk(coord);
        }

        let radius = (settings.max_view_distance() / world_size).ceil() as i32;
        let centre = ChunkCoord::from_world(viewer, world_size);
        let mut created = 0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                // Offsets saturate at the grid edge, so coords can repeat
                let coord = centre.offset(dx, dy);
                if !updated.insert(coord) {
                    continue;
                }
                if self.state.chunks.contains_key(&coord) {
                    self.state.update_chunk(coord);
                } else {
                    self.state.create_chunk(coord, Arc::clone(settings));
                    created += 1;
                }
            }
        }

        self.stats.chunks_created += created as u64;
        log::debug!(
            "[ChunkStreamer] Refresh around {}: radius {}, {} new chunks, {} total",
            centre,
            radius,
            created,
            self.state.chunks.len()
        );
        created
    }

    /// Apply visibility changes to the visible set and publish every
    /// pending event
    fn dispatch_events(&mut self) -> usize {
        let events = std::mem::take(&mut self.state.events);
        for event in &events {
            if let ChunkEvent::VisibilityChanged { coord, visible } = event {
                if *visible {
                    if !self.visible.contains(coord) {
                        self.visible.push(*coord);
                    }
                } else {
                    self.visible.retain(|c| c != coord);
                }
            }
            self.listeners.publish(event);
        }
        self.stats.events_published += events.len() as u64;
        events.len()
    }

    /// Block until every in-flight job is delivered or the timeout passes.
    /// For tools and tests; a frame loop should only ever `tick`.
    pub fn flush(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let delivered = self.queue.drain(&mut self.state);
            self.stats.results_delivered += delivered as u64;
            self.dispatch_events();
            if self.queue.in_flight() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(crate::constants::compute::IDLE_POLL_INTERVAL_MS));
        }
    }

    pub fn subscribe<H>(&self, handler: H) -> SubscriptionId
    where
        H: EventHandler<ChunkEvent> + 'static,
    {
        self.listeners.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.state.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.state.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.state.chunks.len()
    }

    /// Chunks currently visible, in the order they became visible
    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        &self.visible
    }

    pub fn settings(&self) -> Option<&Arc<TerrainSettings>> {
        self.settings.as_ref()
    }

    pub fn settings_version(&self) -> u64 {
        self.settings_version
    }

    pub fn generation(&self) -> &GenerationContext {
        &self.generation
    }

    pub fn stats(&self) -> StreamerStats {
        self.stats
    }

    pub fn queue_stats(&self) -> ComputeQueueStats {
        self.queue.stats()
    }
}

impl Drop for ChunkStreamer {
    fn drop(&mut self) {
        self.store.unsubscribe(self.settings_subscription);
        log::debug!(
            "[ChunkStreamer] Dropped with {} chunks, {} jobs still in flight",
            self.state.chunks.len(),
            self.queue.in_flight()
        );
    }
}
