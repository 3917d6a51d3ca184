//! Per-chunk lifecycle: height request, LOD selection, mesh requests,
//! visibility and collider attachment.
//!
//! A chunk never blocks. Work goes to the `ComputeQueue` and results come
//! back through `on_height_ready` / `on_mesh_ready` when the streamer
//! drains the queue. Every method that changes observable state pushes a
//! `ChunkEvent`; the streamer publishes them once the tick is done.

use super::coord::ChunkCoord;
use super::events::{ChunkEvent, JobKind};
use super::lod::{select_lod_index, ChunkBounds};
use super::streamer::StreamState;
use crate::config::{MeshSource, TerrainSettings};
use crate::generation::NoiseField;
use crate::heightmap::{GenerationContext, HeightGrid, HeightMapBuilder, HeightRange};
use crate::mesh::{triangulate, ElevationSource, MeshBuffer};
use crate::thread_pool::{ComputeError, ComputeQueue};
use glam::Vec2;
use std::sync::Arc;

/// Shared services a chunk submits work to
#[derive(Clone)]
pub struct ChunkEnv {
    pub(crate) queue: Arc<ComputeQueue<StreamState>>,
    pub(crate) generation: Arc<GenerationContext>,
    /// Bumped when the chunk set is discarded; jobs carry the value they
    /// were submitted under
    pub(crate) session: u64,
}

impl ChunkEnv {
    pub fn new(queue: Arc<ComputeQueue<StreamState>>, generation: Arc<GenerationContext>) -> Self {
        Self {
            queue,
            generation,
            session: 0,
        }
    }
}

/// Height data lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkState {
    Unloaded,
    /// `attempt` counts earlier failed attempts
    HeightPending { attempt: u32 },
    HeightReady,
    HeightFailed { attempts: u32, error: ComputeError },
}

/// Mesh slot for one entry of the LOD table
#[derive(Debug, Clone)]
pub enum LodMesh {
    Empty,
    Pending { attempt: u32 },
    Ready(Arc<MeshBuffer>),
    Failed { attempts: u32, error: ComputeError },
}

impl LodMesh {
    pub fn is_ready(&self) -> bool {
        matches!(self, LodMesh::Ready(_))
    }

    pub fn mesh(&self) -> Option<&Arc<MeshBuffer>> {
        match self {
            LodMesh::Ready(mesh) => Some(mesh),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderState {
    Detached,
    /// Latched; never detaches while the chunk lives
    Attached { lod_index: usize },
}

enum MeshInput {
    Grid(Arc<HeightGrid>),
    Noise,
}

pub struct TerrainChunk {
    coord: ChunkCoord,
    settings: Arc<TerrainSettings>,
    bounds: ChunkBounds,
    state: ChunkState,
    height: Option<Arc<HeightGrid>>,
    lod_meshes: Vec<LodMesh>,
    mesh_requests: Vec<u32>,
    active_lod: Option<usize>,
    visible: bool,
    collider: ColliderState,
}

impl TerrainChunk {
    /// `settings` is the snapshot this chunk keeps for its whole life
    pub fn new(coord: ChunkCoord, settings: Arc<TerrainSettings>) -> Self {
        let world_size = settings.mesh.mesh_world_size();
        let lod_count = settings.lods.len();
        Self {
            coord,
            bounds: ChunkBounds::new(coord.world_centre(world_size), world_size),
            settings,
            state: ChunkState::Unloaded,
            height: None,
            lod_meshes: vec![LodMesh::Empty; lod_count],
            mesh_requests: vec![0; lod_count],
            active_lod: None,
            visible: false,
            collider: ColliderState::Detached,
        }
    }

    /// Start height generation. With `MeshSource::DirectNoise` there is no
    /// height job and the chunk goes straight to `HeightReady`.
    pub fn load(&mut self, viewer: Vec2, env: &ChunkEnv, events: &mut Vec<ChunkEvent>) {
        if self.state != ChunkState::Unloaded {
            return;
        }
        match self.settings.streaming.mesh_source {
            MeshSource::HeightGrid => self.request_height(0, env),
            MeshSource::DirectNoise => {
                self.state = ChunkState::HeightReady;
                self.update(viewer, env, events);
                self.update_collision_mesh(viewer, env, events);
            }
        }
    }

    fn request_height(&mut self, attempt: u32, env: &ChunkEnv) {
        self.state = ChunkState::HeightPending { attempt };
        let settings = Arc::clone(&self.settings);
        let generation = Arc::clone(&env.generation);
        let coord = self.coord;
        let session = env.session;

        env.queue.submit(
            format!("height-{}-{}", coord.x, coord.y),
            move || {
                let n = settings.mesh.vertices_per_line();
                Ok(HeightMapBuilder::new(&settings.height).build(
                    n,
                    n,
                    coord.sample_centre(n),
                    &generation,
                ))
            },
            move |state: &mut StreamState, result| {
                if state.is_current_session(session, coord) {
                    state.deliver_height(coord, result);
                }
            },
        );
    }

    pub fn on_height_ready(
        &mut self,
        result: Result<HeightGrid, ComputeError>,
        viewer: Vec2,
        env: &ChunkEnv,
        events: &mut Vec<ChunkEvent>,
    ) {
        let ChunkState::HeightPending { attempt } = self.state else {
            log::debug!("[TerrainChunk] {} ignoring stale height result", self.coord);
            return;
        };

        match result {
            Ok(grid) => {
                log::debug!(
                    "[TerrainChunk] {} height ready, range {:.2}..{:.2}",
                    self.coord,
                    grid.range().min,
                    grid.range().max
                );
                self.height = Some(Arc::new(grid));
                self.state = ChunkState::HeightReady;
                self.update(viewer, env, events);
                self.update_collision_mesh(viewer, env, events);
            }
            Err(error) => {
                let attempts = attempt + 1;
                let will_retry = attempts <= self.settings.streaming.max_compute_retries;
                if will_retry {
                    log::warn!("[TerrainChunk] {} height attempt {} failed, retrying: {}", self.coord, attempts, error);
                } else {
                    log::error!("[TerrainChunk] {} height failed after {} attempts: {}", self.coord, attempts, error);
                }
                events.push(ChunkEvent::ComputeFailed {
                    coord: self.coord,
                    job: JobKind::Height,
                    attempts,
                    will_retry,
                    error: error.clone(),
                });
                if will_retry {
                    self.request_height(attempts, env);
                } else {
                    self.state = ChunkState::HeightFailed { attempts, error };
                }
            }
        }
    }

    /// Re-evaluate LOD and visibility for a viewer position
    pub fn update(&mut self, viewer: Vec2, env: &ChunkEnv, events: &mut Vec<ChunkEvent>) {
        if self.state != ChunkState::HeightReady {
            return;
        }

        let distance = self.bounds.distance(viewer);
        let lod_index = select_lod_index(&self.settings.lods, distance);

        if let Some(lod_index) = lod_index {
            if self.active_lod != Some(lod_index) {
                if self.lod_meshes[lod_index].is_ready() {
                    self.active_lod = Some(lod_index);
                    events.push(ChunkEvent::MeshActivated {
                        coord: self.coord,
                        lod_index,
                    });
                } else {
                    self.request_mesh(lod_index, env);
                }
            }
        }

        let visible = lod_index.is_some();
        if visible != self.visible {
            self.visible = visible;
            events.push(ChunkEvent::VisibilityChanged {
                coord: self.coord,
                visible,
            });
        }
    }

    /// Request the collider LOD once the viewer is inside its visible
    /// distance, attach it once the viewer is close enough
    pub fn update_collision_mesh(&mut self, viewer: Vec2, env: &ChunkEnv, events: &mut Vec<ChunkEvent>) {
        if self.collider != ColliderState::Detached || self.state != ChunkState::HeightReady {
            return;
        }
        let lod_index = self.settings.collider_lod_index;
        let Some(info) = self.settings.lods.get(lod_index) else {
            return;
        };

        let sqr_distance = self.bounds.sqr_distance(viewer);
        if sqr_distance < info.sqr_visible_distance() {
            self.request_mesh(lod_index, env);
        }

        let attach_distance = self.settings.streaming.collider_generation_distance;
        if sqr_distance < attach_distance * attach_distance && self.lod_meshes[lod_index].is_ready() {
            self.collider = ColliderState::Attached { lod_index };
            log::debug!("[TerrainChunk] {} collider attached", self.coord);
            events.push(ChunkEvent::ColliderAttached {
                coord: self.coord,
                lod_index,
            });
        }
    }

    /// Submit a mesh job for `lod_index` unless one is cached, in flight or
    /// out of retries
    fn request_mesh(&mut self, lod_index: usize, env: &ChunkEnv) {
        let attempt = match &self.lod_meshes[lod_index] {
            LodMesh::Empty => 0,
            LodMesh::Failed { attempts, .. }
                if *attempts <= self.settings.streaming.max_compute_retries =>
            {
                *attempts
            }
            _ => return,
        };
        let input = match (self.settings.streaming.mesh_source, &self.height) {
            (MeshSource::HeightGrid, Some(grid)) => MeshInput::Grid(Arc::clone(grid)),
            (MeshSource::HeightGrid, None) => return,
            (MeshSource::DirectNoise, _) => MeshInput::Noise,
        };
        let Some(lod) = self.settings.lods.get(lod_index).map(|info| info.lod) else {
            return;
        };

        self.lod_meshes[lod_index] = LodMesh::Pending { attempt };
        self.mesh_requests[lod_index] += 1;
        let settings = Arc::clone(&self.settings);
        let coord = self.coord;
        let session = env.session;

        env.queue.submit(
            format!("mesh-{}-{}-lod{}", coord.x, coord.y, lod),
            move || {
                let mesh = match &input {
                    MeshInput::Grid(grid) => {
                        triangulate(lod, &settings.mesh, coord, ElevationSource::Grid(grid))?
                    }
                    MeshInput::Noise => {
                        let field = NoiseField::new(settings.height.seed, &settings.height.noise_layers);
                        let source = ElevationSource::Noise {
                            field: &field,
                            height_multiplier: settings.height.height_multiplier,
                        };
                        triangulate(lod, &settings.mesh, coord, source)?
                    }
                };
                Ok(mesh)
            },
            move |state: &mut StreamState, result| {
                if state.is_current_session(session, coord) {
                    state.deliver_mesh(coord, lod_index, result);
                }
            },
        );
    }

    pub fn on_mesh_ready(
        &mut self,
        lod_index: usize,
        result: Result<MeshBuffer, ComputeError>,
        viewer: Vec2,
        env: &ChunkEnv,
        events: &mut Vec<ChunkEvent>,
    ) {
        let Some(LodMesh::Pending { attempt }) = self.lod_meshes.get(lod_index).cloned() else {
            log::debug!(
                "[TerrainChunk] {} ignoring stale mesh result for LOD index {}",
                self.coord,
                lod_index
            );
            return;
        };

        match result {
            Ok(mesh) => {
                self.lod_meshes[lod_index] = LodMesh::Ready(Arc::new(mesh));
            }
            Err(error) => {
                let attempts = attempt + 1;
                let will_retry = attempts <= self.settings.streaming.max_compute_retries;
                if will_retry {
                    log::warn!(
                        "[TerrainChunk] {} mesh for LOD index {} attempt {} failed: {}",
                        self.coord,
                        lod_index,
                        attempts,
                        error
                    );
                } else {
                    log::error!(
                        "[TerrainChunk] {} mesh for LOD index {} failed after {} attempts: {}",
                        self.coord,
                        lod_index,
                        attempts,
                        error
                    );
                }
                events.push(ChunkEvent::ComputeFailed {
                    coord: self.coord,
                    job: JobKind::Mesh { lod_index },
                    attempts,
                    will_retry,
                    error: error.clone(),
                });
                self.lod_meshes[lod_index] = LodMesh::Failed { attempts, error };
            }
        }

        // A failed slot is resubmitted here while it is still wanted
        self.update(viewer, env, events);
        if lod_index == self.settings.collider_lod_index {
            self.update_collision_mesh(viewer, env, events);
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn settings(&self) -> &Arc<TerrainSettings> {
        &self.settings
    }

    pub fn bounds(&self) -> ChunkBounds {
        self.bounds
    }

    pub fn state(&self) -> &ChunkState {
        &self.state
    }

    pub fn lod_state(&self, lod_index: usize) -> Option<&LodMesh> {
        self.lod_meshes.get(lod_index)
    }

    /// Mesh jobs submitted so far for one LOD table entry
    pub fn mesh_requests(&self, lod_index: usize) -> u32 {
        self.mesh_requests.get(lod_index).copied().unwrap_or(0)
    }

    pub fn active_lod(&self) -> Option<usize> {
        self.active_lod
    }

    /// Mesh currently rendered, if any. May belong to a coarser or finer
    /// LOD than the desired one while the desired mesh is pending.
    pub fn active_mesh(&self) -> Option<&Arc<MeshBuffer>> {
        self.active_lod
            .and_then(|index| self.lod_meshes.get(index))
            .and_then(LodMesh::mesh)
    }

    pub fn collider(&self) -> ColliderState {
        self.collider
    }

    pub fn collider_mesh(&self) -> Option<&Arc<MeshBuffer>> {
        match self.collider {
            ColliderState::Attached { lod_index } => self.lod_meshes.get(lod_index).and_then(LodMesh::mesh),
            ColliderState::Detached => None,
        }
    }

    pub fn height_grid(&self) -> Option<&Arc<HeightGrid>> {
        self.height.as_ref()
    }

    /// Elevation range of the chunk for material shading
    pub fn height_range(&self) -> Option<HeightRange> {
        if let Some(grid) = &self.height {
            let range = grid.range();
            let multiplier = grid.height_multiplier();
            return Some([range.min * multiplier, range.max * multiplier].into_iter().collect());
        }
        self.active_mesh().map(|mesh| mesh.height_range())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
