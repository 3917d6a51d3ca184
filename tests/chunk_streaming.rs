use glam::Vec2;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use terrain_engine::generation::NoiseLayerConfig;
use terrain_engine::streaming::{ChunkState, LodMesh};
use terrain_engine::{
    ChunkCoord, ChunkEvent, ChunkStreamer, LodInfo, MeshSource, SettingsStore, SpawnStrategy,
    TerrainSettings,
};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(60);

fn test_settings(mesh_source: MeshSource) -> TerrainSettings {
    let mut settings = TerrainSettings::default();
    settings.height.noise_layers = vec![NoiseLayerConfig::simple(2, 0.02)];
    settings.mesh.chunk_size_index = 0;
    settings.lods = vec![
        LodInfo::new(0, 30.0),
        LodInfo::new(1, 60.0),
        LodInfo::new(4, 90.0),
    ];
    settings.streaming.mesh_source = mesh_source;
    settings
}

fn pooled_streamer(settings: TerrainSettings) -> (Arc<SettingsStore>, ChunkStreamer) {
    let store = Arc::new(SettingsStore::new(settings).unwrap());
    let streamer =
        ChunkStreamer::new(Arc::clone(&store), SpawnStrategy::Pooled { threads: 4 }).unwrap();
    (store, streamer)
}

fn assert_visibility_matches_distance(streamer: &ChunkStreamer, viewer: Vec2) {
    let max_view = streamer.settings().unwrap().max_view_distance();
    let visible: HashSet<ChunkCoord> = streamer.visible_chunks().iter().copied().collect();
    assert_eq!(visible.len(), streamer.visible_chunks().len(), "visible set has duplicates");

    for chunk in streamer.chunks() {
        if chunk.state() != &ChunkState::HeightReady {
            continue;
        }
        let expected = chunk.bounds().distance(viewer) <= max_view;
        assert_eq!(chunk.is_visible(), expected, "chunk {}", chunk.coord());
        assert_eq!(visible.contains(&chunk.coord()), expected, "chunk {}", chunk.coord());
    }
}

#[test]
fn test_walk_creates_each_chunk_once_and_meshes_at_most_once() {
    let (_store, mut streamer) = pooled_streamer(test_settings(MeshSource::HeightGrid));
    let mut viewer = Vec2::ZERO;
    for _ in 0..40 {
        streamer.tick(viewer);
        viewer += Vec2::new(9.0, 4.0);
    }
    assert!(streamer.flush(FLUSH_TIMEOUT));

    let coords: HashSet<ChunkCoord> = streamer.chunks().map(|chunk| chunk.coord()).collect();
    assert_eq!(coords.len(), streamer.chunk_count());
    assert_eq!(streamer.stats().chunks_created as usize, streamer.chunk_count());

    for chunk in streamer.chunks() {
        for lod_index in 0..3 {
            assert!(chunk.mesh_requests(lod_index) <= 1, "chunk {} lod {}", chunk.coord(), lod_index);
            if chunk.mesh_requests(lod_index) == 1 {
                assert!(matches!(chunk.lod_state(lod_index), Some(LodMesh::Ready(_))));
            }
        }
    }
    let queue = streamer.queue_stats();
    assert_eq!(queue.tasks_failed, 0);
    assert_eq!(queue.in_flight, 0);
}

#[test]
fn test_static_viewer_visibility_matches_distance() {
    for source in [MeshSource::HeightGrid, MeshSource::DirectNoise] {
        let (_store, mut streamer) = pooled_streamer(test_settings(source));
        let viewer = Vec2::new(130.0, -75.0);
        streamer.tick(viewer);
        assert!(streamer.flush(FLUSH_TIMEOUT));
        streamer.tick(viewer);

        assert_visibility_matches_distance(&streamer, viewer);
        for coord in streamer.visible_chunks() {
            let chunk = streamer.chunk(*coord).unwrap();
            assert!(chunk.active_mesh().is_some(), "visible chunk {} has no mesh", coord);
        }
    }
}

#[test]
fn test_colliders_attach_only_near_the_viewer() {
    let (_store, mut streamer) = pooled_streamer(test_settings(MeshSource::HeightGrid));
    let attached = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&attached);
    streamer.subscribe(move |event: &ChunkEvent| {
        if let ChunkEvent::ColliderAttached { coord, .. } = event {
            sink.lock().push(*coord);
        }
    });

    // Inside chunk (1, 0), far from every other chunk edge
    let viewer = Vec2::new(50.0, 0.0);
    streamer.tick(viewer);
    assert!(streamer.flush(FLUSH_TIMEOUT));
    streamer.tick(viewer + Vec2::new(0.5, 0.0));
    assert!(streamer.flush(FLUSH_TIMEOUT));

    assert_eq!(*attached.lock(), vec![ChunkCoord::new(1, 0)]);
    let chunk = streamer.chunk(ChunkCoord::new(1, 0)).unwrap();
    assert!(chunk.collider_mesh().is_some());
    assert!(streamer.chunk(ChunkCoord::new(0, 0)).unwrap().collider_mesh().is_none());
}

#[test]
fn test_cleared_settings_pause_streaming() {
    let (store, mut streamer) = pooled_streamer(test_settings(MeshSource::HeightGrid));
    streamer.tick(Vec2::ZERO);
    let count = streamer.chunk_count();
    assert!(count > 0);

    store.clear();
    let summary = streamer.tick(Vec2::new(500.0, 500.0));
    assert!(!summary.refreshed);
    assert_eq!(streamer.chunk_count(), count);
    assert_eq!(streamer.stats().skipped_ticks, 1);

    store.publish(test_settings(MeshSource::HeightGrid)).unwrap();
    let summary = streamer.tick(Vec2::new(500.0, 500.0));
    assert!(summary.refreshed);
    assert!(streamer.chunk_count() > count);
    assert!(streamer.flush(FLUSH_TIMEOUT));
}

#[test]
fn test_settings_bump_drops_cached_falloff_maps() {
    let mut settings = test_settings(MeshSource::HeightGrid);
    settings.height.use_falloff = true;
    let (store, mut streamer) = pooled_streamer(settings.clone());

    streamer.tick(Vec2::ZERO);
    assert!(streamer.flush(FLUSH_TIMEOUT));
    assert_eq!(streamer.generation().falloff_cache().len(), 1);

    settings.height.height_multiplier = 45.0;
    store.publish(settings).unwrap();
    streamer.tick(Vec2::ZERO);
    assert_eq!(streamer.settings_version(), 2);
    assert!(streamer.generation().falloff_cache().is_empty());
}
