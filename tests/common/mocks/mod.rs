//! Mock implementations for external dependencies
//! The audio node is mocked with mockall; `recording_node` wires every call
//! into a `Probe` so tests can assert on the side effects afterwards.

use async_trait::async_trait;
use lavabot::commands::music::audio_sources::{
    AudioNode, PlayerHandle, SearchResult, SearchSource, Track,
};
use lavabot::commands::music::utils::filters::FilterPreset;
use lavabot::commands::music::utils::music_manager::{MusicError, MusicResult};
use mockall::mock;
use serenity::all::{ChannelId, GuildId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mock! {
    pub Node {}

    #[async_trait]
    impl AudioNode for Node {
        async fn search(
            &self,
            guild_id: GuildId,
            query: &str,
            source: SearchSource,
        ) -> MusicResult<SearchResult>;
        async fn connect(&self, guild_id: GuildId, voice_channel: ChannelId) -> MusicResult<PlayerHandle>;
        async fn play(&self, player: &PlayerHandle, track: &Track) -> MusicResult<()>;
        async fn stop(&self, player: &PlayerHandle) -> MusicResult<()>;
        async fn set_paused(&self, player: &PlayerHandle, paused: bool) -> MusicResult<()>;
        async fn seek(&self, player: &PlayerHandle, position: Duration) -> MusicResult<()>;
        async fn set_volume(&self, player: &PlayerHandle, volume: u16) -> MusicResult<()>;
        async fn set_filters(&self, player: &PlayerHandle, preset: FilterPreset) -> MusicResult<()>;
        async fn position(&self, player: &PlayerHandle) -> MusicResult<Duration>;
        async fn disconnect(&self, player: &PlayerHandle) -> MusicResult<()>;
    }
}

/// Position every recording node reports for the current track
pub const REPORTED_POSITION: Duration = Duration::from_secs(42);

/// Everything a recording node was asked to do, in call order.
#[derive(Clone, Default)]
pub struct Probe {
    pub connects: Arc<AtomicUsize>,
    pub searches: Arc<Mutex<Vec<(String, SearchSource)>>>,
    pub played: Arc<Mutex<Vec<Track>>>,
    pub stops: Arc<AtomicUsize>,
    pub paused: Arc<Mutex<Vec<bool>>>,
    pub seeks: Arc<Mutex<Vec<Duration>>>,
    pub volumes: Arc<Mutex<Vec<u16>>>,
    pub filters: Arc<Mutex<Vec<FilterPreset>>>,
    pub disconnects: Arc<AtomicUsize>,
}

impl Probe {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn searched(&self) -> Vec<String> {
        self.searches
            .lock()
            .unwrap()
            .iter()
            .map(|(query, _)| query.clone())
            .collect()
    }

    pub fn played_titles(&self) -> Vec<String> {
        self.played
            .lock()
            .unwrap()
            .iter()
            .map(|track| track.title.clone())
            .collect()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn paused(&self) -> Vec<bool> {
        self.paused.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn volumes(&self) -> Vec<u16> {
        self.volumes.lock().unwrap().clone()
    }

    pub fn filters(&self) -> Vec<FilterPreset> {
        self.filters.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

/// A node that accepts every call and resolves searches from `catalog`.
///
/// Queries missing from the catalog resolve to `SearchResult::Empty`.
pub fn recording_node(catalog: Vec<(String, SearchResult)>) -> (MockNode, Probe) {
    let probe = Probe::default();
    let catalog: HashMap<String, SearchResult> = catalog.into_iter().collect();
    let mut node = MockNode::new();

    let searches = Arc::clone(&probe.searches);
    node.expect_search().returning(move |_, query, source| {
        searches.lock().unwrap().push((query.to_string(), source));
        Ok(catalog.get(query).cloned().unwrap_or(SearchResult::Empty))
    });

    let connects = Arc::clone(&probe.connects);
    node.expect_connect().returning(move |guild_id, voice_channel| {
        connects.fetch_add(1, Ordering::SeqCst);
        Ok(PlayerHandle {
            guild_id,
            voice_channel,
        })
    });

    let played = Arc::clone(&probe.played);
    node.expect_play().returning(move |_, track| {
        played.lock().unwrap().push(track.clone());
        Ok(())
    });

    let stops = Arc::clone(&probe.stops);
    node.expect_stop().returning(move |_| {
        stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let paused = Arc::clone(&probe.paused);
    node.expect_set_paused().returning(move |_, state| {
        paused.lock().unwrap().push(state);
        Ok(())
    });

    let seeks = Arc::clone(&probe.seeks);
    node.expect_seek().returning(move |_, position| {
        seeks.lock().unwrap().push(position);
        Ok(())
    });

    let volumes = Arc::clone(&probe.volumes);
    node.expect_set_volume().returning(move |_, volume| {
        volumes.lock().unwrap().push(volume);
        Ok(())
    });

    let filters = Arc::clone(&probe.filters);
    node.expect_set_filters().returning(move |_, preset| {
        filters.lock().unwrap().push(preset);
        Ok(())
    });

    node.expect_position().returning(|_| Ok(REPORTED_POSITION));

    let disconnects = Arc::clone(&probe.disconnects);
    node.expect_disconnect().returning(move |_| {
        disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    (node, probe)
}

/// A node whose voice join is always refused
pub fn unreachable_node() -> MockNode {
    let mut node = MockNode::new();
    node.expect_connect()
        .returning(|_, _| Err(MusicError::NodeError("voice gateway refused".to_string())));
    node
}
