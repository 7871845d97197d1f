//! Replica manager keeping cached copies of remote catalogs up to date

use anyhow::Result;
use chrono::{DateTime, Utc};
use mediarepo_core::{FinalizeOptions, MediaCatalog};
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{interval, timeout, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::compress::decompress_snapshot;
use crate::config::ReplicaConfig;
use crate::error::ReplicaError;
use crate::source::{RemoteCatalogSource, SourceDiscovery, SourceId, SnapshotUpdate};

/// Replica event for real-time updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaEvent {
    /// Discovery reported a new source
    SourceAdded(SourceId),
    /// Source disappeared from discovery, its replica was dropped
    SourceRemoved(SourceId),
    /// A newer snapshot was installed
    CatalogUpdated { source: SourceId, serial: String },
    /// Discovery reported no sources at all, every replica was dropped
    CacheCleared,
}

/// Point-in-time view of one replica
#[derive(Debug, Clone)]
pub struct ReplicaStatus {
    pub source: SourceId,
    pub serial: Option<String>,
    pub entities: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

struct SlotState {
    catalog: Arc<MediaCatalog>,
    serial: Option<String>,
    next_check: Instant,
    last_updated: Option<DateTime<Utc>>,
}

/// Cached replica of one source. Readers only ever see a complete catalog;
/// a refresh builds the new one off to the side and swaps the `Arc`.
struct ReplicaSlot {
    state: RwLock<SlotState>,
    refresh: Mutex<()>,
}

impl ReplicaSlot {
    fn new() -> Self {
        Self {
            state: RwLock::new(SlotState {
                catalog: Arc::new(MediaCatalog::new()),
                serial: None,
                next_check: Instant::now(),
                last_updated: None,
            }),
            refresh: Mutex::new(()),
        }
    }
}

type RefreshOutcome = (SourceId, Result<bool, ReplicaError>);

/// State shared with the per-source refresh tasks
struct Refresher {
    config: ReplicaConfig,
    remote: Arc<dyn RemoteCatalogSource>,
    event_tx: broadcast::Sender<ReplicaEvent>,
}

impl Refresher {
    async fn refresh_source(&self, source: &SourceId, slot: &ReplicaSlot) -> Result<bool, ReplicaError> {
        // A refresh of this source is already running elsewhere
        let Ok(_guard) = slot.refresh.try_lock() else {
            return Ok(false);
        };

        let known_serial = {
            let state = slot.state.read().await;
            if Instant::now() < state.next_check {
                return Ok(false);
            }
            state.serial.clone()
        };

        let fetched = self.fetch_catalog(source, known_serial.as_deref()).await;
        let next_check = Instant::now() + self.next_delay();

        let mut state = slot.state.write().await;
        state.next_check = next_check;
        let Some((serial, catalog)) = fetched? else {
            return Ok(false);
        };
        state.catalog = Arc::new(catalog);
        state.serial = Some(serial.clone());
        state.last_updated = Some(Utc::now());
        drop(state);

        info!(source = %source, serial = %serial, "Installed newer catalog snapshot");
        let _ = self.event_tx.send(ReplicaEvent::CatalogUpdated {
            source: source.clone(),
            serial,
        });
        Ok(true)
    }

    /// Ask the source for newer data and build a finalized catalog from it
    async fn fetch_catalog(
        &self,
        source: &SourceId,
        known_serial: Option<&str>,
    ) -> Result<Option<(String, MediaCatalog)>, ReplicaError> {
        let limit = self.config.query_timeout_ms;
        let update = match timeout(
            Duration::from_millis(limit),
            self.remote.query_is_newer(source, known_serial),
        )
        .await
        {
            Ok(Ok(update)) => update,
            Ok(Err(e)) => return Err(ReplicaError::Source(format!("{:#}", e))),
            Err(_) => return Err(ReplicaError::Timeout(limit)),
        };

        let Some(SnapshotUpdate { serial, compressed }) = update else {
            debug!(source = %source, "Catalog is current");
            return Ok(None);
        };

        // Inflating and decoding a large snapshot would stall the runtime
        let compressed_len = compressed.len();
        let max_bytes = self.config.max_snapshot_bytes;
        let opts = self.config.finalize.clone();
        let catalog =
            tokio::task::spawn_blocking(move || build_catalog(&compressed, max_bytes, &opts)).await??;

        debug!(
            source = %source,
            serial = %serial,
            compressed = compressed_len,
            entities = catalog.len(),
            "Built catalog from snapshot"
        );
        Ok(Some((serial, catalog)))
    }

    fn next_delay(&self) -> Duration {
        let jitter = if self.config.poll_jitter_ms > 0 {
            rand::rng().random_range(0..=self.config.poll_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.config.poll_interval_ms + jitter)
    }
}

/// Decompress, decode and finalize a snapshot into a brand-new catalog
pub(crate) fn build_catalog(
    compressed: &[u8],
    max_bytes: u64,
    opts: &FinalizeOptions,
) -> Result<MediaCatalog, ReplicaError> {
    let raw = decompress_snapshot(compressed, max_bytes)?;
    let mut catalog = MediaCatalog::decode(&raw)?;
    catalog.finalize(opts);
    Ok(catalog)
}

/// Background manager of per-source catalog replicas
pub struct ReplicaManager {
    refresher: Arc<Refresher>,
    discovery: Arc<dyn SourceDiscovery>,
    slots: RwLock<HashMap<SourceId, Arc<ReplicaSlot>>>,
    stop: AtomicBool,
}

impl ReplicaManager {
    pub fn new(
        config: ReplicaConfig,
        remote: Arc<dyn RemoteCatalogSource>,
        discovery: Arc<dyn SourceDiscovery>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            refresher: Arc::new(Refresher {
                config,
                remote,
                event_tx,
            }),
            discovery,
            slots: RwLock::new(HashMap::new()),
            stop: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ReplicaConfig {
        &self.refresher.config
    }

    /// Subscribe to replica events
    pub fn subscribe(&self) -> broadcast::Receiver<ReplicaEvent> {
        self.refresher.event_tx.subscribe()
    }

    fn emit(&self, event: ReplicaEvent) {
        let _ = self.refresher.event_tx.send(event);
    }

    /// Current catalog of a source.
    ///
    /// The returned `Arc` stays valid and unchanged even if a newer snapshot
    /// is installed afterwards.
    pub async fn catalog(&self, source: &SourceId) -> Option<Arc<MediaCatalog>> {
        let slot = self.slots.read().await.get(source).cloned()?;
        let state = slot.state.read().await;
        Some(state.catalog.clone())
    }

    /// Serial of the snapshot currently held for a source
    pub async fn serial(&self, source: &SourceId) -> Option<String> {
        let slot = self.slots.read().await.get(source).cloned()?;
        let state = slot.state.read().await;
        state.serial.clone()
    }

    /// Sources currently tracked, sorted
    pub async fn sources(&self) -> Vec<SourceId> {
        let mut sources: Vec<SourceId> = self.slots.read().await.keys().cloned().collect();
        sources.sort();
        sources
    }

    pub async fn status(&self) -> Vec<ReplicaStatus> {
        let mut slots = self.slot_handles().await;
        slots.sort_by(|a, b| a.0.cmp(&b.0));

        let mut status = Vec::with_capacity(slots.len());
        for (source, slot) in slots {
            let state = slot.state.read().await;
            status.push(ReplicaStatus {
                source,
                serial: state.serial.clone(),
                entities: state.catalog.len(),
                last_updated: state.last_updated,
            });
        }
        status
    }

    async fn slot_handles(&self) -> Vec<(SourceId, Arc<ReplicaSlot>)> {
        self.slots
            .read()
            .await
            .iter()
            .map(|(id, slot)| (id.clone(), slot.clone()))
            .collect()
    }

    /// Reconcile tracked sources with what discovery currently knows
    pub async fn sync_sources(&self) -> Result<()> {
        let known = self.discovery.list_known_sources().await?;
        let mut slots = self.slots.write().await;

        if known.is_empty() {
            if !slots.is_empty() {
                info!(dropped = slots.len(), "No sources known, clearing catalog cache");
                slots.clear();
                self.emit(ReplicaEvent::CacheCleared);
            }
            return Ok(());
        }

        let vanished: Vec<SourceId> = slots
            .keys()
            .filter(|id| !known.contains(id))
            .cloned()
            .collect();
        for source in vanished {
            slots.remove(&source);
            info!(source = %source, "Source vanished, dropping replica");
            self.emit(ReplicaEvent::SourceRemoved(source));
        }

        for source in known {
            if !slots.contains_key(&source) {
                slots.insert(source.clone(), Arc::new(ReplicaSlot::new()));
                info!(source = %source, "Tracking new catalog source");
                self.emit(ReplicaEvent::SourceAdded(source));
            }
        }
        Ok(())
    }

    /// Start a refresh task for every tracked source. Sources already being
    /// refreshed or not yet due return at once.
    async fn spawn_refreshes(&self, tasks: &mut JoinSet<RefreshOutcome>) {
        for (source, slot) in self.slot_handles().await {
            let refresher = Arc::clone(&self.refresher);
            tasks.spawn(async move {
                let result = refresher.refresh_source(&source, &slot).await;
                (source, result)
            });
        }
    }

    /// Check every source whose next-check time has passed.
    ///
    /// Sources are checked concurrently, a slow source does not hold up the
    /// others. Returns how many replicas were replaced. Failures are logged
    /// and leave the previous data in place.
    pub async fn poll_once(&self) -> usize {
        let mut tasks = JoinSet::new();
        self.spawn_refreshes(&mut tasks).await;

        let mut updated = 0;
        while let Some(joined) = tasks.join_next().await {
            if log_outcome(joined) {
                updated += 1;
            }
        }
        updated
    }

    /// Ask a running [`run`](Self::run) loop to exit at its next wake-up
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Run the replica loop until [`stop`](Self::stop) is called.
    ///
    /// Each cycle starts refreshes without waiting for the previous ones, so
    /// every source keeps its own schedule. Refreshes still running at stop
    /// are aborted.
    pub async fn run(&self) {
        info!("Catalog replica manager started");
        if let Err(e) = self.sync_sources().await {
            warn!(error = %e, "Initial source sync failed");
        }
        let resync = Duration::from_secs(self.refresher.config.resync_interval_secs);
        let mut last_sync = Instant::now();

        let mut cycle = interval(Duration::from_millis(self.refresher.config.cycle_ms.max(1)));
        cycle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();

        loop {
            cycle.tick().await;
            if self.is_stopped() {
                break;
            }

            let mut updated = 0;
            while let Some(joined) = in_flight.try_join_next() {
                if log_outcome(joined) {
                    updated += 1;
                }
            }
            if updated > 0 {
                debug!(updated = updated, "Replica cycle complete");
            }

            if last_sync.elapsed() >= resync {
                if let Err(e) = self.sync_sources().await {
                    warn!(error = %e, "Source sync failed");
                }
                last_sync = Instant::now();
            }

            self.spawn_refreshes(&mut in_flight).await;
        }
        in_flight.abort_all();
        info!("Catalog replica manager stopped");
    }

    /// Spawn [`run`](Self::run) on the current tokio runtime
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.run().await })
    }
}

/// Log a finished refresh, returning true when a catalog was replaced
fn log_outcome(joined: Result<RefreshOutcome, JoinError>) -> bool {
    match joined {
        Ok((_, Ok(updated))) => updated,
        Ok((source, Err(e))) => {
            warn!(source = %source, error = %e, "Catalog refresh failed, keeping cached data");
            false
        }
        Err(e) => {
            warn!(error = %e, "Catalog refresh task ended abnormally");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress_snapshot;
    use async_trait::async_trait;
    use mediarepo_core::{Category, Collection, Item, MediaType, TitleSet};
    use std::collections::{HashSet, VecDeque};
    use std::sync::atomic::AtomicUsize;

    type Reply = std::result::Result<Option<SnapshotUpdate>, String>;

    #[derive(Default)]
    struct MockRemote {
        replies: std::sync::Mutex<VecDeque<Reply>>,
        seen_serials: std::sync::Mutex<Vec<Option<String>>>,
        calls: AtomicUsize,
        hanging: std::sync::Mutex<HashSet<SourceId>>,
    }

    impl MockRemote {
        fn push(&self, reply: Reply) {
            self.replies.lock().unwrap().push_back(reply);
        }

        /// Queries for this source never answer
        fn hang(&self, source: &str) {
            self.hanging.lock().unwrap().insert(SourceId::new(source));
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteCatalogSource for MockRemote {
        async fn query_is_newer(
            &self,
            source: &SourceId,
            known_serial: Option<&str>,
        ) -> Result<Option<SnapshotUpdate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_serials
                .lock()
                .unwrap()
                .push(known_serial.map(str::to_string));
            let hangs = self.hanging.lock().unwrap().contains(source);
            if hangs {
                std::future::pending::<()>().await;
            }
            let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Ok(None));
            reply.map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[derive(Default)]
    struct MockDiscovery {
        sources: std::sync::Mutex<Vec<SourceId>>,
    }

    impl MockDiscovery {
        fn set(&self, ids: &[&str]) {
            *self.sources.lock().unwrap() = ids.iter().map(|id| SourceId::new(id)).collect();
        }
    }

    #[async_trait]
    impl SourceDiscovery for MockDiscovery {
        async fn list_known_sources(&self) -> Result<Vec<SourceId>> {
            Ok(self.sources.lock().unwrap().clone())
        }
    }

    fn fast_config() -> ReplicaConfig {
        ReplicaConfig {
            poll_interval_ms: 0,
            poll_jitter_ms: 0,
            cycle_ms: 5,
            query_timeout_ms: 200,
            ..Default::default()
        }
    }

    fn setup(config: ReplicaConfig) -> (ReplicaManager, Arc<MockRemote>, Arc<MockDiscovery>) {
        let remote = Arc::new(MockRemote::default());
        let discovery = Arc::new(MockDiscovery::default());
        let manager = ReplicaManager::new(config, remote.clone(), discovery.clone());
        (manager, remote, discovery)
    }

    fn snapshot(album: &str) -> Vec<u8> {
        let mut catalog = MediaCatalog::new();
        catalog
            .add_category(MediaType::Music, Category::new(1, "Jazz"))
            .unwrap();
        let mut item = Item::new(1, "So What");
        item.artist = "Miles Davis".into();
        item.duration = 562;
        catalog.add_item(MediaType::Music, item).unwrap();
        let mut collection = Collection::new(2, album);
        collection.item_ids = vec![1];
        catalog.add_collection(MediaType::Music, collection).unwrap();
        let mut title_set = TitleSet::new(3, album);
        title_set.collection_ids = vec![2];
        catalog.add_title_set(MediaType::Music, title_set).unwrap();
        compress_snapshot(&catalog.encode()).unwrap()
    }

    fn update(serial: &str, album: &str) -> Reply {
        Ok(Some(SnapshotUpdate {
            serial: serial.to_string(),
            compressed: snapshot(album),
        }))
    }

    fn album_name(catalog: &MediaCatalog) -> String {
        catalog
            .title_set(MediaType::Music, 3)
            .map(|t| t.base.name.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_sync_tracks_sources() {
        let (manager, _remote, discovery) = setup(fast_config());
        let mut events = manager.subscribe();

        discovery.set(&["den", "kitchen"]);
        manager.sync_sources().await.unwrap();
        assert_eq!(manager.sources().await, vec![SourceId::new("den"), SourceId::new("kitchen")]);
        assert!(manager.catalog(&SourceId::new("den")).await.unwrap().is_empty());
        assert!(matches!(events.recv().await.unwrap(), ReplicaEvent::SourceAdded(_)));

        discovery.set(&["kitchen"]);
        manager.sync_sources().await.unwrap();
        assert_eq!(manager.sources().await, vec![SourceId::new("kitchen")]);
        assert!(manager.catalog(&SourceId::new("den")).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_discovery_clears_cache() {
        let (manager, remote, discovery) = setup(fast_config());
        discovery.set(&["den"]);
        manager.sync_sources().await.unwrap();
        remote.push(update("s1", "Kind of Blue"));
        assert_eq!(manager.poll_once().await, 1);

        let mut events = manager.subscribe();
        discovery.set(&[]);
        manager.sync_sources().await.unwrap();
        assert!(manager.sources().await.is_empty());
        assert_eq!(events.recv().await.unwrap(), ReplicaEvent::CacheCleared);
    }

    #[tokio::test]
    async fn test_not_newer_keeps_same_catalog() {
        let (manager, remote, discovery) = setup(fast_config());
        let den = SourceId::new("den");
        discovery.set(&["den"]);
        manager.sync_sources().await.unwrap();

        remote.push(update("s1", "Kind of Blue"));
        assert_eq!(manager.poll_once().await, 1);
        let before = manager.catalog(&den).await.unwrap();

        remote.push(Ok(None));
        assert_eq!(manager.poll_once().await, 0);
        let after = manager.catalog(&den).await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(manager.serial(&den).await.as_deref(), Some("s1"));

        let seen = remote.seen_serials.lock().unwrap().clone();
        assert_eq!(seen, vec![None, Some("s1".to_string())]);
    }

    #[tokio::test]
    async fn test_newer_snapshot_replaces_catalog() {
        let (manager, remote, discovery) = setup(fast_config());
        let den = SourceId::new("den");
        discovery.set(&["den"]);
        manager.sync_sources().await.unwrap();

        remote.push(update("s1", "Kind of Blue"));
        manager.poll_once().await;
        let old = manager.catalog(&den).await.unwrap();

        let mut events = manager.subscribe();
        remote.push(update("s2", "Bitches Brew"));
        assert_eq!(manager.poll_once().await, 1);

        let new = manager.catalog(&den).await.unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(album_name(&old), "Kind of Blue");
        assert_eq!(album_name(&new), "Bitches Brew");
        assert_eq!(manager.serial(&den).await.as_deref(), Some("s2"));
        assert_eq!(
            events.recv().await.unwrap(),
            ReplicaEvent::CatalogUpdated {
                source: den.clone(),
                serial: "s2".into()
            }
        );

        // Installed catalogs are finalized
        let title_set = new.title_set(MediaType::Music, 3).unwrap();
        assert_eq!(title_set.rollup.artist, "Miles Davis");
    }

    #[tokio::test]
    async fn test_bad_snapshot_keeps_previous_data() {
        let (manager, remote, discovery) = setup(fast_config());
        let den = SourceId::new("den");
        discovery.set(&["den"]);
        manager.sync_sources().await.unwrap();

        remote.push(update("s1", "Kind of Blue"));
        manager.poll_once().await;
        let before = manager.catalog(&den).await.unwrap();

        remote.push(Ok(Some(SnapshotUpdate {
            serial: "s2".into(),
            compressed: b"garbage".to_vec(),
        })));
        assert_eq!(manager.poll_once().await, 0);

        let mut truncated = MediaCatalog::new().encode();
        truncated.truncate(5);
        remote.push(Ok(Some(SnapshotUpdate {
            serial: "s3".into(),
            compressed: compress_snapshot(&truncated).unwrap(),
        })));
        assert_eq!(manager.poll_once().await, 0);

        remote.push(Err("connection reset".into()));
        assert_eq!(manager.poll_once().await, 0);

        assert!(Arc::ptr_eq(&before, &manager.catalog(&den).await.unwrap()));
        assert_eq!(manager.serial(&den).await.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_query_timeout_counts_as_no_data() {
        let (manager, remote, discovery) = setup(ReplicaConfig {
            query_timeout_ms: 20,
            ..fast_config()
        });
        discovery.set(&["den"]);
        manager.sync_sources().await.unwrap();

        remote.hang("den");
        assert_eq!(manager.poll_once().await, 0);
        assert!(manager.catalog(&SourceId::new("den")).await.unwrap().is_empty());
        assert_eq!(manager.serial(&SourceId::new("den")).await, None);
    }

    #[tokio::test]
    async fn test_sources_not_due_are_skipped() {
        let (manager, remote, discovery) = setup(ReplicaConfig {
            poll_interval_ms: 60_000,
            ..fast_config()
        });
        discovery.set(&["den"]);
        manager.sync_sources().await.unwrap();

        manager.poll_once().await;
        manager.poll_once().await;
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_loop_refreshes_and_stops() {
        let (manager, remote, discovery) = setup(fast_config());
        discovery.set(&["den"]);
        remote.push(update("s1", "Kind of Blue"));

        let manager = Arc::new(manager);
        let mut events = manager.subscribe();
        let handle = manager.spawn();

        let den = SourceId::new("den");
        let updated = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let ReplicaEvent::CatalogUpdated { source, .. } = events.recv().await.unwrap() {
                    break source;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(updated, den);

        manager.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(album_name(&manager.catalog(&den).await.unwrap()), "Kind of Blue");
    }

    #[tokio::test]
    async fn test_slow_source_does_not_delay_others() {
        let (manager, remote, discovery) = setup(ReplicaConfig {
            query_timeout_ms: 1_000,
            ..fast_config()
        });
        discovery.set(&["a", "b", "c", "d", "e", "z"]);
        manager.sync_sources().await.unwrap();
        for source in ["a", "b", "c", "d", "e"] {
            remote.hang(source);
        }
        remote.push(update("s1", "Kind of Blue"));

        let manager = Arc::new(manager);
        let mut events = manager.subscribe();
        let started = Instant::now();
        let poll = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.poll_once().await }
        });

        let event = tokio::time::timeout(Duration::from_millis(500), events.recv())
            .await
            .expect("fast source was held up by hanging ones")
            .unwrap();
        assert_eq!(
            event,
            ReplicaEvent::CatalogUpdated {
                source: SourceId::new("z"),
                serial: "s1".into()
            }
        );
        assert!(started.elapsed() < Duration::from_millis(500));

        // The whole pass still ends after one timeout, not five
        assert_eq!(poll.await.unwrap(), 1);
        assert!(started.elapsed() < Duration::from_millis(2_500));
    }

    #[tokio::test]
    async fn test_run_loop_keeps_polling_while_a_source_hangs() {
        let (manager, remote, discovery) = setup(ReplicaConfig {
            query_timeout_ms: 60_000,
            ..fast_config()
        });
        discovery.set(&["attic", "den"]);
        remote.hang("attic");
        remote.push(update("s1", "Kind of Blue"));
        remote.push(update("s2", "Bitches Brew"));

        let manager = Arc::new(manager);
        let mut events = manager.subscribe();
        let handle = manager.spawn();

        let serials = tokio::time::timeout(Duration::from_secs(5), async {
            let mut serials = Vec::new();
            while serials.len() < 2 {
                if let ReplicaEvent::CatalogUpdated { source, serial } = events.recv().await.unwrap() {
                    assert_eq!(source, SourceId::new("den"));
                    serials.push(serial);
                }
            }
            serials
        })
        .await
        .unwrap();
        assert_eq!(serials, vec!["s1".to_string(), "s2".to_string()]);

        manager.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(manager.serial(&SourceId::new("attic")).await, None);
    }

    #[test]
    fn test_build_catalog_decodes_and_finalizes() {
        let catalog = build_catalog(&snapshot("Kind of Blue"), 1 << 20, &FinalizeOptions::default()).unwrap();
        assert_eq!(album_name(&catalog), "Kind of Blue");
        let title_set = catalog.title_set(MediaType::Music, 3).unwrap();
        assert_eq!(title_set.rollup.artist, "Miles Davis");
        assert_eq!(title_set.rollup.sort_title, "KIND OF BLUE");

        assert!(matches!(
            build_catalog(&snapshot("Kind of Blue"), 8, &FinalizeOptions::default()),
            Err(ReplicaError::TooLarge { .. })
        ));
    }
}
