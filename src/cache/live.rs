use tokio::sync::mpsc;

use crate::cache::{CacheState, PageCache};
use crate::core::{ChangeEvent, Result};
use crate::gateway::Subscription;
use crate::repo::{Record, Repository};

/// A page cache wired to a live change feed.
///
/// Subscription events land in an unbounded channel and are merged into the
/// cache only by `pump()`, so the cache has a single mutator and needs no
/// locking. Call `close()` on teardown; dropping the controller also cancels
/// the subscription so no events leak into a stale cache.
pub struct LivePage<T: Record> {
    repo: Repository<T>,
    cache: PageCache<T>,
    events: mpsc::UnboundedReceiver<ChangeEvent<T>>,
    subscription: Option<Subscription>,
}

impl<T: Record> LivePage<T> {
    /// Subscribes and loads page 1.
    pub async fn open(repo: Repository<T>, limit: usize) -> Result<Self> {
        let (sender, events) = mpsc::unbounded_channel();
        let subscription = repo
            .subscribe(move |event| {
                // Receiver gone means the controller was torn down.
                let _ = sender.send(event);
            })
            .await?;
        let mut live = Self {
            repo,
            cache: PageCache::new(limit),
            events,
            subscription: Some(subscription),
        };
        live.goto(1).await?;
        Ok(live)
    }

    /// Re-enters `Loading` and fetches the requested page. On failure the
    /// cache keeps its last-known-good contents and the error is returned.
    pub async fn goto(&mut self, page: u32) -> Result<()> {
        self.cache.begin_load(page);
        match self.repo.list(page, self.cache.limit()).await {
            Ok(fetched) => {
                self.cache.install(fetched);
                Ok(())
            }
            Err(err) => {
                self.cache.load_failed();
                Err(err)
            }
        }
    }

    /// Drains pending change events into the cache; returns how many were
    /// applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.cache.apply(event);
            applied += 1;
        }
        applied
    }

    pub fn cache(&self) -> &PageCache<T> {
        &self.cache
    }

    pub fn data(&self) -> &[T] {
        self.cache.data()
    }

    pub fn total(&self) -> u64 {
        self.cache.total()
    }

    pub fn state(&self) -> CacheState {
        self.cache.state()
    }

    /// Cancels the subscription; safe to call once, after which events stop
    /// arriving.
    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

impl<T: Record> Drop for LivePage<T> {
    fn drop(&mut self) {
        self.close();
    }
}
