//! Unified listing feed over independently paginated sources.
//!
//! Every source keeps its own cursor (`EntityState`). `hydrate_all` resets all
//! cursors and fetches page 0 from every source concurrently; `fetch_next`
//! advances exactly one source, the first in `EntityType::ORDER` that still
//! has pages and is not already loading. The merged view is rebuilt after
//! every cursor change and is sorted newest first.
//!
//! All cursor updates go through the single `FeedState` mutex and are never
//! held across an await. Each reset bumps the source's generation; a fetch
//! result is applied only when its generation is still current, so results
//! from superseded fetches are dropped instead of being appended twice.
//! Dropping an operation's future cancels it; its flags and counters are
//! released by drop guards.

use futures::future::join_all;
use market_core::{EntityType, MarketError};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing;

use crate::item::{normalize, ListingItem};
use crate::source::{ListingSource, SourcePage};

/// Pagination cursor of one source.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub items: Vec<ListingItem>,
    /// Next page index to fetch.
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for EntityState {
    fn default() -> Self {
        EntityState {
            items: Vec::new(),
            page: 0,
            has_more: true,
            loading: false,
            error: None,
        }
    }
}

struct SourceSlot {
    source: Arc<dyn ListingSource>,
    state: EntityState,
    generation: u64,
}

#[derive(Default)]
struct FeedState {
    slots: Vec<SourceSlot>,
    merged: Vec<ListingItem>,
    hydrating: usize,
    refreshing: usize,
    initialized: bool,
}

impl FeedState {
    fn slot_mut(&mut self, entity_type: EntityType) -> Option<&mut SourceSlot> {
        self.slots
            .iter_mut()
            .find(|slot| slot.source.entity_type() == entity_type)
    }

    /// Marks a source as loading and hands out what the fetch needs.
    fn begin_load(&mut self, index: usize, reset: bool) -> FetchTicket {
        let slot = &mut self.slots[index];
        if reset {
            slot.generation += 1;
            slot.state.items.clear();
            slot.state.page = 0;
            slot.state.has_more = true;
        }
        slot.state.loading = true;
        slot.state.error = None;

        let ticket = FetchTicket {
            source: slot.source.clone(),
            entity_type: slot.source.entity_type(),
            page: slot.state.page,
            page_size: slot.source.page_size(),
            generation: slot.generation,
            reset,
        };

        if reset {
            self.rebuild_merged();
        }
        ticket
    }

    fn rebuild_merged(&mut self) {
        let mut merged: Vec<ListingItem> = self
            .slots
            .iter()
            .flat_map(|slot| slot.state.items.iter().cloned())
            .collect();
        // Stable: ties keep source priority and page order.
        merged.sort_by(|a, b| b.sort_time().cmp(&a.sort_time()));
        self.merged = merged;
    }
}

struct FetchTicket {
    source: Arc<dyn ListingSource>,
    entity_type: EntityType,
    page: u32,
    page_size: u32,
    generation: u64,
    reset: bool,
}

struct Inner {
    state: Mutex<FeedState>,
    alive: AtomicBool,
}

#[derive(Clone, Copy)]
enum Counter {
    Hydrating,
    Refreshing,
}

/// Holds one unit of `hydrating` or `refreshing` until dropped, so a
/// cancelled hydration or refresh still releases it.
struct CounterGuard {
    inner: Arc<Inner>,
    counter: Counter,
}

impl CounterGuard {
    fn acquire(inner: &Arc<Inner>, counter: Counter) -> Self {
        let mut state = inner.state.lock();
        match counter {
            Counter::Hydrating => state.hydrating += 1,
            Counter::Refreshing => state.refreshing += 1,
        }
        CounterGuard {
            inner: inner.clone(),
            counter,
        }
    }
}

impl Drop for CounterGuard {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        match self.counter {
            Counter::Hydrating => state.hydrating = state.hydrating.saturating_sub(1),
            Counter::Refreshing => state.refreshing = state.refreshing.saturating_sub(1),
        }
    }
}

/// Clears the slot's `loading` flag if the fetch is dropped before its
/// result is applied. A slot reset since then is left alone.
struct PendingFetch {
    inner: Arc<Inner>,
    entity_type: EntityType,
    generation: u64,
    settled: bool,
}

impl PendingFetch {
    fn new(inner: &Arc<Inner>, ticket: &FetchTicket) -> Self {
        PendingFetch {
            inner: inner.clone(),
            entity_type: ticket.entity_type,
            generation: ticket.generation,
            settled: false,
        }
    }
}

impl Drop for PendingFetch {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.inner.state.lock();
        if let Some(slot) = state.slot_mut(self.entity_type) {
            if slot.generation == self.generation && slot.state.loading {
                tracing::debug!("Fetch for {} cancelled", self.entity_type);
                slot.state.loading = false;
            }
        }
    }
}

#[derive(Clone)]
pub struct ListingAggregator {
    inner: Arc<Inner>,
}

impl ListingAggregator {
    /// Sources are kept in `EntityType::ORDER`; a later source for the same
    /// entity type replaces an earlier one.
    pub fn new(sources: Vec<Arc<dyn ListingSource>>) -> Self {
        let mut by_type: BTreeMap<EntityType, Arc<dyn ListingSource>> = BTreeMap::new();
        for source in sources {
            by_type.insert(source.entity_type(), source);
        }

        let slots = by_type
            .into_values()
            .map(|source| SourceSlot {
                source,
                state: EntityState::default(),
                generation: 0,
            })
            .collect();

        ListingAggregator {
            inner: Arc::new(Inner {
                state: Mutex::new(FeedState {
                    slots,
                    ..FeedState::default()
                }),
                alive: AtomicBool::new(true),
            }),
        }
    }

    /// Resets every source and fetches page 0 from all of them concurrently.
    /// A failing source does not affect its siblings.
    pub async fn hydrate_all(&self) {
        let hydrating = CounterGuard::acquire(&self.inner, Counter::Hydrating);
        let fetches: Vec<(FetchTicket, PendingFetch)> = {
            let mut state = self.inner.state.lock();
            (0..state.slots.len())
                .map(|index| {
                    let ticket = state.begin_load(index, true);
                    let pending = PendingFetch::new(&self.inner, &ticket);
                    (ticket, pending)
                })
                .collect()
        };

        tracing::info!("Hydrating listing feed from {} sources", fetches.len());
        join_all(
            fetches
                .into_iter()
                .map(|(ticket, pending)| self.run(ticket, pending)),
        )
        .await;

        {
            let mut state = self.inner.state.lock();
            state.initialized = true;
            tracing::info!("Listing feed hydrated ({} items)", state.merged.len());
        }
        drop(hydrating);
    }

    /// Same fetch semantics as `hydrate_all`, reported as `refreshing`.
    pub async fn refresh(&self) {
        let _refreshing = CounterGuard::acquire(&self.inner, Counter::Refreshing);
        self.hydrate_all().await;
    }

    /// Advances the first source that has more pages and is idle. Returns the
    /// source that was advanced, or `None` when nothing qualified.
    pub async fn fetch_next(&self) -> Option<EntityType> {
        let ticket = {
            let mut state = self.inner.state.lock();
            let index = state
                .slots
                .iter()
                .position(|slot| slot.state.has_more && !slot.state.loading)?;
            state.begin_load(index, false)
        };
        let pending = PendingFetch::new(&self.inner, &ticket);

        let entity_type = ticket.entity_type;
        self.run(ticket, pending).await;
        Some(entity_type)
    }

    async fn run(&self, ticket: FetchTicket, mut pending: PendingFetch) {
        tracing::debug!("Fetching page {} for {}", ticket.page, ticket.entity_type);
        let result = ticket.source.fetch_page(ticket.page, ticket.page_size).await;
        self.apply(ticket, result);
        pending.settled = true;
    }

    fn apply(&self, ticket: FetchTicket, result: Result<SourcePage, MarketError>) {
        if !self.inner.alive.load(Ordering::SeqCst) {
            tracing::debug!("Feed shut down, discarding {} page {}", ticket.entity_type, ticket.page);
            return;
        }

        let mut state = self.inner.state.lock();
        let Some(slot) = state.slot_mut(ticket.entity_type) else {
            return;
        };

        if slot.generation != ticket.generation {
            tracing::debug!(
                "Discarding stale {} page {} (generation {} != {})",
                ticket.entity_type,
                ticket.page,
                ticket.generation,
                slot.generation
            );
            return;
        }

        match result {
            Ok(page) => {
                let normalized: Vec<ListingItem> = page.records.into_iter().map(normalize).collect();
                if ticket.reset {
                    slot.state.items = normalized;
                } else {
                    slot.state.items.extend(normalized);
                }
                slot.state.page = ticket.page + 1;
                slot.state.has_more = page.has_more;
                slot.state.loading = false;
                slot.state.error = None;
            }
            Err(e) => {
                tracing::warn!("Failed to load {} page {}: {}", ticket.entity_type, ticket.page, e);
                slot.state.loading = false;
                slot.state.has_more = false;
                slot.state.error = Some(e.to_string());
            }
        }

        state.rebuild_merged();
    }

    /// Merged feed, newest first by `sort_time`.
    pub fn items(&self) -> Vec<ListingItem> {
        self.inner.state.lock().merged.clone()
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.lock().slots.iter().any(|slot| slot.state.has_more)
    }

    pub fn loading(&self) -> bool {
        let state = self.inner.state.lock();
        state.hydrating > 0 || state.slots.iter().any(|slot| slot.state.loading)
    }

    pub fn is_initial_loading(&self) -> bool {
        !self.initialized() && self.loading()
    }

    pub fn refreshing(&self) -> bool {
        self.inner.state.lock().refreshing > 0
    }

    pub fn initialized(&self) -> bool {
        self.inner.state.lock().initialized
    }

    pub fn errors(&self) -> BTreeMap<EntityType, String> {
        self.inner
            .state
            .lock()
            .slots
            .iter()
            .filter_map(|slot| {
                slot.state
                    .error
                    .clone()
                    .map(|error| (slot.source.entity_type(), error))
            })
            .collect()
    }

    pub fn source_state(&self, entity_type: EntityType) -> Option<EntityState> {
        self.inner
            .state
            .lock()
            .slot_mut(entity_type)
            .map(|slot| slot.state.clone())
    }

    /// Results of fetches still in flight are discarded after this.
    pub fn shutdown(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
    }
}
