//! Fixed-count exclusive slots, claimed by index.
//!
//! Works for any "N interchangeable exclusive resources" problem: duel
//! arenas, instanced dungeons, event stages. The count is fixed at
//! construction; each slot holds at most one live resource.

use std::convert::Infallible;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use worldcore_pool::CancellationToken;

/// A resource that lives in one slot of an [`ExclusiveSlotAllocator`].
pub trait SlotResource: Send + Sync + 'static {
    /// What the caller supplies to build a new resource.
    type Params: Send;

    /// Builds the resource bound to `index`. Runs inside the allocator's
    /// critical section, so keep it cheap.
    fn create(index: usize, params: Self::Params) -> Self;

    /// The slot index this resource was created for.
    fn index(&self) -> usize;
}

/// Result of a slot request.
#[derive(Debug)]
pub enum SlotOutcome<R> {
    /// A slot was claimed; the caller owns it until it releases it.
    Allocated(Arc<R>),
    /// Every slot is taken. Not an error: wait, retry, or tell the player.
    NoSlotAvailable,
    /// The cancellation token fired while waiting. Nothing was claimed.
    Cancelled,
}

impl<R> SlotOutcome<R> {
    /// The allocated resource, if any.
    pub fn allocated(self) -> Option<Arc<R>> {
        match self {
            Self::Allocated(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        matches!(self, Self::Allocated(_))
    }
}

/// Hands out indices in `[0, max_slot_count)`, one live resource each.
pub struct ExclusiveSlotAllocator<R: SlotResource> {
    name: String,
    /// The claim critical section. Async so waiting callers suspend
    /// instead of blocking a worker thread.
    claim: Mutex<()>,
    slots: RwLock<Vec<Option<Arc<R>>>>,
}

impl<R: SlotResource> ExclusiveSlotAllocator<R> {
    /// Creates an allocator with `max_slot_count` empty slots.
    pub fn new(name: impl Into<String>, max_slot_count: usize) -> Self {
        let name = name.into();
        tracing::info!(allocator = %name, max_slot_count, "slot allocator created");
        Self {
            name,
            claim: Mutex::new(()),
            slots: RwLock::new(vec![None; max_slot_count]),
        }
    }

    /// Claims the lowest free slot and builds a resource in it.
    pub async fn get_free_slot(
        &self,
        params: R::Params,
        cancel: &CancellationToken,
    ) -> SlotOutcome<R> {
        match self
            .get_free_slot_checked(params, cancel, |_| Ok::<(), Infallible>(()))
            .await
        {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Like [`get_free_slot`](Self::get_free_slot), but first runs `check`
    /// against the current slots inside the critical section. If `check`
    /// fails nothing is claimed and its error is returned.
    ///
    /// Use this when admission depends on who already holds a slot (for
    /// example, a player may only be in one duel at a time).
    pub async fn get_free_slot_checked<E>(
        &self,
        params: R::Params,
        cancel: &CancellationToken,
        check: impl FnOnce(&[Option<Arc<R>>]) -> Result<(), E>,
    ) -> Result<SlotOutcome<R>, E> {
        if cancel.is_cancelled() {
            return Ok(SlotOutcome::Cancelled);
        }

        let _claim = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(allocator = %self.name, "slot request cancelled");
                return Ok(SlotOutcome::Cancelled);
            }
            guard = self.claim.lock() => guard,
        };

        let free = {
            let slots = self.slots.read();
            check(slots.as_slice())?;
            slots.iter().position(Option::is_none)
        };
        let Some(index) = free else {
            tracing::debug!(allocator = %self.name, "no free slot");
            return Ok(SlotOutcome::NoSlotAvailable);
        };

        let resource = Arc::new(R::create(index, params));
        self.slots.write()[index] = Some(Arc::clone(&resource));
        tracing::info!(allocator = %self.name, index, "slot allocated");
        Ok(SlotOutcome::Allocated(resource))
    }

    /// Frees the slot held by `resource`.
    ///
    /// # Panics
    /// If the slot is not currently held by this exact resource (double
    /// release, or a resource from another allocator). That is a bug in
    /// the caller and continuing would corrupt slot ownership.
    pub fn release_slot(&self, resource: &R) {
        let index = resource.index();
        let mut slots = self.slots.write();
        let held = matches!(
            slots.get(index),
            Some(Some(current)) if std::ptr::eq(Arc::as_ptr(current), resource)
        );
        if !held {
            tracing::error!(
                allocator = %self.name,
                index,
                "release of a slot not held by this resource"
            );
            panic!("slot {index} of {} released but not held by this resource", self.name);
        }
        slots[index] = None;
        drop(slots);
        tracing::info!(allocator = %self.name, index, "slot released");
    }

    /// The resource in slot `index`, or `None` if free or out of range.
    pub fn get_by_index(&self, index: usize) -> Option<Arc<R>> {
        self.slots.read().get(index).cloned().flatten()
    }

    /// Every live resource, in slot order.
    pub fn occupied(&self) -> Vec<Arc<R>> {
        self.slots.read().iter().flatten().cloned().collect()
    }

    /// Snapshot of all slots, in index order.
    pub fn slots(&self) -> Vec<Option<Arc<R>>> {
        self.slots.read().clone()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.read().iter().filter(|s| s.is_some()).count()
    }

    pub fn max_slot_count(&self) -> usize {
        self.slots.read().len()
    }
}
