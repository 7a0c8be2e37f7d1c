//! Fixed-capacity slot pools.
//!
//! This module provides [`ResourcePool<T>`], a preallocated array of slots
//! with two pieces of intrusive bookkeeping:
//!
//! - a singly-linked **free list** threaded through free slots, popped by
//!   [`acquire`](ResourcePool::acquire) and pushed by
//!   [`release`](ResourcePool::release) (LIFO reuse)
//! - a fixed-size **hash table** whose buckets are singly-linked collision
//!   chains threaded through in-use slots
//!
//! A slot's link fields live inside its [`SlotState`]: a free slot only has a
//! free-list link, an in-use slot only has a chain link. The two roles can
//! never be confused.
//!
//! # Handles
//!
//! Slots are addressed through [`Handle`]s carrying the slot index and the
//! slot generation at acquire time. Releasing a slot bumps its generation, so
//! a handle kept past release is rejected as [`PoolError::Stale`] instead of
//! aliasing whatever reuses the slot.
//!
//! # Example
//!
//! ```
//! use cinder_core::pool::ResourcePool;
//!
//! let mut pool = ResourcePool::<&str>::new(4, 2);
//! let h = pool.acquire("brick").unwrap();
//! pool.insert(h, 1).unwrap();
//! assert_eq!(pool.find(1, |v| *v == "brick"), Some(h));
//!
//! pool.remove(h, 1).unwrap();
//! assert_eq!(pool.release(h).unwrap(), "brick");
//! assert!(pool.get(h).is_err());
//! ```

use crate::error::ErrorKind;

/// Generation-checked reference to a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Build a handle from raw parts.
    ///
    /// Handles built this way are validated like any other on use.
    pub fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at acquire time.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Errors reported by pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The free list is empty.
    #[error("pool exhausted (capacity {capacity})")]
    Exhausted {
        /// Pool capacity.
        capacity: usize,
    },
    /// The handle index lies outside the pool.
    #[error("slot index {index} outside pool of capacity {capacity}")]
    Bounds {
        /// Offending index.
        index: u32,
        /// Pool capacity.
        capacity: usize,
    },
    /// The slot is free or has been reused since the handle was issued.
    #[error("stale handle {handle}")]
    Stale {
        /// Offending handle.
        handle: Handle,
    },
    /// The bucket index lies outside the hash table.
    #[error("bucket {bucket} outside table of {bucket_count} buckets")]
    BucketOutOfRange {
        /// Offending bucket.
        bucket: usize,
        /// Number of buckets.
        bucket_count: usize,
    },
    /// The slot is not linked into the chain it was expected in.
    #[error("slot {handle} not found in bucket {bucket}")]
    NotInChain {
        /// Slot being unlinked.
        handle: Handle,
        /// Bucket that was searched.
        bucket: usize,
    },
    /// The slot is already linked into a chain.
    #[error("slot {handle} already linked into bucket {bucket}")]
    AlreadyLinked {
        /// Slot being linked.
        handle: Handle,
        /// Bucket it is linked into.
        bucket: usize,
    },
    /// The slot is still linked into a chain and cannot be released.
    #[error("slot {handle} still linked into bucket {bucket}")]
    StillLinked {
        /// Slot being released.
        handle: Handle,
        /// Bucket it is linked into.
        bucket: usize,
    },
}

impl PoolError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Exhausted { .. } => ErrorKind::Exhausted,
            Self::Bounds { .. } | Self::BucketOutOfRange { .. } => ErrorKind::Bounds,
            Self::Stale { .. }
            | Self::NotInChain { .. }
            | Self::AlreadyLinked { .. }
            | Self::StillLinked { .. } => ErrorKind::Internal,
        }
    }
}

/// State of one slot. Link fields are only reachable through the state
/// that owns them.
#[derive(Debug)]
enum SlotState<T> {
    Free {
        next_free: Option<u32>,
    },
    InUse {
        value: T,
        /// Bucket this slot is linked into, if any.
        bucket: Option<usize>,
        chain_next: Option<u32>,
    },
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    state: SlotState<T>,
}

/// Fixed-capacity pool of slots with a free list and a chained hash index.
#[derive(Debug)]
pub struct ResourcePool<T> {
    slots: Box<[Slot<T>]>,
    buckets: Box<[Option<u32>]>,
    free_head: Option<u32>,
    live: usize,
}

impl<T> ResourcePool<T> {
    /// Preallocate a pool of `capacity` slots and `bucket_count` buckets.
    ///
    /// The free list initially runs in index order, so the first acquire
    /// returns slot 0.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero or `capacity` exceeds `u32::MAX`.
    pub fn new(capacity: usize, bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "pool needs at least one bucket");
        assert!(u32::try_from(capacity).is_ok(), "pool capacity exceeds u32");

        let slots: Box<[Slot<T>]> = (0..capacity)
            .map(|i| Slot {
                generation: 0,
                state: SlotState::Free {
                    next_free: (i + 1 < capacity).then(|| (i + 1) as u32),
                },
            })
            .collect();

        Self {
            slots,
            buckets: vec![None; bucket_count].into_boxed_slice(),
            free_head: (capacity > 0).then_some(0),
            live: 0,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of hash buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of in-use slots.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no slot is in use.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether every slot is in use.
    pub fn is_full(&self) -> bool {
        self.free_head.is_none()
    }

    /// Pop the free-list head and store `value` in it.
    pub fn acquire(&mut self, value: T) -> Result<Handle, PoolError> {
        let Some(index) = self.free_head else {
            return Err(PoolError::Exhausted {
                capacity: self.capacity(),
            });
        };
        let slot = &mut self.slots[index as usize];
        let SlotState::Free { next_free } = slot.state else {
            // The free list only ever links free slots.
            unreachable!("free list head {index} is in use");
        };
        self.free_head = next_free;
        slot.state = SlotState::InUse {
            value,
            bucket: None,
            chain_next: None,
        };
        self.live += 1;
        log::debug!("pool: acquired slot {index}");
        Ok(Handle {
            index,
            generation: slot.generation,
        })
    }

    /// Return a slot to the free-list head and hand back its value.
    ///
    /// The slot must not be linked into a bucket. Its generation is bumped,
    /// invalidating every outstanding handle to it.
    pub fn release(&mut self, handle: Handle) -> Result<T, PoolError> {
        self.validate(handle)?;
        let free_head = self.free_head;
        let slot = &mut self.slots[handle.index as usize];
        if let SlotState::InUse {
            bucket: Some(bucket),
            ..
        } = slot.state
        {
            return Err(PoolError::StillLinked { handle, bucket });
        }
        let state = std::mem::replace(
            &mut slot.state,
            SlotState::Free {
                next_free: free_head,
            },
        );
        slot.generation = slot.generation.wrapping_add(1);
        self.free_head = Some(handle.index);
        self.live -= 1;
        log::debug!("pool: released slot {}", handle.index);
        match state {
            SlotState::InUse { value, .. } => Ok(value),
            SlotState::Free { .. } => unreachable!("validated slot is in use"),
        }
    }

    /// Link a slot at the head of `bucket`'s chain.
    pub fn insert(&mut self, handle: Handle, bucket: usize) -> Result<(), PoolError> {
        self.check_bucket(bucket)?;
        self.validate(handle)?;
        let old_head = self.buckets[bucket];
        match &mut self.slots[handle.index as usize].state {
            SlotState::InUse {
                bucket: Some(linked),
                ..
            } => {
                return Err(PoolError::AlreadyLinked {
                    handle,
                    bucket: *linked,
                });
            }
            SlotState::InUse {
                bucket: slot_bucket,
                chain_next,
                ..
            } => {
                *slot_bucket = Some(bucket);
                *chain_next = old_head;
            }
            SlotState::Free { .. } => unreachable!("validated slot is in use"),
        }
        self.buckets[bucket] = Some(handle.index);
        Ok(())
    }

    /// Unlink a slot from `bucket`'s chain.
    ///
    /// Walks the chain from the bucket head; fails with
    /// [`PoolError::NotInChain`] if the slot is not reachable from it.
    pub fn remove(&mut self, handle: Handle, bucket: usize) -> Result<(), PoolError> {
        self.check_bucket(bucket)?;
        self.validate(handle)?;
        let target = handle.index;
        let target_next = self.chain_next(target);

        if self.buckets[bucket] == Some(target) {
            self.buckets[bucket] = target_next;
        } else {
            let mut current = self.buckets[bucket];
            loop {
                let Some(index) = current else {
                    return Err(PoolError::NotInChain { handle, bucket });
                };
                let next = self.chain_next(index);
                if next == Some(target) {
                    if let SlotState::InUse { chain_next, .. } =
                        &mut self.slots[index as usize].state
                    {
                        *chain_next = target_next;
                    }
                    break;
                }
                current = next;
            }
        }

        if let SlotState::InUse {
            bucket: slot_bucket,
            chain_next,
            ..
        } = &mut self.slots[target as usize].state
        {
            *slot_bucket = None;
            *chain_next = None;
        }
        Ok(())
    }

    /// Find the first slot in `bucket`'s chain whose value matches.
    ///
    /// Returns `None` for an out-of-range bucket.
    pub fn find(&self, bucket: usize, mut predicate: impl FnMut(&T) -> bool) -> Option<Handle> {
        let mut current = *self.buckets.get(bucket)?;
        while let Some(index) = current {
            let slot = &self.slots[index as usize];
            let SlotState::InUse {
                value, chain_next, ..
            } = &slot.state
            else {
                log::error!("pool: free slot {index} found in bucket {bucket}");
                return None;
            };
            if predicate(value) {
                return Some(Handle {
                    index,
                    generation: slot.generation,
                });
            }
            current = *chain_next;
        }
        None
    }

    /// Number of slots linked into `bucket`.
    pub fn chain_len(&self, bucket: usize) -> usize {
        let mut len = 0;
        let mut current = self.buckets.get(bucket).copied().flatten();
        while let Some(index) = current {
            len += 1;
            current = self.chain_next(index);
        }
        len
    }

    /// Check that `handle` refers to a live slot.
    pub fn validate(&self, handle: Handle) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(PoolError::Bounds {
                index: handle.index,
                capacity: self.capacity(),
            })?;
        match slot.state {
            SlotState::InUse { .. } if slot.generation == handle.generation => Ok(()),
            _ => Err(PoolError::Stale { handle }),
        }
    }

    /// Borrow the value of a live slot.
    pub fn get(&self, handle: Handle) -> Result<&T, PoolError> {
        self.validate(handle)?;
        match &self.slots[handle.index as usize].state {
            SlotState::InUse { value, .. } => Ok(value),
            SlotState::Free { .. } => Err(PoolError::Stale { handle }),
        }
    }

    /// Mutably borrow the value of a live slot.
    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T, PoolError> {
        self.validate(handle)?;
        match &mut self.slots[handle.index as usize].state {
            SlotState::InUse { value, .. } => Ok(value),
            SlotState::Free { .. } => Err(PoolError::Stale { handle }),
        }
    }

    /// Bucket a live slot is linked into, if any.
    pub fn bucket_of(&self, handle: Handle) -> Result<Option<usize>, PoolError> {
        self.validate(handle)?;
        match self.slots[handle.index as usize].state {
            SlotState::InUse { bucket, .. } => Ok(bucket),
            SlotState::Free { .. } => Err(PoolError::Stale { handle }),
        }
    }

    /// Iterate over live slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match &slot.state {
            SlotState::InUse { value, .. } => Some((
                Handle {
                    index: i as u32,
                    generation: slot.generation,
                },
                value,
            )),
            SlotState::Free { .. } => None,
        })
    }

    fn chain_next(&self, index: u32) -> Option<u32> {
        match self.slots[index as usize].state {
            SlotState::InUse { chain_next, .. } => chain_next,
            SlotState::Free { .. } => None,
        }
    }

    fn check_bucket(&self, bucket: usize) -> Result<(), PoolError> {
        if bucket < self.buckets.len() {
            Ok(())
        } else {
            Err(PoolError::BucketOutOfRange {
                bucket,
                bucket_count: self.buckets.len(),
            })
        }
    }
}
