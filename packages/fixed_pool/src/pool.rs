use std::alloc::{Layout, alloc, dealloc};
use std::any::type_name;
use std::pin::Pin;
use std::ptr::NonNull;
use std::{mem, thread};

use crate::{DropPolicy, Error, FixedPoolBuilder, Result};

/// An object pool of compile-time fixed capacity that guarantees pinning of its items.
///
/// The pool reserves storage for all `CAPACITY` slots up front, when the pool is created.
/// Inserting and removing items never allocates or releases memory, which makes the pool
/// suitable as a hot-path allocation primitive. The price of this is that the pool can run
/// out of slots: insertion is fallible and reports [exhaustion][Error::Exhausted] through
/// its return value, to be handled by the caller as a normal runtime condition.
///
/// There are multiple ways to insert items into the pool:
///
/// * [`insert()`][3] - inserts a value and returns the key. This is the simplest way to add an
///   item but requires you to later look it up by the key. That lookup is fast but not free.
/// * [`begin_insert().insert()`][4] - returns a shared reference to the inserted item; you may
///   also obtain the key in advance from the inserter through [`key()`][7] which may be
///   useful if the item needs to know its own key in the pool.
/// * [`begin_insert().insert_mut()`][5] - returns an exclusive reference to the inserted item;
///   you may also obtain the key in advance from the inserter through [`key()`][7].
///
/// Reserving a slot via [`begin_insert()`][6] before constructing the value also guarantees
/// that a value constructor which fails cannot affect the pool - the slot only transitions
/// to occupied once a fully constructed value is moved in.
///
/// # Out of band access
///
/// The pool does not keep references to the items or create new references unless you
/// explicitly ask for one, so it is valid to access items via pointers and to create custom
/// references (including exclusive references) to items from unsafe code even when not holding
/// an exclusive reference to the pool, as long as you do not ask the pool to concurrently
/// create a conflicting reference (e.g. via [`get()`][1] or [`get_mut()`][2]).
///
/// You can obtain pointers to the items via the `Pin<&T>` or `Pin<&mut T>` returned by the
/// [`get()`][1] and [`get_mut()`][2] methods, respectively. These pointers are guaranteed to
/// be valid until the item is removed from the pool or the pool itself is dropped. The pool
/// never resizes or relocates its storage.
///
/// [1]: Self::get
/// [2]: Self::get_mut
/// [3]: Self::insert
/// [4]: FixedPoolInserter::insert
/// [5]: FixedPoolInserter::insert_mut
/// [6]: Self::begin_insert
/// [7]: FixedPoolInserter::key
#[derive(Debug)]
pub struct FixedPool<T, const CAPACITY: usize> {
    first_entry_ptr: NonNull<Entry<T>>,

    /// Index of the next free slot in the pool. Think of this as a virtual stack of the most
    /// recently freed slots, with the stack entries stored in the pool entries themselves.
    /// Also known as intrusive freelist. This will point out of bounds if the pool is full.
    next_free_index: usize,

    /// The total number of items in the pool. Together with the freelist this maintains the
    /// partition invariant: every slot is either occupied (counted here) or vacant (reachable
    /// through the freelist), never both.
    count: usize,

    drop_policy: DropPolicy,
}

/// A key that can be used to reference an item in a [`FixedPool`].
///
/// Keys are opaque handles returned by [`FixedPool::insert()`] and related methods.
/// They provide efficient access to items in the pool via [`FixedPool::get()`] and
/// [`FixedPool::get_mut()`], and are required to release an item via
/// [`FixedPool::remove()`].
///
/// # Key reuse
///
/// Keys may be reused by the pool after an item is removed. This means that using a key
/// after its associated item has been removed may access a different item or panic.
/// Which vacant slot a new insertion picks is implementation-defined; callers must not
/// depend on any particular order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Key {
    index: usize,
}

#[derive(Debug)]
enum Entry<T> {
    Occupied { value: T },

    Vacant { next_free_index: usize },
}

impl<T, const CAPACITY: usize> FixedPool<T, CAPACITY> {
    /// # Panics
    ///
    /// Panics if `T` is zero-sized or `CAPACITY` is zero.
    #[must_use]
    pub(crate) fn new_inner(drop_policy: DropPolicy) -> Self {
        assert!(CAPACITY > 0, "FixedPool must have non-zero capacity");
        assert!(
            size_of::<T>() > 0,
            "FixedPool must have non-zero item size"
        );
        assert!(
            CAPACITY < usize::MAX,
            "FixedPool capacity must be less than usize::MAX"
        );

        // SAFETY: The layout must be valid for the target type (sure, we calculate it correctly)
        // and not zero-sized (guarded by assertions above).
        let first_entry_ptr = NonNull::new(unsafe { alloc(Self::layout()).cast::<Entry<T>>() })
            .expect(
                "we do not intend to handle allocation failure as a real possibility - OOM is panic",
            );

        // Initialize all slots to `Vacant` to start with - the free set covers every index
        // and no item is constructed at pool creation time.
        for index in 0..CAPACITY {
            // SAFETY: We ensure in `layout()` that there is enough space for all entries up to
            // our indicated capacity.
            let entry = unsafe { first_entry_ptr.add(index) };

            // SAFETY: The pointer is valid for writes and of the right type, so all is well.
            unsafe {
                entry.as_ptr().write(Entry::Vacant {
                    // For the last slot, this will point out of bounds, which is fine.
                    // It means the pool is full and no more items can be inserted.
                    next_free_index: index
                        .checked_add(1)
                        .expect("guarded by capacity < usize::MAX above"),
                });
            }
        }

        Self {
            first_entry_ptr,
            next_free_index: 0,
            count: 0,
            drop_policy,
        }
    }

    /// Creates a new [`FixedPool`] with the default configuration.
    ///
    /// All `CAPACITY` slots start vacant. Storage for every slot is reserved immediately;
    /// no further memory is allocated over the lifetime of the pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<String, 8>::new();
    ///
    /// assert_eq!(pool.len(), 0);
    /// assert_eq!(pool.capacity(), 8);
    ///
    /// let key = pool.insert("Hello".to_string()).unwrap();
    /// assert_eq!(&*pool.get(key), "Hello");
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized or `CAPACITY` is zero.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`FixedPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::{DropPolicy, FixedPool};
    ///
    /// let pool = FixedPool::<u32, 16>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    ///
    /// assert!(pool.is_empty());
    /// ```
    pub fn builder() -> FixedPoolBuilder<T, CAPACITY> {
        FixedPoolBuilder::new()
    }

    #[must_use]
    fn layout() -> Layout {
        Layout::array::<Entry<T>>(CAPACITY).expect("simple flat array layout must be calculable")
    }

    /// The number of items the pool can hold.
    ///
    /// This is a constant for the lifetime of the pool - the pool never grows or shrinks.
    #[must_use]
    #[expect(
        clippy::unused_self,
        reason = "kept as a method for API symmetry with len()"
    )]
    pub fn capacity(&self) -> usize {
        CAPACITY
    }

    /// The number of items in the pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<i32, 4>::new();
    /// assert_eq!(pool.len(), 0);
    ///
    /// let key1 = pool.insert(42).unwrap();
    /// assert_eq!(pool.len(), 1);
    ///
    /// let key2 = pool.insert(24).unwrap();
    /// assert_eq!(pool.len(), 2);
    ///
    /// pool.remove(key1);
    /// assert_eq!(pool.len(), 1);
    /// # pool.remove(key2);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the pool holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether every slot holds an item, meaning the next insertion will fail.
    ///
    /// Exhaustion is a normal runtime condition for a fixed-capacity pool. This method
    /// lets callers check for it without attempting an insertion.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<u32, 1>::new();
    /// assert!(!pool.is_full());
    ///
    /// let key = pool.insert(42).unwrap();
    /// assert!(pool.is_full());
    /// assert!(pool.insert(43).is_err());
    ///
    /// pool.remove(key);
    /// assert!(!pool.is_full());
    /// ```
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.next_free_index >= CAPACITY
    }

    fn entry(&self, index: usize) -> &Entry<T> {
        let entry_ptr = self.entry_ptr(index);

        // SAFETY: We ensured in the ctor that every entry is initialized and ensured above
        // that the pointer is valid, so we can safely dereference it.
        unsafe { entry_ptr.as_ref() }
    }

    #[expect(clippy::needless_pass_by_ref_mut, reason = "false positive")]
    fn entry_mut(&mut self, index: usize) -> &mut Entry<T> {
        let mut entry_ptr = self.entry_ptr(index);

        // SAFETY: We ensured in the ctor that every entry is initialized and ensured above
        // that the pointer is valid, so we can safely dereference it.
        unsafe { entry_ptr.as_mut() }
    }

    fn entry_ptr(&self, index: usize) -> NonNull<Entry<T>> {
        assert!(
            index < CAPACITY,
            "slot {index} index out of bounds in pool of {}",
            type_name::<T>()
        );

        // SAFETY: Guarded by bounds check above, so we are guaranteed that the pointer is valid.
        unsafe { self.first_entry_ptr.add(index) }
    }

    /// Gets a pinned reference to an item in the pool by its key.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<String, 4>::new();
    /// let key = pool.insert("Hello, World!".to_string()).unwrap();
    ///
    /// let item = pool.get(key);
    /// assert_eq!(&*item, "Hello, World!");
    /// # pool.remove(key);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the key is not associated with an item. Using a stale or foreign key is a
    /// contract violation by the caller, not a recoverable condition.
    #[must_use]
    pub fn get(&self, key: Key) -> Pin<&T> {
        match self.entry(key.index) {
            // SAFETY: This pool guarantees pinning. At no point do we
            // provide non-pinned references to the items.
            Entry::Occupied { value } => unsafe { Pin::new_unchecked(value) },
            Entry::Vacant { .. } => panic!(
                "get({}) slot was vacant in pool of {}",
                key.index,
                type_name::<T>()
            ),
        }
    }

    /// Gets an exclusive pinned reference to an item in the pool by its key.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<String, 4>::new();
    /// let key = pool.insert("Hello".to_string()).unwrap();
    ///
    /// let mut item = pool.get_mut(key);
    /// item.as_mut().get_mut().push_str(", World!");
    ///
    /// assert_eq!(&*pool.get(key), "Hello, World!");
    /// # pool.remove(key);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the key is not associated with an item.
    #[must_use]
    pub fn get_mut(&mut self, key: Key) -> Pin<&mut T> {
        match self.entry_mut(key.index) {
            // SAFETY: This pool guarantees pinning. At no point do we
            // provide non-pinned references to the items.
            Entry::Occupied { value } => unsafe { Pin::new_unchecked(value) },
            Entry::Vacant { .. } => panic!(
                "get_mut({}) slot was vacant in pool of {}",
                key.index,
                type_name::<T>()
            ),
        }
    }

    /// Creates an inserter that enables advanced techniques for inserting an item into the pool.
    ///
    /// Using an inserter allows you to obtain the key before the item is inserted and
    /// immediately obtain a pinned reference to the item. It also reserves nothing: an
    /// abandoned inserter leaves the pool unchanged, so a value constructor that fails
    /// between `begin_insert()` and [`FixedPoolInserter::insert()`] cannot leak a slot.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<String, 4>::new();
    ///
    /// let inserter = pool.begin_insert().unwrap();
    /// let key = inserter.key();
    ///
    /// let item = inserter.insert("Hello".to_string());
    /// assert_eq!(&*item, "Hello");
    ///
    /// assert_eq!(&*pool.get(key), "Hello");
    /// # pool.remove(key);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] if every slot already holds an item.
    pub fn begin_insert<'a, 'b>(&'a mut self) -> Result<FixedPoolInserter<'b, T, CAPACITY>>
    where
        'a: 'b,
    {
        #[cfg(debug_assertions)]
        self.integrity_check();

        if self.is_full() {
            return Err(Error::Exhausted { capacity: CAPACITY });
        }

        // Peek at the top of the stack of free entries. The freelist itself is only
        // updated once a value is actually written into the slot.
        let next_free_index = self.next_free_index;

        Ok(FixedPoolInserter {
            pool: self,
            index: next_free_index,
        })
    }

    /// Inserts an item into the pool and returns its key.
    ///
    /// The item stays pinned at its slot until it is removed. The returned key can be used
    /// to access the item via [`get()`] or [`get_mut()`] and to release it via [`remove()`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<i32, 4>::new();
    ///
    /// let key = pool.insert(42).unwrap();
    /// assert_eq!(*pool.get(key), 42);
    /// # pool.remove(key);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] if every slot already holds an item. The given value is
    /// dropped in that case; callers that must not lose the value should reserve a slot
    /// first via [`begin_insert()`].
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<i32, 1>::new();
    ///
    /// let key = pool.insert(1).unwrap();
    /// assert!(pool.insert(2).is_err());
    ///
    /// // Removing an item makes the slot available again.
    /// pool.remove(key);
    /// let key = pool.insert(3).unwrap();
    /// assert_eq!(*pool.get(key), 3);
    /// # pool.remove(key);
    /// ```
    ///
    /// [`get()`]: Self::get
    /// [`get_mut()`]: Self::get_mut
    /// [`remove()`]: Self::remove
    /// [`begin_insert()`]: Self::begin_insert
    pub fn insert(&mut self, value: T) -> Result<Key> {
        let inserter = self.begin_insert()?;
        let key = inserter.key();
        inserter.insert(value);
        Ok(key)
    }

    /// Removes an item from the pool by its key.
    ///
    /// The item is dropped in place and its slot returns to the free set, eligible for
    /// reuse by a future insertion. Any pointers to the item become invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::FixedPool;
    ///
    /// let mut pool = FixedPool::<String, 4>::new();
    /// let key = pool.insert("Hello".to_string()).unwrap();
    ///
    /// assert_eq!(pool.len(), 1);
    ///
    /// pool.remove(key);
    ///
    /// assert_eq!(pool.len(), 0);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the key is not associated with an item. A key that is out of bounds,
    /// already removed, or from a different pool is a contract violation by the caller;
    /// silently ignoring it would corrupt the occupied/vacant partition, so it is
    /// diagnosed as early as possible instead.
    pub fn remove(&mut self, key: Key) {
        let next_free_index = self.next_free_index;

        {
            let entry = self.entry_mut(key.index);

            if matches!(entry, Entry::Vacant { .. }) {
                panic!(
                    "remove({}) slot was vacant in pool of {}",
                    key.index,
                    type_name::<T>()
                );
            }

            // Replacing the occupied entry drops the contained value in place.
            *entry = Entry::Vacant { next_free_index };
        }

        // Push the removed item's slot onto the free stack.
        self.next_free_index = key.index;

        self.count = self
            .count
            .checked_sub(1)
            .expect("we asserted above that the slot is occupied so count must be non-zero");
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        let mut observed_is_vacant: [Option<bool>; CAPACITY] = [None; CAPACITY];
        let mut observed_next_free_index: [Option<usize>; CAPACITY] = [None; CAPACITY];
        let mut observed_occupied_count: usize = 0;

        for index in 0..CAPACITY {
            match self.entry(index) {
                Entry::Occupied { .. } => {
                    *observed_is_vacant
                        .get_mut(index)
                        .expect("guarded by loop range") = Some(false);
                    observed_occupied_count = observed_occupied_count
                        .checked_add(1)
                        .expect("guarded by capacity < usize::MAX in pool ctor");
                }
                Entry::Vacant { next_free_index } => {
                    *observed_is_vacant
                        .get_mut(index)
                        .expect("guarded by loop range") = Some(true);
                    *observed_next_free_index
                        .get_mut(index)
                        .expect("guarded by loop range") = Some(*next_free_index);
                }
            }
        }

        assert!(
            matches!(
                observed_is_vacant.get(self.next_free_index),
                None | Some(Some(true))
            ),
            "self.next_free_index points to an occupied slot {} in pool of {}",
            self.next_free_index,
            type_name::<T>()
        );

        assert!(
            self.count == observed_occupied_count,
            "self.count {} does not match the observed occupied count {} in pool of {}",
            self.count,
            observed_occupied_count,
            type_name::<T>()
        );

        // Verify that all vacant entries form a valid freelist.
        for index in 0..CAPACITY {
            if !observed_is_vacant
                .get(index)
                .expect("guarded by loop range")
                .expect("we just populated this above")
            {
                continue;
            }

            let next_free_index = observed_next_free_index
                .get(index)
                .expect("guarded by loop range")
                .expect("we just populated this above for vacant entries");

            if next_free_index == CAPACITY {
                // This is fine - it means the pool became full once this slot was filled.
                continue;
            }

            assert!(
                next_free_index <= CAPACITY,
                "slot {} is vacant but has an out-of-bounds next_free_index {} in pool of {}",
                index,
                next_free_index,
                type_name::<T>()
            );

            assert!(
                observed_is_vacant
                    .get(next_free_index)
                    .expect("guarded by previous assertion")
                    .expect("we just populated this above"),
                "slot {} is vacant but its next_free_index {} points to an occupied slot in pool of {}",
                index,
                next_free_index,
                type_name::<T>()
            );
        }
    }
}

impl<T, const CAPACITY: usize> Default for FixedPool<T, CAPACITY> {
    /// Creates a new [`FixedPool`] with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized or `CAPACITY` is zero.
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> Drop for FixedPool<T, CAPACITY> {
    fn drop(&mut self) {
        let was_empty = self.is_empty();

        // Set them all to `Vacant` - this drops the value of every occupied slot exactly
        // once and is a no-op for slots that are already vacant.
        for index in 0..CAPACITY {
            let entry = self.entry_mut(index);

            *entry = Entry::Vacant {
                // Intentionally anomalous - we are dropping so do not expect any more usage.
                next_free_index: usize::MAX,
            };
        }

        // SAFETY: The layout must match between alloc and dealloc. It does.
        unsafe {
            dealloc(self.first_entry_ptr.as_ptr().cast(), Self::layout());
        }

        // We do this check at the end so we clean up the memory first. Mostly to make Miri happy.
        // As we are going to panic anyway if something is wrong, there is little good to expect
        // for the app itself.
        //
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if self.drop_policy == DropPolicy::MustNotDropItems && !thread::panicking() {
            assert!(
                was_empty,
                "dropped a non-empty pool of {} with a policy that says it must be empty when dropped",
                type_name::<T>()
            );
        }
    }
}

// SAFETY: Yes, there are raw pointers involved here but nothing inherently non-thread-mobile
// about it, so as long as T itself can move between threads, the pool can do so, too.
unsafe impl<T: Send, const CAPACITY: usize> Send for FixedPool<T, CAPACITY> {}

/// An inserter for a [`FixedPool`], enabling advanced item insertion scenarios.
///
/// The inserter allows you to:
/// - Obtain the key before inserting the item via [`key()`]
/// - Insert an item and get immediate access via [`insert()`] or [`insert_mut()`]
/// - Check for exhaustion before constructing the value to insert
///
/// Created by calling [`FixedPool::begin_insert()`]. An abandoned inserter leaves the
/// pool unchanged.
///
/// # Example
///
/// ```rust
/// use fixed_pool::FixedPool;
///
/// let mut pool = FixedPool::<String, 4>::new();
///
/// let inserter = pool.begin_insert().unwrap();
/// let key = inserter.key();
///
/// // The item can learn its own key during construction.
/// let item = inserter.insert(format!("item {key:?}"));
/// assert!(item.starts_with("item"));
/// # pool.remove(key);
/// ```
///
/// [`key()`]: Self::key
/// [`insert()`]: Self::insert
/// [`insert_mut()`]: Self::insert_mut
#[derive(Debug)]
pub struct FixedPoolInserter<'p, T, const CAPACITY: usize> {
    pool: &'p mut FixedPool<T, CAPACITY>,

    /// Index at which the item will be inserted.
    index: usize,
}

impl<'p, T, const CAPACITY: usize> FixedPoolInserter<'p, T, CAPACITY> {
    /// Inserts an item and returns a pinned reference to it.
    ///
    /// This provides immediate access to the inserted item without requiring a separate lookup.
    pub fn insert<'v>(self, value: T) -> Pin<&'v T>
    where
        'p: 'v,
    {
        // Inserting an item always results in an exclusive reference, so this non-mut method
        // simply downgrades the exclusive reference to a shared one.
        self.insert_mut(value).into_ref()
    }

    /// Inserts an item and returns a pinned exclusive reference to it.
    ///
    /// This provides immediate mutable access to the inserted item without requiring a
    /// separate lookup.
    pub fn insert_mut<'v>(self, value: T) -> Pin<&'v mut T>
    where
        'p: 'v,
    {
        let mut entry_ptr = self.pool.entry_ptr(self.index);

        // This detaches the lifetime of the pool from the lifetime of the entry for the purpose
        // of this method. We restore the relationship for the caller via function signature.
        //
        // This is because we have to return a reference to the filled entry, which borrows the
        // pool and thereby locks the pool. However, in this function that would prevent the pool
        // field updates we need to do.
        //
        // SAFETY: We are not allowed to perform operations on the pool that would create another
        // reference to the entry (because we hold an exclusive reference). We do not do that, and
        // the pool by design does not create/hold permanent references to its entries.
        let entry = unsafe { entry_ptr.as_mut() };

        let previous_entry = mem::replace(entry, Entry::Occupied { value });

        self.pool.next_free_index = match previous_entry {
            Entry::Vacant { next_free_index } => next_free_index,
            Entry::Occupied { .. } => panic!(
                "slot {} was not vacant when we inserted into it in pool of {}",
                self.index,
                type_name::<T>()
            ),
        };

        let pinned_ref: Pin<&'v mut T> = match entry {
            // SAFETY: Items are always pinned - that is the point of this pool.
            Entry::Occupied { value } => unsafe { Pin::new_unchecked(value) },
            Entry::Vacant { .. } => panic!(
                "slot {} was not occupied after we inserted into it in pool of {}",
                self.index,
                type_name::<T>()
            ),
        };

        self.pool.count = self
            .pool
            .count
            .checked_add(1)
            .expect("guarded by capacity < usize::MAX in pool ctor");

        pinned_ref
    }

    /// The key of the item that will be inserted by this inserter.
    ///
    /// This allows you to obtain the key before actually inserting the item, which can be
    /// useful when the item needs to know its own key during construction.
    ///
    /// If the inserter is abandoned, the key may be used by a different item inserted later.
    #[must_use]
    pub fn key(&self) -> Key {
        Key { index: self.index }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::arithmetic_side_effects,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use std::{ptr, thread};

    use super::*;

    /// Counts value constructions and drops, to verify construction/destruction pairing.
    #[derive(Debug, Default)]
    struct Counters {
        created: Cell<usize>,
        dropped: Cell<usize>,
    }

    #[derive(Debug)]
    struct Counted {
        counters: Rc<Counters>,
    }

    impl Counted {
        fn new(counters: &Rc<Counters>) -> Self {
            counters.created.set(counters.created.get() + 1);

            Self {
                counters: Rc::clone(counters),
            }
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.counters.dropped.set(self.counters.dropped.get() + 1);
        }
    }

    #[test]
    fn smoke_test() {
        let mut pool = FixedPool::<u32, 3>::new();

        assert_eq!(pool.len(), 0);
        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 3);

        let key_a = pool.insert(42).unwrap();
        let key_b = pool.insert(43).unwrap();
        let key_c = pool.insert(44).unwrap();

        assert_eq!(pool.len(), 3);
        assert!(!pool.is_empty());

        assert_eq!(*pool.get(key_a), 42);
        assert_eq!(*pool.get(key_b), 43);
        assert_eq!(*pool.get(key_c), 44);

        pool.remove(key_b);

        assert_eq!(pool.len(), 2);

        let key_d = pool.insert(45).unwrap();

        assert_eq!(*pool.get(key_a), 42);
        assert_eq!(*pool.get(key_c), 44);
        assert_eq!(*pool.get(key_d), 45);

        assert!(pool.is_full());
    }

    #[test]
    fn exhausted_after_capacity_inserts() {
        let mut pool = FixedPool::<u32, 3>::new();

        for value in 0..3 {
            _ = pool.insert(value).unwrap();
        }

        assert!(pool.is_full());

        let error = pool.insert(1234).unwrap_err();
        assert!(matches!(error, Error::Exhausted { capacity: 3 }));

        // Exhaustion must leave the pool fully intact.
        assert_eq!(pool.len(), 3);
        assert!(pool.is_full());
    }

    #[test]
    fn begin_insert_when_full_fails_before_value_exists() {
        let counters = Rc::new(Counters::default());
        let mut pool = FixedPool::<Counted, 1>::new();

        _ = pool.insert(Counted::new(&counters)).unwrap();

        // The exhaustion check happens before any value construction.
        assert!(pool.begin_insert().is_err());

        assert_eq!(counters.created.get(), 1);
        assert_eq!(counters.dropped.get(), 0);
    }

    #[test]
    fn insert_when_full_drops_the_rejected_value() {
        let counters = Rc::new(Counters::default());
        let mut pool = FixedPool::<Counted, 1>::new();

        _ = pool.insert(Counted::new(&counters)).unwrap();
        assert!(pool.insert(Counted::new(&counters)).is_err());

        // The rejected value was constructed by the caller and dropped by the error path.
        // The item already in the pool is untouched.
        assert_eq!(counters.created.get(), 2);
        assert_eq!(counters.dropped.get(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn begin_insert_returns_correct_key() {
        let mut pool = FixedPool::<u32, 3>::new();

        // We expect that we insert items in order, from the start (0, 1, 2, ...).

        let inserter = pool.begin_insert().unwrap();
        let key = inserter.key();
        assert_eq!(key, Key { index: 0 });
        inserter.insert(10);
        assert_eq!(*pool.get(key), 10);

        let inserter = pool.begin_insert().unwrap();
        let key = inserter.key();
        assert_eq!(key, Key { index: 1 });
        inserter.insert(11);
        assert_eq!(*pool.get(key), 11);

        let inserter = pool.begin_insert().unwrap();
        let key = inserter.key();
        assert_eq!(key, Key { index: 2 });
        inserter.insert(12);
        assert_eq!(*pool.get(key), 12);
    }

    #[test]
    fn abandoned_inserter_is_noop() {
        let mut pool = FixedPool::<u32, 3>::new();

        // If you abandon an inserter, nothing happens.
        let inserter = pool.begin_insert().unwrap();
        assert_eq!(inserter.key(), Key { index: 0 });

        let inserter = pool.begin_insert().unwrap();
        assert_eq!(inserter.key(), Key { index: 0 });
        _ = inserter.insert(20);

        assert_eq!(*pool.get(Key { index: 0 }), 20);

        // There must still be room for 2 more.
        _ = pool.insert(123).unwrap();
        _ = pool.insert(456).unwrap();
    }

    #[test]
    fn remove_makes_room() {
        let mut pool = FixedPool::<u32, 3>::new();

        let a = pool.insert(42).unwrap();
        let b = pool.insert(43).unwrap();
        let c = pool.insert(44).unwrap();

        pool.remove(b);

        let d = pool.insert(45).unwrap();

        assert_eq!(*pool.get(a), 42);
        assert_eq!(*pool.get(c), 44);
        assert_eq!(*pool.get(d), 45);
    }

    #[test]
    fn reuse_moves_in_a_fresh_value() {
        let counters = Rc::new(Counters::default());
        let mut pool = FixedPool::<Counted, 2>::new();

        let key = pool.insert(Counted::new(&counters)).unwrap();
        pool.remove(key);

        assert_eq!(counters.created.get(), 1);
        assert_eq!(counters.dropped.get(), 1);

        // The slot may be reused but the value in it must be a fresh construction.
        _ = pool.insert(Counted::new(&counters)).unwrap();

        assert_eq!(counters.created.get(), 2);
        assert_eq!(counters.dropped.get(), 1);
    }

    #[test]
    fn items_stay_pinned_across_churn() {
        let mut pool = FixedPool::<u32, 3>::new();

        let key_a = pool.insert(42).unwrap();
        let a_before = ptr::from_ref(pool.get(key_a).get_ref());

        let key_b = pool.insert(43).unwrap();
        pool.remove(key_b);
        let key_c = pool.insert(44).unwrap();

        let a_after = ptr::from_ref(pool.get(key_a).get_ref());
        assert!(ptr::eq(a_before, a_after));

        pool.remove(key_a);
        pool.remove(key_c);
    }

    #[test]
    #[should_panic]
    fn double_remove_panics() {
        let mut pool = FixedPool::<u32, 3>::new();

        let key = pool.insert(42).unwrap();

        pool.remove(key);
        pool.remove(key);
    }

    #[test]
    #[should_panic]
    fn remove_vacant_panics() {
        let mut pool = FixedPool::<u32, 3>::new();

        pool.remove(Key { index: 1 });
    }

    #[test]
    #[should_panic]
    fn remove_out_of_bounds_panics() {
        let mut pool = FixedPool::<u32, 3>::new();

        _ = pool.insert(42).unwrap();

        pool.remove(Key { index: 1234 });
    }

    #[test]
    #[should_panic]
    fn get_vacant_panics() {
        let pool = FixedPool::<u32, 3>::new();

        _ = pool.get(Key { index: 1 });
    }

    #[test]
    #[should_panic]
    fn get_mut_vacant_panics() {
        let mut pool = FixedPool::<u32, 3>::new();

        _ = pool.get_mut(Key { index: 1 });
    }

    #[test]
    #[should_panic]
    fn get_out_of_bounds_panics() {
        let mut pool = FixedPool::<u32, 3>::new();

        _ = pool.insert(42).unwrap();
        _ = pool.get(Key { index: 1234 });
    }

    #[test]
    fn calls_drop_on_remove() {
        struct Droppable {
            dropped: Rc<Cell<bool>>,
        }

        impl Drop for Droppable {
            fn drop(&mut self) {
                self.dropped.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let mut pool = FixedPool::<Droppable, 3>::new();

        let a = pool
            .insert(Droppable {
                dropped: Rc::clone(&dropped),
            })
            .unwrap();
        pool.remove(a);

        assert!(dropped.get());
    }

    #[test]
    fn drop_runs_one_drop_per_live_item() {
        let counters = Rc::new(Counters::default());

        {
            let mut pool = FixedPool::<Counted, 4>::new();

            _ = pool.insert(Counted::new(&counters)).unwrap();
            _ = pool.insert(Counted::new(&counters)).unwrap();
        }

        // Two live items at teardown, two drops - vacant slots contribute nothing.
        assert_eq!(counters.created.get(), 2);
        assert_eq!(counters.dropped.get(), 2);
    }

    #[test]
    fn end_to_end_capacity_three() {
        let counters = Rc::new(Counters::default());

        {
            let mut pool = FixedPool::<Counted, 3>::new();

            let _first = pool.insert(Counted::new(&counters)).unwrap();
            let second = pool.insert(Counted::new(&counters)).unwrap();
            let _third = pool.insert(Counted::new(&counters)).unwrap();

            assert_eq!(pool.len(), 3);
            assert_eq!(counters.created.get(), 3);
            assert_eq!(counters.dropped.get(), 0);

            // A fourth insertion is rejected; the rejected value is dropped.
            assert!(pool.insert(Counted::new(&counters)).is_err());
            assert_eq!(counters.created.get(), 4);
            assert_eq!(counters.dropped.get(), 1);

            pool.remove(second);
            assert_eq!(pool.len(), 2);
            assert_eq!(counters.dropped.get(), 2);

            // One more insertion succeeds, reusing the freed slot.
            _ = pool.insert(Counted::new(&counters)).unwrap();
            assert_eq!(pool.len(), 3);
            assert_eq!(counters.created.get(), 5);
            assert!(pool.is_full());
        }

        // Teardown drops each of the three live items exactly once.
        assert_eq!(counters.dropped.get(), 5);
    }

    #[test]
    fn fill_drain_refill() {
        let mut pool = FixedPool::<usize, 8>::new();

        let keys = (0..8)
            .map(|value| pool.insert(value).unwrap())
            .collect::<Vec<_>>();

        assert!(pool.is_full());
        assert_eq!(pool.len(), 8);

        for key in keys {
            pool.remove(key);
        }

        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);

        let keys = (0..8)
            .map(|value| pool.insert(value * 10).unwrap())
            .collect::<Vec<_>>();

        assert!(pool.is_full());

        for (i, key) in keys.iter().enumerate() {
            assert_eq!(*pool.get(*key), i * 10);
        }
    }

    #[test]
    fn in_refcell_works_fine() {
        let pool = RefCell::new(FixedPool::<u32, 3>::new());

        {
            let mut pool = pool.borrow_mut();
            let a = pool.insert(42).unwrap();
            let b = pool.insert(43).unwrap();
            let c = pool.insert(44).unwrap();

            assert_eq!(*pool.get(a), 42);
            assert_eq!(*pool.get(b), 43);
            assert_eq!(*pool.get(c), 44);

            pool.remove(b);

            let d = pool.insert(45).unwrap();

            assert_eq!(*pool.get(a), 42);
            assert_eq!(*pool.get(c), 44);
            assert_eq!(*pool.get(d), 45);
        }

        {
            let pool = pool.borrow();
            assert!(pool.is_full());
        }
    }

    #[test]
    fn multithreaded_via_mutex() {
        let pool = Arc::new(Mutex::new(FixedPool::<u32, 3>::new()));

        let a;
        let b;
        let c;

        {
            let mut pool = pool.lock().unwrap();
            a = pool.insert(42).unwrap();
            b = pool.insert(43).unwrap();
            c = pool.insert(44).unwrap();

            assert_eq!(*pool.get(a), 42);
            assert_eq!(*pool.get(b), 43);
            assert_eq!(*pool.get(c), 44);
        }

        let pool_clone = Arc::clone(&pool);
        let handle = thread::spawn(move || {
            let mut pool = pool_clone.lock().unwrap();

            pool.remove(b);

            let d = pool.insert(45).unwrap();

            assert_eq!(*pool.get(a), 42);
            assert_eq!(*pool.get(c), 44);
            assert_eq!(*pool.get(d), 45);
        });

        handle.join().unwrap();

        let pool = pool.lock().unwrap();
        assert!(pool.is_full());
    }

    #[test]
    #[should_panic]
    fn drop_item_with_forbidden_to_drop_policy_panics() {
        let mut pool = FixedPool::<u32, 3>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        _ = pool.insert(123).unwrap();
    }

    #[test]
    fn drop_itemless_with_forbidden_to_drop_policy_ok() {
        drop(
            FixedPool::<u32, 3>::builder()
                .drop_policy(DropPolicy::MustNotDropItems)
                .build(),
        );
    }

    #[test]
    #[should_panic]
    fn zst_is_panic() {
        drop(FixedPool::<(), 3>::new());
    }

    #[test]
    #[should_panic]
    fn zero_capacity_is_panic() {
        drop(FixedPool::<usize, 0>::new());
    }
}
