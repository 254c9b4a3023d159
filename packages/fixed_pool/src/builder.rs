use std::marker::PhantomData;

use crate::{DropPolicy, FixedPool};

/// Builder for creating an instance of [`FixedPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`FixedPool::new()`][1] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use fixed_pool::{DropPolicy, FixedPool};
///
/// let pool = FixedPool::<u32, 64>::builder()
///     .drop_policy(DropPolicy::MayDropItems)
///     .build();
/// ```
///
/// [1]: FixedPool::new
#[must_use]
pub struct FixedPoolBuilder<T, const CAPACITY: usize> {
    drop_policy: DropPolicy,

    _item: PhantomData<T>,
}

impl<T, const CAPACITY: usize> std::fmt::Debug for FixedPoolBuilder<T, CAPACITY> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedPoolBuilder")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("capacity", &CAPACITY)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T, const CAPACITY: usize> FixedPoolBuilder<T, CAPACITY> {
    pub(crate) fn new() -> Self {
        Self {
            drop_policy: DropPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how
    /// to treat remaining items in the pool when the pool is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::{DropPolicy, FixedPool};
    ///
    /// let pool = FixedPool::<u32, 64>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    /// ```
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized or `CAPACITY` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::FixedPool;
    ///
    /// let pool = FixedPool::<u32, 64>::builder().build();
    /// ```
    #[must_use]
    pub fn build(self) -> FixedPool<T, CAPACITY> {
        FixedPool::new_inner(self.drop_policy)
    }
}
