use thiserror::Error;

/// Errors that can occur when inserting items into a pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Every slot in the pool already holds an item, so nothing more can be inserted
    /// until an item is removed.
    ///
    /// This is a normal runtime condition for a fixed-capacity pool, not a defect.
    /// Callers are expected to check for it and react (e.g. back off, evict, or fail
    /// the higher-level request).
    #[error("pool is exhausted: all {capacity} slots hold an item")]
    Exhausted {
        /// Total slot count of the pool that rejected the insertion.
        capacity: usize,
    },
}

/// A specialized `Result` type for pool insertion operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn exhausted_names_capacity() {
        let error = Error::Exhausted { capacity: 16 };

        assert_eq!(
            error.to_string(),
            "pool is exhausted: all 16 slots hold an item"
        );
    }
}
