//! Sharing one process-wide pool instance.
//!
//! Some programs want a single well-known pool that every component draws from. This
//! example models that as explicit lazily-initialized shared state: a `static` holding
//! the pool behind a `OnceLock`, with `instance()` as the single documented
//! initialization point. Repeated calls return the same pool; nothing else in the
//! program touches the `static` directly.
//!
//! Components that want to be testable should accept `&Mutex<MarkerPool>` as a
//! parameter instead of calling `instance()` themselves - then a test can hand them a
//! local pool, as `audit_pool()` demonstrates below.

use std::sync::{Mutex, OnceLock};

use fixed_pool::FixedPool;

/// Placeholder item type for the shared pool.
#[derive(Debug)]
struct Marker {
    id: u32,
}

const SHARED_POOL_CAPACITY: usize = 1024;

type MarkerPool = FixedPool<Marker, SHARED_POOL_CAPACITY>;

/// Returns the process-wide pool, creating it on first access.
///
/// This is the only place the shared pool is initialized. The pool lives for the
/// remainder of the process lifetime; the mutex provides the external synchronization
/// that the pool itself deliberately does not.
fn instance() -> &'static Mutex<MarkerPool> {
    static INSTANCE: OnceLock<Mutex<MarkerPool>> = OnceLock::new();

    INSTANCE.get_or_init(|| Mutex::new(MarkerPool::new()))
}

/// Reports slot usage for any pool - shared or test-local.
fn audit_pool(pool: &Mutex<MarkerPool>) -> (usize, usize) {
    let pool = pool.lock().expect("no panics while holding the lock");
    (pool.len(), pool.capacity())
}

fn main() {
    // First access creates the pool; later accesses return the same instance.
    let key = {
        let mut pool = instance().lock().expect("no panics while holding the lock");
        pool.insert(Marker { id: 1 }).expect("fresh pool has room")
    };

    {
        let pool = instance().lock().expect("no panics while holding the lock");
        println!("Inserted marker id {}", pool.get(key).id);
    }

    let (used, capacity) = audit_pool(instance());
    println!("Shared pool: {used} of {capacity} slots used");

    {
        let mut pool = instance().lock().expect("no panics while holding the lock");
        pool.remove(key);
    }

    // The same component logic works against a substitute instance, no global state
    // involved - this is what tests do instead of touching the shared pool.
    let local = Mutex::new(MarkerPool::new());
    {
        let mut pool = local.lock().expect("no panics while holding the lock");
        _ = pool.insert(Marker { id: 2 }).expect("fresh pool has room");
    }

    let (used, capacity) = audit_pool(&local);
    println!("Test-local pool: {used} of {capacity} slots used");
}
