//! Handling pool exhaustion as a normal runtime condition:
//!
//! * Filling a pool to capacity.
//! * Reacting to `Error::Exhausted` without panicking.
//! * Freeing a slot and retrying.

use fixed_pool::{Error, FixedPool};

const CONNECTION_LIMIT: usize = 4;

#[derive(Debug)]
struct Connection {
    id: u32,
}

fn main() {
    let mut pool = FixedPool::<Connection, CONNECTION_LIMIT>::new();

    // Fill every slot.
    let mut keys = Vec::with_capacity(CONNECTION_LIMIT);
    for id in 0..CONNECTION_LIMIT {
        let id = u32::try_from(id).expect("connection limit is a small constant");
        let key = pool.insert(Connection { id }).expect("pool has room");
        keys.push(key);
    }

    println!("Pool is full: {} of {} slots used", pool.len(), pool.capacity());

    // The next insertion is rejected on the return channel - no panic, no abort.
    match pool.insert(Connection { id: 99 }) {
        Ok(_) => unreachable!("the pool was full"),
        Err(Error::Exhausted { capacity }) => {
            println!("Insertion rejected: all {capacity} slots are in use");
        }
        Err(error) => println!("Unexpected error: {error}"),
    }

    // A caller that cannot afford to construct a throwaway value can reserve first.
    assert!(pool.begin_insert().is_err());

    // Releasing any slot makes the pool accept insertions again.
    let released = keys.swap_remove(1);
    pool.remove(released);

    let key = pool
        .insert(Connection { id: 100 })
        .expect("a slot was just released");
    println!("Inserted replacement connection id {}", pool.get(key).id);
}
