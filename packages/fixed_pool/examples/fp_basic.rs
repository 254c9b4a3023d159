//! Basic usage of the `fixed_pool` crate:
//!
//! * Creating a pool.
//! * Adding items.
//! * Retrieving items.
//! * Removing items.

use fixed_pool::FixedPool;

fn main() {
    let mut pool = FixedPool::<String, 8>::new();

    // Inserting an item gives you a key that you can later use to look up the item again.
    // Insertion is fallible because the pool has a fixed number of slots.
    let alice_key = pool.insert("Alice".to_string()).expect("pool has room");
    let bob_key = pool.insert("Bob".to_string()).expect("pool has room");
    let charlie_key = pool.insert("Charlie".to_string()).expect("pool has room");

    println!(
        "Object pool contains {} items, with a fixed capacity of {}",
        pool.len(),
        pool.capacity()
    );

    // Retrieving items from a pool is fast, similar to `Vec[key]`.
    let alice = pool.get(alice_key);
    println!("Retrieved item: {alice}");

    pool.remove(bob_key);
    pool.remove(charlie_key);

    // Retrieving an item borrows the pool for as long as you use the item, so we have to
    // re-lookup `alice` here because otherwise the above `remove()` would be blocked.
    let alice = pool.get(alice_key);
    println!("Retrieved item after removal of other items: {alice}");

    // You can also modify the items in-place.
    let mut alice = pool.get_mut(alice_key);
    alice.push_str(" Smith");
    println!("Modified item: {alice}");
}
