//! Simple standalone example of replicated sequence usage.
//!
//! This example demonstrates the basic functionality of the sequence CRDT
//! in a simple, easy-to-understand scenario.
//!
//! Run with: cargo run --example simple

use std::sync::Arc;

use crdt_seq::{ExponentialStrategy, Outbox, Sequence};

fn main() {
    println!("=== Simple Sequence CRDT Example ===\n");

    // Create two replicas representing two users
    let alice_outbox = Arc::new(Outbox::new(1));
    let bob_outbox = Arc::new(Outbox::new(2));
    let mut alice = Sequence::with_upstream(1, ExponentialStrategy::new(), alice_outbox.clone());
    let mut bob = Sequence::with_upstream(2, ExponentialStrategy::new(), bob_outbox.clone());

    alice.subscribe(|change| println!("  [alice] {:?}", change));

    println!("Alice (site 1) and Bob (site 2) start editing a shopping list\n");

    println!("Alice adds three items:");
    for (i, item) in ["milk", "eggs", "bread"].iter().enumerate() {
        alice.insert(i, *item).unwrap();
    }
    println!("  Alice's list: {:?}", alice.content());

    // Bob concurrently starts his own list
    println!("\nBob concurrently adds two items:");
    bob.insert(0, "coffee").unwrap();
    bob.insert(1, "tea").unwrap();
    println!("  Bob's list: {:?}", bob.content());

    println!("\n--- Synchronizing Changes ---");
    let from_alice = alice_outbox.drain();
    let from_bob = bob_outbox.drain();
    for op in &from_bob {
        alice.apply(op);
    }
    for op in &from_alice {
        bob.apply(op);
    }

    println!("\n--- After Synchronization ---");
    println!("  Alice sees: {:?}", alice.content());
    println!("  Bob sees:   {:?}", bob.content());

    if alice.content() == bob.content() {
        println!("\n✓ SUCCESS: Both users converged to the same list!");
    } else {
        println!("\n✗ ERROR: Lists did not converge!");
    }

    println!("\n--- Technical Details ---");
    println!("The final ordering is determined by element identifiers:");
    for id in alice.identifiers() {
        println!("  {}", id);
    }

    // Demonstrate move and delete
    println!("\n=== Move and Delete Example ===");
    println!("Bob moves the first item to the end and deletes the new first item");
    bob.move_element(0, bob.size()).unwrap();
    bob.delete(0).unwrap();
    println!("  Bob's list: {:?}", bob.content());

    for op in bob_outbox.drain() {
        alice.apply(&op);
    }
    println!("  Alice's list: {:?}", alice.content());

    if alice.content() == bob.content() {
        println!("✓ Edits synchronized successfully!");
    }

    println!("\n=== Example Complete ===");
}
