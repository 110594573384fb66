//! Guarded Turnstile
//!
//! This example shares one machine between several threads through a
//! ConcurrencyGuard.
//!
//! Key concepts:
//! - Submissions from many threads are applied one at a time
//! - A busy guard queues the trigger and returns `None` immediately
//! - Nothing submitted is ever dropped
//!
//! Run with: cargo run --example guarded_turnstile

use sidetrack::{label_enum, ConcurrencyGuard, MachineBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

label_enum! {
    enum Turnstile {
        Locked,
        Unlocked,
    }
}

label_enum! {
    enum Event {
        Coin,
        Push,
    }
}

const VISITORS: usize = 4;
const ROUNDS: usize = 25;

fn main() {
    println!("=== Guarded Turnstile ===\n");

    let coins = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&coins);

    let engine = MachineBuilder::new()
        .name("turnstile")
        .state(Turnstile::Locked)
        .transition(Event::Coin, Turnstile::Unlocked)
        // Pushing a locked turnstile does nothing.
        .ignoring()
        .done()
        .state(Turnstile::Unlocked)
        .transition(Event::Push, Turnstile::Locked)
        .self_loop(Event::Coin)
        .on_enter(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .done()
        .build(Turnstile::Locked)
        .unwrap();
    let guard = Arc::new(ConcurrencyGuard::new(engine));

    let visitors: Vec<_> = (0..VISITORS)
        .map(|visitor| {
            let guard = Arc::clone(&guard);
            thread::spawn(move || {
                let mut queued = 0;
                for _ in 0..ROUNDS {
                    for event in [Event::Coin, Event::Push] {
                        if guard.submit(event).unwrap().is_none() {
                            queued += 1;
                        }
                    }
                }
                println!("visitor {} had {} submissions queued or ignored", visitor, queued);
            })
        })
        .collect();
    for visitor in visitors {
        visitor.join().unwrap();
    }

    println!("\nCoins accepted: {}", coins.load(Ordering::SeqCst));
    println!("Expected:       {}", VISITORS * ROUNDS);
    println!("Pending:        {}", guard.pending());
    println!("Final state:    {}", guard.current_state());

    println!("\n=== Example Complete ===");
}
