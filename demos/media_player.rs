//! Media Player with Diversions
//!
//! This example walks a player through all three kinds of diversion state.
//!
//! Key concepts:
//! - Interrupts that hand control straight back
//! - A holding state that swallows input until its return trigger
//! - A reset interrupt that always lands on the same state
//! - Recording history with an observer
//!
//! Run with: cargo run --example media_player

use sidetrack::engine::HistoryRecorder;
use sidetrack::{label_enum, MachineBuilder};
use std::sync::Arc;

label_enum! {
    enum Player {
        Stopped,
        Playing,
        Buffering,
        Paused,
        Ejected,
    }
}

label_enum! {
    enum Input {
        Play,
        Stop,
        Stall,
        Pause,
        Resume,
        Eject,
    }
}

fn main() {
    println!("=== Media Player with Diversions ===\n");

    let recorder: Arc<HistoryRecorder<Input, Player>> = Arc::new(HistoryRecorder::new());

    let mut player = MachineBuilder::<Input, Player>::new()
        .name("player")
        .observe(recorder.clone())
        .state(Player::Stopped)
        .transition(Input::Play, Player::Playing)
        .done()
        .state(Player::Playing)
        .transition(Input::Stop, Player::Stopped)
        .on_enter(|ctx| {
            println!("  [hook] playing (via {}, from {})", ctx.trigger, ctx.source);
            Ok(())
        })
        .done()
        .interrupt(Player::Buffering, Input::Stall)
        .on_enter(|ctx| {
            println!("  [hook] buffering, will return to {}", ctx.source);
            Ok(())
        })
        .done()
        .holding(Player::Paused, Input::Pause, Input::Resume)
        .done()
        .reset_interrupt(Player::Ejected, Input::Eject, Player::Stopped)
        .on_enter(|_| {
            println!("  [hook] disc ejected");
            Ok(())
        })
        .done()
        .build(Player::Stopped)
        .unwrap();

    println!("Initial state: {}\n", player.current_state());

    let script = [
        Input::Play,
        Input::Stall,
        Input::Pause,
        Input::Play,
        Input::Resume,
        Input::Eject,
    ];
    for input in script {
        let outcome = player.submit(input).unwrap();
        match outcome {
            Some(state) => println!("{} -> settled in {}", input, state),
            None => println!("{} -> ignored while {}", input, player.current_state()),
        }
    }

    println!("\nPath taken:");
    let history = recorder.snapshot();
    let path: Vec<String> = history.path().iter().map(|state| state.to_string()).collect();
    println!("  {}", path.join(" -> "));

    println!("\nDiversions declared:");
    for info in player.registry().diversions() {
        println!("  {} ({:?})", info.name, info.kind);
    }

    println!("\n=== Example Complete ===");
}
