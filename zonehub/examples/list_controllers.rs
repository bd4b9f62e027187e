//! Discover the local network and print one line per playback group.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example list_controllers
//! ```

use zonehub::Network;

fn main() -> zonehub::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut network = Network::new()?;
    for controller in network.controllers()? {
        println!(
            "group {} coordinated by {} ({})",
            controller.group, controller.room, controller.address
        );
    }
    Ok(())
}
