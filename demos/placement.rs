//! Replays a burst of placements through the limiter.
//!
//! Run with: `cargo run --example placement -- demos/config.yml`

use placement_limiter::{
    ActorId, Capability, Clock, Grants, ItemType, PlacementLimiter, UsageAttempt,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/config.yml".to_string());
    let limiter = PlacementLimiter::from_config_file(&config)?;
    let sweeper = limiter.start_sweeper();

    let player = Grants::none();
    let actor = ActorId::random();
    let dirt = ItemType::parse("dirt")?;

    for _ in 0..5 {
        let attempt = UsageAttempt::new(actor, dirt.clone(), limiter.clock().now());
        let decision = limiter.notify_attempt(&attempt, &player);
        match decision.notice(&attempt.item) {
            Some(notice) => println!("denied:\n{notice}"),
            None => println!("placed {}", attempt.item.display_name()),
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let admin = Grants::none().with(Capability::Reload);
    if let Some(outcome) = limiter.handle_command("limiterreload", &admin) {
        println!("{outcome}");
    }

    println!("{:?}", limiter.metrics().snapshot());

    sweeper.shutdown().await?;
    limiter.shutdown()?;
    Ok(())
}
