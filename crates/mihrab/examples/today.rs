//! Today's schedule for the current location, with a short live countdown.
//!
//! Run with `cargo run -p mihrab --example today`. Set `RUST_LOG=debug` to
//! watch the fetch chain.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use mihrab::network::{DEFAULT_USER_AGENT, IpLocationSensor, JsonFileStore, LocationSensor};
use mihrab::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = Arc::new(JsonFileStore::open_default()?);
    let sensor: Arc<dyn LocationSensor> = Arc::new(IpLocationSensor::new(DEFAULT_USER_AGENT)?);
    let mut session = Session::from_config(SessionConfig::default(), store, Some(sensor))?;

    let now = Local::now().naive_local();
    if let Err(e) = session.start(now).await {
        anyhow::bail!("could not load prayer times: {e}");
    }

    let labels = session.labels(Local::now().fixed_offset());
    if let Some(location) = session.location() {
        println!("{}", location.coordinate.display_name());
        if let Some(warning) = &location.warning {
            println!("  ({warning})");
        }
    }
    println!("{} | {} | {}\n", labels.gregorian, labels.hijri, labels.timezone);

    for row in session.table(now).unwrap_or_default() {
        println!("  {:<8} {:>8}  {}", row.prayer, row.time.to_12_hour(), row.state);
    }
    if let Some(q) = session.qibla() {
        println!("\nQibla: {:.1}° {} ({:.0} km)", q.bearing_degrees, q.direction, q.distance_km);
    }

    let mut timer = CountdownTimer::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let next = session.status().map(|s| s.next);
    session.drive_countdown(&mut timer, move |left: CountdownState| {
        let _ = tx.send(left);
    });

    let deadline = tokio::time::sleep(Duration::from_secs(5));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            Some(left) = rx.recv() => match next {
                Some(prayer) => println!("{prayer} in {left}"),
                None => println!("{left}"),
            },
            _ = &mut deadline => break,
        }
    }
    timer.stop();
    Ok(())
}
