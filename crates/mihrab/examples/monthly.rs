//! Qibla and the month-to-date timetable for a fixed position.
//!
//! `cargo run -p mihrab --example monthly -- 40.7128 -74.0060 ISNA shafi`

use anyhow::Context;
use chrono::Local;
use mihrab::network::{ClientConfig, PrayerTimeClient};
use mihrab::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let latitude: f64 = args.first().map(|s| s.parse()).transpose().context("latitude")?.unwrap_or(21.3891);
    let longitude: f64 = args.get(1).map(|s| s.parse()).transpose().context("longitude")?.unwrap_or(39.8579);
    let method = args.get(2).map(|s| CalculationMethod::parse_or_default(s)).unwrap_or_default();
    let school: School = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or_default();

    let origin = Coordinate::new(latitude, longitude)?;
    let q = qibla(&origin);
    println!("{} -> Kaaba: {:.2}° {}, {:.0} km", origin, q.bearing_degrees, q.direction, q.distance_km);

    let client = PrayerTimeClient::new(ClientConfig::default())?;
    let selection = CalculationSelection::new(method, school);
    let days = client.monthly_schedule(&origin, selection, Local::now().date_naive()).await;

    println!("\n{:<12} {:>6} {:>6} {:>6} {:>6} {:>6}", "Date", "Fajr", "Dhuhr", "Asr", "Maghrib", "Isha");
    for day in &days {
        print!("{:<12}", day.date.format("%a %d %b"));
        for prayer in Prayer::OBLIGATORY {
            print!(" {:>6}", day.cell(prayer));
        }
        println!();
    }
    Ok(())
}
