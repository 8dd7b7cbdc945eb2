//! Routing model with a clean-up memory on the state buffer.
//!
//! The state buffer cycles A→B→C→D→E→A after vision (`0.8*LETTER+D`) is
//! routed into it; the "cleanup A" port reports how strongly the state
//! resembles A at every step.
//!
//! Run with `cargo run --example sequence_cleanup [config.json]`.

use spa_cleanup::config::ModelConfig;
use spa_cleanup::Model;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ModelConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => ModelConfig::default(),
    };

    println!("{}", "=".repeat(70));
    println!("SEQUENCE ROUTING WITH CLEAN-UP MEMORY");
    println!("{}", "=".repeat(70));
    println!(
        "dimensions={} symbols={:?} cleanup={:?}",
        config.dimensions, config.symbols, config.cleanup.symbols
    );

    let mut model = Model::from_config(&config)?;
    let report_every = (config.dwell / config.dt).round().max(1.0) as usize;

    println!("\n{:>8}  {:<24}  {}", "t (s)", "state", config.cleanup.name);
    for step in 0..(report_every * 12) {
        model.step()?;
        if step % report_every == report_every / 2 {
            let out = model.cleanup_output().unwrap_or(&[]);
            println!(
                "{:>8.3}  {:<24}  {:?}",
                model.time(),
                model.state_text(0.3)?,
                out.iter().map(|v| format!("{:+.3}", v)).collect::<Vec<_>>()
            );
        }
    }

    let trace = model.cleanup_trace();
    println!("\nSamples recorded: {}", trace.len());
    println!("Peak similarity:  {:.3}", trace.max(0));
    if let Some(mean) = trace.mean(0) {
        println!("Mean similarity:  {:.3}", mean);
    }

    Ok(())
}
