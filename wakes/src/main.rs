//! Museum Wakes tour driver.
//!
//! Runs a tour as a line-oriented text session, for scripted play and
//! manual testing of the engine:
//!
//! ```bash
//! cargo run -p wakes -- --catalog data/egyptian-art.json --path search --seed 7
//! ```

mod headless;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = headless::parse_config_from_args(&args);
    headless::run_headless(config).await.map_err(|e| e.into())
}

fn print_help() {
    println!("Museum Wakes - narrative tour of the Egyptian galleries");
    println!();
    println!("USAGE:");
    println!("  wakes [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help            Show this help message");
    println!("  --catalog <FILE>      Artifact catalog JSON (default: data/egyptian-art.json)");
    println!("  --state-dir <DIR>     Where the session is saved (default: .wakes)");
    println!("  --path <PATH>         Start on a path right away");
    println!("  --register <REG>      Audience register (default: adult)");
    println!("  --seed <N>            Seed target sampling");
    println!("  --model <MODEL>       Claude model for narration");
    println!();
    println!("PATHS:");
    println!("  search, trial, letters, memory, awakening");
    println!();
    println!("REGISTERS:");
    println!("  kid, teen, adult, family");
    println!();
    println!("Narration uses Claude when ANTHROPIC_API_KEY is set, otherwise the");
    println!("built-in fallback text. Set RUST_LOG=debug for engine logs.");
}
