use analyzer::conf::Profile;
use analyzer::runtime::{boot, run};
use clap::Parser;

#[derive(Parser)]
#[command(name = "analyzer")]
#[command(about = "G1 garbage collector log analyzer", long_about = None)]
#[command(version)]
struct Cli {
    /// G1 unified-logging file to analyse
    log: String,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Configuration file (TOML); defaults to $ANALYZER_CONFIG_FILE or analyzer.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Threshold profile (balanced, latency, batch)
    #[arg(short, long, value_parser = parse_profile)]
    profile: Option<Profile>,
}

fn parse_profile(text: &str) -> Result<Profile, String> {
    Profile::parse(text).ok_or_else(|| format!("unknown profile: {}", text))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (_config, thresholds) = boot::boot(cli.config.as_deref(), cli.profile)?;
    run::run(&cli.log, cli.json, &thresholds)?;
    Ok(())
}
