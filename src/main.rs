use clap::{Parser, Subcommand};
use crackscope::analysis::{RustDecoder, analyze_path};
use crackscope::config::{self, Secrets};
use crackscope::{output, scan, server};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "crackscope")]
#[command(version, about = "Crack severity from photos via box-counting fractal dimension")]
#[command(long_about = "\
Crack severity from photos via box-counting fractal dimension

Images are resampled to a square grid, pixels darker than the threshold are
treated as crack, and the fractal dimension of that crack pattern is estimated
by box counting. The dimension maps to a severity:

  fd < 1.2          Minor
  1.2 <= fd < 1.5   Moderate
  fd >= 1.5         Severe

'serve' runs the LINE webhook bot (needs LINE_CHANNEL_ACCESS_TOKEN and
LINE_CHANNEL_SECRET in the environment). 'analyze' measures local files.

Run 'crackscope gen-config' to generate a documented config.toml.")]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook server
    Serve,
    /// Analyze image files or directories of images
    Analyze {
        /// Files or directories to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let mut bot_config = config::load_config(&cli.config_dir)?;
            bot_config.apply_env_overrides(|key| std::env::var(key).ok())?;
            let secrets = Secrets::from_env()?;
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(server::serve(&bot_config, secrets))?;
        }
        Command::Analyze { paths, json } => {
            let bot_config = config::load_config(&cli.config_dir)?;
            init_thread_pool(&bot_config.processing);
            let params = bot_config.analysis.params();
            let files = scan::collect_images(&paths)?;
            if files.is_empty() {
                return Err("no images found".into());
            }

            let decoder = RustDecoder::new();
            let outcomes: Vec<_> = files
                .par_iter()
                .map(|path| analyze_path(&decoder, path, &params))
                .collect();

            if json {
                let reports: Vec<_> = files
                    .iter()
                    .zip(&outcomes)
                    .map(|(path, outcome)| output::FileReport::new(path, outcome))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for (path, outcome) in files.iter().zip(&outcomes) {
                    println!("{}", output::format_analysis_line(path, outcome));
                }
            }

            let failed = outcomes.iter().filter(|o| o.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} images failed", files.len()).into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. User can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
