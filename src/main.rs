use std::path::{Path, PathBuf};

use clap::Parser;
use secret_scrubber::{
    config::{DEFAULT_CONFIG_PATH, ScrubberConfig, default_config_toml},
    notify::SlackNotifier,
    observability::init_tracing,
    scrubber::run_scrub,
    secrets::AwsSecretsManager,
};

/// CLI arguments for the secret scrubber
#[derive(Parser, Debug)]
#[command(version, about = "Delete secrets unused for two years and report them to Slack", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run the scrub job once (default)
    Run {
        /// Flag and report without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Write a default configuration file
    Init {
        /// Path to create the config file (defaults to --config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Load and validate the configuration, then exit
    Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Init { output, force }) => {
            run_init(output.unwrap_or(args.config), force);
        }
        Some(Command::Check) => {
            run_check(&args.config);
        }
        Some(Command::Run { dry_run }) => {
            run_job(&args.config, dry_run).await;
        }
        None => {
            run_job(&args.config, false).await;
        }
    }
}

/// Load configuration or exit with a readable error.
fn load_config(path: &Path) -> ScrubberConfig {
    match ScrubberConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Write the default configuration file
fn run_init(output: PathBuf, force: bool) {
    if output.exists() && !force {
        eprintln!(
            "Config file already exists: {}\nUse --force to overwrite.",
            output.display()
        );
        std::process::exit(1);
    }

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        eprintln!("Failed to create directory {}: {}", parent.display(), e);
        std::process::exit(1);
    }

    if let Err(e) = std::fs::write(&output, default_config_toml()) {
        eprintln!("Failed to write config file: {}", e);
        std::process::exit(1);
    }

    println!("Created config file: {}", output.display());
    println!();
    println!("The default config runs in dry-run mode. To run the scrubber:");
    println!("  secret-scrubber run --config {}", output.display());
}

/// Validate the configuration and print a summary
fn run_check(path: &Path) {
    let config = load_config(path);

    println!("Configuration OK: {}", path.display());
    println!(
        "  region:               {}",
        config.aws.region.as_deref().unwrap_or("(default chain)")
    );
    println!(
        "  recovery window:      {} days",
        config.scrub.recovery_window_days
    );
    println!("  page error policy:    {:?}", config.scrub.page_error_policy);
    println!("  dry run:              {}", config.scrub.dry_run);
    println!("  report:               {}", config.report.path.display());
    println!(
        "  slack channel:        {}",
        config.notifications.slack.channel
    );
}

/// Run the scrub job once
async fn run_job(path: &Path, dry_run: bool) {
    let mut config = load_config(path);
    if dry_run {
        config.scrub.dry_run = true;
    }

    if let Err(e) = init_tracing(&config.observability.logging) {
        eprintln!("Warning: {}", e);
    }

    let notifier = match SlackNotifier::new(&config.notifications.slack) {
        Ok(notifier) => notifier,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create Slack client");
            std::process::exit(1);
        }
    };

    let secrets = AwsSecretsManager::new(&config.aws).await;

    let mut pages = secrets.list_pages(config.scrub.page_size);

    if let Err(e) = run_scrub(&mut pages, &secrets, &notifier, &config).await {
        tracing::error!(error = %e, "Secret scrub failed");
        std::process::exit(1);
    }
}
