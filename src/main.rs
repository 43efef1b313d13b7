use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deckforge")]
#[command(
    version,
    about = "AI-driven slide deck generator for managed security service reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a deckforge project in the current directory
    Init,

    /// Generate a report deck from a tenant input and a template
    Generate {
        #[arg(help = "Input id (file <inputs_dir>/<id>.json)")]
        input: String,
        #[arg(help = "Template id")]
        template: String,
        #[arg(long, help = "Skip the LLM and fill AI placeholders with fallback text")]
        mock: bool,
    },

    /// Re-render a previously generated slidespec without calling the LLM
    Render {
        #[arg(help = "Input id")]
        input: String,
        #[arg(help = "Template id")]
        template: String,
    },

    /// Merge new content into one slide of a generated spec and re-render
    Rewrite {
        #[arg(help = "Job id (input_id:template_id)")]
        job: String,
        #[arg(long, help = "Slide key to rewrite")]
        slide: String,
        #[arg(long, help = "JSON file with token -> value replacements")]
        content: PathBuf,
    },

    /// List available templates
    Templates,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    use deckforge::cli::commands;
    use deckforge::config::ConfigLoader;

    match cli.command {
        Commands::Init => {
            let dir = ConfigLoader::init_project()?;
            println!("initialized {}", dir.display());
        }
        Commands::Generate {
            input,
            template,
            mock,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate(&input, &template, mock))?;
        }
        Commands::Render { input, template } => {
            commands::render(&input, &template)?;
        }
        Commands::Rewrite {
            job,
            slide,
            content,
        } => {
            commands::rewrite(&job, &slide, &content)?;
        }
        Commands::Templates => {
            commands::templates()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                ConfigLoader::show_config(json)?;
            }
            ConfigAction::Path => {
                ConfigLoader::show_path();
            }
            ConfigAction::Init { global, force } => {
                if global {
                    ConfigLoader::init_global(force)?;
                } else {
                    ConfigLoader::init_project()?;
                }
            }
        },
    }

    Ok(())
}
