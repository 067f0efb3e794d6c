use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursewright::cli::commands::{config, generate, solve, topics};
use coursewright::session::Language;

#[derive(Parser)]
#[command(name = "coursewright")]
#[command(
    version,
    about = "AI-assisted course authoring: outlines, sections, exercises and exams"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra config file merged above the global and project files
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a course and render it as Markdown
    Generate {
        #[arg(long, short, help = "Course topic")]
        topic: String,
        #[arg(long, help = "Number of chapters (1-20)")]
        chapters: Option<u8>,
        #[arg(long, short, help = "Output language (english, arabic, french, ...)")]
        language: Option<Language>,
        #[arg(long, help = "Write the content of every section")]
        fill: bool,
        #[arg(long, help = "Generate one exercise set per chapter")]
        exercises: bool,
        #[arg(long, help = "Generate a course exam")]
        exam: bool,
        #[arg(long, help = "Generate one illustration per section")]
        images: bool,
        #[arg(long, short, help = "Markdown output file (default: stdout)")]
        output: Option<PathBuf>,
    },

    /// Solve a single problem given as text and/or an image
    Solve {
        #[arg(long, help = "Problem statement")]
        text: Option<String>,
        #[arg(long, help = "Problem image (png, jpg, webp, gif, heic; max 4 MiB)")]
        image: Option<PathBuf>,
        #[arg(long, short, help = "Output language")]
        language: Option<Language>,
    },

    /// List the main topics of a text document
    Topics {
        #[arg(help = "Text or Markdown file")]
        file: PathBuf,
    },

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
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize the global configuration file
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mCoursewright encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

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
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Generate {
            topic,
            chapters,
            language,
            fill,
            exercises,
            exam,
            images,
            output,
        } => {
            generate::run(
                generate::GenerateOptions {
                    topic,
                    chapters,
                    language,
                    fill,
                    exercises,
                    exam,
                    images,
                    output,
                },
                config_path,
                cli.quiet,
            )?;
        }
        Commands::Solve {
            text,
            image,
            language,
        } => {
            solve::run(
                solve::SolveOptions {
                    text,
                    image,
                    language,
                },
                config_path,
                cli.quiet,
            )?;
        }
        Commands::Topics { file } => {
            topics::run(&file, config_path, cli.quiet)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => config::show(config_path, &format)?,
            ConfigAction::Path => config::path()?,
            ConfigAction::Init { force } => config::init(force)?,
        },
    }

    Ok(())
}
