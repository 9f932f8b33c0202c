//! k9 CLI: elaborate, build and program LiteX-style SoCs for the Colorlight K9+.

mod commands;
mod manifest;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use k9_build::ProgramAction;
use k9_platform::Toolchain;
use tracing_subscriber::EnvFilter;

use commands::build::BuildArgs;
use commands::{Project, SocArgs};

#[derive(Parser)]
#[command(name = "k9", version, about = "SoC builder for the Colorlight K9+")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Elaborate the SoC, write the build directory and run the toolchain
    Build {
        #[command(flatten)]
        soc: SocArgs,
        /// Toolchain (vivado, openxc7); defaults to the board's
        #[arg(long)]
        toolchain: Option<Toolchain>,
        /// Output directory (default: build/colorlight_k9plus_ext)
        #[arg(long)]
        build_dir: Option<PathBuf>,
        /// Write sources and scripts without running the toolchain
        #[arg(long)]
        no_compile: bool,
        /// Print what would run instead of running it
        #[arg(long)]
        dry_run: bool,
        /// Load the bitstream into SRAM after building
        #[arg(long, conflicts_with = "flash")]
        load: bool,
        /// Write the bitstream to configuration flash after building
        #[arg(long)]
        flash: bool,
    },
    /// Load a built bitstream into FPGA SRAM
    Load {
        /// Board file or name (for the programmer cable)
        #[arg(long)]
        board: Option<String>,
        /// Build directory holding the bitstream
        #[arg(long)]
        build_dir: Option<PathBuf>,
        /// Print the programmer command instead of running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Write a built bitstream to configuration flash
    Flash {
        /// Board file or name (for the programmer cable)
        #[arg(long)]
        board: Option<String>,
        /// Build directory holding the bitstream
        #[arg(long)]
        build_dir: Option<PathBuf>,
        /// Flash offset in bytes
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Print the programmer command instead of running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Elaborate the SoC and print its clocks, peripherals and memory map
    Describe {
        #[command(flatten)]
        soc: SocArgs,
        /// Print the full elaboration as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a board's pin map
    Pins {
        /// Board file or name
        #[arg(long)]
        board: Option<String>,
        /// Include disabled bindings
        #[arg(long)]
        all: bool,
    },
    /// Manage board files
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },
    /// Check the environment for synthesis and programming tools
    Doctor,
}

#[derive(Subcommand)]
enum BoardAction {
    /// List available boards
    List,
    /// Print a board template seeded from the K9+
    Template {
        /// Board name
        name: String,
    },
    /// Validate a board file
    Validate {
        /// Path to a .board.toml file
        file: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let project = Project::discover(&cwd)?;

    match cli.command {
        Commands::Build {
            soc,
            toolchain,
            build_dir,
            no_compile,
            dry_run,
            load,
            flash,
        } => {
            let program = if load {
                Some(ProgramAction::Load)
            } else if flash {
                Some(ProgramAction::Flash { offset: 0 })
            } else {
                None
            };
            commands::build::run(
                &project,
                &soc,
                BuildArgs {
                    toolchain,
                    build_dir: build_dir.as_deref(),
                    no_compile,
                    dry_run,
                    program,
                },
            )
        }

        Commands::Load {
            board,
            build_dir,
            dry_run,
        } => commands::program::run(
            &project,
            board.as_deref(),
            build_dir.as_deref(),
            ProgramAction::Load,
            dry_run,
        ),

        Commands::Flash {
            board,
            build_dir,
            offset,
            dry_run,
        } => commands::program::run(
            &project,
            board.as_deref(),
            build_dir.as_deref(),
            ProgramAction::Flash { offset },
            dry_run,
        ),

        Commands::Describe { soc, json } => commands::describe::run(&project, &soc, json),

        Commands::Pins { board, all } => commands::pins::run(&project, board.as_deref(), all),

        Commands::Board { action } => match action {
            BoardAction::List => commands::board::list(&project),
            BoardAction::Template { name } => commands::board::template(&name),
            BoardAction::Validate { file } => commands::board::validate(&file),
        },

        Commands::Doctor => commands::doctor::run(&project),
    }
}
