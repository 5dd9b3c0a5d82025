#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wadkit::wad::{self, ExportOptions};

#[derive(Debug, Parser)]
#[command(name = "wadkit", version, about = "WAD extractor and assembler")]
struct Cli {
    /// Debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List entries of a WAD. The first line is IWAD or PWAD.
    List {
        wad: PathBuf,
        /// Print `name;filename;offset;size;hash` per entry.
        #[arg(long, default_value_t = false)]
        details: bool,
    },

    /// Export every entry plus an !INDEX.TXT manifest into a directory.
    Export {
        wad: PathBuf,
        output: PathBuf,
        /// Skip writing converted media into MEDIA/.
        #[arg(long, default_value_t = false)]
        raw: bool,
    },

    /// Assemble a WAD from a directory holding !INDEX.TXT.
    Assemble {
        input: PathBuf,
        wad: PathBuf,
    },

    /// Convert one lump file to its common format (MID, WAV, PNG, ...).
    Convert {
        input: PathBuf,
        /// Output path without extension.
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let res = match cli.cmd {
        Command::List { wad: path, details } => {
            wad::list(&path, details, &mut std::io::stdout().lock())
        }
        Command::Export { wad: path, output, raw } => {
            let opts = ExportOptions {
                convert_media: !raw,
            };
            wad::export_dir(&path, &output, &opts).map(|_| ())
        }
        Command::Assemble { input, wad: path } => wad::assemble_dir(&input, &path).map(|_| ()),
        Command::Convert { input, output } => wad::convert_file(&input, &output).map(|_| ()),
    };

    if let Err(e) = res {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
