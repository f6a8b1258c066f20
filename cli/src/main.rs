// diskmgmt - interactive disk management console

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};

use diskmgmt_core::{Operation, Preset, RegistryConfig, Session};

mod commands;
mod output;

use commands::{execute, split_words, Flow, Line};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    Blank,
    Preinstalled,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Blank => Preset::Blank,
            PresetArg::Preinstalled => Preset::Preinstalled,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "diskmgmt")]
#[command(about = "Simulated disk management console")]
struct Cli {
    /// Initial layout of the system disk
    #[arg(long, value_enum, default_value = "blank")]
    preset: PresetArg,

    /// Attach the removable disk at startup
    #[arg(long)]
    removable: bool,

    /// Refuse drive letters already used anywhere in the registry
    #[arg(long)]
    unique_letters: bool,

    /// Read commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    diskmgmt_core::logger::init(level_filter(cli.verbose))
        .context("failed to install logger")?;

    let config = RegistryConfig::default()
        .preset(cli.preset.into())
        .unique_letters(cli.unique_letters);
    let mut session = Session::new(config);
    if cli.removable {
        session.dispatch(Operation::AddRemovableDisk)?;
    }

    session.subscribe(|op, state| match op {
        Operation::Select(_) => match state.selected_extent() {
            Some((disk, extent)) => println!("Selected extent {} on {}.", extent.id, disk.id),
            None => println!("Selection cleared."),
        },
        _ => output::print_disks(state),
    });

    info!("console started with {} disk(s)", session.state().disk_count());
    output::print_disks(session.state());

    let interactive = cli.script.is_none() && io::stdin().is_terminal();
    let input: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    run(&mut session, input, interactive)
}

fn run(session: &mut Session, input: Box<dyn BufRead>, interactive: bool) -> Result<()> {
    let mut lines = input.lines();
    loop {
        if interactive {
            print!("diskmgmt> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match Line::try_parse_from(split_words(line)) {
            Ok(parsed) => {
                if execute(session, parsed.command) == Flow::Quit {
                    break;
                }
            }
            // Help and usage errors both render through clap
            Err(err) => err.print()?,
        }
    }
    Ok(())
}
