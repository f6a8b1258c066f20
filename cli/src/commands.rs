// Console commands and their execution

use clap::{Parser, Subcommand, ValueEnum};
use diskmgmt_core::disk::alloc_ops::parse_size_mb;
use diskmgmt_core::logger;
use diskmgmt_core::{DiskId, DriveLetter, ExtentId, FileSystem, Operation, Session};

use crate::output;

/// One console line.
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show every disk and its extents
    #[command(alias = "ls")]
    List,
    /// Select an extent; with no id, clear the selection
    Select { extent: Option<u64> },
    /// Create a volume in unallocated space
    Create {
        disk: String,
        extent: u64,
        /// Size, e.g. 500, 20GB, 1.5TB
        #[arg(value_parser = parse_size)]
        size: u64,
        #[arg(long)]
        letter: Option<DriveLetter>,
        #[arg(long, default_value = "New Volume")]
        label: String,
        #[arg(long, default_value = "NTFS")]
        fs: FileSystem,
    },
    /// Delete a volume
    Delete { disk: String, extent: u64 },
    /// Format a volume
    Format {
        disk: String,
        extent: u64,
        #[arg(long)]
        fs: FileSystem,
        #[arg(long, default_value = "New Volume")]
        label: String,
    },
    /// Shrink a volume by the given amount
    Shrink {
        disk: String,
        extent: u64,
        #[arg(value_parser = parse_size)]
        amount: u64,
    },
    /// Extend a volume into the unallocated space right after it
    Extend {
        disk: String,
        extent: u64,
        #[arg(value_parser = parse_size)]
        amount: u64,
    },
    /// Change a volume's drive letter ("none" removes it)
    Letter {
        disk: String,
        extent: u64,
        #[arg(value_parser = parse_letter)]
        letter: LetterArg,
    },
    /// Attach the removable disk
    AddRemovable,
    /// Bring a disk online or take it offline
    Online { disk: String, state: OnlineState },
    /// Start over with a fresh system disk
    Reset,
    /// Show the GPT entries this layout would produce
    Gpt { disk: String },
    /// Show recent log records
    Logs,
    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OnlineState {
    On,
    Off,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LetterArg(Option<DriveLetter>);

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn parse_size(text: &str) -> Result<u64, String> {
    parse_size_mb(text).ok_or_else(|| format!("'{}' is not a size in MB/GB/TB", text))
}

fn parse_letter(text: &str) -> Result<LetterArg, String> {
    if text.eq_ignore_ascii_case("none") {
        return Ok(LetterArg(None));
    }
    text.parse::<DriveLetter>()
        .map(|letter| LetterArg(Some(letter)))
        .map_err(|e| e.to_string())
}

/// Split a console line into words, honouring double quotes.
pub fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_word = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Run one command against the session.
pub fn execute(session: &mut Session, command: Command) -> Flow {
    let op = match command {
        Command::List => {
            output::print_disks(session.state());
            return Flow::Continue;
        }
        Command::Gpt { disk } => {
            match session.state().disk(&disk) {
                Some(disk) => output::print_gpt(disk),
                None => println!("No disk named '{}'.", disk),
            }
            return Flow::Continue;
        }
        Command::Logs => {
            println!(
                "{} of {} records buffered",
                logger::log_count(),
                logger::MAX_LOG_ENTRIES
            );
            output::print_logs(&logger::get_logs());
            return Flow::Continue;
        }
        Command::Quit => return Flow::Quit,
        Command::Reset => Operation::Initialize,
        Command::AddRemovable => Operation::AddRemovableDisk,
        Command::Select { extent } => Operation::Select(extent.map(ExtentId::from_raw)),
        Command::Online { disk, state } => Operation::SetOnline {
            disk: DiskId::new(disk),
            online: state == OnlineState::On,
        },
        Command::Create {
            disk,
            extent,
            size,
            letter,
            label,
            fs,
        } => Operation::CreatePartition {
            disk: DiskId::new(disk),
            extent: ExtentId::from_raw(extent),
            size_mb: size,
            letter,
            label,
            filesystem: fs,
        },
        Command::Delete { disk, extent } => Operation::DeletePartition {
            disk: DiskId::new(disk),
            extent: ExtentId::from_raw(extent),
        },
        Command::Format {
            disk,
            extent,
            fs,
            label,
        } => Operation::FormatPartition {
            disk: DiskId::new(disk),
            extent: ExtentId::from_raw(extent),
            label,
            filesystem: fs,
        },
        Command::Shrink {
            disk,
            extent,
            amount,
        } => Operation::ShrinkPartition {
            disk: DiskId::new(disk),
            extent: ExtentId::from_raw(extent),
            amount_mb: amount,
        },
        Command::Extend {
            disk,
            extent,
            amount,
        } => Operation::ExtendPartition {
            disk: DiskId::new(disk),
            extent: ExtentId::from_raw(extent),
            amount_mb: amount,
        },
        Command::Letter {
            disk,
            extent,
            letter,
        } => Operation::ChangeLetter {
            disk: DiskId::new(disk),
            extent: ExtentId::from_raw(extent),
            letter: letter.0,
        },
    };

    let before = session.state().clone();
    match session.dispatch(op) {
        Ok(state) if *state == before => println!("No change."),
        Ok(_) => {}
        Err(err) => println!("Rejected: {}", err),
    }
    Flow::Continue
}
