//! Command-line front end.
//!
//! Every command rebuilds the event from a JSON roster and keeps
//! assignments in a CBOR state file between invocations, so a draw survives
//! across runs and reveals are tracked.
//!
//! `draw` never prints who gives to whom; each giver learns their own
//! assignment through `reveal`.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use kringle_core::{
    AssignmentGenerator, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_STEPS, Environment, GeneratorConfig,
    MIN_PARTICIPANTS, Strategy,
};

use crate::{
    error::ServerError,
    event_manager::{EventId, EventManager, ParticipantId},
    executor::{ActionExecutor, LogNotifier, NotifyPolicy},
    roster::RosterFile,
    storage::{MemoryStorage, Storage},
};

/// Secret Santa assignment tool
#[derive(Parser, Debug)]
#[command(name = "kringle")]
#[command(about = "Draw and reveal Secret Santa assignments")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate assignments for the confirmed participants
    Draw(DrawArgs),

    /// Show one giver their assignment and mark it viewed
    Reveal {
        /// Roster and state files
        #[command(flatten)]
        files: FileArgs,

        /// Participant ID of the giver
        #[arg(long)]
        giver: ParticipantId,
    },

    /// Show how many assignments exist and have been viewed
    Status(FileArgs),

    /// Discard assignments (only while nobody has viewed theirs)
    Reset(FileArgs),
}

/// Input and state file locations.
#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// JSON roster file
    #[arg(short, long)]
    pub roster: PathBuf,

    /// CBOR state file (created on first draw)
    #[arg(short, long)]
    pub state: PathBuf,
}

/// Search strategy flag.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    /// Reshuffle until a valid chain appears
    Resample,
    /// Depth-first search for a valid cycle
    Backtrack,
}

/// Options for `draw`.
#[derive(Args, Debug, Clone)]
pub struct DrawArgs {
    /// Roster and state files
    #[command(flatten)]
    pub files: FileArgs,

    /// Reshuffle budget for the resample strategy
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Search strategy
    #[arg(long, value_enum, default_value_t = StrategyArg::Resample)]
    pub strategy: StrategyArg,

    /// Step budget for the backtrack strategy
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: u64,

    /// Minimum number of confirmed participants
    #[arg(long, default_value_t = MIN_PARTICIPANTS)]
    pub min_participants: usize,
}

impl DrawArgs {
    /// Build the generator configuration from flags.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` for a minimum below three.
    pub fn generator_config(&self) -> Result<GeneratorConfig, ServerError> {
        if self.min_participants < MIN_PARTICIPANTS {
            return Err(ServerError::Config(format!(
                "--min-participants must be at least {}",
                MIN_PARTICIPANTS
            )));
        }

        let strategy = match self.strategy {
            StrategyArg::Resample => Strategy::Resample,
            StrategyArg::Backtrack => Strategy::Backtrack { max_steps: self.max_steps },
        };
        Ok(GeneratorConfig {
            max_attempts: self.max_attempts,
            min_participants: self.min_participants,
            strategy,
        })
    }
}

/// A loaded roster plus its persisted assignments.
struct Session {
    manager: EventManager,
    storage: MemoryStorage,
    event_id: EventId,
    state_path: PathBuf,
}

impl Session {
    fn open<E: Environment>(files: &FileArgs, env: &E) -> Result<Self, ServerError> {
        let roster = RosterFile::load(&files.roster)?;
        let mut manager = EventManager::new();
        let event_id = roster.apply(&mut manager, env)?;

        let storage = load_state(&files.state)?;
        manager.load_assignment_state(event_id, &storage)?;

        Ok(Self { manager, storage, event_id, state_path: files.state.clone() })
    }

    /// Write the state file through a temporary sibling and rename it into
    /// place, so an interrupted write never truncates an existing draw.
    fn save(&self) -> Result<(), ServerError> {
        let bytes = self.storage.snapshot()?;
        let io_err = |e: std::io::Error| {
            ServerError::Io(format!("{}: {}", self.state_path.display(), e))
        };

        let dir = match self.state_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&self.state_path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn event_name(&self) -> &str {
        self.manager.metadata(self.event_id).map_or("", |m| m.name.as_str())
    }

    fn participant_name(&self, id: ParticipantId) -> Result<&str, ServerError> {
        Ok(self.manager.participant(self.event_id, id)?.name.as_str())
    }
}

fn load_state(path: &Path) -> Result<MemoryStorage, ServerError> {
    if !path.exists() {
        return Ok(MemoryStorage::new());
    }
    let bytes =
        std::fs::read(path).map_err(|e| ServerError::Io(format!("{}: {}", path.display(), e)))?;
    Ok(MemoryStorage::restore(&bytes)?)
}

/// Run a command against `env`, writing user-facing output to `out`.
///
/// # Errors
///
/// Any roster, event, storage or I/O error; generation failures surface as
/// `ServerError::Event` wrapping the generator error.
pub fn run<E: Environment>(
    command: &Command,
    env: &E,
    out: &mut impl Write,
) -> Result<(), ServerError> {
    match command {
        Command::Draw(args) => draw(args, env, out),
        Command::Reveal { files, giver } => reveal(files, *giver, env, out),
        Command::Status(files) => status(files, env, out),
        Command::Reset(files) => reset(files, env, out),
    }
}

fn draw<E: Environment>(args: &DrawArgs, env: &E, out: &mut impl Write) -> Result<(), ServerError> {
    let generator = AssignmentGenerator::new(args.generator_config()?);
    let mut session = Session::open(&args.files, env)?;

    let actions =
        session.manager.generate_assignments(session.event_id, &generator, env, &session.storage)?;
    let report = ActionExecutor::new(&session.storage, &LogNotifier, NotifyPolicy::BestEffort)
        .execute(actions)?;
    session.save()?;
    session.manager.load_assignment_state(session.event_id, &session.storage)?;

    writeln!(out, "Drew {} assignments for '{}'.", report.persisted, session.event_name())?;
    writeln!(out, "Each giver can now run: kringle reveal --giver <id>")?;
    Ok(())
}

fn reveal<E: Environment>(
    files: &FileArgs,
    giver: ParticipantId,
    env: &E,
    out: &mut impl Write,
) -> Result<(), ServerError> {
    let session = Session::open(files, env)?;
    let giver_name = session.participant_name(giver)?;

    // view_assignment refuses before marking if the receiver is unknown
    let record = session.manager.view_assignment(session.event_id, giver, env, &session.storage)?;
    let receiver = session.manager.participant(session.event_id, record.receiver)?;
    session.save()?;

    writeln!(
        out,
        "{}, you are the Secret Santa for {} <{}>.",
        giver_name, receiver.name, receiver.email
    )?;
    Ok(())
}

fn status<E: Environment>(files: &FileArgs, env: &E, out: &mut impl Write) -> Result<(), ServerError> {
    let session = Session::open(files, env)?;
    let event_id = session.event_id;
    let participants = session.manager.participants(event_id)?;
    let confirmed = participants.iter().filter(|p| p.confirmed).count();
    let status = session.manager.assignment_status(event_id, &session.storage)?;

    writeln!(out, "event: {}", session.event_name())?;
    writeln!(out, "confirmed: {}/{}", confirmed, participants.len())?;
    let ready = status.total == 0 && session.manager.can_generate(event_id)?;
    writeln!(out, "ready to draw: {}", ready)?;
    writeln!(out, "assignments: {}", status.total)?;
    writeln!(out, "viewed: {}", status.viewed)?;

    let pending: Vec<String> = session
        .storage
        .load_assignments(event_id)?
        .iter()
        .filter(|r| !r.is_viewed())
        .map(|r| match session.participant_name(r.giver) {
            Ok(name) => name.to_string(),
            Err(_) => format!("#{}", r.giver),
        })
        .collect();
    if !pending.is_empty() {
        writeln!(out, "not yet viewed: {}", pending.join(", "))?;
    }
    Ok(())
}

fn reset<E: Environment>(files: &FileArgs, env: &E, out: &mut impl Write) -> Result<(), ServerError> {
    let mut session = Session::open(files, env)?;
    let removed = session.manager.reset_assignments(session.event_id, &session.storage)?;
    session.save()?;

    writeln!(out, "Removed {} assignments from '{}'.", removed, session.event_name())?;
    Ok(())
}
