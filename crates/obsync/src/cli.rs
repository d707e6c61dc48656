//! Clap derive structures for the `obsync` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// obsync -- mirror and drive OBS over obs-websocket
#[derive(Debug, Parser)]
#[command(
    name = "obsync",
    version,
    about = "Mirror OBS state and drive scenes from the command line",
    long_about = "Connects to OBS through obs-websocket (v4 protocol), keeps a live\n\
        mirror of scenes, sources, and studio mode, and exposes transitions\n\
        and streaming control as subcommands.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "OBSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// OBS host (overrides profile)
    #[arg(long, short = 'H', env = "OBSYNC_HOST", global = true)]
    pub host: Option<String>,

    /// obs-websocket port (overrides profile)
    #[arg(long, short = 'P', env = "OBSYNC_PORT", global = true)]
    pub port: Option<u16>,

    /// obs-websocket password
    #[arg(long, env = "OBSYNC_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// State namespace (overrides profile)
    #[arg(long, short = 'n', global = true)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "OBSYNC_OUTPUT",
        default_value = "plain",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines (default)
    Plain,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect and print every state change until Ctrl-C
    #[command(alias = "w")]
    Watch,

    /// Transition to a scene
    #[command(alias = "t")]
    Transition(TransitionArgs),

    /// Stage a scene in preview (studio mode)
    Preview {
        /// Scene to stage
        scene: String,
    },

    /// Start or stop streaming
    Stream(StreamArgs),

    /// Show scenes, sources, and studio mode
    #[command(alias = "ls")]
    Scenes,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Transition ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TransitionArgs {
    /// Transition to use (e.g. "Fade", "Cut")
    #[arg(long, short = 't')]
    pub name: Option<String>,

    /// Transition duration in milliseconds
    #[arg(long, short = 'd')]
    pub duration: Option<u64>,

    /// Target scene (optional in studio mode: transitions the current preview)
    #[arg(long, short = 's')]
    pub scene: Option<String>,
}

// ── Stream ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StreamArgs {
    #[command(subcommand)]
    pub command: StreamCommand,
}

#[derive(Debug, Subcommand)]
pub enum StreamCommand {
    /// Start streaming
    Start,
    /// Stop streaming
    Stop,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Write a profile from the global flags
    Init {
        /// Overwrite an existing profile of the same name
        #[arg(long)]
        force: bool,

        /// Read the password from this environment variable instead of
        /// storing it in the file
        #[arg(long)]
        password_env: Option<String>,

        /// Connect with wss://
        #[arg(long)]
        secure: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
