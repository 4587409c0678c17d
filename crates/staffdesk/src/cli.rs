//! Clap derive structures for the `staffdesk` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// staffdesk -- browse and edit administrative collections
#[derive(Debug, Parser)]
#[command(
    name = "staffdesk",
    version,
    about = "Browse and edit staffdesk collections from the command line",
    long_about = "Paginated, filtered views over the staffdesk REST API.\n\n\
        Lists are served through a stale-while-revalidate cache; `all`\n\
        walks every page of a collection until the server runs out of rows.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "STAFFDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, short = 'u', env = "STAFFDESK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STAFFDESK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log lines as JSON objects on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "STAFFDESK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show one page of a collection
    #[command(alias = "ls")]
    List(ListArgs),

    /// Fetch every page of a collection
    All(AllArgs),

    /// Create an item
    Create(CreateArgs),

    /// Update an item
    Update(UpdateArgs),

    /// Delete an item
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Collection path plus filter arguments, shared by `list` and `all`.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Collection path, e.g. `api/employees`
    pub resource: String,

    /// Free-text search (sent as `SearchTerm`)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter field, repeatable: `Field=value`, `Field=true`, or
    /// `Field=2024-01-01..2024-12-31` for date ranges
    #[arg(long = "filter", short = 'f', value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Send filter FIELD under query parameter PARAM, repeatable
    #[arg(long = "alias", value_name = "FIELD=PARAM")]
    pub aliases: Vec<String>,
}

/// JSON body for create/update, inline or from a file.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct BodyArgs {
    /// Inline JSON body
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Read the JSON body from a file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LIST / ALL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Page number (1-based)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Rows per page (defaults to the profile's page size)
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..=500))]
    pub page_size: Option<u32>,

    /// Sort as `key` or `key,desc`
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Debug, Args)]
pub struct AllArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Rows requested per page (defaults to the profile's accumulator page size)
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..=500))]
    pub page_size: Option<u32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MUTATIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Collection path, e.g. `api/employees`
    pub resource: String,

    #[command(flatten)]
    pub body: BodyArgs,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Collection path, e.g. `api/employees`
    pub resource: String,

    /// Item id
    pub id: String,

    #[command(flatten)]
    pub body: BodyArgs,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Collection path, e.g. `api/employees`
    pub resource: String,

    /// Item id
    pub id: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key: base_url, timeout, page_size, or header.<Name>
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
