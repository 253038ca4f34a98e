mod cmd_commit;
mod cmd_config;
mod cmd_init;
mod cmd_log;
mod cmd_record;
mod cmd_series;
mod cmd_stack_log;
mod cmd_status;
mod cmd_uncommit;

use clap::{Parser, Subcommand};
use cmd_config::ConfigCmd;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheaf", version, about = "Named, reorderable patches on top of commit history")]
struct Cli {
    /// Show debug logging on stderr (overridden by SHEAF_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new .sheaf/ workspace with an empty stack on HEAD
    Init,
    /// Record a plain commit on HEAD (not tracked as a patch)
    Record {
        /// Commit message
        #[arg(short, long)]
        message: String,
        /// Snapshot content the commit's tree is derived from
        #[arg(long, default_value = "")]
        content: String,
        /// Extra parent revisions, making a merge commit (repeatable)
        #[arg(long = "merge")]
        merges: Vec<String>,
    },
    /// Move HEAD to another commit without touching the stack
    Reset {
        /// Target revision (HEAD~N, id or unique id prefix)
        rev: String,
    },
    /// Turn commits below HEAD into patches on top of the stack
    Uncommit {
        /// Patch names, oldest commit first; with --number, one name is a prefix
        names: Vec<String>,
        /// Number of commits to uncommit
        #[arg(
            short = 'n',
            long = "number",
            allow_negative_numbers = true,
            conflicts_with = "to"
        )]
        number: Option<i64>,
        /// Uncommit every commit above this revision
        #[arg(short = 't', long, conflicts_with = "names")]
        to: Option<String>,
        /// With --to, also leave out the oldest commit above the target
        #[arg(short = 'x', long, requires = "to")]
        exclusive: bool,
    },
    /// Fold bottom patches into plain history
    Commit {
        /// Patches to commit; must be the bottom of the applied stack
        names: Vec<String>,
        /// Number of bottom patches to commit
        #[arg(
            short = 'n',
            long = "number",
            allow_negative_numbers = true,
            conflicts_with_all = ["names", "all"]
        )]
        number: Option<i64>,
        /// Commit every applied patch
        #[arg(short, long, conflicts_with = "names")]
        all: bool,
    },
    /// List the patches of the stack
    Series {
        /// Show commit ids and summaries
        #[arg(short, long)]
        commits: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show HEAD, stack top and base
    Status,
    /// Show first-parent history from HEAD
    Log {
        /// Maximum number of commits to show (0 = unlimited)
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the stack state log
    StackLog {
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
        /// Verify the hash chain
        #[arg(long)]
        verify: bool,
    },
    /// Read or write workspace config (.sheaf/config.json)
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("SHEAF_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cwd = std::env::current_dir()?;

    match cli.cmd {
        Command::Init => cmd_init::execute(&cwd),
        Command::Record {
            message,
            content,
            merges,
        } => cmd_record::record(&cwd, &message, &content, &merges),
        Command::Reset { rev } => cmd_record::reset(&cwd, &rev),
        Command::Uncommit {
            names,
            number,
            to,
            exclusive,
        } => cmd_uncommit::execute(&cmd_uncommit::UncommitParams {
            repo_root: &cwd,
            names,
            number,
            to: to.as_deref(),
            exclusive,
        }),
        Command::Commit { names, number, all } => cmd_commit::execute(&cwd, names, number, all),
        Command::Series { commits, json } => cmd_series::execute(&cwd, commits, json),
        Command::Status => cmd_status::execute(&cwd),
        Command::Log { limit } => cmd_log::execute(&cwd, limit),
        Command::StackLog { json, verify } => cmd_stack_log::execute(&cwd, json, verify),
        Command::Config { cmd } => cmd_config::run(cmd, &cwd),
    }
}
