pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use esm_core::PageQuery;

use commands::{
    approvals, auth, config, dashboard, doctor, submissions, templates, users, CommandResult,
    GlobalArgs,
};

#[derive(Debug, Parser)]
#[command(
    name = "esm",
    about = "Electronic Submission Management client",
    long_about = "Sign in, fill and track forms, review approvals, and administer templates and users against an ESM backend.",
    after_help = "Examples:\n  esm login --username jdoe\n  esm submissions show 90 --log-id 1\n  esm approvals decide 90 reject --comment \"missing receipt\"\n  esm doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an esm.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override api.base_url for this invocation")]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Sign in and persist the session")]
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, help = "Password; falls back to the ESM_PASSWORD environment variable")]
        password: Option<String>,
    },
    #[command(about = "Forget the persisted session")]
    Logout,
    #[command(about = "Show the signed-in user and role capabilities")]
    Whoami,
    #[command(about = "Fetch the dashboard sections for the signed-in role")]
    Dashboard,
    #[command(subcommand, about = "Browse and administer form templates")]
    Templates(TemplatesCommand),
    #[command(subcommand, about = "Fill, track, and resubmit your own forms")]
    Submissions(SubmissionsCommand),
    #[command(subcommand, about = "Review submissions assigned to you")]
    Approvals(ApprovalsCommand),
    #[command(subcommand, about = "Inspect and administer user accounts")]
    Users(UsersCommand),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Check configuration, session storage, and API reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    #[arg(long, default_value_t = 10)]
    pub size: u32,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub sort: Option<String>,
}

impl PageArgs {
    pub fn query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            size: self.size,
            search: self.search.clone(),
            sort: self.sort.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    #[command(about = "List templates (active ones, or all with --admin)")]
    List {
        #[arg(long)]
        admin: bool,
        #[command(flatten)]
        paging: PageArgs,
    },
    Show {
        id: i64,
    },
    #[command(about = "Create a template from a JSON draft file")]
    Create {
        file: PathBuf,
    },
    Update {
        id: i64,
        file: PathBuf,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum SubmissionsCommand {
    Drafts {
        #[command(flatten)]
        paging: PageArgs,
    },
    Submitted {
        #[command(flatten)]
        paging: PageArgs,
    },
    #[command(about = "Show a submission with its workflow, optionally as of a history log id")]
    Show {
        id: i64,
        #[arg(long)]
        log_id: Option<i64>,
    },
    #[command(about = "Save values as a draft (new, or --id to update an existing draft)")]
    SaveDraft {
        #[arg(long)]
        template: i64,
        #[arg(long)]
        id: Option<i64>,
        #[arg(long = "value", value_name = "FIELD_ID=VALUE")]
        values: Vec<String>,
    },
    #[command(about = "Submit a new form, or an existing draft with --draft")]
    Submit {
        #[arg(long)]
        template: i64,
        #[arg(long)]
        draft: Option<i64>,
        #[arg(long = "value", value_name = "FIELD_ID=VALUE")]
        values: Vec<String>,
    },
    #[command(about = "Resubmit a rejected submission with corrected values")]
    Resubmit {
        id: i64,
        #[arg(long = "value", value_name = "FIELD_ID=VALUE")]
        values: Vec<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum ApprovalsCommand {
    Pending {
        #[command(flatten)]
        paging: PageArgs,
    },
    History {
        #[command(flatten)]
        paging: PageArgs,
    },
    Show {
        id: i64,
        #[arg(long)]
        log_id: Option<i64>,
    },
    #[command(about = "Approve or reject a submission (reject requires --comment)")]
    Decide {
        id: i64,
        action: String,
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    List {
        #[command(flatten)]
        paging: PageArgs,
    },
    Show {
        id: i64,
    },
    Managers,
    Profile,
    #[command(about = "Change a user's role and account status")]
    SetRole {
        id: i64,
        #[arg(long)]
        role: String,
        #[arg(long, default_value = "active")]
        status: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs { config_path: cli.config, base_url: cli.base_url };
    logging::init_from(&global);

    let result = dispatch(&global, cli.command);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn dispatch(global: &GlobalArgs, command: Command) -> CommandResult {
    match command {
        Command::Login { username, password } => auth::login(global, &username, password),
        Command::Logout => auth::logout(global),
        Command::Whoami => auth::whoami(global),
        Command::Dashboard => dashboard::run(global),
        Command::Templates(command) => templates::run(global, command),
        Command::Submissions(command) => submissions::run(global, command),
        Command::Approvals(command) => approvals::run(global, command),
        Command::Users(command) => users::run(global, command),
        Command::Config => CommandResult { exit_code: 0, output: config::run(global) },
        Command::Doctor { json } => doctor::run(global, json),
    }
}
