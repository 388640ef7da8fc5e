//! Purpose: `domreg` CLI entry point and command-line surface.
//! Role: Binary crate root; parses args, runs commands, emits results.
//! Invariants: Machine-readable output is JSON on stdout; human output only on TTYs.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All network traffic goes through `api::RemoteClient`.
#![allow(clippy::result_large_err)]

use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};

mod command_dispatch;
mod render;
mod session_store;

use domreg::api::{Error, ErrorKind, RemoteClient, ResultTree, Session, to_exit_code};
use render::render_tree;
use session_store::{clear_token, default_session_path, load_token, save_token};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let ctx = CliContext {
        url: cli.url,
        session_file: cli.session_file.unwrap_or_else(default_session_path),
        tls_ca: cli.tls_ca,
        tls_skip_verify: cli.tls_skip_verify,
        color: color_mode,
    };

    command_dispatch::dispatch_command(cli.command, ctx)
        .map_err(add_auth_hint)
        .map_err(add_transport_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "domreg",
    version,
    about = "Manage domains at a registrar management endpoint",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Talks to a registrar management endpoint over plain HTTP GET requests.
Replies are dotted key/value text decoded into a nested tree.

Mental model:
  - `login` opens a session and stores its token
  - `query` runs any endpoint command and prints the decoded reply
  - `domain` wraps the common domain queries with friendly output
"#,
    after_help = r#"EXAMPLES
  $ export DOMREG_URL=https://rmapi.example.net
  $ domreg login --username alice --password-file ~/.domreg/password
  $ domreg domain list
  $ domreg domain info example.com
  $ domreg query query-domain-info domain=example.com

LEARN MORE
  $ domreg <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        env = "DOMREG_URL",
        value_name = "URL",
        help = "Registrar endpoint base URL, e.g. https://rmapi.example.net"
    )]
    url: Option<String>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Session token file (default: ~/.domreg/session)",
        value_hint = ValueHint::FilePath
    )]
    session_file: Option<PathBuf>,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and TTY output: auto|always|never"
    )]
    color: ColorMode,
    #[arg(
        long = "tls-ca",
        value_name = "PATH",
        help = "Trust this PEM CA/certificate for the endpoint",
        value_hint = ValueHint::FilePath,
        help_heading = "TLS"
    )]
    tls_ca: Option<PathBuf>,
    #[arg(
        long = "tls-skip-verify",
        help = "Disable TLS certificate verification (unsafe; dev-only)",
        help_heading = "TLS"
    )]
    tls_skip_verify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Open a session and store its token",
        long_about = r#"Log in to the registrar endpoint.

The session token from the reply head is stored in the session file and
reused by every other command until `logout`."#,
        after_help = r#"EXAMPLES
  $ domreg login --username alice --password-file ~/.domreg/password
  $ domreg login --username alice --password s3cret   # dev-only

NOTES
  - Prefer --password-file; --password leaks into shell history.
  - The session file is user-only readable on Unix."#
    )]
    Login {
        #[arg(long, help = "Account user name")]
        username: String,
        #[arg(
            long,
            help = "Account password (dev-only; prefer --password-file)",
            conflicts_with = "password_file"
        )]
        password: Option<String>,
        #[arg(
            long,
            value_name = "PATH",
            help = "Read the account password from file",
            value_hint = ValueHint::FilePath
        )]
        password_file: Option<PathBuf>,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        about = "End the session and forget the stored token",
        after_help = r#"EXAMPLES
  $ domreg logout"#
    )]
    Logout {
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Run any endpoint command and print the decoded reply",
        long_about = r#"Run an arbitrary endpoint command.

Parameters are key=value pairs appended to the request. The reply body is
decoded into a nested tree and printed as indented text on terminals or as
JSON otherwise; `--raw` prints the verbatim body instead."#,
        after_help = r#"EXAMPLES
  $ domreg query query-domain-info domain=example.com
  $ domreg query query-contact-list | jq '.result'
  $ domreg query query-domain-info domain=example.com --raw

NOTES
  - Values keep embedded `: ` sequences; only the first one splits a line.
  - Unrecognized reply lines are skipped, never errors."#
    )]
    Query {
        #[arg(help = "Endpoint command name, e.g. query-domain-info")]
        command: String,
        #[arg(help = "key=value parameters (repeatable)")]
        params: Vec<String>,
        #[arg(long, help = "Print the raw reply body instead of the decoded tree")]
        raw: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Friendly wrappers for common domain queries"
    )]
    Domain {
        #[command(subcommand)]
        command: DomainCommand,
    },
    #[command(
        about = "Print version info",
        after_help = r#"EXAMPLES
  $ domreg version"#
    )]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Prints a completion script for the given shell to stdout."#,
        after_help = r#"EXAMPLES
  $ domreg completion bash > ~/.local/share/bash-completion/completions/domreg
  $ domreg completion zsh > ~/.zfunc/_domreg"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum DomainCommand {
    #[command(
        arg_required_else_help = true,
        about = "Show one domain with its nameservers",
        after_help = r#"EXAMPLES
  $ domreg domain info example.com
  $ domreg domain info example.com --json"#
    )]
    Info {
        #[arg(help = "Domain name")]
        name: String,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        about = "List domains in the account",
        after_help = r#"EXAMPLES
  $ domreg domain list
  $ domreg domain list --json"#
    )]
    List {
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
}

struct CliContext {
    url: Option<String>,
    session_file: PathBuf,
    tls_ca: Option<PathBuf>,
    tls_skip_verify: bool,
    color: ColorMode,
}

impl CliContext {
    fn client(&self) -> Result<RemoteClient, Error> {
        let Some(url) = &self.url else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("no registrar endpoint configured")
                .with_hint("Pass --url or set DOMREG_URL."));
        };
        let mut client = RemoteClient::new(url.clone())?;
        if let Some(ca) = &self.tls_ca {
            client = client.with_tls_ca_file(ca)?;
        }
        if self.tls_skip_verify {
            client = client.with_tls_skip_verify();
        }
        Ok(client)
    }

    /// Session resumed from the stored token, plus the token as stored so
    /// callers can detect a refresh worth persisting.
    fn open_session(&self) -> Result<(Session, String), Error> {
        let token = load_token(&self.session_file)?.ok_or_else(|| {
            Error::new(ErrorKind::Auth)
                .with_message("not logged in")
                .with_hint("Run `domreg login` first.")
        })?;
        Ok((Session::with_token(token.clone()), token))
    }

    fn persist_session(&self, stored_token: &str, session: &Session) -> Result<(), Error> {
        match session.token() {
            Some(token) if token != stored_token => save_token(&self.session_file, token),
            Some(_) => Ok(()),
            None => clear_token(&self.session_file),
        }
    }
}

fn resolve_password(
    password: Option<String>,
    password_file: Option<PathBuf>,
) -> Result<String, Error> {
    if let Some(password) = password {
        return Ok(password);
    }
    let Some(path) = password_file else {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("login requires a password source")
            .with_hint("Pass --password-file (preferred) or --password."));
    };
    let text = std::fs::read_to_string(&path).map_err(|err| {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::Permission,
            _ => ErrorKind::Io,
        };
        Error::new(kind)
            .with_message(format!("failed to read password file {}", path.display()))
            .with_source(err)
    })?;
    let password = text.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("password file {} is empty", path.display())));
    }
    Ok(password.to_string())
}

fn parse_param(raw: &str) -> Result<(String, String), Error> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid parameter `{raw}`"))
            .with_hint("Parameters take the form key=value."));
    };
    if key.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid parameter `{raw}`"))
            .with_hint("Parameters take the form key=value."));
    }
    Ok((key.to_string(), value.to_string()))
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("domreg {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(json!({
            "name": "domreg",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

/// Decoded tree for humans on a TTY, `{"result": ...}` JSON otherwise.
fn emit_tree(tree: &ResultTree, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    if is_tty {
        print!("{}", render_tree(tree, color_mode.use_color(is_tty)));
    } else {
        emit_json(json!({ "result": tree.to_json() }));
    }
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Auth => "not authenticated".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Registrar => "registrar request failed".to_string(),
        ErrorKind::Transport => "transport failure".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(command) = err.command() {
        inner.insert("command".to_string(), json!(command));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(http_status) = err.http_status() {
        inner.insert("http_status".to_string(), json!(http_status));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(command) = err.command() {
        lines.push(format!(
            "{} {command}",
            colorize_label("command:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(status) = err.status() {
        lines.push(format!(
            "{} {status}",
            colorize_label("status:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(http_status) = err.http_status() {
        lines.push(format!(
            "{} {http_status}",
            colorize_label("http:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `domreg --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "domreg") else {
        return "Try `domreg --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `domreg --help`.".to_string();
    }
    format!("Try `domreg {} --help`.", parts.join(" "))
}

fn add_auth_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Auth || err.hint().is_some() {
        return err;
    }
    err.with_hint("Run `domreg login` first.")
}

fn add_transport_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Transport || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check --url (or DOMREG_URL) and that the endpoint is reachable.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and share command/context if it persists.",
    )
}
