use std::borrow::Cow;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::Level;
use url::Url;

use rehost::core::{rehost_css, rehost_css_relative, RehostError, RewriteMode, RewriteRule};
use rehost::env::{core as env_vars, EnvVar};

/// Rewrite internal IPv4 asset URLs in aggregated CSS
#[derive(Parser)]
#[command(name = "rehost", version, about)]
struct Cli {
    /// CSS file to process; reads standard input when omitted
    input: Option<PathBuf>,

    /// Canonical host name to rewrite URLs to
    /// (falls back to REHOST_PRIMARY_HOST, then to the --request-url host)
    #[arg(long)]
    host: Option<String>,

    /// Scheme to rewrite URLs to (falls back to the --request-url scheme)
    #[arg(long)]
    scheme: Option<String>,

    /// URL of the inbound request, used as host and scheme fallback
    #[arg(long)]
    request_url: Option<String>,

    /// The server's own IPv4 address (falls back to REHOST_SERVER_ADDRESS)
    #[arg(long)]
    server_address: Option<String>,

    /// Rewrite every IPv4-literal host instead of only the server address
    #[arg(long)]
    all_addresses: bool,

    /// Anchor relative url() paths at this directory before host-prefixing
    #[arg(long)]
    base_path: Option<String>,

    /// Write output to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    init_logging();

    if let Err(err) = run(&cli) {
        eprintln!("rehost: {}", err);
        process::exit(1);
    }
}

fn init_logging() {
    let level = env_vars::LogLevel::get_or_default("info".to_string());
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let no_color = env_vars::NoColor::get_or_default(false);

    // CSS goes to stdout, logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!no_color)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), RehostError> {
    let request_url = match &cli.request_url {
        Some(raw) => Some(Url::parse(raw).map_err(|err| {
            RehostError::new(&format!("invalid request URL '{}': {}", raw, err))
        })?),
        None => None,
    };

    let rule = resolve_rule(cli, request_url.as_ref());

    if rule.host.is_empty() {
        tracing::warn!(
            "No host name configured or resolvable; content will pass through unchanged"
        );
    }

    let (content, asset) = read_input(cli.input.as_deref())?;

    let anchored = match &cli.base_path {
        Some(base_path) => rehost_css_relative(&content, &asset, base_path, &rule).content,
        None => Cow::Borrowed(content.as_str()),
    };

    let result = rehost_css(&anchored, &asset, &rule);

    write_output(cli.output.as_deref(), result.content.as_bytes())
}

/// Builds the rewrite rule from CLI flags, environment and request URL
fn resolve_rule(cli: &Cli, request_url: Option<&Url>) -> RewriteRule {
    let configured_host = match &cli.host {
        Some(host) => Some(host.clone()),
        None => match env_vars::PrimaryHost::get() {
            Ok(host) if !host.is_empty() => Some(host),
            _ => None,
        },
    };

    let mut rule = RewriteRule::resolve(configured_host.as_deref(), request_url);

    if let Some(scheme) = &cli.scheme {
        rule.scheme = scheme.clone();
    }

    rule.server_address = match &cli.server_address {
        Some(address) => address.clone(),
        None => match env_vars::ServerAddress::get() {
            Ok(address) => address,
            Err(err) => {
                tracing::warn!("{}. Server-address rewriting disabled.", err);
                String::new()
            }
        },
    };

    if cli.all_addresses {
        rule.mode = RewriteMode::AnyAddress;
    }

    rule
}

fn read_input(input: Option<&Path>) -> Result<(String, String), RehostError> {
    match input {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|err| {
                RehostError::new(&format!("could not read {}: {}", path.display(), err))
            })?;

            Ok((content, path.display().to_string()))
        }
        None => {
            let mut content = String::new();

            io::stdin().read_to_string(&mut content).map_err(|err| {
                RehostError::new(&format!("could not read standard input: {}", err))
            })?;

            Ok((content, "<stdin>".to_string()))
        }
    }
}

fn write_output(output: Option<&Path>, content: &[u8]) -> Result<(), RehostError> {
    match output {
        Some(path) => fs::write(path, content).map_err(|err| {
            RehostError::new(&format!("could not write {}: {}", path.display(), err))
        }),
        None => {
            let mut stdout = io::stdout();

            stdout
                .write_all(content)
                .and_then(|_| stdout.flush())
                .map_err(|err| {
                    RehostError::new(&format!("could not write standard output: {}", err))
                })
        }
    }
}
