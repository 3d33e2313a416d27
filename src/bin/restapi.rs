//! restapi CLI binary.
//!
//! Thin command-line front end over the session and the version negotiator.
//!
//! # Commands
//!
//! - `get` - Send a GET request and print the status and body
//! - `discover` - Query a service's versions and negotiate one

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use restapi::{
    config::Config,
    discovery::{Negotiation, ServiceProfile},
    session::{RequestOptions, Session, Verify},
    TokenAuth, VERSION,
};

#[derive(Parser)]
#[command(name = "restapi")]
#[command(version = VERSION)]
#[command(about = "Versioned REST API client - requests and version negotiation", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Config file path (default: <config dir>/restapi/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    /// CA bundle used to verify TLS certificates
    #[arg(long, global = true)]
    cacert: Option<PathBuf>,

    /// User-Agent header value
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Token sent in the X-Auth-Token header
    #[arg(long, global = true, env = "RESTAPI_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Enable debug logging (request/response dumps)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a GET request
    Get {
        /// Target URL
        url: String,

        /// Query parameters (key=value, repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Do not follow redirects
        #[arg(long)]
        no_redirect: bool,
    },

    /// Discover server versions and negotiate a compatible one
    Discover {
        /// Discovery URL
        url: String,

        /// Client-supported versions (comma-separated)
        #[arg(long, value_delimiter = ',', required_unless_present = "requested")]
        clients: Vec<String>,

        /// Only negotiate this version
        #[arg(long)]
        requested: Option<String>,

        /// Allow stripping a deprecated version suffix from the URL
        #[arg(long)]
        not_strict: bool,

        /// Use the identity service profile
        #[arg(long)]
        identity: bool,

        /// Keep self links exactly as the server reports them
        #[arg(long)]
        no_url_workaround: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose);
    let config = load_config(&cli.global)?;

    let mut session = Session::new(&config.session)?;
    if let Some(token) = &cli.global.token {
        session = session.with_auth(TokenAuth::new(token.clone()));
    }

    match cli.command {
        Commands::Get {
            url,
            params,
            no_redirect,
        } => cmd_get(&session, &url, &params, no_redirect),

        Commands::Discover {
            url,
            clients,
            requested,
            not_strict,
            identity,
            no_url_workaround,
            json,
        } => {
            let profile = if identity {
                ServiceProfile::identity()
            } else {
                ServiceProfile::default()
            };

            let mut negotiation = Negotiation::new(url)
                .clients(clients)
                .discovery_config(&config.discovery)
                .profile(profile);
            if not_strict {
                negotiation = negotiation.strict(false);
            }
            if no_url_workaround {
                negotiation = negotiation.workaround_url_bug(false);
            }
            if let Some(requested) = requested {
                negotiation = negotiation.requested_version(requested);
            }

            cmd_discover(&session, negotiation, json)
        }
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &GlobalArgs) -> anyhow::Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(cacert) = &args.cacert {
        config.session.verify = Verify::CaBundle(cacert.clone());
    }
    if args.insecure {
        config.session.verify = Verify::Disabled;
    }
    if let Some(agent) = &args.user_agent {
        config.session.user_agent = Some(agent.clone());
    }

    Ok(config)
}

fn cmd_get(session: &Session, url: &str, params: &[String], no_redirect: bool) -> anyhow::Result<()> {
    let mut options = RequestOptions::new();
    for param in params {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid parameter: {param}. Use: key=value"))?;
        options = options.param(key, value);
    }
    if no_redirect {
        options = options.redirect(false);
    }

    let resp = session.get(url, options)?;

    for hop in resp.history() {
        eprintln!("{} {}", hop.status(), hop.url());
    }
    eprintln!("{} {}", resp.status(), resp.url());
    println!("{}", resp.text()?);

    Ok(())
}

fn cmd_discover(session: &Session, negotiation: Negotiation, json: bool) -> anyhow::Result<()> {
    let negotiator = negotiation.run(session)?;

    if json {
        let output = serde_json::json!({
            "url": negotiator.probe_url().as_str(),
            "server_versions": negotiator.server_versions(),
            "matched": negotiator.matched().map(|m| serde_json::json!({
                "server": m.server,
                "client": m.client,
            })),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Server versions at {}:", negotiator.probe_url());
    if negotiator.server_versions().is_empty() {
        println!("  (none)");
    }
    for version in negotiator.server_versions() {
        println!(
            "  {:<8} {:<12} {}",
            version.id,
            version.status.as_deref().unwrap_or("-"),
            version.url.as_deref().unwrap_or("-")
        );
    }

    println!();
    match negotiator.matched() {
        Some(m) => {
            println!("Negotiated:");
            println!("  Server:  {}", m.server);
            println!("  Client:  {}", m.client);
            if let Some(url) = &m.server.url {
                println!("  URL:     {url}");
            }
        }
        None => {
            eprintln!("No compatible version found");
            std::process::exit(1);
        }
    }

    Ok(())
}
