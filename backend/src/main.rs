//! Backend entry point: `serve` runs the identity API, `make-users` seeds the
//! example accounts.

mod server;

use actix_web::web;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use recipeapp::IdentityStack;
use recipeapp::domain::bootstrap;
use recipeapp::example_data::{SeedReport, require_persistent_target, seed_example_users};
use recipeapp::inbound::http::health::HealthState;
use recipeapp::inbound::http::session_config::session_settings;
use recipeapp::inbound::http::state::HttpState;
use recipeapp::settings::{AppSettings, RuntimeSettings};

use server::{ServerConfig, create_server};

#[derive(Debug, Parser)]
#[command(name = "recipeapp", version, about = "Recipe app identity backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Create the example chef and guest accounts.
    MakeUsers,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let settings = AppSettings::load()?.resolve()?;
    init_tracing(&settings.log_level);

    let command = cli.command.unwrap_or(Command::Serve);
    if matches!(command, Command::MakeUsers) {
        require_persistent_target(&settings.database)?;
    }

    let stack = IdentityStack::from_settings(&settings)
        .await
        .wrap_err("failed to assemble identity stack")?;

    match command {
        Command::Serve => serve(&settings, stack).await,
        Command::MakeUsers => make_users(&stack).await,
    }
}

async fn serve(settings: &RuntimeSettings, stack: IdentityStack) -> Result<()> {
    let session = session_settings(settings).wrap_err("invalid session configuration")?;
    let bootstrapped = bootstrap(&stack.registry)
        .await
        .wrap_err("role bootstrap failed")?;

    let health_state = web::Data::new(HealthState::new());
    let http_state = HttpState::new(stack.identity, &bootstrapped);
    let server = create_server(
        health_state,
        http_state,
        ServerConfig::new(session, settings.bind_addr),
    )?;
    server.await?;
    Ok(())
}

async fn make_users(stack: &IdentityStack) -> Result<()> {
    let report = seed_example_users(&stack.identity, &stack.registry)
        .await
        .wrap_err("seeding example users failed")?;
    print_report(&report);
    Ok(())
}

#[expect(clippy::print_stdout, reason = "make-users reports to the terminal")]
fn print_report(report: &SeedReport) {
    println!("roles   {}", report.roles.join(", "));
    for email in &report.created {
        println!("created {email}");
    }
    for email in &report.existing {
        println!("exists  {email}");
    }
}
