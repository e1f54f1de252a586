use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header::HeaderName, Method};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod config;
mod errors;
mod service;
mod store;
mod token;

use store::postgres::PgStore;
use store::TokenStore;
use token::permissions::PermissionSet;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub store: PgStore,
    pub config: config::Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "codexi_pat=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Token { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_token_command(&db, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let store = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    store.migrate().await?;

    let state = Arc::new(AppState { store, config: cfg });

    let app = axum::Router::new()
        // Health endpoints (no auth)
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .route("/readyz", axum::routing::get(|| async { "ok" }))
        // Token API — nested under /api/v1
        .nest("/api/v1", api::api_router(state.clone()))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        // Dashboard and CLI clients call from arbitrary origins; preflight
        // OPTIONS is answered by the layer.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    HeaderName::from_static("authorization"),
                    HeaderName::from_static("x-client-info"),
                    HeaderName::from_static("apikey"),
                    HeaderName::from_static("content-type"),
                ]),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("CodeXI PAT service listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_token_command(db: &PgStore, cmd: cli::TokenCommands) -> anyhow::Result<()> {
    match cmd {
        cli::TokenCommands::Issue {
            owner_id,
            name,
            llm,
            agent,
            project,
            cli: cli_actions,
            expires,
        } => {
            let owner = parse_owner_id(&owner_id)?;
            let permissions = PermissionSet {
                llm: to_action_set(llm),
                agent: to_action_set(agent),
                project: to_action_set(project),
                cli: to_action_set(cli_actions),
            };
            let expires_at = match expires {
                Some(raw) => Some(
                    chrono::DateTime::parse_from_rfc3339(&raw)
                        .context("invalid --expires timestamp (want RFC 3339)")?
                        .with_timezone(&chrono::Utc),
                ),
                None => None,
            };

            let issued = service::issue::issue(
                db,
                service::issue::IssueRequest {
                    owner_id: owner,
                    name,
                    permissions,
                    expires_at,
                },
            )
            .await?;

            println!("Token issued (shown once, store it now):");
            println!("  Token:   {}", issued.cleartext);
            println!("  ID:      {}", issued.record.id);
            println!("  Name:    {}", issued.record.name);
            match issued.record.expires_at {
                Some(ts) => println!("  Expires: {}", ts.to_rfc3339()),
                None => println!("  Expires: never"),
            }
        }
        cli::TokenCommands::List { owner_id } => {
            let owner = parse_owner_id(&owner_id)?;
            let tokens = db.list_for_owner(owner).await?;
            if tokens.is_empty() {
                println!("No tokens found.");
            } else {
                println!("{:<38} {:<20} {:<10} {:<10}", "ID", "NAME", "PREFIX", "ACTIVE");
                for t in tokens {
                    println!(
                        "{:<38} {:<20} {:<10} {:<10}",
                        t.id, t.name, t.token_prefix, t.is_active
                    );
                }
            }
        }
        cli::TokenCommands::Revoke { id, owner_id } => {
            let owner = parse_owner_id(&owner_id)?;
            let token_id = uuid::Uuid::parse_str(&id).context("invalid token ID")?;
            let revoked = db.deactivate(token_id, owner).await?;
            if revoked {
                println!("Token revoked.");
            } else {
                println!("Token not found or already revoked.");
            }
        }
    }
    Ok(())
}

fn to_action_set(raw: Option<Vec<String>>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_owner_id(raw: &str) -> anyhow::Result<uuid::Uuid> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("invalid owner ID: {}", raw))
}
