// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod error;
mod handlers;
mod live;

#[cfg(test)]
mod tests;

use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use shift_exchange_api::{
    ChangeNotifier, ExchangeContext, ShiftAssignmentGateway, StaticDirectory, StaticPlanning,
    UserDirectory,
};
use shift_exchange_persistence::Persistence;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

use crate::handlers::{
    handle_accept_proposal, handle_add_interest, handle_can_submit, handle_cancel_bag_offer,
    handle_cancel_direct_offer, handle_configure_phase, handle_create_bag_offer,
    handle_create_direct_offer, handle_create_proposal, handle_detect_conflict, handle_get_phase,
    handle_list_bag_offers, handle_list_direct_offers, handle_list_offer_proposals,
    handle_list_user_proposals, handle_planning, handle_query_history, handle_record_match,
    handle_reject_bag_offer, handle_reject_match, handle_reject_proposal, handle_remove_interest,
    handle_revert_transfer, handle_validate_match, handle_withdraw_proposal,
};
use crate::live::{ChannelNotifier, LiveEventBroadcaster, handle_live, run_snapshot_feed};

/// Shift exchange server - HTTP surface for the bag and direct marketplaces
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// JSON planning fixture backing shift ownership checks
    #[arg(short, long)]
    assignments: Option<PathBuf>,

    /// JSON user directory used for offer visibility
    #[arg(long)]
    directory: Option<PathBuf>,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    persistence: Arc<Mutex<Persistence>>,
    gateway: Arc<dyn ShiftAssignmentGateway>,
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn ChangeNotifier>,
    broadcaster: Arc<LiveEventBroadcaster>,
}

impl AppState {
    fn new(
        persistence: Persistence,
        gateway: Arc<dyn ShiftAssignmentGateway>,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            persistence: Arc::new(Mutex::new(persistence)),
            gateway,
            directory,
            notifier,
            broadcaster: Arc::new(LiveEventBroadcaster::new()),
        }
    }

    /// Collaborators handed to every api operation.
    fn ctx(&self) -> ExchangeContext<'_> {
        ExchangeContext::new(
            self.gateway.as_ref(),
            self.directory.as_ref(),
            self.notifier.as_ref(),
        )
    }
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    let tenant_routes: Router<AppState> = Router::new()
        .route(
            "/bag/offers",
            post(handle_create_bag_offer).get(handle_list_bag_offers),
        )
        .route("/bag/offers/{id}/cancel", post(handle_cancel_bag_offer))
        .route("/bag/offers/{id}/reject", post(handle_reject_bag_offer))
        .route(
            "/bag/offers/{id}/interest",
            post(handle_add_interest).delete(handle_remove_interest),
        )
        .route("/bag/offers/{id}/match", post(handle_record_match))
        .route(
            "/bag/offers/{id}/match/validate",
            post(handle_validate_match),
        )
        .route("/bag/offers/{id}/match/reject", post(handle_reject_match))
        .route(
            "/bag/phase",
            get(handle_get_phase).put(handle_configure_phase),
        )
        .route("/bag/can-submit", get(handle_can_submit))
        .route(
            "/direct/offers",
            post(handle_create_direct_offer).get(handle_list_direct_offers),
        )
        .route(
            "/direct/offers/{id}/cancel",
            post(handle_cancel_direct_offer),
        )
        .route(
            "/direct/offers/{id}/proposals",
            post(handle_create_proposal).get(handle_list_offer_proposals),
        )
        .route("/direct/proposals", get(handle_list_user_proposals))
        .route(
            "/direct/proposals/{id}/accept",
            post(handle_accept_proposal),
        )
        .route(
            "/direct/proposals/{id}/reject",
            post(handle_reject_proposal),
        )
        .route(
            "/direct/proposals/{id}/withdraw",
            post(handle_withdraw_proposal),
        )
        .route("/conflicts", get(handle_detect_conflict))
        .route("/history", get(handle_query_history))
        .route("/history/{id}/revert", post(handle_revert_transfer))
        .route("/planning/{date}", get(handle_planning))
        .route("/live", get(handle_live));

    Router::new()
        .nest("/tenants/{tenant}", tenant_routes)
        .with_state(app_state)
}

fn load_planning(path: Option<&Path>) -> Result<StaticPlanning, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        warn!("No planning fixture given; every shift ownership check will fail");
        return Ok(StaticPlanning::new());
    };
    info!("Loading planning fixture from: {}", path.display());
    Ok(StaticPlanning::from_json_file(path)?)
}

fn load_directory(path: Option<&Path>) -> Result<StaticDirectory, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        info!("No user directory given; replacement offers are visible to their owners only");
        return Ok(StaticDirectory::new());
    };
    info!("Loading user directory from: {}", path.display());
    Ok(StaticDirectory::from_json_file(path)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing shift exchange server");

    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let planning: StaticPlanning = load_planning(args.assignments.as_deref())?;
    let directory: StaticDirectory = load_directory(args.directory.as_deref())?;

    let (notifier, events): (ChannelNotifier, mpsc::UnboundedReceiver<_>) =
        ChannelNotifier::channel();
    let app_state: AppState = AppState::new(
        persistence,
        Arc::new(planning),
        Arc::new(directory),
        Arc::new(notifier),
    );
    tokio::spawn(run_snapshot_feed(app_state.clone(), events));

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener: tokio::net::TcpListener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
