// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live snapshots for presentation layers.
//!
//! The engines publish an [`ExchangeEvent`] after each committed change.
//! [`ChannelNotifier`] hands those events to [`run_snapshot_feed`], which
//! reloads the affected view and broadcasts it to every WebSocket
//! subscriber of the tenant. Each message replaces the subscriber's local
//! view of that kind; nothing is sent as a diff.
//!
//! Snapshots are informational. Clients still read and write through the
//! HTTP routes.

use axum::{
    extract::{
        Path, State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use shift_exchange_api::{
    ApiError, ChangeNotifier, ExchangeEvent, current_phase, get_phase_config, list_bag_offers,
    list_direct_offers, list_proposals_for_offer, query_history,
};
use shift_exchange_domain::{
    BagOffer, DirectOffer, ExchangeType, OfferFilter, Phase, PhaseConfig, Proposal, TenantId,
};
use shift_exchange_history::HistoryEntry;
use shift_exchange_persistence::Persistence;
use time::OffsetDateTime;
use tokio::sync::{MutexGuard, broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::AppState;

/// Maximum number of snapshots buffered per subscriber.
/// Slow subscribers skip older snapshots.
const SNAPSHOT_BUFFER_SIZE: usize = 64;

/// A full replacement view of one part of a tenant's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Active bag offers.
    BagOffers {
        tenant: TenantId,
        offers: Vec<BagOffer>,
    },
    /// Active direct offers.
    DirectOffers {
        tenant: TenantId,
        offers: Vec<DirectOffer>,
    },
    /// Every proposal on one direct offer.
    Proposals {
        tenant: TenantId,
        offer_id: i64,
        proposals: Vec<Proposal>,
    },
    /// The pooled marketplace's phase.
    Phase {
        tenant: TenantId,
        phase: Phase,
        config: Option<PhaseConfig>,
    },
    /// The most recent transfers.
    History {
        tenant: TenantId,
        entries: Vec<HistoryEntry>,
    },
    /// Sent once when a subscriber connects.
    Connected {
        /// Server timestamp (RFC 3339).
        timestamp: String,
    },
}

impl LiveEvent {
    /// The tenant a snapshot belongs to. `None` for connection messages.
    #[must_use]
    pub const fn tenant(&self) -> Option<&TenantId> {
        match self {
            Self::BagOffers { tenant, .. }
            | Self::DirectOffers { tenant, .. }
            | Self::Proposals { tenant, .. }
            | Self::Phase { tenant, .. }
            | Self::History { tenant, .. } => Some(tenant),
            Self::Connected { .. } => None,
        }
    }
}

/// Fans snapshots out to WebSocket subscribers.
#[derive(Debug, Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx): (broadcast::Sender<LiveEvent>, broadcast::Receiver<LiveEvent>) =
            broadcast::channel(SNAPSHOT_BUFFER_SIZE);
        Self { tx }
    }

    /// Sends a snapshot to every subscriber. Dropped when nobody listens.
    pub fn broadcast(&self, event: &LiveEvent) {
        match self.tx.send(event.clone()) {
            Ok(count) => debug!(tenant = ?event.tenant(), receivers = count, "Broadcast snapshot"),
            Err(_) => debug!(tenant = ?event.tenant(), "No receivers for snapshot"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards engine events to the snapshot feed.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<ExchangeEvent>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiving end for [`run_snapshot_feed`].
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExchangeEvent>) {
        let (tx, rx): (
            mpsc::UnboundedSender<ExchangeEvent>,
            mpsc::UnboundedReceiver<ExchangeEvent>,
        ) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn publish(&self, event: ExchangeEvent) {
        if self.tx.send(event).is_err() {
            warn!("Snapshot feed stopped; dropping change event");
        }
    }
}

/// Loads the snapshot describing the state an event touched.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn load_snapshot(
    app_state: &AppState,
    event: &ExchangeEvent,
) -> Result<LiveEvent, ApiError> {
    let tenant: TenantId = event.tenant().clone();
    let everything: OfferFilter = OfferFilter::default();
    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;

    let snapshot: LiveEvent = match event {
        ExchangeEvent::OffersChanged {
            exchange_type: ExchangeType::Bag,
            ..
        } => LiveEvent::BagOffers {
            offers: list_bag_offers(&mut persistence, &app_state.ctx(), &tenant, &everything, None)?,
            tenant,
        },
        ExchangeEvent::OffersChanged {
            exchange_type: ExchangeType::Direct,
            ..
        } => LiveEvent::DirectOffers {
            offers: list_direct_offers(
                &mut persistence,
                &app_state.ctx(),
                &tenant,
                &everything,
                None,
            )?,
            tenant,
        },
        ExchangeEvent::ProposalsChanged { offer_id, .. } => LiveEvent::Proposals {
            offer_id: *offer_id,
            proposals: list_proposals_for_offer(&mut persistence, &tenant, *offer_id)?,
            tenant,
        },
        ExchangeEvent::PhaseChanged { .. } => LiveEvent::Phase {
            phase: current_phase(&mut persistence, &tenant, OffsetDateTime::now_utc())?,
            config: get_phase_config(&mut persistence, &tenant)?,
            tenant,
        },
        ExchangeEvent::HistoryAppended { .. } | ExchangeEvent::HistoryReverted { .. } => {
            LiveEvent::History {
                entries: query_history(&mut persistence, &tenant, None, None)?,
                tenant,
            }
        }
    };
    drop(persistence);

    Ok(snapshot)
}

/// Turns engine events into broadcast snapshots until every notifier is
/// dropped.
pub async fn run_snapshot_feed(
    app_state: AppState,
    mut events: mpsc::UnboundedReceiver<ExchangeEvent>,
) {
    info!("Snapshot feed started");
    while let Some(event) = events.recv().await {
        match load_snapshot(&app_state, &event).await {
            Ok(snapshot) => app_state.broadcaster.broadcast(&snapshot),
            Err(err) => warn!(error = %err, ?event, "Failed to load snapshot"),
        }
    }
    info!("Snapshot feed stopped");
}

/// Handler for GET `/tenants/{tenant}/live`.
///
/// Upgrades to a WebSocket that receives the tenant's snapshots.
pub async fn handle_live(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
) -> Response {
    let tenant: TenantId = TenantId::new(tenant.trim());
    let rx: broadcast::Receiver<LiveEvent> = app_state.broadcaster.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, tenant, rx))
}

async fn handle_socket(
    socket: WebSocket,
    tenant: TenantId,
    mut rx: broadcast::Receiver<LiveEvent>,
) {
    info!(tenant = %tenant, "Client connected to live snapshots");

    let (mut sender, mut receiver) = socket.split();

    let connected: LiveEvent = LiveEvent::Connected {
        timestamp: OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| String::from("unknown")),
    };
    if let Ok(json) = serde_json::to_string(&connected)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let event: LiveEvent = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged; older snapshots skipped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if event.tenant() != Some(&tenant) {
                continue;
            }
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!(?e, "Failed to serialize snapshot"),
            }
        }
    });

    // Nothing is accepted over the socket.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => break,
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("Client disconnected from live snapshots");
}
