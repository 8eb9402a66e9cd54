//! `GET /ws`: the live channel.
//!
//! On connect the session joins its role groups (admin, or its merchant)
//! and its user group, then receives every event published to them. The
//! client joins single orders with `order.subscribe`. Memberships end with
//! the connection.

use axum::{
    extract::{
        Query, State,
        rejection::QueryRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use d2y_core::events::{Group, Subscription};
use d2y_core::identity::Caller;
use d2y_sdk::objects::{ClientMessage, ServerMessage};
use serde::Deserialize;

use super::ApiError;
use super::extractors::{bearer_token, resolve_caller};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub(super) struct LiveParams {
    /// For clients that cannot set headers on the upgrade request.
    token: Option<String>,
}

/// Authenticate, then upgrade. The bearer header wins over `?token=`.
pub(super) async fn live_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<LiveParams>, QueryRejection>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let token = bearer_token(&headers).or(params.token.as_deref());
    let caller = resolve_caller(&state, token).await?;
    Ok(ws.on_upgrade(move |socket| handle_live(socket, state, caller)))
}

/// Drives one connection until either side goes away.
async fn handle_live(mut socket: WebSocket, state: AppState, caller: Caller) {
    let mut subscription = state.hub().subscribe(Group::for_session(&caller));
    tracing::debug!(user_id = %caller.user_id, "WS: session opened");

    let hello = ServerMessage::Connected {
        user: caller.info(),
    };
    if send_json(&mut socket, &hello).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let msg = ServerMessage::Event(event.as_ref().clone());
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Some(reply) =
                            client_message(&state, &caller, &subscription, text.as_str()).await
                        else {
                            continue;
                        };
                        if send_json(&mut socket, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    subscription.leave_all();
    tracing::debug!(user_id = %caller.user_id, "WS: session closed");
}

/// Handle one client frame. Frames that are not a known message are ignored.
async fn client_message(
    state: &AppState,
    caller: &Caller,
    subscription: &Subscription,
    raw: &str,
) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ClientMessage>(raw) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(error = %e, "WS: ignoring client frame");
            return None;
        }
    };

    match message {
        ClientMessage::OrderSubscribe { order_id } => {
            let reply = match state.engine.order_group(caller, order_id).await {
                Ok(group) => {
                    subscription.join(group);
                    ServerMessage::SubscribeResult {
                        order_id,
                        ok: true,
                        error: None,
                    }
                }
                Err(e) => ServerMessage::SubscribeResult {
                    order_id,
                    ok: false,
                    error: Some(e.code()),
                },
            };
            Some(reply)
        }
    }
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
