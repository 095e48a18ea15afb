use crate::client_message::ClientMessage;
use crate::lobby::Lobby;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use cr_core::Chips;
use cr_core::PlayerId;
use cr_gameplay::GameType;
use cr_gameroom::ErrorCode;
use cr_gameroom::RoomConfig;
use cr_gameroom::ServerMessage;
use cr_session::SocketSink;
use futures::StreamExt;
use serde::Deserialize;

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub game_name: String,
    pub game_type: GameType,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    pub max_players: usize,
    pub starting_stack: Chips,
    #[serde(default = "default_min_players")]
    pub min_players_to_start: usize,
}

fn default_min_players() -> usize {
    2
}

/// Admin-style room creation. The real admin surface (auth, quotas, room
/// lifecycle policy) is out of scope here; this exists so the server has a
/// way to seed a cold room at all.
pub async fn create_room(lobby: web::Data<Lobby>, body: web::Json<CreateRoomRequest>) -> impl Responder {
    let body = body.into_inner();
    let game_id = lobby.create_room(RoomConfig {
        game_name: body.game_name,
        game_type: body.game_type,
        small_blind_amount: body.small_blind_amount,
        big_blind_amount: body.big_blind_amount,
        max_players: body.max_players,
        starting_stack: body.starting_stack,
        min_players_to_start: body.min_players_to_start,
    });
    HttpResponse::Ok().json(serde_json::json!({ "gameId": game_id.to_string() }))
}

/// Upgrades to a WebSocket and bridges it to the lobby for its whole
/// lifetime: inbound text frames are parsed into `ClientMessage` and
/// dispatched, outbound frames queued by any room (not necessarily the one
/// this socket is seated in) are written back as they arrive.
pub async fn ws_connect(lobby: web::Data<Lobby>, req: HttpRequest, body: web::Payload) -> actix_web::Result<impl Responder> {
    let (response, mut session, mut stream) = actix_ws::handle(&req, body)?;
    let (socket_id, mut outbound) = lobby.sockets.register();
    let lobby = lobby.into_inner();
    actix_web::rt::spawn(async move {
        let mut player_id: Option<PlayerId> = None;
        log::debug!("[hosting] socket {:?} connected", socket_id);
        'conn: loop {
            tokio::select! {
                biased;
                frame = outbound.recv() => match frame {
                    Some(json) => if session.text(json).await.is_err() { break 'conn },
                    None => break 'conn,
                },
                frame = stream.next() => match frame {
                    Some(Ok(actix_ws::Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(message) => player_id = lobby.dispatch(player_id, socket_id, message, &lobby.sockets),
                            Err(error) => lobby.sockets.send(
                                socket_id,
                                ServerMessage::Error {
                                    code: ErrorCode::InvalidMessage,
                                    message: error.to_string(),
                                    details: None,
                                },
                            ),
                        }
                    }
                    Some(Ok(actix_ws::Message::Close(_))) => break 'conn,
                    Some(Err(_)) => break 'conn,
                    None => break 'conn,
                    _ => continue 'conn,
                },
            }
        }
        lobby.sockets.forget(socket_id);
        lobby.handle_disconnect(socket_id);
        log::debug!("[hosting] socket {:?} disconnected", socket_id);
    });
    Ok(response)
}
