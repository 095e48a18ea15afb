use cr_core::Epoch;
use cr_core::GameId;
use cr_core::PlayerId;
use cr_gameplay::ActionKind;
use cr_core::Chips;
use serde::Deserialize;
use std::collections::HashMap;

/// Everything a client can send, one envelope per WebSocket text frame:
/// `{"action": "<name>", "payload": {...}}`. `identify` is the only action
/// accepted before a session exists — every other variant requires one.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Identify {
        display_name: String,
        reconnect_token: Option<String>,
    },
    ListGames {},
    #[serde(rename_all = "camelCase")]
    JoinGame {
        game_id: GameId,
        #[serde(default = "default_role")]
        role: SeatRoleRequest,
    },
    Ready {},
    #[serde(rename_all = "camelCase")]
    PlayerAction {
        hand_number: Epoch,
        #[serde(rename = "type")]
        kind: ActionKind,
        amount: Option<Chips>,
    },
    #[serde(rename_all = "camelCase")]
    RevealCards {
        hand_number: Epoch,
    },
    Chat {
        message: String,
    },
    LeaveGame {},
    #[serde(rename_all = "camelCase")]
    ReplayControl {
        command: ReplayCommand,
        speed: Option<f32>,
        position: Option<usize>,
    },
    #[serde(rename_all = "camelCase")]
    ReplayCardVisibility {
        show_all_cards: Option<bool>,
        player_visibility: Option<HashMap<PlayerId, bool>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatRoleRequest {
    Player,
    Spectator,
}

fn default_role() -> SeatRoleRequest {
    SeatRoleRequest::Player
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayCommand {
    Play,
    Pause,
    StepForward,
    StepBackward,
    JumpRoundStart,
    JumpNextRound,
    SetSpeed,
    SetPosition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_game_defaults_role_to_player() {
        let json = r#"{"action":"joinGame","payload":{"gameId":"00000000-0000-0000-0000-000000000000"}}"#;
        let message: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            message,
            ClientMessage::JoinGame { role: SeatRoleRequest::Player, .. }
        ));
    }

    #[test]
    fn player_action_parses_the_type_tag_under_its_wire_name() {
        let json = r#"{"action":"playerAction","payload":{"handNumber":3,"type":"RAISE","amount":40}}"#;
        let message: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            message,
            ClientMessage::PlayerAction { hand_number: 3, kind: ActionKind::Raise, amount: Some(40) }
        ));
    }

    #[test]
    fn an_unknown_action_fails_to_parse() {
        let json = r#"{"action":"doSomethingElse","payload":{}}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
