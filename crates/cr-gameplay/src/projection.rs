use crate::action::LegalAction;
use crate::pot::PotBreakdown;
use crate::stage::Stage;
use crate::state::EngineState;
use crate::state::GameStatus;
use crate::state::GameType;
use crate::state::SeatRole;
use crate::state::SpectatorVisibility;
use crate::validator::legal_actions;
use cr_cards::Card;
use cr_cards::Hole;
use cr_core::Chips;
use cr_core::Epoch;
use cr_core::GameId;
use cr_core::PlayerId;
use cr_core::Position;
use serde::Serialize;

/// One seat as a viewer is allowed to see it: hole cards are `None` unless
/// visibility rules for this particular viewer grant access.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPlayer {
    pub id: PlayerId,
    pub display_name: String,
    pub seat_index: Position,
    pub role: SeatRole,
    pub stack: Chips,
    pub bet: Chips,
    pub pot_share: Chips,
    pub folded: bool,
    pub hole_cards: Option<Hole>,
    pub connected: bool,
    pub is_all_in: bool,
    pub is_ready: bool,
}

/// The externally visible projection of `EngineState` for one viewer: the
/// deck and `actedThisRound` bookkeeping never leave the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientGameState {
    pub game_id: GameId,
    pub game_name: String,
    pub game_type: GameType,
    pub status: GameStatus,
    pub hand_number: Epoch,
    pub stage: Stage,
    pub hand_in_progress: bool,
    pub community_cards: Vec<Card>,
    pub pot: Chips,
    pub pots: Vec<PotBreakdown>,
    pub seats: Vec<ClientPlayer>,
    pub dealer_seat_index: Position,
    pub current_bet: Chips,
    pub active_player_id: Option<PlayerId>,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    pub max_players: usize,
    pub starting_stack: Chips,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub player_id: PlayerId,
    pub hand_number: Epoch,
    pub legal_actions: Vec<LegalAction>,
    pub time_to_act_ms: u64,
}

fn visible_to(
    state: &EngineState,
    hole_cards: Option<Hole>,
    seat_owner: PlayerId,
    viewer_id: PlayerId,
    viewer_is_spectator: bool,
    spectator_visibility: SpectatorVisibility,
) -> Option<Hole> {
    if seat_owner == viewer_id {
        return hole_cards;
    }
    if !viewer_is_spectator {
        // A player viewer never sees another seat's hole cards through the
        // ongoing game state; reveals travel only via the SHOWDOWN event.
        return None;
    }
    match spectator_visibility {
        SpectatorVisibility::Immediate => hole_cards,
        SpectatorVisibility::Delayed | SpectatorVisibility::Showdown => {
            if state.stage == Stage::Showdown || !state.hand_in_progress {
                hole_cards
            } else {
                None
            }
        }
    }
}

/// Strips engine-internal fields and applies hole-card visibility rules for
/// one viewer (a seated player or a spectator).
pub fn to_client_game_state(
    state: &EngineState,
    viewer_id: PlayerId,
    spectator_visibility: SpectatorVisibility,
) -> ClientGameState {
    let viewer_is_spectator = state
        .player(viewer_id)
        .map(|p| p.role == SeatRole::Spectator)
        .unwrap_or(true);

    let seats = state
        .seats
        .iter()
        .map(|p| ClientPlayer {
            id: p.id,
            display_name: p.display_name.clone(),
            seat_index: p.seat_index,
            role: p.role,
            stack: p.stack,
            bet: p.bet,
            pot_share: p.pot_share,
            folded: p.folded,
            hole_cards: visible_to(
                state,
                p.hole_cards,
                p.id,
                viewer_id,
                viewer_is_spectator,
                spectator_visibility,
            ),
            connected: p.connected,
            is_all_in: p.is_all_in,
            is_ready: p.is_ready,
        })
        .collect();

    ClientGameState {
        game_id: state.game_id,
        game_name: state.game_name.clone(),
        game_type: state.game_type,
        status: state.status,
        hand_number: state.hand_number,
        stage: state.stage,
        hand_in_progress: state.hand_in_progress,
        community_cards: state.community_cards.clone(),
        pot: state.pot,
        pots: state.pots.clone(),
        seats,
        dealer_seat_index: state.dealer_seat_index,
        current_bet: state.current_bet,
        active_player_id: state.active_player_id,
        small_blind_amount: state.small_blind_amount,
        big_blind_amount: state.big_blind_amount,
        max_players: state.max_players,
        starting_stack: state.starting_stack,
    }
}

/// The active player's legal moves and remaining time, or `None` if
/// `player_id` is not presently on the clock. Never built for the
/// PLAYER_JOINED broadcast — callers must omit it there regardless of whose
/// turn it is.
pub fn build_action_request(
    state: &EngineState,
    player_id: PlayerId,
    time_to_act_ms: u64,
) -> Option<ActionRequest> {
    if state.active_player_id != Some(player_id) {
        return None;
    }
    let actions = legal_actions(state, player_id);
    if actions.is_empty() {
        return None;
    }
    Some(ActionRequest {
        player_id,
        hand_number: state.hand_number,
        legal_actions: actions,
        time_to_act_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EnginePlayer;
    use cr_core::ID;

    fn state_with_two_players() -> (EngineState, PlayerId, PlayerId) {
        let mut state = EngineState::new(ID::default(), "t".into(), GameType::Cash, 5, 10, 9, 1000);
        let a: PlayerId = ID::default();
        let b: PlayerId = ID::default();
        for (id, seat) in [(a, 0), (b, 1)] {
            state.seats.push(EnginePlayer {
                id,
                display_name: "p".into(),
                seat_index: seat,
                role: SeatRole::Player,
                stack: 100,
                bet: 0,
                pot_share: 0,
                folded: false,
                hole_cards: Some(Hole::new(
                    cr_cards::Card::new(cr_cards::Rank::Ace, cr_cards::Suit::Spades),
                    cr_cards::Card::new(cr_cards::Rank::King, cr_cards::Suit::Spades),
                )),
                connected: true,
                is_all_in: false,
                is_ready: true,
            });
        }
        state.hand_in_progress = true;
        (state, a, b)
    }

    #[test]
    fn own_hole_cards_are_always_visible() {
        let (state, a, _b) = state_with_two_players();
        let projected = to_client_game_state(&state, a, SpectatorVisibility::Showdown);
        assert!(projected.seats[0].hole_cards.is_some());
    }

    #[test]
    fn player_viewer_never_sees_others_cards_mid_hand() {
        let (state, a, _b) = state_with_two_players();
        let projected = to_client_game_state(&state, a, SpectatorVisibility::Showdown);
        assert!(projected.seats[1].hole_cards.is_none());
    }

    #[test]
    fn spectator_immediate_mode_sees_everything() {
        let (state, _a, _b) = state_with_two_players();
        let spectator: PlayerId = ID::default();
        let projected = to_client_game_state(&state, spectator, SpectatorVisibility::Immediate);
        assert!(projected.seats[0].hole_cards.is_some());
        assert!(projected.seats[1].hole_cards.is_some());
    }

    #[test]
    fn spectator_showdown_mode_hides_cards_until_showdown() {
        let (mut state, _a, _b) = state_with_two_players();
        let spectator: PlayerId = ID::default();
        let hidden = to_client_game_state(&state, spectator, SpectatorVisibility::Showdown);
        assert!(hidden.seats[0].hole_cards.is_none());

        state.stage = Stage::Showdown;
        let revealed = to_client_game_state(&state, spectator, SpectatorVisibility::Showdown);
        assert!(revealed.seats[0].hole_cards.is_some());
    }

    #[test]
    fn action_request_is_none_when_not_on_the_clock() {
        let (mut state, a, b) = state_with_two_players();
        state.active_player_id = Some(a);
        assert!(build_action_request(&state, b, 30_000).is_none());
    }
}
