use crate::action::ActionKind;
use crate::action::LegalAction;
use crate::state::EngineState;
use crate::state::SeatRole;
use cr_core::PlayerId;

/// Enumerates the actions `player_id` may legally take right now, with
/// amount bounds where applicable. Returns an empty list if the player is
/// not the active player or the hand has no active player.
pub fn legal_actions(state: &EngineState, player_id: PlayerId) -> Vec<LegalAction> {
    if state.active_player_id != Some(player_id) {
        return Vec::new();
    }
    let Some(player) = state.player(player_id) else {
        return Vec::new();
    };
    if player.folded || player.is_all_in || player.role != SeatRole::Player {
        return Vec::new();
    }

    let mut actions = Vec::new();
    let call_amount = player.call_amount(state.current_bet);
    let outstanding = state.current_bet - player.bet;

    if outstanding == 0 {
        actions.push(LegalAction {
            kind: ActionKind::Check,
            min_amount: None,
            max_amount: None,
        });
    } else if call_amount <= player.stack {
        actions.push(LegalAction {
            kind: ActionKind::Call,
            min_amount: Some(call_amount),
            max_amount: Some(call_amount),
        });
    }

    actions.push(LegalAction {
        kind: ActionKind::Fold,
        min_amount: None,
        max_amount: None,
    });

    if state.current_bet == 0 && player.stack > 0 {
        actions.push(LegalAction {
            kind: ActionKind::Bet,
            min_amount: Some(state.big_blind_amount.min(player.stack)),
            max_amount: Some(player.stack),
        });
    }

    if state.current_bet > 0
        && player.stack > call_amount
        && call_amount + state.last_raise_size <= player.stack
    {
        actions.push(LegalAction {
            kind: ActionKind::Raise,
            min_amount: Some(call_amount + state.last_raise_size),
            max_amount: Some(player.stack),
        });
    }

    if player.stack > 0 {
        actions.push(LegalAction {
            kind: ActionKind::AllIn,
            min_amount: Some(player.stack),
            max_amount: Some(player.stack),
        });
    }

    actions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("it is not this player's turn to act")]
    OutOfTurn,
    #[error("that action is not legal in this state")]
    IllegalAction,
    #[error("amount {amount} is outside the legal range [{min}, {max}]")]
    InvalidAmount { amount: i64, min: i64, max: i64 },
}

/// Checks a concrete `Action` against the legal-action table, returning the
/// matched `LegalAction` entry on success.
pub fn validate(
    state: &EngineState,
    player_id: PlayerId,
    kind: ActionKind,
    amount: Option<i64>,
) -> Result<LegalAction, ValidationError> {
    if state.active_player_id != Some(player_id) {
        return Err(ValidationError::OutOfTurn);
    }
    let legal = legal_actions(state, player_id);
    let matched = legal
        .into_iter()
        .find(|entry| entry.kind == kind)
        .ok_or(ValidationError::IllegalAction)?;

    if let (Some(min), Some(max)) = (matched.min_amount, matched.max_amount) {
        let amount = amount.unwrap_or(min);
        if amount < min || amount > max {
            return Err(ValidationError::InvalidAmount { amount, min, max });
        }
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EnginePlayer;
    use crate::state::GameType;
    use cr_core::ID;

    fn state_with_one_active(current_bet: i64, stack: i64, bet: i64) -> (EngineState, PlayerId) {
        let mut state = EngineState::new(ID::default(), "t".into(), GameType::Cash, 5, 10, 9, 1000);
        let id: PlayerId = ID::default();
        state.current_bet = current_bet;
        state.last_raise_size = 10;
        state.active_player_id = Some(id);
        state.seats.push(EnginePlayer {
            id,
            display_name: "p".into(),
            seat_index: 0,
            role: SeatRole::Player,
            stack,
            bet,
            pot_share: bet,
            folded: false,
            hole_cards: None,
            connected: true,
            is_all_in: false,
            is_ready: true,
        });
        (state, id)
    }

    #[test]
    fn check_is_legal_with_no_outstanding_bet() {
        let (state, id) = state_with_one_active(0, 100, 0);
        let actions = legal_actions(&state, id);
        assert!(actions.iter().any(|a| a.kind == ActionKind::Check));
        assert!(!actions.iter().any(|a| a.kind == ActionKind::Call));
    }

    #[test]
    fn call_is_reported_with_exact_amount() {
        let (state, id) = state_with_one_active(10, 100, 0);
        let actions = legal_actions(&state, id);
        let call = actions.iter().find(|a| a.kind == ActionKind::Call).unwrap();
        assert_eq!(call.min_amount, Some(10));
        assert_eq!(call.max_amount, Some(10));
    }

    #[test]
    fn raise_requires_enough_stack_beyond_the_call() {
        let (state, id) = state_with_one_active(10, 15, 0);
        let actions = legal_actions(&state, id);
        // call_amount=10, last_raise_size=10 => needs stack >= 20, but stack is 15
        assert!(!actions.iter().any(|a| a.kind == ActionKind::Raise));
    }

    #[test]
    fn out_of_turn_is_rejected() {
        let (state, _) = state_with_one_active(10, 100, 0);
        let other: PlayerId = ID::default();
        assert_eq!(
            validate(&state, other, ActionKind::Fold, None),
            Err(ValidationError::OutOfTurn)
        );
    }

    #[test]
    fn amount_outside_bounds_is_rejected() {
        let (state, id) = state_with_one_active(0, 100, 0);
        assert_eq!(
            validate(&state, id, ActionKind::Bet, Some(1)),
            Err(ValidationError::InvalidAmount { amount: 1, min: 10, max: 100 })
        );
    }
}
