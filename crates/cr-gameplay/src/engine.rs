//! The pure hand state machine: `startHand` and `processAction` each take an
//! `EngineState` by reference and return the ordered `Transition`s that
//! carry a room from one state to the next. Neither function mutates its
//! input; every transition's state is an independent deep copy.

use crate::action::ActionKind;
use crate::event::BlindPost;
use crate::event::EngineEvent;
use crate::event::ShowdownResult;
use crate::event::Transition;
use crate::event::Winner;
use crate::pot::award_uncontested;
use crate::pot::calculate_pots;
use crate::pot::distribute_pots;
use crate::stage::Stage;
use crate::state::EnginePlayer;
use crate::state::EngineState;
use crate::state::GameStatus;
use crate::state::SeatRole;
use crate::validator;
use crate::validator::ValidationError;
use cr_cards::Card;
use cr_cards::Deck;
use cr_cards::HandEvaluator;
use cr_cards::Hole;
use cr_cards::StandardEvaluator;
use cr_core::Chips;
use cr_core::PlayerId;
use cr_core::Position;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("not enough players with chips to start a hand")]
    NotEnoughPlayers,
    #[error("no hand is currently in progress")]
    HandNotInProgress,
    #[error("it is not this player's turn to act")]
    OutOfTurn,
    #[error("that action is not legal in this state")]
    InvalidAction,
    #[error("amount {amount} is outside the legal range [{min}, {max}]")]
    InvalidAmount { amount: Chips, min: Chips, max: Chips },
    #[error("the deck ran out of cards mid-hand")]
    DeckExhausted,
}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::OutOfTurn => EngineError::OutOfTurn,
            ValidationError::IllegalAction => EngineError::InvalidAction,
            ValidationError::InvalidAmount { amount, min, max } => {
                EngineError::InvalidAmount { amount, min, max }
            }
        }
    }
}

fn push(transitions: &mut Vec<Transition>, next: &mut EngineState, event: EngineEvent) {
    next.hand_events.push(event.clone());
    transitions.push(Transition {
        state: next.clone_state(),
        event,
    });
}

fn player_seat_indices(state: &EngineState) -> Vec<Position> {
    let mut seats: Vec<Position> = state.players_in_play().map(|p| p.seat_index).collect();
    seats.sort_unstable();
    seats
}

/// Player seats in clockwise order starting right after `after_seat`.
fn rotation_from(state: &EngineState, after_seat: Position) -> Vec<Position> {
    let seats = player_seat_indices(state);
    if seats.is_empty() {
        return Vec::new();
    }
    let start = seats
        .iter()
        .position(|&s| s == after_seat)
        .map(|i| (i + 1) % seats.len())
        .unwrap_or(0);
    (0..seats.len()).map(|offset| seats[(start + offset) % seats.len()]).collect()
}

fn seat_player<'a>(state: &'a EngineState, seat_index: Position) -> Option<&'a EnginePlayer> {
    state.seats.iter().find(|p| p.seat_index == seat_index)
}

/// The first player-seat after `after_seat`, clockwise, matching `pred`.
fn next_seat_matching(
    state: &EngineState,
    after_seat: Position,
    pred: impl Fn(&EnginePlayer) -> bool,
) -> Option<Position> {
    rotation_from(state, after_seat)
        .into_iter()
        .find(|&seat| seat_player(state, seat).is_some_and(&pred))
}

fn first_active_after(state: &EngineState, after_seat: Position) -> Option<PlayerId> {
    next_seat_matching(state, after_seat, EnginePlayer::is_active_candidate)
        .and_then(|seat| seat_player(state, seat))
        .map(|p| p.id)
}

fn post_blind(state: &mut EngineState, seat_index: Position, amount: Chips) -> BlindPost {
    let player = state
        .seats
        .iter_mut()
        .find(|p| p.seat_index == seat_index)
        .expect("blind seat exists");
    let posted = amount.min(player.stack);
    player.stack -= posted;
    player.bet += posted;
    player.pot_share += posted;
    if player.stack == 0 {
        player.is_all_in = true;
    }
    BlindPost {
        player_id: player.id,
        amount: posted,
    }
}

/// Starts a new hand: advances the dealer button, shuffles (or installs an
/// override) deck, posts blinds, and deals hole cards. Fails without
/// mutating anything observable if fewer than two seated players have
/// chips.
pub fn start_hand(
    state: &EngineState,
    deck_override: Option<Vec<Card>>,
) -> Result<Vec<Transition>, EngineError> {
    let fundable = state.players_in_play().filter(|p| p.stack > 0).count();
    if fundable < 2 {
        return Err(EngineError::NotEnoughPlayers);
    }

    let mut next = state.clone();
    next.community_cards.clear();
    next.pots.clear();
    next.pot = 0;
    next.hand_events.clear();
    next.stage = Stage::PreFlop;
    next.hand_number += 1;
    next.hand_in_progress = true;
    next.status = GameStatus::InProgress;
    next.current_bet = 0;
    next.acted_this_round.clear();
    next.deck = match deck_override {
        Some(cards) => Deck::from_cards(cards),
        None => {
            let mut deck = Deck::create();
            deck.shuffle();
            deck
        }
    };
    for player in next.seats.iter_mut() {
        player.bet = 0;
        player.pot_share = 0;
        player.hole_cards = None;
        player.is_all_in = false;
        player.folded = player.role == SeatRole::Player && player.stack == 0;
    }

    next.dealer_seat_index = next_seat_matching(&next, next.dealer_seat_index, |p| {
        p.role == SeatRole::Player && p.stack > 0
    })
    .ok_or(EngineError::NotEnoughPlayers)?;

    let mut transitions = Vec::new();
    let hand_number = next.hand_number;
    let dealer_seat_index = next.dealer_seat_index;
    push(
        &mut transitions,
        &mut next,
        EngineEvent::HandStart {
            hand_number,
            dealer_seat_index,
        },
    );

    let active_count = next.players_in_play().filter(|p| !p.folded).count();
    let (sb_seat, bb_seat) = if active_count == 2 {
        let other = next_seat_matching(&next, next.dealer_seat_index, |p| !p.folded)
            .expect("heads-up has exactly one other active seat");
        (next.dealer_seat_index, other)
    } else {
        let sb = next_seat_matching(&next, next.dealer_seat_index, |p| !p.folded)
            .expect("at least two active seats");
        let bb = next_seat_matching(&next, sb, |p| !p.folded).expect("at least two active seats");
        (sb, bb)
    };
    let small_blind_amount = next.small_blind_amount;
    let big_blind_amount = next.big_blind_amount;
    let small_blind = post_blind(&mut next, sb_seat, small_blind_amount);
    let big_blind = post_blind(&mut next, bb_seat, big_blind_amount);
    next.current_bet = next.big_blind_amount;
    next.last_raise_size = next.big_blind_amount;
    push(
        &mut transitions,
        &mut next,
        EngineEvent::BlindsPosted { small_blind, big_blind },
    );

    for seat_index in rotation_from(&next, next.dealer_seat_index) {
        if seat_player(&next, seat_index).is_some_and(|p| p.folded) {
            continue;
        }
        let dealt = next.deck.deal(2).map_err(|_| EngineError::DeckExhausted)?;
        let player = next
            .seats
            .iter_mut()
            .find(|p| p.seat_index == seat_index)
            .expect("seat exists");
        player.hole_cards = Some(Hole::new(dealt[0], dealt[1]));
    }
    push(&mut transitions, &mut next, EngineEvent::Deal);

    next.active_player_id = if active_count == 2 {
        seat_player(&next, next.dealer_seat_index).map(|p| p.id)
    } else {
        first_active_after(&next, bb_seat)
    };

    if next.active_player_id.is_none() {
        advance_stage(&mut next, &mut transitions)?;
    }

    Ok(transitions)
}

fn betting_round_complete(state: &EngineState) -> bool {
    state
        .non_folded()
        .filter(|p| !p.is_all_in)
        .all(|p| state.acted_this_round.contains(&p.id) && p.bet == state.current_bet)
}

fn apply_action(
    next: &mut EngineState,
    player_id: PlayerId,
    kind: ActionKind,
    amount: Option<Chips>,
    min_amount: Option<Chips>,
) -> crate::action::Action {
    use crate::action::Action;

    let current_bet = next.current_bet;
    let last_raise_size = next.last_raise_size;
    let player = next.player_mut(player_id).expect("validated player exists");

    let action = match kind {
        ActionKind::Fold => {
            player.folded = true;
            Action::Fold
        }
        ActionKind::Check => Action::Check,
        ActionKind::Call => {
            let call_amount = player.call_amount(current_bet);
            player.stack -= call_amount;
            player.bet += call_amount;
            player.pot_share += call_amount;
            if player.stack == 0 {
                player.is_all_in = true;
            }
            Action::Call
        }
        ActionKind::Bet => {
            let amount = amount.unwrap_or_else(|| min_amount.unwrap_or(0));
            player.stack -= amount;
            player.bet += amount;
            player.pot_share += amount;
            let new_bet = player.bet;
            drop(player);
            next.current_bet = new_bet;
            next.last_raise_size = amount;
            next.acted_this_round.clear();
            Action::Bet { amount }
        }
        ActionKind::Raise => {
            let amount = amount.unwrap_or_else(|| min_amount.unwrap_or(0));
            player.stack -= amount;
            player.bet += amount;
            player.pot_share += amount;
            let new_bet = player.bet;
            drop(player);
            let raise_size = new_bet - current_bet;
            next.last_raise_size = raise_size.max(last_raise_size);
            next.current_bet = new_bet;
            next.acted_this_round.clear();
            Action::Raise { amount }
        }
        ActionKind::AllIn => {
            let amount = player.stack;
            player.stack = 0;
            player.bet += amount;
            player.pot_share += amount;
            player.is_all_in = true;
            let new_bet = player.bet;
            drop(player);
            if new_bet > current_bet {
                let raise_size = new_bet - current_bet;
                next.current_bet = new_bet;
                if raise_size >= last_raise_size {
                    next.last_raise_size = raise_size;
                    next.acted_this_round.clear();
                }
                // under-min all-in raise: lastRaiseSize held, actedThisRound
                // preserved so players who already called stay settled.
            }
            Action::AllIn
        }
    };
    next.acted_this_round.insert(player_id);
    action
}

fn try_short_circuit(next: &mut EngineState, transitions: &mut Vec<Transition>) -> bool {
    let survivors: Vec<PlayerId> = next.non_folded().map(|p| p.id).collect();
    if survivors.len() != 1 {
        return false;
    }
    let winner = survivors[0];
    let awards = award_uncontested(&next.pots, winner);
    for award in &awards {
        if let Some(player) = next.player_mut(award.player_id) {
            player.stack += award.amount;
        }
    }
    next.hand_in_progress = false;
    next.active_player_id = None;
    let winners = awards
        .into_iter()
        .map(|a| Winner {
            player_id: a.player_id,
            amount: a.amount,
            pot_index: a.pot_index,
        })
        .collect();
    push(transitions, next, EngineEvent::HandEnd { winners });
    true
}

fn run_showdown(next: &mut EngineState, transitions: &mut Vec<Transition>) -> Result<(), EngineError> {
    let contenders: Vec<(PlayerId, Hole)> = next
        .non_folded()
        .filter_map(|p| p.hole_cards.map(|hole| (p.id, hole)))
        .collect();

    let mut results = Vec::with_capacity(contenders.len());
    let mut strengths = Vec::with_capacity(contenders.len());
    for (player_id, hole) in contenders {
        let mut cards = hole.cards().to_vec();
        cards.extend(next.community_cards.iter().copied());
        let strength = StandardEvaluator::evaluate(&cards);
        results.push(ShowdownResult {
            player_id,
            hole_cards: hole,
            hand_rank: strength,
            hand_description: strength.description(),
        });
        strengths.push((player_id, strength));
    }
    push(transitions, next, EngineEvent::Showdown { results });

    let seat_of: HashMap<PlayerId, Position> =
        next.seats.iter().map(|p| (p.id, p.seat_index)).collect();
    let awards = distribute_pots(&next.pots, &strengths, next.dealer_seat_index, next.max_players, |id| {
        seat_of[&id]
    });
    for award in &awards {
        if let Some(player) = next.player_mut(award.player_id) {
            player.stack += award.amount;
        }
    }
    next.hand_in_progress = false;
    next.active_player_id = None;
    let winners = awards
        .into_iter()
        .map(|a| Winner {
            player_id: a.player_id,
            amount: a.amount,
            pot_index: a.pot_index,
        })
        .collect();
    push(transitions, next, EngineEvent::HandEnd { winners });
    Ok(())
}

fn advance_stage(next: &mut EngineState, transitions: &mut Vec<Transition>) -> Result<(), EngineError> {
    loop {
        for player in next.seats.iter_mut() {
            player.bet = 0;
        }
        next.current_bet = 0;
        next.last_raise_size = next.big_blind_amount;
        next.acted_this_round.clear();

        match next.stage {
            Stage::PreFlop => {
                next.stage = Stage::Flop;
                let dealt = next.deck.deal(3).map_err(|_| EngineError::DeckExhausted)?;
                let cards = [dealt[0], dealt[1], dealt[2]];
                next.community_cards.extend(dealt);
                push(transitions, next, EngineEvent::Flop { cards });
            }
            Stage::Flop => {
                next.stage = Stage::Turn;
                let dealt = next.deck.deal(1).map_err(|_| EngineError::DeckExhausted)?;
                next.community_cards.push(dealt[0]);
                push(transitions, next, EngineEvent::Turn { card: dealt[0] });
            }
            Stage::Turn => {
                next.stage = Stage::River;
                let dealt = next.deck.deal(1).map_err(|_| EngineError::DeckExhausted)?;
                next.community_cards.push(dealt[0]);
                push(transitions, next, EngineEvent::River { card: dealt[0] });
            }
            Stage::River => {
                next.stage = Stage::Showdown;
                return run_showdown(next, transitions);
            }
            Stage::Showdown => unreachable!("advance_stage invoked from Showdown"),
        }

        let can_still_bet = next.non_folded().filter(|p| !p.is_all_in).count();
        if can_still_bet >= 2 {
            next.active_player_id = first_active_after(next, next.dealer_seat_index);
            return Ok(());
        }
    }
}

/// Applies one player's action to `state`, returning the transitions it
/// produces: the `PLAYER_ACTION` itself, then whatever chain of automatic
/// stage advances, showdown, or hand-end follows from it. Fails and leaves
/// `state` conceptually untouched (the caller simply discards the `Err` and
/// keeps using its existing `state`) on any validation failure.
pub fn process_action(
    state: &EngineState,
    player_id: PlayerId,
    kind: ActionKind,
    amount: Option<Chips>,
) -> Result<Vec<Transition>, EngineError> {
    if !state.hand_in_progress {
        return Err(EngineError::HandNotInProgress);
    }
    let matched = validator::validate(state, player_id, kind, amount)?;

    let mut next = state.clone();
    let action = apply_action(&mut next, player_id, kind, amount, matched.min_amount);
    next.pot = next.seats.iter().map(|p| p.pot_share).sum();
    next.pots = calculate_pots(&next.seats);

    let mut transitions = Vec::new();
    push(
        &mut transitions,
        &mut next,
        EngineEvent::PlayerAction { player_id, action },
    );

    if try_short_circuit(&mut next, &mut transitions) {
        return Ok(transitions);
    }

    if betting_round_complete(&next) {
        advance_stage(&mut next, &mut transitions)?;
    } else {
        let seat_index = next.player(player_id).expect("player exists").seat_index;
        next.active_player_id = first_active_after(&next, seat_index);
    }

    Ok(transitions)
}

/// The default action submitted on behalf of a timed-out player: CHECK if
/// legal, otherwise FOLD.
pub fn default_action_for_timeout(state: &EngineState, player_id: PlayerId) -> ActionKind {
    let legal = validator::legal_actions(state, player_id);
    if legal.iter().any(|a| a.kind == ActionKind::Check) {
        ActionKind::Check
    } else {
        ActionKind::Fold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameType;
    use crate::state::SeatRole;
    use cr_cards::Rank;
    use cr_cards::Suit;
    use cr_core::ID;

    fn fresh_state(stacks: &[Chips]) -> EngineState {
        let mut state = EngineState::new(ID::default(), "t".into(), GameType::Cash, 5, 10, 9, 1000);
        for (i, &stack) in stacks.iter().enumerate() {
            state.seats.push(EnginePlayer {
                id: ID::default(),
                display_name: format!("p{i}"),
                seat_index: i,
                role: SeatRole::Player,
                stack,
                bet: 0,
                pot_share: 0,
                folded: false,
                hole_cards: None,
                connected: true,
                is_all_in: false,
                is_ready: true,
            });
        }
        state
    }

    fn rigged_deck(order: &[(Rank, Suit)]) -> Vec<Card> {
        let mut full = Deck::create();
        let mut cards: Vec<Card> = order.iter().map(|&(r, s)| Card::new(r, s)).collect();
        // top up with the remainder of a full deck so deals beyond the rig
        // (flop/turn/river) still have cards to draw.
        while cards.len() < 52 {
            let next = full.deal(1).unwrap()[0];
            if !cards.contains(&next) {
                cards.push(next);
            }
        }
        cards
    }

    #[test]
    fn start_hand_fails_with_fewer_than_two_funded_players() {
        let state = fresh_state(&[100, 0]);
        assert_eq!(start_hand(&state, None), Err(EngineError::NotEnoughPlayers));
    }

    #[test]
    fn heads_up_start_hand_posts_blinds_and_deals() {
        let state = fresh_state(&[1000, 1000]);
        let transitions = start_hand(&state, None).unwrap();
        let last = transitions.last().unwrap();
        assert!(matches!(last.event, EngineEvent::Deal));
        assert_eq!(last.state.hand_number, 1);
        assert_eq!(last.state.stage, Stage::PreFlop);
        // heads-up: dealer (seat 0) posts SB and acts first.
        assert_eq!(last.state.active_player_id, Some(last.state.seats[0].id));
        assert_eq!(last.state.seats[0].bet, 5);
        assert_eq!(last.state.seats[1].bet, 10);
    }

    #[test]
    fn three_way_fold_to_winner_matches_the_scripted_scenario() {
        let mut state = fresh_state(&[1000, 1000, 1000]);
        // start_hand advances the button clockwise before dealing, so seed
        // it one seat early to land the dealer on seat 2 (C).
        state.dealer_seat_index = 1;
        let deck = rigged_deck(&[
            (Rank::Ace, Suit::Hearts),
            (Rank::King, Suit::Hearts), // seat 0 (SB / A): Ah Kh
            (Rank::Two, Suit::Clubs),
            (Rank::Two, Suit::Diamonds), // seat 1 (BB / B): 2c 2d
            (Rank::Seven, Suit::Hearts),
            (Rank::Two, Suit::Spades), // seat 2 (dealer / C): 7h 2s
        ]);
        let start = start_hand(&state, Some(deck)).unwrap();
        let mut live = start.last().unwrap().state.clone();
        assert_eq!(live.active_player_id, Some(live.seats[2].id)); // C acts first (multi-way)

        let c_id = live.seats[2].id;
        let fold_c = process_action(&live, c_id, ActionKind::Fold, None).unwrap();
        live = fold_c.last().unwrap().state.clone();

        let a_id = live.seats[0].id;
        let fold_a = process_action(&live, a_id, ActionKind::Fold, None).unwrap();
        let last = fold_a.last().unwrap();

        match &last.event {
            EngineEvent::HandEnd { winners } => {
                assert_eq!(winners.len(), 1);
                assert_eq!(winners[0].amount, 15);
                assert_eq!(winners[0].player_id, live.seats[1].id);
            }
            other => panic!("expected HandEnd, got {other:?}"),
        }
        assert_eq!(last.state.seats[1].stack, 1005);
        assert!(!fold_a.iter().any(|t| matches!(t.event, EngineEvent::Showdown { .. })));
    }

    #[test]
    fn heads_up_double_all_in_runs_the_board_to_showdown() {
        let state = fresh_state(&[1000, 1000]);
        let start = start_hand(&state, None).unwrap();
        let live = start.last().unwrap().state.clone();
        let dealer_id = live.active_player_id.unwrap();

        let after_first = process_action(&live, dealer_id, ActionKind::AllIn, None).unwrap();
        let live = after_first.last().unwrap().state.clone();
        let other_id = live.active_player_id.unwrap();
        let after_second = process_action(&live, other_id, ActionKind::AllIn, None).unwrap();

        let kinds: Vec<_> = after_second.iter().map(|t| std::mem::discriminant(&t.event)).collect();
        assert!(kinds.len() >= 5); // PLAYER_ACTION, FLOP, TURN, RIVER, SHOWDOWN, HAND_END
        let last = after_second.last().unwrap();
        assert!(matches!(last.event, EngineEvent::HandEnd { .. }));
        assert_eq!(last.state.community_cards.len(), 5);
        assert!(!last.state.hand_in_progress);
    }

    #[test]
    fn under_min_allin_raise_does_not_reopen_betting() {
        // three-handed: seat2 (BB, 25 stack) can go all-in for a partial
        // raise (new bet 25 over a current bet of 20, short of a full
        // +10 raise) after seat0 opens and seat1 calls.
        let mut state = fresh_state(&[1000, 1000, 25]);
        // seed one seat early so start_hand's clockwise advance lands the
        // button on seat 0.
        state.dealer_seat_index = 2;
        let start = start_hand(&state, None).unwrap();
        let mut live = start.last().unwrap().state.clone();

        // preflop, 3-handed: seat1=SB(5), seat2=BB(10), first to act = seat0.
        let seat0_id = live.seats[0].id;
        let seat1_id = live.seats[1].id;
        assert_eq!(live.active_player_id, Some(seat0_id));
        let raise = process_action(&live, seat0_id, ActionKind::Raise, Some(20)).unwrap();
        live = raise.last().unwrap().state.clone();
        assert!(!live.acted_this_round.contains(&seat1_id));

        let call = process_action(&live, seat1_id, ActionKind::Call, None).unwrap();
        live = call.last().unwrap().state.clone();
        assert!(live.acted_this_round.contains(&seat0_id));
        assert!(live.acted_this_round.contains(&seat1_id));
        let last_raise_before = live.last_raise_size;

        let seat2_id = live.active_player_id.unwrap();
        assert_eq!(seat2_id, live.seats[2].id);
        let all_in = process_action(&live, seat2_id, ActionKind::AllIn, None).unwrap();
        let live_after = all_in.last().unwrap().state.clone();

        // 25 total over a current bet of 20 is a +5 raise, short of the
        // standing +10 minimum: lastRaiseSize holds, and the two players who
        // already called stay marked as acted (they still owe the extra 5
        // to call, which the bet/currentBet mismatch — not a cleared acted
        // set — is what prompts them to act again).
        assert_eq!(live_after.current_bet, 25);
        assert_eq!(live_after.last_raise_size, last_raise_before);
        assert!(live_after.acted_this_round.contains(&seat0_id));
        assert!(live_after.acted_this_round.contains(&seat1_id));
    }
}
