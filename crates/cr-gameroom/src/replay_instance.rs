use crate::message::ServerMessage;
use crate::recorder::ReplayEntry;
use crate::recorder::ReplayFile;
use cr_core::PlayerId;
use cr_gameplay::ClientGameState;
use cr_gameplay::ClientPlayer;
use cr_gameplay::EngineState;
use cr_gameplay::PotBreakdown;
use std::collections::HashMap;
use std::time::Duration;

const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 10.0;
const MIN_TICK: Duration = Duration::from_millis(50);

/// Per-spectator playback cursor. Spectators on the same replay are
/// entirely independent — scrubbing one never affects another.
#[derive(Debug, Clone)]
pub struct SpectatorPlayback {
    pub position: usize,
    pub speed: f32,
    pub is_playing: bool,
    pub show_all_cards: bool,
    pub player_visibility_overrides: HashMap<PlayerId, bool>,
}

impl Default for SpectatorPlayback {
    fn default() -> Self {
        Self {
            position: 0,
            speed: 1.0,
            is_playing: false,
            show_all_cards: false,
            player_visibility_overrides: HashMap::new(),
        }
    }
}

const ROUND_BOUNDARY_TYPES: [&str; 4] = ["hand_start", "flop", "turn", "river"];

fn is_round_boundary(entry: &ReplayEntry) -> bool {
    entry
        .event_type()
        .map(|event| ROUND_BOUNDARY_TYPES.contains(&event_tag(event)))
        .unwrap_or(false)
}

fn event_tag(event: &cr_gameplay::EngineEvent) -> &'static str {
    use cr_gameplay::EngineEvent::*;
    match event {
        HandStart { .. } => "hand_start",
        BlindsPosted { .. } => "blinds_posted",
        Deal => "deal",
        Flop { .. } => "flop",
        Turn { .. } => "turn",
        River { .. } => "river",
        PlayerAction { .. } => "player_action",
        PlayerTimeout { .. } => "player_timeout",
        Showdown { .. } => "showdown",
        HandEnd { .. } => "hand_end",
        PlayerRevealed { .. } => "player_revealed",
        PlayerJoined { .. } => "player_joined",
        PlayerLeft { .. } => "player_left",
    }
}

/// A loaded, replayable recording of one finished (or crashed) game, with an
/// independent cursor per spectator watching it.
pub struct ReplayInstance {
    file: ReplayFile,
    spectators: HashMap<PlayerId, SpectatorPlayback>,
}

impl ReplayInstance {
    pub fn new(file: ReplayFile) -> Self {
        Self {
            file,
            spectators: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.file.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.file.entries.is_empty()
    }

    fn last_index(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn add_spectator(&mut self, spectator_id: PlayerId) {
        self.spectators.entry(spectator_id).or_default();
    }
    pub fn remove_spectator(&mut self, spectator_id: PlayerId) {
        self.spectators.remove(&spectator_id);
    }

    fn playback_mut(&mut self, spectator_id: PlayerId) -> &mut SpectatorPlayback {
        self.spectators.entry(spectator_id).or_default()
    }

    pub fn play(&mut self, spectator_id: PlayerId) {
        self.playback_mut(spectator_id).is_playing = true;
    }
    pub fn pause(&mut self, spectator_id: PlayerId) {
        self.playback_mut(spectator_id).is_playing = false;
    }

    pub fn step_forward(&mut self, spectator_id: PlayerId) {
        let last = self.last_index();
        let playback = self.playback_mut(spectator_id);
        playback.is_playing = false;
        playback.position = (playback.position + 1).min(last);
    }
    pub fn step_backward(&mut self, spectator_id: PlayerId) {
        let playback = self.playback_mut(spectator_id);
        playback.is_playing = false;
        playback.position = playback.position.saturating_sub(1);
    }

    pub fn jump_round_start(&mut self, spectator_id: PlayerId) {
        let current = self.playback_mut(spectator_id).position;
        let target = self.file.entries[..=current]
            .iter()
            .rposition(is_round_boundary)
            .unwrap_or(0);
        let playback = self.playback_mut(spectator_id);
        playback.is_playing = false;
        playback.position = target;
    }

    pub fn jump_next_round(&mut self, spectator_id: PlayerId) {
        let current = self.playback_mut(spectator_id).position;
        let last = self.last_index();
        let target = self.file.entries[(current + 1).min(last)..]
            .iter()
            .position(is_round_boundary)
            .map(|offset| current + 1 + offset)
            .unwrap_or(last);
        let playback = self.playback_mut(spectator_id);
        playback.is_playing = false;
        playback.position = target;
    }

    pub fn set_position(&mut self, spectator_id: PlayerId, position: usize) {
        let last = self.last_index();
        let playback = self.playback_mut(spectator_id);
        playback.is_playing = false;
        playback.position = position.min(last);
    }

    pub fn set_speed(&mut self, spectator_id: PlayerId, speed: f32) {
        self.playback_mut(spectator_id).speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    pub fn set_card_visibility(
        &mut self,
        spectator_id: PlayerId,
        show_all_cards: bool,
        overrides: HashMap<PlayerId, bool>,
    ) {
        let playback = self.playback_mut(spectator_id);
        playback.show_all_cards = show_all_cards;
        playback.player_visibility_overrides = overrides;
    }

    /// The delay before the next autoplay tick, or `None` if paused or at
    /// the end of the recording.
    pub fn next_tick_delay(&self, spectator_id: PlayerId) -> Option<Duration> {
        let playback = self.spectators.get(&spectator_id)?;
        if !playback.is_playing || playback.position >= self.last_index() {
            return None;
        }
        let gap = self.file.entries[playback.position + 1]
            .timestamp()
            .saturating_sub(self.file.entries[playback.position].timestamp());
        let scaled = Duration::from_millis((gap as f32 / playback.speed) as u64);
        Some(scaled.max(MIN_TICK))
    }

    /// Advances one spectator's cursor by a single autoplay tick.
    pub fn tick(&mut self, spectator_id: PlayerId) {
        let last = self.last_index();
        if let Some(playback) = self.spectators.get_mut(&spectator_id) {
            if playback.position >= last {
                playback.is_playing = false;
            } else {
                playback.position += 1;
            }
        }
    }

    /// Renders the current `replayState` message for one spectator.
    pub fn render(&self, spectator_id: PlayerId) -> Option<ServerMessage> {
        let playback = self.spectators.get(&spectator_id)?;
        let entry = self.file.entries.get(playback.position)?;
        let (event, engine_state, chat) = match entry {
            ReplayEntry::Event { event, engine_state, .. } => (Some(event.clone()), engine_state, None),
            ReplayEntry::Chat { chat, .. } => {
                let prior = self.file.entries[..=playback.position]
                    .iter()
                    .rev()
                    .find_map(|e| match e {
                        ReplayEntry::Event { event, engine_state, .. } => {
                            Some((event.clone(), engine_state))
                        }
                        ReplayEntry::Chat { .. } => None,
                    });
                match prior {
                    Some((event, state)) => (Some(event), state, Some(chat.clone())),
                    None => return None,
                }
            }
        };
        let game_state = project_with_visibility(engine_state, playback);
        Some(ServerMessage::ReplayState {
            position: playback.position,
            total_entries: self.len(),
            is_playing: playback.is_playing,
            speed: playback.speed,
            game_state,
            event,
            hand_number: engine_state.hand_number,
            stage: engine_state.stage,
            chat,
        })
    }
}

/// Projects a recorded `EngineState` for one spectator using the
/// replay-specific visibility command (distinct from `SpectatorVisibility`,
/// which governs *live* broadcasts): when `show_all_cards` is set, every
/// hole card is shown except players explicitly hidden by an override;
/// otherwise every hole card is hidden except players explicitly shown.
fn project_with_visibility(state: &EngineState, playback: &SpectatorPlayback) -> ClientGameState {
    let seats: Vec<ClientPlayer> = state
        .seats
        .iter()
        .map(|p| {
            let overridden = playback.player_visibility_overrides.get(&p.id).copied();
            let visible = overridden.unwrap_or(playback.show_all_cards);
            ClientPlayer {
                id: p.id,
                display_name: p.display_name.clone(),
                seat_index: p.seat_index,
                role: p.role,
                stack: p.stack,
                bet: p.bet,
                pot_share: p.pot_share,
                folded: p.folded,
                hole_cards: if visible { p.hole_cards } else { None },
                connected: p.connected,
                is_all_in: p.is_all_in,
                is_ready: p.is_ready,
            }
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
        pots: state.pots.clone() as Vec<PotBreakdown>,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::GameConfig;
    use cr_core::ID;
    use cr_gameplay::EngineEvent;
    use cr_gameplay::GameType;

    fn sample_file() -> ReplayFile {
        let state = EngineState::new(ID::default(), "t".into(), GameType::Cash, 5, 10, 9, 1000);
        ReplayFile {
            version: 1,
            game_config: GameConfig {
                game_id: state.game_id,
                game_name: state.game_name.clone(),
                small_blind_amount: 5,
                big_blind_amount: 10,
                max_players: 9,
                starting_stack: 1000,
            },
            players: Vec::new(),
            entries: vec![
                ReplayEntry::Event {
                    index: 0,
                    timestamp: 0,
                    event: EngineEvent::HandStart { hand_number: 1, dealer_seat_index: 0 },
                    engine_state: state.clone(),
                },
                ReplayEntry::Event {
                    index: 1,
                    timestamp: 1_000,
                    event: EngineEvent::Deal,
                    engine_state: state.clone(),
                },
                ReplayEntry::Event {
                    index: 2,
                    timestamp: 2_500,
                    event: EngineEvent::Flop { cards: [cr_cards::Card::new(cr_cards::Rank::Two, cr_cards::Suit::Clubs); 3] },
                    engine_state: state,
                },
            ],
        }
    }

    #[test]
    fn step_forward_and_backward_clamp_at_the_bounds() {
        let mut replay = ReplayInstance::new(sample_file());
        let viewer: PlayerId = ID::default();
        replay.add_spectator(viewer);
        replay.step_backward(viewer);
        assert_eq!(replay.spectators[&viewer].position, 0);
        replay.set_position(viewer, 99);
        assert_eq!(replay.spectators[&viewer].position, 2);
    }

    #[test]
    fn jump_round_start_finds_the_nearest_earlier_boundary() {
        let mut replay = ReplayInstance::new(sample_file());
        let viewer: PlayerId = ID::default();
        replay.add_spectator(viewer);
        replay.set_position(viewer, 2);
        replay.jump_round_start(viewer);
        assert_eq!(replay.spectators[&viewer].position, 2); // FLOP itself is a boundary
    }

    #[test]
    fn speed_is_clamped_to_the_allowed_range() {
        let mut replay = ReplayInstance::new(sample_file());
        let viewer: PlayerId = ID::default();
        replay.set_speed(viewer, 100.0);
        assert_eq!(replay.spectators[&viewer].speed, MAX_SPEED);
        replay.set_speed(viewer, 0.01);
        assert_eq!(replay.spectators[&viewer].speed, MIN_SPEED);
    }

    #[test]
    fn tick_delay_respects_the_floor() {
        let mut replay = ReplayInstance::new(sample_file());
        let viewer: PlayerId = ID::default();
        replay.add_spectator(viewer);
        replay.play(viewer);
        replay.set_speed(viewer, 10.0);
        let delay = replay.next_tick_delay(viewer).unwrap();
        assert!(delay >= MIN_TICK);
    }
}
