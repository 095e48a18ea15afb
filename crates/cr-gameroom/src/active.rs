use crate::message::ServerMessage;
use crate::recorder::ChatEntry;
use crate::recorder::GameConfig;
use crate::recorder::Recorder;
use crate::recorder::ReplayFile;
use crate::recorder::ReplayPlayer;
use crate::timer::ActionTimer;
use crate::timer::TimerConfig;
use cr_core::Chips;
use cr_core::PlayerId;
use cr_gameplay::build_action_request;
use cr_gameplay::default_action_for_timeout;
use cr_gameplay::process_action;
use cr_gameplay::start_hand;
use cr_gameplay::to_client_game_state;
use cr_gameplay::ActionKind;
use cr_gameplay::EngineError;
use cr_gameplay::EngineEvent;
use cr_gameplay::EnginePlayer;
use cr_gameplay::EngineState;
use cr_gameplay::GameStatus;
use cr_gameplay::SeatRole;
use cr_gameplay::SpectatorVisibility;
use cr_gameplay::Transition;

#[derive(Debug, thiserror::Error)]
pub enum ActiveGameError {
    #[error("the room is already at capacity")]
    GameFull,
    #[error("player is already seated in this room")]
    AlreadyInGame,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Everything an `ActiveGame` needs from the outside world: where to send
/// per-viewer messages and where to persist the crash-recovery snapshot.
/// Kept as a trait so this crate never depends on a transport or a storage
/// engine directly — `cr-hosting` and `cr-records` supply the real thing.
pub trait RoomSink {
    fn send(&mut self, player_id: PlayerId, message: ServerMessage);
    fn write_snapshot(&mut self, state: &EngineState);
    fn delete_snapshot(&mut self);
}

/// Wraps one engine instance for one room: applies transitions, fans out
/// per-viewer payloads, runs the action clock, and rotates hands. Exactly
/// one `ActiveGame` exists per room id at any time (enforced by
/// `crate::manager::GameManager`), and every mutating call here must be
/// serialized by the caller — this type holds no lock of its own.
pub struct ActiveGame {
    state: EngineState,
    recorder: Recorder,
    pub timer: ActionTimer,
    min_players_to_start: usize,
    spectator_visibility: SpectatorVisibility,
}

impl ActiveGame {
    pub fn new(state: EngineState, min_players_to_start: usize, timer_config: TimerConfig) -> Self {
        Self {
            state,
            recorder: Recorder::new(),
            timer: ActionTimer::new(timer_config),
            min_players_to_start,
            spectator_visibility: SpectatorVisibility::Showdown,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn set_spectator_visibility(&mut self, mode: SpectatorVisibility) {
        self.spectator_visibility = mode;
    }

    pub fn spectator_visibility(&self) -> SpectatorVisibility {
        self.spectator_visibility
    }

    pub fn hand_events(&self) -> &[EngineEvent] {
        &self.state.hand_events
    }

    /// Applies a validated player action and drains the resulting
    /// transitions through the full broadcast/record/timer pipeline.
    pub fn apply_player_action(
        &mut self,
        player_id: PlayerId,
        kind: ActionKind,
        amount: Option<Chips>,
        sink: &mut impl RoomSink,
        now_millis: u64,
    ) -> Result<(), ActiveGameError> {
        let transitions = process_action(&self.state, player_id, kind, amount)?;
        self.timer.cancel();
        self.drain(transitions, sink, now_millis);
        self.arm_timer_if_waiting_on_someone();
        Ok(())
    }

    /// Starts the next hand, failing silently (the caller checks
    /// `hand_in_progress`/`status` to decide whether to transition the room
    /// to `completed`) if fewer than two seats have chips.
    pub fn start_next_hand(&mut self, sink: &mut impl RoomSink, now_millis: u64) -> Result<(), ActiveGameError> {
        let transitions = start_hand(&self.state, None)?;
        self.state.status = GameStatus::InProgress;
        self.drain(transitions, sink, now_millis);
        self.arm_timer_if_waiting_on_someone();
        Ok(())
    }

    /// Submits the default action (CHECK if legal, else FOLD) on behalf of
    /// the player currently on the clock, emitting `PLAYER_TIMEOUT` first.
    pub fn apply_timeout(&mut self, sink: &mut impl RoomSink, now_millis: u64) -> Result<(), ActiveGameError> {
        let Some(player_id) = self.state.active_player_id else {
            return Ok(());
        };
        let kind = default_action_for_timeout(&self.state, player_id);
        self.broadcast_event_only(
            EngineEvent::PlayerTimeout {
                player_id,
                default_action: match kind {
                    ActionKind::Check => cr_gameplay::Action::Check,
                    _ => cr_gameplay::Action::Fold,
                },
            },
            sink,
            now_millis,
        );
        self.apply_player_action(player_id, kind, None, sink, now_millis)
    }

    /// A player joins mid-game or into a waiting room. Per join policy, a
    /// player seated while a hand is in progress starts `folded` until the
    /// next `HAND_START`; the broadcast of `PLAYER_JOINED` never carries an
    /// action request, even if someone else is on the clock right now.
    pub fn join_player(
        &mut self,
        player_id: PlayerId,
        display_name: String,
        sink: &mut impl RoomSink,
        now_millis: u64,
    ) -> Result<(), ActiveGameError> {
        if self.state.player(player_id).is_some() {
            return Err(ActiveGameError::AlreadyInGame);
        }
        if self.state.players_in_play().count() >= self.state.max_players {
            return Err(ActiveGameError::GameFull);
        }
        let seat_index = next_free_seat_index(&self.state);
        self.state.seats.push(EnginePlayer {
            id: player_id,
            display_name: display_name.clone(),
            seat_index,
            role: SeatRole::Player,
            stack: self.state.starting_stack,
            bet: 0,
            pot_share: 0,
            folded: self.state.hand_in_progress,
            hole_cards: None,
            connected: true,
            is_all_in: false,
            is_ready: false,
        });
        self.recorder.upsert_player(ReplayPlayer {
            player_id,
            display_name: display_name.clone(),
            seat_index,
        });
        self.broadcast_player_joined(player_id, display_name, seat_index, sink, now_millis);
        Ok(())
    }

    /// A spectator joins: added without affecting seat capacity, and gets
    /// the current snapshot plus the in-progress hand's event list so its
    /// UI can catch up without replaying animations.
    pub fn join_spectator(
        &mut self,
        spectator_id: PlayerId,
        display_name: String,
        sink: &mut impl RoomSink,
    ) {
        if self.state.player(spectator_id).is_some() {
            return;
        }
        let seat_index = self.state.seats.len();
        self.state.seats.push(EnginePlayer {
            id: spectator_id,
            display_name,
            seat_index,
            role: SeatRole::Spectator,
            stack: 0,
            bet: 0,
            pot_share: 0,
            folded: false,
            hole_cards: None,
            connected: true,
            is_all_in: false,
            is_ready: true,
        });
        let projected = to_client_game_state(&self.state, spectator_id, self.spectator_visibility);
        sink.send(
            spectator_id,
            ServerMessage::GameJoined {
                game_state: projected,
                hand_events: Some(self.state.hand_events.clone()),
            },
        );
    }

    /// A socket closes. Seated players stay seated with `connected = false`
    /// (the action timer auto-folds/checks them on their turn); spectators
    /// are removed immediately and lose their seat assignment.
    pub fn handle_disconnect(&mut self, player_id: PlayerId) {
        let is_spectator = self
            .state
            .player(player_id)
            .map(|p| p.role == SeatRole::Spectator)
            .unwrap_or(false);
        if is_spectator {
            self.state.seats.retain(|p| p.id != player_id);
        } else if let Some(p) = self.state.player_mut(player_id) {
            p.connected = false;
        }
    }

    /// Drops this player's synthetic spectator seat, if it still has one.
    /// A spectator's disconnect already prunes its seat, but a reconnect
    /// that races ahead of the disconnect notification can leave a stale
    /// one behind — `identify` calls this defensively so a reconnecting
    /// spectator never double-seats itself.
    pub fn prune_stale_spectator_seat(&mut self, player_id: PlayerId) {
        let is_spectator = self
            .state
            .player(player_id)
            .map(|p| p.role == SeatRole::Spectator)
            .unwrap_or(false);
        if is_spectator {
            self.state.seats.retain(|p| p.id != player_id);
        }
    }

    /// Removes a seated player entirely. Only safe to call when no hand is
    /// in progress — mid-hand, `handle_disconnect` (flagging, not removal)
    /// is the correct operation instead.
    pub fn remove_seated_player(&mut self, player_id: PlayerId) {
        self.state.seats.retain(|p| p.id != player_id);
    }

    /// A deliberate `leaveGame`, distinct from a socket disconnect: the
    /// seat is always removed, never just flagged. If it was this player's
    /// turn, their default action resolves first so the hand can progress
    /// before the seat disappears.
    pub fn leave_player(
        &mut self,
        player_id: PlayerId,
        sink: &mut impl RoomSink,
        now_millis: u64,
    ) -> Result<(), ActiveGameError> {
        if self.state.active_player_id == Some(player_id) {
            self.apply_timeout(sink, now_millis)?;
        }
        self.remove_seated_player(player_id);
        self.broadcast_event_only(EngineEvent::PlayerLeft { player_id }, sink, now_millis);
        Ok(())
    }

    /// Post-showdown voluntary reveal. No-op (returns `Ok` without an
    /// event) if the hand number doesn't match, the stage isn't showdown
    /// yet, or the player never saw a flop.
    pub fn reveal_cards(
        &mut self,
        player_id: PlayerId,
        hand_number: cr_core::Epoch,
        sink: &mut impl RoomSink,
        now_millis: u64,
    ) -> Result<(), ActiveGameError> {
        if self.state.stage != cr_gameplay::Stage::Showdown || self.state.hand_number != hand_number {
            return Ok(());
        }
        let Some(hole_cards) = self.state.player(player_id).and_then(|p| p.hole_cards) else {
            return Ok(());
        };
        self.broadcast_event_only(
            EngineEvent::PlayerRevealed { player_id, hole_cards },
            sink,
            now_millis,
        );
        Ok(())
    }

    pub fn mark_ready(&mut self, player_id: PlayerId) {
        if let Some(p) = self.state.player_mut(player_id) {
            p.is_ready = true;
        }
    }

    /// True once enough seated players are ready and the room hasn't
    /// started its first hand yet.
    pub fn should_auto_start(&self) -> bool {
        self.state.status == GameStatus::Waiting
            && self
                .state
                .players_in_play()
                .filter(|p| p.is_ready)
                .count()
                >= self.min_players_to_start
    }

    /// True once fewer than two seats retain chips — the room is over.
    pub fn should_end_game(&self) -> bool {
        self.state.players_in_play().filter(|p| p.stack > 0).count() < 2
    }

    pub fn finish(self, game_config: GameConfig) -> ReplayFile {
        self.recorder.finish(game_config)
    }

    fn arm_timer_if_waiting_on_someone(&mut self) {
        if self.state.active_player_id.is_some() {
            self.timer.arm();
        }
    }

    fn drain(&mut self, transitions: Vec<Transition>, sink: &mut impl RoomSink, now_millis: u64) {
        for transition in transitions {
            self.state = transition.state.clone();
            self.recorder
                .record_event(now_millis, transition.event.clone(), transition.state.clone());
            sink.write_snapshot(&self.state);
            self.fan_out(&transition.event, sink);
        }
        if self.state.status == GameStatus::Completed {
            sink.delete_snapshot();
        }
    }

    fn fan_out(&self, event: &EngineEvent, sink: &mut impl RoomSink) {
        for viewer in self.state.seats.clone() {
            let game_state = to_client_game_state(&self.state, viewer.id, self.spectator_visibility);
            let action_request = self
                .state
                .active_player_id
                .filter(|&id| id == viewer.id)
                .and_then(|id| {
                    build_action_request(&self.state, id, self.timer.remaining_ms().unwrap_or(0))
                });
            sink.send(
                viewer.id,
                ServerMessage::GameState {
                    game_state,
                    event: event.clone(),
                    action_request,
                },
            );
        }
    }

    fn broadcast_event_only(&mut self, event: EngineEvent, sink: &mut impl RoomSink, now_millis: u64) {
        self.recorder
            .record_event(now_millis, event.clone(), self.state.clone());
        self.fan_out(&event, sink);
    }

    fn broadcast_player_joined(
        &mut self,
        player_id: PlayerId,
        display_name: String,
        seat_index: cr_core::Position,
        sink: &mut impl RoomSink,
        now_millis: u64,
    ) {
        let event = EngineEvent::PlayerJoined {
            player_id,
            display_name,
            seat_index,
        };
        self.recorder
            .record_event(now_millis, event.clone(), self.state.clone());
        // Mirrors `fan_out` but with `action_request` forced to `None`: the
        // join broadcast must never duplicate an action prompt.
        for viewer in self.state.seats.clone() {
            let game_state = to_client_game_state(&self.state, viewer.id, self.spectator_visibility);
            sink.send(
                viewer.id,
                ServerMessage::GameState {
                    game_state,
                    event: event.clone(),
                    action_request: None,
                },
            );
        }
    }

    pub fn broadcast_chat(&mut self, chat: ChatEntry, sink: &mut impl RoomSink, now_millis: u64) {
        self.recorder.record_chat(now_millis, chat.clone());
        for viewer in &self.state.seats {
            sink.send(
                viewer.id,
                ServerMessage::ChatMessage {
                    player_id: chat.player_id,
                    display_name: chat.display_name.clone(),
                    message: chat.message.clone(),
                    timestamp_millis: now_millis,
                },
            );
        }
    }
}

fn next_free_seat_index(state: &EngineState) -> cr_core::Position {
    let taken: std::collections::HashSet<cr_core::Position> = state
        .players_in_play()
        .map(|p| p.seat_index)
        .collect();
    (0..state.max_players)
        .find(|i| !taken.contains(i))
        .unwrap_or(state.seats.len())
}
