use crate::recorder::ReplayFile;
use crate::replay_instance::ReplayInstance;
use cr_core::GameId;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ReplayManagerError {
    #[error("no replay is loaded for this game")]
    NotLoaded,
}

/// Loads a finished game's `ReplayFile` from storage; implemented by
/// `cr-records` against whatever storage engine is configured. Kept as a
/// trait so this crate never depends on a concrete storage backend.
pub trait ReplaySource {
    fn load(&self, game_id: GameId) -> Option<ReplayFile>;
}

/// Registry of loaded replays, parallel in shape to `GameManager`: one
/// shared map, lazily populated on first request, guarded by a single lock.
pub struct ReplayManager {
    loaded: Mutex<HashMap<GameId, ReplayInstance>>,
}

impl Default for ReplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayManager {
    pub fn new() -> Self {
        Self {
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the replay for `game_id` from `source` if it isn't already
    /// resident, then runs `f` against it.
    pub fn with_replay<R>(
        &self,
        game_id: GameId,
        source: &impl ReplaySource,
        f: impl FnOnce(&mut ReplayInstance) -> R,
    ) -> Result<R, ReplayManagerError> {
        let mut loaded = self.loaded.lock().expect("replay manager lock poisoned");
        if !loaded.contains_key(&game_id) {
            let file = source.load(game_id).ok_or(ReplayManagerError::NotLoaded)?;
            loaded.insert(game_id, ReplayInstance::new(file));
        }
        let instance = loaded.get_mut(&game_id).expect("just inserted or present");
        Ok(f(instance))
    }

    pub fn unload(&self, game_id: GameId) {
        self.loaded.lock().expect("replay manager lock poisoned").remove(&game_id);
    }

    pub fn is_loaded(&self, game_id: GameId) -> bool {
        self.loaded.lock().expect("replay manager lock poisoned").contains_key(&game_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::GameConfig;
    use cr_core::ID;
    use cr_gameplay::EngineState;
    use cr_gameplay::GameType;

    struct StaticSource(Option<ReplayFile>);
    impl ReplaySource for StaticSource {
        fn load(&self, _game_id: GameId) -> Option<ReplayFile> {
            self.0.clone()
        }
    }

    fn empty_file() -> ReplayFile {
        let state = EngineState::new(ID::default(), "t".into(), GameType::Cash, 5, 10, 9, 1000);
        ReplayFile {
            version: 1,
            game_config: GameConfig {
                game_id: state.game_id,
                game_name: state.game_name,
                small_blind_amount: 5,
                big_blind_amount: 10,
                max_players: 9,
                starting_stack: 1000,
            },
            players: Vec::new(),
            entries: Vec::new(),
        }
    }

    #[test]
    fn missing_source_data_is_not_loaded() {
        let manager = ReplayManager::new();
        let source = StaticSource(None);
        let result = manager.with_replay(ID::default(), &source, |_| ());
        assert!(matches!(result, Err(ReplayManagerError::NotLoaded)));
    }

    #[test]
    fn a_replay_loads_once_and_stays_resident() {
        let manager = ReplayManager::new();
        let game_id: GameId = ID::default();
        let source = StaticSource(Some(empty_file()));
        manager.with_replay(game_id, &source, |_| ()).unwrap();
        assert!(manager.is_loaded(game_id));
    }
}
