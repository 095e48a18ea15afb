use cr_core::Player;
use cr_core::PlayerId;
use cr_core::Unique;
use serde::Deserialize;
use serde::Serialize;
use std::time::SystemTime;

/// A player's stable identity, independent of any one socket or session.
/// Created on first `identify`; never destroyed — a player who disconnects
/// for good simply never reconnects, but their id remains valid for
/// historical lookups (hand history, replay rosters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub id: PlayerId,
    pub display_name: String,
    #[serde(with = "created_at_millis")]
    pub created_at: SystemTime,
}

impl PlayerIdentity {
    pub fn new(id: PlayerId, display_name: String) -> Self {
        Self {
            id,
            display_name,
            created_at: SystemTime::now(),
        }
    }
}

impl Unique<Player> for PlayerIdentity {
    fn id(&self) -> PlayerId {
        self.id
    }
}

mod created_at_millis {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use std::time::Duration;
    use std::time::SystemTime;
    use std::time::UNIX_EPOCH;

    pub fn serialize<S: Serializer>(value: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = value
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_core::ID;

    #[test]
    fn round_trips_through_json() {
        let identity = PlayerIdentity::new(ID::default(), "alice".into());
        let json = serde_json::to_string(&identity).unwrap();
        let back: PlayerIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, identity.id);
        assert_eq!(back.display_name, identity.display_name);
    }
}
