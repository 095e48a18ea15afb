use crate::rank::Rank;
use crate::suit::Suit;
use serde::Deserialize;
use serde::Serialize;
use serde::de::Error as _;

/// A single playing card, encoded bijectively as `rank * 4 + suit` so it fits
/// in a byte and compares/hashes the way a human reads it: by rank first.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Card(u8);

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self(u8::from(rank) * 4 + u8::from(suit))
    }
    pub fn rank(&self) -> Rank {
        Rank::from(self.0 / 4)
    }
    pub fn suit(&self) -> Suit {
        Suit::from(self.0 % 4)
    }
    /// Parse a two-character wire string such as `"Th"` or `"2d"`.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.len() != 2 {
            return Err(format!("card string must be 2 characters, got {s:?}"));
        }
        let rank = Rank::try_from(&s[0..1])?;
        let suit = Suit::try_from(&s[1..2])?;
        Ok(Self::new(rank, suit))
    }
    /// Parse a sequence of concatenated two-character card strings, e.g. a
    /// community-card blob like `"Th9d2c"`.
    pub fn parse_many(s: &str) -> Result<Vec<Self>, String> {
        if s.len() % 2 != 0 {
            return Err(format!("card sequence has odd length: {s:?}"));
        }
        s.as_bytes()
            .chunks(2)
            .map(|chunk| Self::parse(std::str::from_utf8(chunk).expect("ascii chunk")))
            .collect()
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.rank(), self.suit())
    }
}

impl TryFrom<&str> for Card {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl Serialize for Card {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Card::parse(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display() {
        for rank in Rank::all() {
            for suit in Suit::all() {
                let card = Card::new(rank, suit);
                assert_eq!(Card::parse(&card.to_string()).unwrap(), card);
            }
        }
    }

    #[test]
    fn parses_many_concatenated() {
        let cards = Card::parse_many("Th9d2c").unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].to_string(), "Th");
    }

    #[test]
    fn rejects_odd_length_sequence() {
        assert!(Card::parse_many("Th9").is_err());
    }

    #[test]
    fn orders_by_rank_then_suit() {
        assert!(Card::new(Rank::Two, Suit::Spades) < Card::new(Rank::Three, Suit::Clubs));
    }
}
