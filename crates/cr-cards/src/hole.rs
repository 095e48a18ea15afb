use crate::card::Card;
use serde::Deserialize;
use serde::Serialize;

/// A player's two private hole cards.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hole(pub Card, pub Card);

impl Hole {
    pub fn new(a: Card, b: Card) -> Self {
        Self(a, b)
    }
    pub fn cards(&self) -> [Card; 2] {
        [self.0, self.1]
    }
}

impl std::fmt::Display for Hole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::Rank;
    use crate::suit::Suit;

    #[test]
    fn displays_concatenated() {
        let hole = Hole::new(
            Card::new(Rank::Ace, Suit::Spades),
            Card::new(Rank::King, Suit::Hearts),
        );
        assert_eq!(hole.to_string(), "AsKh");
    }
}
