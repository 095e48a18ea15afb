use crate::card::Card;
use crate::rank::Rank;
use crate::suit::Suit;
use rand::rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde::Serialize;

/// A standard 52-card deck, shuffled once per hand and drawn down through
/// hole cards, burns, and board streets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeckError {
    #[error("cannot deal {requested} cards from a deck of {remaining}")]
    Exhausted { requested: usize, remaining: usize },
}

impl Deck {
    /// Build a freshly ordered, unshuffled 52-card deck.
    pub fn create() -> Self {
        let mut cards = Vec::with_capacity(52);
        for rank in Rank::all() {
            for suit in Suit::all() {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    /// Build a deck from an explicit card sequence, bypassing `create()`.
    /// Used to seed deterministic hands in tests via a `deckOverride`.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Fisher-Yates shuffle using the thread's default CSPRNG.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rng());
    }

    /// Deal `n` cards off the top, removing them from the deck.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if n > self.cards.len() {
            return Err(DeckError::Exhausted {
                requested: n,
                remaining: self.cards.len(),
            });
        }
        Ok(self.cards.drain(0..n).collect())
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::create()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_has_fifty_two_unique_cards() {
        let deck = Deck::create();
        assert_eq!(deck.len(), 52);
        let unique: std::collections::HashSet<_> = deck.cards.iter().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn shuffle_preserves_composition() {
        let mut deck = Deck::create();
        let before: std::collections::HashSet<_> = deck.cards.iter().copied().collect();
        deck.shuffle();
        let after: std::collections::HashSet<_> = deck.cards.iter().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn deal_removes_cards_from_the_top() {
        let mut deck = Deck::create();
        let dealt = deck.deal(5).unwrap();
        assert_eq!(dealt.len(), 5);
        assert_eq!(deck.len(), 47);
    }

    #[test]
    fn deal_past_exhaustion_fails() {
        let mut deck = Deck::create();
        deck.deal(52).unwrap();
        assert!(matches!(
            deck.deal(1),
            Err(DeckError::Exhausted {
                requested: 1,
                remaining: 0
            })
        ));
    }
}
