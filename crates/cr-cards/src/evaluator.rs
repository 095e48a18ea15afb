use crate::card::Card;
use crate::rank::Rank;
use crate::suit::Suit;
use serde::Deserialize;
use serde::Serialize;

/// The category of a five-card poker hand, ordered weakest to strongest.
/// Declaration order doubles as derived `Ord`, so `Category::Flush >
/// Category::Straight` falls out of the enum definition.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            Category::HighCard => "High Card",
            Category::OnePair => "One Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
        };
        write!(f, "{label}")
    }
}

/// The comparable strength of a five-card hand: its category, plus ranks
/// in descending significance for tie-breaking within that category. Two
/// `HandStrength` values compare correctly with derived `Ord` alone.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandStrength {
    category: Category,
    tiebreakers: [Rank; 5],
}

impl HandStrength {
    pub fn category(&self) -> Category {
        self.category
    }
    pub fn description(&self) -> String {
        format!("{} ({})", self.category, self.tiebreakers[0])
    }
}

/// Evaluates the best five-card hand obtainable from a set of cards (5 to 7
/// cards: hole cards plus whatever of the board has been revealed).
pub trait HandEvaluator {
    fn evaluate(cards: &[Card]) -> HandStrength;
}

pub struct StandardEvaluator;

impl HandEvaluator for StandardEvaluator {
    fn evaluate(cards: &[Card]) -> HandStrength {
        assert!(cards.len() >= 5, "need at least 5 cards to evaluate a hand");
        combinations(cards, 5)
            .iter()
            .map(|five| score_five(five))
            .max()
            .expect("at least one five-card combination exists")
    }
}

fn combinations(cards: &[Card], k: usize) -> Vec<Vec<Card>> {
    if k == 0 {
        return vec![vec![]];
    }
    if cards.len() < k {
        return vec![];
    }
    let mut out = Vec::new();
    for i in 0..=cards.len() - k {
        for mut rest in combinations(&cards[i + 1..], k - 1) {
            rest.insert(0, cards[i]);
            out.push(rest);
        }
    }
    out
}

fn score_five(cards: &[Card]) -> HandStrength {
    let mut ranks: Vec<Rank> = cards.iter().map(Card::rank).collect();
    ranks.sort_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().map(Card::suit).collect::<std::collections::HashSet<Suit>>().len() == 1;
    let straight_high = straight_high_rank(&ranks);

    let mut counts: Vec<(Rank, usize)> = Vec::new();
    for &rank in &ranks {
        match counts.iter_mut().find(|(r, _)| *r == rank) {
            Some((_, n)) => *n += 1,
            None => counts.push((rank, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
    let ordered_ranks: Vec<Rank> = counts.iter().map(|(r, _)| *r).collect();

    let (category, tiebreakers): (Category, Vec<Rank>) = match counts.as_slice() {
        _ if is_flush && straight_high.is_some() => {
            (Category::StraightFlush, vec![straight_high.unwrap()])
        }
        [(r, 4), (k, 1)] => (Category::FourOfAKind, vec![*r, *k]),
        [(r, 3), (k, 2)] => (Category::FullHouse, vec![*r, *k]),
        _ if is_flush => (Category::Flush, ranks.clone()),
        _ if straight_high.is_some() => (Category::Straight, vec![straight_high.unwrap()]),
        [(r, 3), (k1, 1), (k2, 1)] => (Category::ThreeOfAKind, vec![*r, *k1, *k2]),
        [(r1, 2), (r2, 2), (k, 1)] => (Category::TwoPair, vec![*r1, *r2, *k]),
        [(r, 2), (k1, 1), (k2, 1), (k3, 1)] => (Category::OnePair, vec![*r, *k1, *k2, *k3]),
        _ => (Category::HighCard, ranks.clone()),
    };
    let _ = ordered_ranks;

    let mut padded = [Rank::Two; 5];
    for (slot, rank) in padded.iter_mut().zip(tiebreakers.iter()) {
        *slot = *rank;
    }
    HandStrength {
        category,
        tiebreakers: padded,
    }
}

/// Returns the high rank of a straight among these five descending-sorted
/// ranks, if one exists. Handles the wheel (A-2-3-4-5) as five-high.
fn straight_high_rank(sorted_desc: &[Rank]) -> Option<Rank> {
    let mut values: Vec<u8> = sorted_desc.iter().map(Rank::value).collect();
    values.dedup();
    if values.len() != 5 {
        return None;
    }
    if values[0] - values[4] == 4 {
        return Some(sorted_desc[0]);
    }
    // wheel: A,5,4,3,2 -> values [14,5,4,3,2]
    if values == [14, 5, 4, 3, 2] {
        return Some(Rank::Five);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(s: &str) -> Vec<Card> {
        Card::parse_many(s).unwrap()
    }

    #[test]
    fn recognizes_straight_flush() {
        let strength = StandardEvaluator::evaluate(&cards("ThJhQhKhAh9c2d"));
        assert_eq!(strength.category(), Category::StraightFlush);
    }

    #[test]
    fn recognizes_wheel_straight() {
        let strength = StandardEvaluator::evaluate(&cards("Ah2d3c4h5sKcQd"));
        assert_eq!(strength.category(), Category::Straight);
    }

    #[test]
    fn four_of_a_kind_beats_full_house() {
        let quads = StandardEvaluator::evaluate(&cards("AhAdAsAc2d3h4s"));
        let boat = StandardEvaluator::evaluate(&cards("KhKdKsQcQd2h3s"));
        assert!(quads > boat);
    }

    #[test]
    fn higher_kicker_breaks_pair_tie() {
        let a = StandardEvaluator::evaluate(&cards("AhAd2c3d5hKsQc"));
        let b = StandardEvaluator::evaluate(&cards("AhAd2c3d4hKsQc"));
        assert!(a > b);
    }

    #[test]
    fn flush_beats_straight() {
        let flush = StandardEvaluator::evaluate(&cards("2h5h9hJhKh3c4d"));
        let straight = StandardEvaluator::evaluate(&cards("5c6d7h8s9cKdQh"));
        assert!(flush > straight);
    }
}
