//! Game zones (Library, Hand, Graveyard, Battlefield, etc.)

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};

/// Different zones where cards can exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    Stack,
}

/// An ordered list of cards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardZone {
    pub zone_type: Zone,

    /// Player this zone belongs to (controller, for the battlefield)
    pub owner: PlayerId,

    /// Cards in insertion order; for the library the top card is last
    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new(zone_type: Zone, owner: PlayerId) -> Self {
        CardZone {
            zone_type,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    pub fn remove(&mut self, card_id: CardId) -> bool {
        if let Some(pos) = self.cards.iter().position(|&id| id == card_id) {
            // remove() rather than swap_remove(): iteration order drives
            // interceptor order and controller choices, so it must be stable.
            self.cards.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Draw from top (for Library)
    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    pub fn peek_top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    /// Unbiased shuffle (for Library)
    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        self.cards.shuffle(rng);
    }
}

/// All zones belonging to one player, including their side of the battlefield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZones {
    pub library: CardZone,
    pub hand: CardZone,
    pub graveyard: CardZone,
    pub exile: CardZone,
    /// Permanents this player controls, in the order they arrived
    pub battlefield: CardZone,
}

impl PlayerZones {
    pub fn new(player_id: PlayerId) -> Self {
        PlayerZones {
            library: CardZone::new(Zone::Library, player_id),
            hand: CardZone::new(Zone::Hand, player_id),
            graveyard: CardZone::new(Zone::Graveyard, player_id),
            exile: CardZone::new(Zone::Exile, player_id),
            battlefield: CardZone::new(Zone::Battlefield, player_id),
        }
    }

    pub fn get_zone(&self, zone: Zone) -> Option<&CardZone> {
        match zone {
            Zone::Library => Some(&self.library),
            Zone::Hand => Some(&self.hand),
            Zone::Graveyard => Some(&self.graveyard),
            Zone::Exile => Some(&self.exile),
            Zone::Battlefield => Some(&self.battlefield),
            Zone::Stack => None,
        }
    }

    pub fn get_zone_mut(&mut self, zone: Zone) -> Option<&mut CardZone> {
        match zone {
            Zone::Library => Some(&mut self.library),
            Zone::Hand => Some(&mut self.hand),
            Zone::Graveyard => Some(&mut self.graveyard),
            Zone::Exile => Some(&mut self.exile),
            Zone::Battlefield => Some(&mut self.battlefield),
            Zone::Stack => None,
        }
    }

    /// Which of this player's zones holds the card
    pub fn find(&self, card_id: CardId) -> Option<Zone> {
        [
            Zone::Battlefield,
            Zone::Hand,
            Zone::Library,
            Zone::Graveyard,
            Zone::Exile,
        ]
        .into_iter()
        .find(|&z| self.get_zone(z).is_some_and(|zone| zone.contains(card_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_zone_keeps_order_on_remove() {
        let mut zone = CardZone::new(Zone::Battlefield, PlayerId::new(1));
        let ids: Vec<CardId> = (10..14).map(CardId::new).collect();
        for &id in &ids {
            zone.add(id);
        }

        assert!(zone.remove(ids[1]));
        assert!(!zone.remove(ids[1]));
        assert_eq!(zone.cards, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn test_library_operations() {
        let mut library = CardZone::new(Zone::Library, PlayerId::new(1));
        let bottom = CardId::new(10);
        let top = CardId::new(11);
        library.add(bottom);
        library.add(top);

        assert_eq!(library.peek_top(), Some(top));
        assert_eq!(library.draw_top(), Some(top));
        assert_eq!(library.draw_top(), Some(bottom));
        assert_eq!(library.draw_top(), None);
    }

    #[test]
    fn test_find_zone() {
        let mut zones = PlayerZones::new(PlayerId::new(1));
        let card = CardId::new(5);
        assert_eq!(zones.find(card), None);
        zones.graveyard.add(card);
        assert_eq!(zones.find(card), Some(Zone::Graveyard));
        assert!(zones.get_zone(Zone::Stack).is_none());
    }
}
