use crate::geometry::Rect;
use crate::world::{Item, Portal, Sign};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionType {
    #[default]
    None,
    Sign,
    Portal,
    Item,
}

/// The interactable object the player overlaps, as an index into its
/// collection of the current world object index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Sign(usize),
    Portal(usize),
    Item(usize),
}

impl Interaction {
    pub fn collision_type(self) -> CollisionType {
        match self {
            Interaction::Sign(_) => CollisionType::Sign,
            Interaction::Portal(_) => CollisionType::Portal,
            Interaction::Item(_) => CollisionType::Item,
        }
    }
}

/// Tests the player's draw rectangle against signs, then portals, then
/// items. The first overlap wins, so a sign on top of a portal is a sign.
pub fn detect(
    player_rect: Rect,
    signs: &[Sign],
    portals: &[Portal],
    items: &[Item],
) -> Option<Interaction> {
    player_rect
        .first_intersecting(signs.iter().map(|sign| &sign.rect))
        .map(Interaction::Sign)
        .or_else(|| {
            player_rect
                .first_intersecting(portals.iter().map(|portal| &portal.rect))
                .map(Interaction::Portal)
        })
        .or_else(|| {
            player_rect
                .first_intersecting(items.iter().map(|item| &item.rect))
                .map(Interaction::Item)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(rect: Rect) -> Sign {
        Sign {
            rect,
            message: "Welcome".to_string(),
        }
    }

    fn portal(rect: Rect) -> Portal {
        Portal {
            rect,
            destination: "map2.tmx".to_string(),
        }
    }

    fn item(rect: Rect) -> Item {
        Item {
            rect,
            item_name: "potion".to_string(),
        }
    }

    #[test]
    fn no_overlap_is_none() {
        let player = Rect::new(0, 0, 32, 32);
        let found = detect(
            player,
            &[sign(Rect::new(100, 100, 16, 16))],
            &[portal(Rect::new(32, 0, 16, 16))],
            &[],
        );
        assert_eq!(found, None);
    }

    #[test]
    fn sign_beats_portal_and_item() {
        let player = Rect::new(0, 0, 32, 32);
        let shared = Rect::new(16, 16, 16, 16);
        let found = detect(player, &[sign(shared)], &[portal(shared)], &[item(shared)]);
        assert_eq!(found, Some(Interaction::Sign(0)));
        assert_eq!(found.map(Interaction::collision_type), Some(CollisionType::Sign));
    }

    #[test]
    fn portal_beats_item() {
        let player = Rect::new(0, 0, 32, 32);
        let shared = Rect::new(16, 16, 16, 16);
        let found = detect(player, &[], &[portal(shared)], &[item(shared)]);
        assert_eq!(found, Some(Interaction::Portal(0)));
    }

    #[test]
    fn first_match_within_a_collection_wins() {
        let player = Rect::new(0, 0, 32, 32);
        let items = [
            item(Rect::new(200, 0, 16, 16)),
            item(Rect::new(8, 8, 4, 4)),
            item(Rect::new(0, 0, 4, 4)),
        ];
        assert_eq!(detect(player, &[], &[], &items), Some(Interaction::Item(1)));
    }
}
