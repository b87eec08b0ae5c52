use std::path::PathBuf;

use crate::geometry::Rect;

/// Name of the layer sprites are drawn on.
pub const PLAYER_LAYER_NAME: &str = "Player";

/// Top three bits of a tile gid carry flip flags.
pub const TILE_GID_MASK: u32 = 0x1FFF_FFFF;

/// Parsed orthogonal tile map, in the order the document declares things.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapData {
    pub width_tiles: u32,
    pub height_tiles: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tilesets: Vec<Tileset>,
    pub layers: Vec<MapLayer>,
    pub objects: Vec<MapObject>,
}

impl MapData {
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.width_tiles.saturating_mul(self.tile_width),
            self.height_tiles.saturating_mul(self.tile_height),
        )
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name == name)
    }

    /// Layer sprites share; the bottom layer when the map has no "Player" layer.
    pub fn player_layer_index(&self) -> usize {
        self.layer_index(PLAYER_LAYER_NAME).unwrap_or(0)
    }

    /// Tileset owning `gid`, i.e. the one with the greatest `first_gid <= gid`.
    pub fn tileset_for_gid(&self, gid: u32) -> Option<&Tileset> {
        let gid = gid & TILE_GID_MASK;
        if gid == 0 {
            return None;
        }
        self.tilesets
            .iter()
            .filter(|tileset| tileset.first_gid <= gid)
            .max_by_key(|tileset| tileset.first_gid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub name: String,
    pub visible: bool,
    pub kind: MapLayerKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapLayerKind {
    Tiles(TileLayer),
    Objects,
    Image(Option<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    pub width: u32,
    pub height: u32,
    pub gids: Vec<u32>,
}

impl TileLayer {
    pub fn gid_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.gids
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    pub first_gid: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub columns: u32,
    pub tile_count: u32,
    pub image: Option<TilesetImage>,
}

impl Tileset {
    /// Source rectangle of `gid` inside the tileset image.
    pub fn tile_source_rect(&self, gid: u32) -> Option<Rect> {
        let local = (gid & TILE_GID_MASK).checked_sub(self.first_gid)?;
        if self.columns == 0 || (self.tile_count > 0 && local >= self.tile_count) {
            return None;
        }
        let col = local % self.columns;
        let row = local / self.columns;
        Some(Rect::new(
            (self.margin + col * (self.tile_width + self.spacing)) as i32,
            (self.margin + row * (self.tile_height + self.spacing)) as i32,
            self.tile_width as i32,
            self.tile_height as i32,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// One `<object>` record. `name` classifies the record; `kind` holds the
/// payload (destination, message, item name or NPC key).
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub name: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl MapObject {
    pub fn rect(&self) -> Rect {
        Rect::from_f32(self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &str) -> MapLayer {
        MapLayer {
            name: name.to_string(),
            visible: true,
            kind: MapLayerKind::Objects,
        }
    }

    fn tileset(first_gid: u32) -> Tileset {
        Tileset {
            first_gid,
            name: format!("set{first_gid}"),
            tile_width: 16,
            tile_height: 16,
            spacing: 0,
            margin: 0,
            columns: 4,
            tile_count: 16,
            image: None,
        }
    }

    fn map_with_layers(names: &[&str]) -> MapData {
        MapData {
            width_tiles: 10,
            height_tiles: 5,
            tile_width: 16,
            tile_height: 16,
            tilesets: vec![tileset(1), tileset(17)],
            layers: names.iter().map(|name| layer(name)).collect(),
            objects: Vec::new(),
        }
    }

    #[test]
    fn pixel_size_multiplies_tiles_by_tile_size() {
        assert_eq!(map_with_layers(&[]).pixel_size(), (160, 80));
    }

    #[test]
    fn pixel_size_saturates_instead_of_wrapping() {
        let mut map = map_with_layers(&[]);
        map.width_tiles = 100_000;
        map.tile_width = 100_000;
        assert_eq!(map.pixel_size(), (u32::MAX, 80));
    }

    #[test]
    fn player_layer_found_by_name() {
        let map = map_with_layers(&["Ground", "Detail", "Player", "Roofs"]);
        assert_eq!(map.player_layer_index(), 2);
    }

    #[test]
    fn player_layer_defaults_to_bottom() {
        let map = map_with_layers(&["Ground", "Roofs"]);
        assert_eq!(map.player_layer_index(), 0);
    }

    #[test]
    fn gid_resolves_to_owning_tileset() {
        let map = map_with_layers(&[]);
        assert_eq!(map.tileset_for_gid(0), None);
        assert_eq!(map.tileset_for_gid(16).map(|t| t.first_gid), Some(1));
        assert_eq!(map.tileset_for_gid(17).map(|t| t.first_gid), Some(17));
        assert_eq!(
            map.tileset_for_gid(17 | 0x8000_0000).map(|t| t.first_gid),
            Some(17)
        );
    }

    #[test]
    fn tile_source_rect_respects_columns_spacing_and_margin() {
        let mut set = tileset(1);
        assert_eq!(set.tile_source_rect(6), Some(Rect::new(16, 16, 16, 16)));
        set.spacing = 2;
        set.margin = 1;
        assert_eq!(set.tile_source_rect(6), Some(Rect::new(19, 19, 16, 16)));
        assert_eq!(set.tile_source_rect(17), None);
    }
}
