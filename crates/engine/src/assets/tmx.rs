use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::map::{
    MapData, MapLayer, MapLayerKind, MapObject, TileLayer, Tileset, TilesetImage, TILE_GID_MASK,
};

/// Largest map extent, in pixels, on either axis.
const MAX_MAP_PIXELS: u32 = 1 << 24;

/// Largest object coordinate or size magnitude, in map pixels.
const MAX_OBJECT_COORD: f32 = 16_777_216.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmxErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnsupportedMap,
    MissingAttribute,
    InvalidValue,
    UnsupportedEncoding,
    TileCountMismatch,
}

#[derive(Debug, Clone)]
pub struct TmxError {
    pub code: TmxErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for TmxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for TmxError {}

/// Parses a Tiled XML map. External `.tsx` tilesets and image paths are
/// resolved relative to the directory of `file_path`.
pub fn parse_tmx(file_path: &Path, raw: &str) -> Result<MapData, TmxError> {
    let doc = parse_document(file_path, raw)?;
    let ctx = ParseContext {
        file_path,
        doc: &doc,
    };
    let root = doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(ctx.error_at(
            TmxErrorCode::InvalidRoot,
            format!(
                "root element must be <map>, found <{}>",
                root.tag_name().name()
            ),
            root,
        ));
    }

    let orientation = root.attribute("orientation").unwrap_or("orthogonal");
    if orientation != "orthogonal" {
        return Err(ctx.error_at(
            TmxErrorCode::UnsupportedMap,
            format!("map orientation '{orientation}' is not supported; expected orthogonal"),
            root,
        ));
    }
    if root.attribute("infinite") == Some("1") {
        return Err(ctx.error_at(
            TmxErrorCode::UnsupportedMap,
            "infinite maps are not supported".to_string(),
            root,
        ));
    }

    let width_tiles = ctx.required_u32(root, "width")?;
    let height_tiles = ctx.required_u32(root, "height")?;
    let tile_width = ctx.required_u32(root, "tilewidth")?;
    let tile_height = ctx.required_u32(root, "tileheight")?;
    ctx.check_pixel_extent(root, "width", width_tiles, tile_width)?;
    ctx.check_pixel_extent(root, "height", height_tiles, tile_height)?;

    let mut map = MapData {
        width_tiles,
        height_tiles,
        tile_width,
        tile_height,
        tilesets: Vec::new(),
        layers: Vec::new(),
        objects: Vec::new(),
    };
    let base_dir = parent_dir(file_path);

    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() == "tileset" {
            map.tilesets.push(ctx.parse_tileset_ref(child, &base_dir)?);
        } else {
            ctx.collect_layer(child, true, &base_dir, &mut map)?;
        }
    }
    map.tilesets.sort_by_key(|tileset| tileset.first_gid);

    Ok(map)
}

struct ParseContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl ParseContext<'_, '_> {
    fn parse_tileset_ref(&self, node: Node<'_, '_>, base_dir: &Path) -> Result<Tileset, TmxError> {
        let first_gid = self.required_u32(node, "firstgid")?;
        let Some(source) = node.attribute("source") else {
            return self.parse_tileset(node, first_gid, base_dir);
        };

        let tsx_path = base_dir.join(source);
        let raw = fs::read_to_string(&tsx_path).map_err(|source_err| TmxError {
            code: TmxErrorCode::ReadFile,
            message: format!("failed to read external tileset: {source_err}"),
            file_path: tsx_path.clone(),
            location: None,
        })?;
        let doc = parse_document(&tsx_path, &raw)?;
        let tsx = ParseContext {
            file_path: &tsx_path,
            doc: &doc,
        };
        let root = doc.root_element();
        if root.tag_name().name() != "tileset" {
            return Err(tsx.error_at(
                TmxErrorCode::InvalidRoot,
                format!(
                    "root element must be <tileset>, found <{}>",
                    root.tag_name().name()
                ),
                root,
            ));
        }
        tsx.parse_tileset(root, first_gid, &parent_dir(&tsx_path))
    }

    fn parse_tileset(
        &self,
        node: Node<'_, '_>,
        first_gid: u32,
        base_dir: &Path,
    ) -> Result<Tileset, TmxError> {
        let tile_width = self.required_u32(node, "tilewidth")?;
        let tile_height = self.required_u32(node, "tileheight")?;
        let spacing = self.optional_u32(node, "spacing")?.unwrap_or(0);
        let margin = self.optional_u32(node, "margin")?.unwrap_or(0);

        let image = match child_element(node, "image") {
            Some(image) => {
                let Some(source) = image.attribute("source") else {
                    return Err(self.missing_attribute(image, "source"));
                };
                Some(TilesetImage {
                    path: base_dir.join(source),
                    width: self.optional_u32(image, "width")?.unwrap_or(0),
                    height: self.optional_u32(image, "height")?.unwrap_or(0),
                })
            }
            None => None,
        };

        let columns = match self.optional_u32(node, "columns")? {
            Some(columns) => columns,
            None => image
                .as_ref()
                .and_then(|image| {
                    (image.width.saturating_sub(2 * margin) + spacing)
                        .checked_div(tile_width + spacing)
                })
                .unwrap_or(0),
        };

        Ok(Tileset {
            first_gid,
            name: node.attribute("name").unwrap_or_default().to_string(),
            tile_width,
            tile_height,
            spacing,
            margin,
            columns,
            tile_count: self.optional_u32(node, "tilecount")?.unwrap_or(0),
            image,
        })
    }

    /// Appends `node` to the layer list in document order, flattening groups.
    fn collect_layer(
        &self,
        node: Node<'_, '_>,
        parent_visible: bool,
        base_dir: &Path,
        map: &mut MapData,
    ) -> Result<(), TmxError> {
        let visible = parent_visible && node.attribute("visible") != Some("0");
        let name = node.attribute("name").unwrap_or_default().to_string();
        let kind = match node.tag_name().name() {
            "layer" => MapLayerKind::Tiles(self.parse_tile_layer(node, &name, map)?),
            "objectgroup" => {
                for object in node
                    .children()
                    .filter(|child| child.has_tag_name("object"))
                {
                    map.objects.push(self.parse_object(object)?);
                }
                MapLayerKind::Objects
            }
            "imagelayer" => MapLayerKind::Image(
                child_element(node, "image")
                    .and_then(|image| image.attribute("source"))
                    .map(|source| base_dir.join(source)),
            ),
            "group" => {
                for child in node.children().filter(|child| child.is_element()) {
                    self.collect_layer(child, visible, base_dir, map)?;
                }
                return Ok(());
            }
            _ => return Ok(()),
        };
        map.layers.push(MapLayer {
            name,
            visible,
            kind,
        });
        Ok(())
    }

    fn parse_tile_layer(
        &self,
        node: Node<'_, '_>,
        name: &str,
        map: &MapData,
    ) -> Result<TileLayer, TmxError> {
        let width = self.optional_u32(node, "width")?.unwrap_or(map.width_tiles);
        let height = self.optional_u32(node, "height")?.unwrap_or(map.height_tiles);
        let Some(data) = child_element(node, "data") else {
            return Err(self.error_at(
                TmxErrorCode::InvalidValue,
                format!("layer '{name}' has no <data> element"),
                node,
            ));
        };
        if let Some(compression) = data.attribute("compression") {
            return Err(self.error_at(
                TmxErrorCode::UnsupportedEncoding,
                format!("layer '{name}' uses unsupported compression '{compression}'"),
                data,
            ));
        }

        let gids = match data.attribute("encoding") {
            None => data
                .children()
                .filter(|child| child.has_tag_name("tile"))
                .map(|tile| {
                    self.optional_u32(tile, "gid")
                        .map(|gid| gid.unwrap_or(0) & TILE_GID_MASK)
                })
                .collect::<Result<Vec<_>, TmxError>>()?,
            Some("csv") => data
                .text()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| {
                    token.parse::<u32>().map(|gid| gid & TILE_GID_MASK).map_err(|_| {
                        self.error_at(
                            TmxErrorCode::InvalidValue,
                            format!("layer '{name}' has invalid tile gid '{token}'"),
                            data,
                        )
                    })
                })
                .collect::<Result<Vec<_>, TmxError>>()?,
            Some(other) => {
                return Err(self.error_at(
                    TmxErrorCode::UnsupportedEncoding,
                    format!("layer '{name}' uses unsupported encoding '{other}'; expected csv or xml"),
                    data,
                ))
            }
        };

        let expected = width as usize * height as usize;
        if gids.len() != expected {
            return Err(self.error_at(
                TmxErrorCode::TileCountMismatch,
                format!(
                    "layer '{name}' has {} tiles; expected {expected} ({width}x{height})",
                    gids.len()
                ),
                data,
            ));
        }

        Ok(TileLayer {
            width,
            height,
            gids,
        })
    }

    fn parse_object(&self, node: Node<'_, '_>) -> Result<MapObject, TmxError> {
        let width = self.object_f32(node, "width")?;
        let height = self.object_f32(node, "height")?;
        let mut y = self.object_f32(node, "y")?;
        // Tile objects are anchored bottom-left.
        if node.attribute("gid").is_some() {
            y -= height;
        }
        Ok(MapObject {
            name: node.attribute("name").unwrap_or_default().to_string(),
            kind: node
                .attribute("type")
                .or_else(|| node.attribute("class"))
                .unwrap_or_default()
                .to_string(),
            x: self.object_f32(node, "x")?,
            y,
            width,
            height,
        })
    }

    /// Object coordinate or size, defaulting to zero and bounded so the
    /// snapped integer rect keeps its edges in range.
    fn object_f32(&self, node: Node<'_, '_>, attribute: &str) -> Result<f32, TmxError> {
        let value = self.optional_f32(node, attribute)?.unwrap_or(0.0);
        if value.abs() > MAX_OBJECT_COORD {
            let raw = node.attribute(attribute).unwrap_or_default();
            return Err(self.invalid_value(
                node,
                attribute,
                raw,
                &format!("within +/-{MAX_OBJECT_COORD}"),
            ));
        }
        Ok(value)
    }

    fn check_pixel_extent(
        &self,
        node: Node<'_, '_>,
        axis: &str,
        tiles: u32,
        tile_size: u32,
    ) -> Result<(), TmxError> {
        match tiles.checked_mul(tile_size) {
            Some(pixels) if pixels <= MAX_MAP_PIXELS => Ok(()),
            _ => Err(self.error_at(
                TmxErrorCode::InvalidValue,
                format!(
                    "map {axis} of {tiles} tiles x {tile_size} px exceeds {MAX_MAP_PIXELS} pixels"
                ),
                node,
            )),
        }
    }

    fn required_u32(&self, node: Node<'_, '_>, attribute: &str) -> Result<u32, TmxError> {
        self.optional_u32(node, attribute)?
            .ok_or_else(|| self.missing_attribute(node, attribute))
    }

    fn optional_u32(&self, node: Node<'_, '_>, attribute: &str) -> Result<Option<u32>, TmxError> {
        node.attribute(attribute)
            .map(|value| {
                value.trim().parse::<u32>().map_err(|_| {
                    self.invalid_value(node, attribute, value, "a non-negative integer")
                })
            })
            .transpose()
    }

    fn optional_f32(&self, node: Node<'_, '_>, attribute: &str) -> Result<Option<f32>, TmxError> {
        node.attribute(attribute)
            .map(|value| match value.trim().parse::<f32>() {
                Ok(parsed) if parsed.is_finite() => Ok(parsed),
                _ => Err(self.invalid_value(node, attribute, value, "a finite number")),
            })
            .transpose()
    }

    fn missing_attribute(&self, node: Node<'_, '_>, attribute: &str) -> TmxError {
        self.error_at(
            TmxErrorCode::MissingAttribute,
            format!(
                "<{}> is missing required attribute '{attribute}'",
                node.tag_name().name()
            ),
            node,
        )
    }

    fn invalid_value(
        &self,
        node: Node<'_, '_>,
        attribute: &str,
        value: &str,
        expected: &str,
    ) -> TmxError {
        self.error_at(
            TmxErrorCode::InvalidValue,
            format!(
                "<{}> attribute {attribute}='{value}' must be {expected}",
                node.tag_name().name()
            ),
            node,
        )
    }

    fn error_at(&self, code: TmxErrorCode, message: String, node: Node<'_, '_>) -> TmxError {
        let pos = self.doc.text_pos_at(node.range().start);
        TmxError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

fn parse_document<'input>(file_path: &Path, raw: &'input str) -> Result<Document<'input>, TmxError> {
    Document::parse(raw).map_err(|error| TmxError {
        code: TmxErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(name))
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
