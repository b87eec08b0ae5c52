use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetNameError {
    #[error("asset name must not be empty")]
    Empty,
    #[error("asset name must be relative")]
    Absolute,
    #[error("asset name must not contain '\\\\'")]
    Backslash,
    #[error("asset name must not contain a '..' segment")]
    ParentTraversal,
    #[error("asset name contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Map ids and image names are relative paths below the data directory.
pub fn validate_asset_name(name: &str) -> Result<(), AssetNameError> {
    if name.is_empty() {
        return Err(AssetNameError::Empty);
    }
    if name.starts_with('/') {
        return Err(AssetNameError::Absolute);
    }
    if name.contains('\\') {
        return Err(AssetNameError::Backslash);
    }
    if name.split('/').any(|segment| segment == "..") {
        return Err(AssetNameError::ParentTraversal);
    }
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.' | ' ') {
            continue;
        }
        return Err(AssetNameError::InvalidCharacter { character: ch });
    }
    Ok(())
}

/// `town/map1.tmx` -> `town/map1_npcs.json`.
pub fn npc_definitions_name(map_id: &str) -> String {
    let stem = match map_id.rsplit_once('.') {
        Some((stem, extension)) if !extension.contains('/') => stem,
        _ => map_id,
    };
    format!("{stem}_npcs.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        for name in ["map1.tmx", "town/inn.tmx", "male_sprite_model.png", "old-man 2.png"] {
            assert!(validate_asset_name(name).is_ok(), "name={name}");
        }
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "/etc/passwd", "..", "a/../b", r"a\b", "map:1.tmx"] {
            assert!(validate_asset_name(name).is_err(), "name={name}");
        }
    }

    #[test]
    fn npc_definitions_name_replaces_extension() {
        assert_eq!(npc_definitions_name("map1.tmx"), "map1_npcs.json");
        assert_eq!(npc_definitions_name("town/inn.tmx"), "town/inn_npcs.json");
        assert_eq!(npc_definitions_name("v1.2/cave"), "v1.2/cave_npcs.json");
    }
}
