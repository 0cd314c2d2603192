use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must be relative")]
    Absolute,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key must not end with '/'")]
    TrailingSlash,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys are relative, slash-separated, lowercase paths without extension,
/// e.g. `enemies/grunt_walk`.
pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetKeyError::Absolute);
    }
    if key.ends_with('/') {
        return Err(AssetKeyError::TrailingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    match key
        .chars()
        .find(|&ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(AssetKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_keys() {
        for key in ["castle", "enemies/grunt_walk", "ui/btn-2"] {
            assert_eq!(validate_asset_key(key), Ok(()), "key={key}");
        }
    }

    #[test]
    fn rejects_paths_that_escape_or_carry_extensions() {
        assert_eq!(validate_asset_key(""), Err(AssetKeyError::Empty));
        assert_eq!(validate_asset_key("/etc"), Err(AssetKeyError::Absolute));
        assert_eq!(validate_asset_key("a/"), Err(AssetKeyError::TrailingSlash));
        assert_eq!(validate_asset_key("a/../b"), Err(AssetKeyError::ParentTraversal));
        assert_eq!(validate_asset_key(r"a\b"), Err(AssetKeyError::Backslash));
        assert_eq!(
            validate_asset_key("tiles.png"),
            Err(AssetKeyError::InvalidCharacter { character: '.' })
        );
        assert_eq!(
            validate_asset_key("Tiles"),
            Err(AssetKeyError::InvalidCharacter { character: 'T' })
        );
    }
}
