use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use island_merge_core::LayoutError;
use island_merge_system_editor::CustomLevel;
use serde::{Deserialize, Serialize};

const SHARE_DOMAIN: &str = "island";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const SHARE_HEADER: &str = "island:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a custom level into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(level: &CustomLevel) -> Result<String, ShareCodeError> {
    let payload = SharedPayload {
        name: level.name.clone(),
        description: level.description.clone(),
        author: level.author.clone(),
        tags: level.tags.clone(),
        tiles: level.tiles.clone(),
    };
    let json = serde_json::to_vec(&payload).map_err(ShareCodeError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{SHARE_HEADER}:{}x{}:{encoded}",
        level.width, level.height
    ))
}

/// Decodes a share code into a new custom level stamped with `now`.
pub(crate) fn decode(value: &str, now: DateTime<Utc>) -> Result<CustomLevel, ShareCodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ShareCodeError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(ShareCodeError::MissingPrefix)?;
    let version = parts.next().ok_or(ShareCodeError::MissingVersion)?;
    let dimensions = parts.next().ok_or(ShareCodeError::MissingDimensions)?;
    let payload = parts.next().ok_or(ShareCodeError::MissingPayload)?;

    if domain != SHARE_DOMAIN {
        return Err(ShareCodeError::InvalidPrefix(domain.to_owned()));
    }
    if version != SHARE_VERSION {
        return Err(ShareCodeError::UnsupportedVersion(version.to_owned()));
    }

    let (width, height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(ShareCodeError::InvalidEncoding)?;
    let decoded: SharedPayload =
        serde_json::from_slice(&bytes).map_err(ShareCodeError::InvalidPayload)?;

    let level = CustomLevel {
        id: format!("shared_{}", now.timestamp_millis()),
        name: decoded.name,
        description: decoded.description,
        created_at: now,
        author: decoded.author,
        width,
        height,
        tiles: decoded.tiles,
        tags: decoded.tags,
    };
    let _ = level.layout().map_err(ShareCodeError::InvalidLevel)?;
    Ok(level)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SharedPayload {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    tiles: Vec<Vec<u8>>,
}

/// Errors that can occur while encoding or decoding share codes.
#[derive(Debug)]
pub(crate) enum ShareCodeError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the share code.
    MissingPrefix,
    /// The share code did not contain a version segment.
    MissingVersion,
    /// The share code did not include grid dimensions.
    MissingDimensions,
    /// The share code did not include the payload segment.
    MissingPayload,
    /// The share code used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The share code used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the share code.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
    /// The tiles do not form a valid level of the stated size.
    InvalidLevel(LayoutError),
}

impl fmt::Display for ShareCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "share code was empty"),
            Self::MissingPrefix => write!(f, "share code is missing the prefix"),
            Self::MissingVersion => write!(f, "share code is missing the version"),
            Self::MissingDimensions => write!(f, "share code is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "share code is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "share prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "share code version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode level payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not process level payload: {error}")
            }
            Self::InvalidLevel(error) => write!(f, "shared level is invalid: {error}"),
        }
    }
}

impl Error for ShareCodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            Self::InvalidLevel(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), ShareCodeError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| ShareCodeError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| ShareCodeError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| ShareCodeError::InvalidDimensions(dimensions.to_owned()))?;

    if width == 0 || height == 0 {
        return Err(ShareCodeError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use island_merge_core::{CellCoord, GridSize};
    use island_merge_system_editor::LevelEditor;

    fn sample() -> CustomLevel {
        let mut editor = LevelEditor::new(GridSize::new(4, 2).expect("valid size"));
        for cell in [CellCoord::new(0, 0), CellCoord::new(3, 1)] {
            assert!(editor.paint(cell));
        }
        let mut events = Vec::new();
        let mut level = editor.export("Stepping Stones", Utc::now(), &mut events);
        level.author = Some("cartographer".to_owned());
        level
    }

    #[test]
    fn shared_level_keeps_tiles_and_metadata() {
        let level = sample();
        let code = encode(&level).expect("level encodes");
        assert!(code.starts_with(&format!("{SHARE_HEADER}:4x2:")));

        let now = Utc
            .with_ymd_and_hms(2024, 7, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let imported = decode(&code, now).expect("code decodes");
        assert_eq!(imported.tiles, level.tiles);
        assert_eq!(imported.name, level.name);
        assert_eq!(imported.author, level.author);
        assert_eq!(imported.id, format!("shared_{}", now.timestamp_millis()));
        assert_eq!(imported.created_at, now);
    }

    #[test]
    fn malformed_codes_are_rejected_without_panicking() {
        let now = Utc::now();
        assert!(matches!(decode("   ", now), Err(ShareCodeError::EmptyPayload)));
        assert!(matches!(
            decode("maze:v1:4x2:abc", now),
            Err(ShareCodeError::InvalidPrefix(_))
        ));
        assert!(matches!(
            decode("island:v2:4x2:abc", now),
            Err(ShareCodeError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            decode("island:v1:0x2:abc", now),
            Err(ShareCodeError::InvalidDimensions(_))
        ));
        assert!(matches!(
            decode("island:v1:4x2", now),
            Err(ShareCodeError::MissingPayload)
        ));
        assert!(matches!(
            decode("island:v1:4x2:!!!", now),
            Err(ShareCodeError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn dimensions_must_match_tiles() {
        let code = encode(&sample()).expect("level encodes");
        let tampered = code.replacen(":4x2:", ":5x2:", 1);
        assert!(matches!(
            decode(&tampered, Utc::now()),
            Err(ShareCodeError::InvalidLevel(_))
        ));
    }
}
