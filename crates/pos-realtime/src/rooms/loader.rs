//! Room table loading
//!
//! The room table is data: either the built-in default or a TOML/JSON file
//! named by `ROOMS_CONFIG`, validated before the gateway starts.

use pos_common::ConfigError;
use pos_core::RoomDefinition;
use serde::Deserialize;

use super::RoomRegistry;

/// On-disk layout of a room table
#[derive(Debug, Deserialize)]
struct RoomsFile {
    rooms: Vec<RoomDefinition>,
}

/// Load the registry from `path`, or the built-in table when `path` is `None`
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or the table fails validation
pub fn load_registry(path: Option<&str>) -> Result<RoomRegistry, ConfigError> {
    let Some(path) = path else {
        tracing::info!("Using built-in room table");
        return Ok(RoomRegistry::default());
    };

    let settings = config::Config::builder()
        .add_source(config::File::with_name(path))
        .build()
        .map_err(|e| ConfigError::Rooms(format!("{path}: {e}")))?;

    let file: RoomsFile = settings
        .try_deserialize()
        .map_err(|e| ConfigError::Rooms(format!("{path}: {e}")))?;

    let registry =
        RoomRegistry::new(file.rooms).map_err(|e| ConfigError::Rooms(format!("{path}: {e}")))?;

    tracing::info!(path = %path, rooms = registry.len(), "Loaded room table");

    Ok(registry)
}
