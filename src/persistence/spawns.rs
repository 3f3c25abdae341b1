use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One persisted spawn-point row, as stored in `spawnpoints.yaml` under
/// the data root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPointRow {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub radius: i32,
    pub spawn_radius: i32,
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    pub spawn_all: bool,
    #[serde(default)]
    pub entries: Vec<SpawnEntryRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntryRow {
    pub race: u16,
    pub count: u16,
}

/// Load failures the spawn manager must branch on: an empty table is
/// recoverable, a data-access fault is not.
#[derive(Debug)]
pub enum SpawnLoadError {
    NoData,
    Access(String),
}

impl std::fmt::Display for SpawnLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpawnLoadError::NoData => write!(f, "no spawn point rows"),
            SpawnLoadError::Access(message) => write!(f, "spawn point access fault: {}", message),
        }
    }
}

pub trait SpawnStore {
    fn load_spawn_points(&self) -> Result<Vec<SpawnPointRow>, SpawnLoadError>;
}

#[derive(Debug)]
pub struct YamlSpawnStore {
    path: PathBuf,
}

impl YamlSpawnStore {
    pub fn from_root(root: &Path) -> Self {
        Self {
            path: root.join("spawnpoints.yaml"),
        }
    }
}

impl SpawnStore for YamlSpawnStore {
    fn load_spawn_points(&self) -> Result<Vec<SpawnPointRow>, SpawnLoadError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SpawnLoadError::NoData);
            }
            Err(err) => {
                return Err(SpawnLoadError::Access(format!(
                    "read {} failed: {}",
                    self.path.display(),
                    err
                )));
            }
        };
        parse_spawn_rows(&content)
    }
}

pub fn parse_spawn_rows(content: &str) -> Result<Vec<SpawnPointRow>, SpawnLoadError> {
    let rows: Vec<SpawnPointRow> = serde_yaml::from_str(content)
        .map_err(|err| SpawnLoadError::Access(format!("spawn point parse failed: {}", err)))?;
    if rows.is_empty() {
        return Err(SpawnLoadError::NoData);
    }
    Ok(rows)
}
