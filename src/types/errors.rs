use std::fmt;

use super::entity::EntityId;

// === StorageError ===

/// Errors from the persistent key/value store.
#[derive(Debug)]
pub enum StorageError {
    /// Database operation failed.
    DatabaseError(String),
    /// A stored value could not be serialized or deserialized.
    SerializationError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::SerializationError(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// The settings record could not be read or written.
    StorageError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::StorageError(msg) => write!(f, "Settings storage error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<StorageError> for SettingsError {
    fn from(e: StorageError) -> Self {
        SettingsError::StorageError(e.to_string())
    }
}

// === HostError ===

/// Errors reported by the host browser collaborator.
#[derive(Debug)]
pub enum HostError {
    /// The entity was removed before the operation reached it.
    EntityNotFound(EntityId),
    /// The entity's page agent could not be reached.
    ChannelError(String),
    /// The host could not carry out the request.
    Unavailable(String),
}

impl HostError {
    /// True when the error only means the target entity is gone.
    pub fn is_entity_gone(&self) -> bool {
        matches!(self, HostError::EntityNotFound(_))
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::EntityNotFound(id) => write!(f, "Entity not found: {}", id),
            HostError::ChannelError(msg) => write!(f, "Page agent channel error: {}", msg),
            HostError::Unavailable(msg) => write!(f, "Host unavailable: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

// === HistoryError ===

/// Errors related to the browsing history mirror.
#[derive(Debug)]
pub enum HistoryError {
    /// History entry with the given ID was not found.
    NotFound(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::NotFound(id) => write!(f, "History entry not found: {}", id),
            HistoryError::DatabaseError(msg) => write!(f, "History database error: {}", msg),
        }
    }
}

impl std::error::Error for HistoryError {}

// === MigrationError ===

/// Errors raised while migrating saved entity state.
#[derive(Debug)]
pub enum MigrationError {
    /// The snapshot was written by a newer configuration version.
    UnsupportedVersion(u32),
    /// The snapshot or one of its records has an unexpected shape.
    Malformed(String),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::UnsupportedVersion(v) => {
                write!(f, "Unsupported snapshot version: {}", v)
            }
            MigrationError::Malformed(msg) => write!(f, "Malformed snapshot: {}", msg),
        }
    }
}

impl std::error::Error for MigrationError {}

// === AppError ===

/// Errors surfaced by scheduler operations.
#[derive(Debug)]
pub enum AppError {
    /// A host collaborator call failed.
    Host(HostError),
    /// Persistent state could not be read or written.
    Storage(StorageError),
    /// Settings could not be updated.
    Settings(SettingsError),
    /// An upgrade snapshot could not be written or read.
    Migration(MigrationError),
}

impl AppError {
    /// True when the error only means the target entity is gone.
    pub fn is_entity_gone(&self) -> bool {
        matches!(self, AppError::Host(e) if e.is_entity_gone())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Host(e) => write!(f, "{}", e),
            AppError::Storage(e) => write!(f, "{}", e),
            AppError::Settings(e) => write!(f, "{}", e),
            AppError::Migration(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Host(e) => Some(e),
            AppError::Storage(e) => Some(e),
            AppError::Settings(e) => Some(e),
            AppError::Migration(e) => Some(e),
        }
    }
}

impl From<HostError> for AppError {
    fn from(e: HostError) -> Self {
        AppError::Host(e)
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e)
    }
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        AppError::Settings(e)
    }
}

impl From<MigrationError> for AppError {
    fn from(e: MigrationError) -> Self {
        AppError::Migration(e)
    }
}
