use autorefresh::types::entity::EntityId;
use autorefresh::types::errors::*;

// === StorageError Tests ===

#[test]
fn storage_error_display_variants() {
    assert_eq!(
        StorageError::DatabaseError("disk full".to_string()).to_string(),
        "Storage database error: disk full"
    );
    assert_eq!(
        StorageError::SerializationError("settings: expected bool".to_string()).to_string(),
        "Storage serialization error: settings: expected bool"
    );
}

#[test]
fn storage_error_from_rusqlite() {
    let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, StorageError::DatabaseError(_)));
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::InvalidKey("defaults.colour".to_string()).to_string(),
        "Invalid settings key: defaults.colour"
    );
    assert_eq!(
        SettingsError::InvalidValue("expected bool".to_string()).to_string(),
        "Invalid settings value: expected bool"
    );
}

#[test]
fn settings_error_wraps_storage_error() {
    let err: SettingsError = StorageError::DatabaseError("locked".to_string()).into();
    assert_eq!(
        err.to_string(),
        "Settings storage error: Storage database error: locked"
    );
}

// === HostError Tests ===

#[test]
fn host_error_entity_gone_detection() {
    assert!(HostError::EntityNotFound(EntityId(4)).is_entity_gone());
    assert!(!HostError::ChannelError("no receiver".to_string()).is_entity_gone());
    assert!(!HostError::Unavailable("history".to_string()).is_entity_gone());
    assert_eq!(
        HostError::EntityNotFound(EntityId(4)).to_string(),
        "Entity not found: 4"
    );
}

// === MigrationError Tests ===

#[test]
fn migration_error_display_variants() {
    assert_eq!(
        MigrationError::UnsupportedVersion(9).to_string(),
        "Unsupported snapshot version: 9"
    );
    assert_eq!(
        MigrationError::Malformed("not an object".to_string()).to_string(),
        "Malformed snapshot: not an object"
    );
}

// === AppError Tests ===

#[test]
fn app_error_keeps_source_and_gone_flag() {
    let err: AppError = HostError::EntityNotFound(EntityId(1)).into();
    assert!(err.is_entity_gone());
    let boxed: Box<dyn std::error::Error> = Box::new(err);
    assert!(boxed.source().is_some());

    let err: AppError = StorageError::DatabaseError("x".to_string()).into();
    assert!(!err.is_entity_gone());
    assert_eq!(err.to_string(), "Storage database error: x");
}

#[test]
fn history_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(HistoryError::NotFound("h-1".to_string()));
    assert_eq!(err.to_string(), "History entry not found: h-1");
    assert!(err.source().is_none());
}
