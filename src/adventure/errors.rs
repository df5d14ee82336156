use thiserror::Error;

/// Errors that can arise while loading content, simulating adventures or
/// talking to the player store.
#[derive(Debug, Error)]
pub enum AdventureError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (content files, directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Bad quest, item or zone definitions. Fatal at startup.
    #[error("invalid content: {0}")]
    Content(String),

    /// The simulation observed state it should never reach (content or engine bug).
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Another unit of work is already open for this user.
    #[error("adventure for user {0} is already being updated")]
    Busy(u64),

    /// Player tried to adventure in a zone they have not discovered.
    #[error("zone not accessible: {0}")]
    ZoneLocked(String),
}
