use thiserror::Error;

/// Failures resolving card members against the fixed roster.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Unknown member id: {0}")]
    UnknownMember(String),

    #[error("A card must tag at least one member")]
    NoMembers,
}
