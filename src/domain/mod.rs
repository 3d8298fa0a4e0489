pub mod article;
pub mod comment;
pub mod product;
pub mod user;

/// Raised when a row that was already proven to exist comes back missing,
/// e.g. an `UPDATE ... RETURNING` hitting zero rows after the lookup.
/// Signals a logic error upstream, not a missing resource.
#[derive(Debug, thiserror::Error)]
#[error("record unexpectedly missing during projection")]
pub struct DataIntegrityError;

/// Resources owned by a single user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}
