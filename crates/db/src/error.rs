#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The row we tried to insert collides with an existing unique value.
    AlreadyExists,
    /// Input rejected by a schema constraint.
    BadInput,
    /// The referenced row does not exist.
    NotFound,
    /// More embedded questions than the schema allows.
    TooMany,
    /// Unrecoverable error.
    Fatal,
}

pub type Result<T> = core::result::Result<T, Error>;
