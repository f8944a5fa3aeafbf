use failure::{Context, Error as FailureError, Fail};
use validator::{Validate, ValidationErrors};

#[derive(Clone, Debug, Fail, PartialEq)]
pub enum Error {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Forbidden")]
    Forbidden,
    #[fail(display = "Validation error: {}", _0)]
    Validate(String),
    #[fail(display = "Insufficient stock")]
    InsufficientStock,
    #[fail(display = "Insufficient credit limit")]
    InsufficientCredit,
    #[fail(display = "Minimum order value not reached")]
    MinimumOrderValue,
    #[fail(display = "Operation is not allowed in the current state")]
    InvalidState,
    #[fail(display = "Cart is empty")]
    EmptyCart,
    #[fail(display = "Already exists")]
    AlreadyExists,
    #[fail(display = "Parse error")]
    ParseError,
}

#[derive(Debug, Fail)]
pub enum RepoError {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Connection: {}", reason)]
    Connection { reason: String },
}

impl From<ValidationErrors> for Error {
    fn from(e: ValidationErrors) -> Self {
        Error::Validate(format!("{:?}", e))
    }
}

/// Runs derived field checks and tags the failure as a validation error
pub fn validate<T: Validate>(payload: &T) -> Result<(), FailureError> {
    payload.validate().map_err(|e| FailureError::from(Error::from(e)))
}

/// Finds the error kind anywhere in the chain, whether raised directly or attached as context.
pub fn kind_of(e: &FailureError) -> Option<Error> {
    for cause in e.iter_chain() {
        if let Some(kind) = cause.downcast_ref::<Error>() {
            return Some(kind.clone());
        }
        if let Some(ctx) = cause.downcast_ref::<Context<Error>>() {
            return Some(ctx.get_context().clone());
        }
        if let Some(RepoError::NotFound) = cause.downcast_ref::<RepoError>() {
            return Some(Error::NotFound);
        }
    }
    None
}
