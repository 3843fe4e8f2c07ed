use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type used throughout this crate.
pub type WildSpotResult<T> = Result<T, Box<dyn Error>>;

/// An on demand aggregation was requested without a caller identity.
#[derive(Debug, Clone, Copy)]
pub struct UnauthenticatedError;

impl Display for UnauthenticatedError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "caller must be authenticated to trigger aggregation")
    }
}

impl Error for UnauthenticatedError {}

/// A sighting report failed the basic shape checks at the ingestion boundary.
#[derive(Debug, Clone, Copy)]
pub struct InvalidReportError {
    pub msg: &'static str,
}

impl Display for InvalidReportError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.msg)
    }
}

impl Error for InvalidReportError {}
