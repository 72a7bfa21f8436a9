use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("unable to initialise logging")]
    Logging,
    #[display("unable to randomize add-on folders")]
    Randomize,
    #[display("update check failed")]
    Check,
}
