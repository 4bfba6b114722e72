use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not start the async runtime")]
    Runtime,
    #[display("invalid configuration")]
    Config,
    #[display("could not connect to the bucket")]
    Storage,
    #[display("sync aborted")]
    Sync,
}
