use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum IndexError {
    #[error("index {index} is out of bounds for collection of length {length}")]
    OutOfBounds { index: usize, length: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum PushError {
    #[error("list is full (maximum length: {maximum})")]
    ListFull { maximum: usize },
}
