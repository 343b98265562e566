pub mod accessors;
pub mod misc;
pub mod predicates;
pub mod signing;
pub mod verifier;

mod error;
