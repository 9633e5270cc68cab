pub mod command;
pub mod market;
pub mod summary;
