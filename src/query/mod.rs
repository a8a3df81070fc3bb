//! Read path: fan-out dispatch and response merging.

pub mod fanout;
pub mod merge;
