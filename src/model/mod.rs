//! Data model: wire types and label-set fingerprinting.

pub mod labels;
pub mod proto;
