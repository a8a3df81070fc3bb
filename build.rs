//! Build script for Quiver.
//!
//! Currently a no-op placeholder. The querier wire types are implemented
//! directly in Rust (see src/model/proto.rs) rather than generated from
//! protobuf definitions.
//!
//! This approach was chosen because:
//! - It avoids proto file dependencies and build-time codegen complexity
//! - The querier API surface is a small, stable set of messages
//! - The custom codec needs direct control over payload compression
//!
//! If proto-based codegen is needed in the future, tonic-build can be
//! configured here to compile proto files from a `proto/` directory.

fn main() {
    // Rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
