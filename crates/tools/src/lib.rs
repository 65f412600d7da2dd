//! Developer Tooling: mesh inspector, frame timing, mesh export.
//!
//! # Invariants
//! - Tools only read geometry; they never modify a mesh.
//! - Inspection reports problems instead of panicking on malformed input.

mod export;
mod frame_timer;
mod inspector;

pub use export::{ExportError, MESH_SCHEMA_VERSION, MeshExport, write_json, write_obj};
pub use frame_timer::FrameTimer;
pub use inspector::{MeshInspector, MeshSummary};

pub fn crate_info() -> &'static str {
    "ribbonscape-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
