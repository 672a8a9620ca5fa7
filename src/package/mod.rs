//! Distribution packaging and the publish hand-off.

pub mod modrinth;
pub mod publish;

pub use modrinth::ModrinthPackage;
pub use publish::{prepare_upload, UploadGate, UploadPlan};
