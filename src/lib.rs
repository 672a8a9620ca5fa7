//! Shared infrastructure for assembling multi-loader Minecraft mod jars.
//!
//! This crate is the build-and-packaging side of a mod shipped for Fabric,
//! Quilt, and NeoForge out of one codebase. It takes the per-loader jars an
//! external toolchain already compiled and remapped, and turns them into the
//! release artifacts:
//!
//! - **Archive model** - Zip-backed entry trees with copy/move/delete
//!   primitives and reproducible (fixed-timestamp, fixed-permission) output
//! - **Manifest splicing** - Fabric and NeoForge descriptor derivation,
//!   mixin/access-widener rewrites, jar-in-jar metadata merging
//! - **Assemblers** - The NeoForge-flavoured merged jar and the final
//!   multi-loader distributable with nested runtime jars
//! - **Packaging** - The upload-ready distribution archive and the
//!   credential-gated publish hand-off
//!
//! # Architecture
//!
//! ```text
//! runtime jar (mojmap)    ─┐
//! neoforge loader jar     ─┼─► assemble::NeoForgeAssembly ─► merged neoforge jar
//! jar-in-jar fragment     ─┘                                        │
//!                                                                   ▼
//! runtime jar (intermediary) ─────────────────────► assemble::FinalAssembly
//!                                                                   │
//!                                                                   ▼
//!                                                    final multi-loader jar
//!                                                                   │
//!                                                                   ▼
//!                                  package::ModrinthPackage ─► upload package
//! ```
//!
//! Every assembler receives explicit [`config`] values and owns its archive
//! handles for exactly one run; failures abort the run and leave no artifact
//! at the output path.

pub mod archive;
pub mod assemble;
pub mod config;
pub mod manifest;
pub mod package;
pub mod preflight;
pub mod release;

pub use archive::reproducible::normalize_archive;
pub use archive::ArchiveTree;
pub use assemble::{FinalAssembly, NeoForgeAssembly};
pub use config::{BuildConfig, ProjectConfig};
pub use package::ModrinthPackage;
