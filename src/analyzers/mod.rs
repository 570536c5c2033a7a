//! Metadata analyzers: independent pure functions over [`crate::model::PackageInfo`]
//! fields, each producing one signal bundle for the scoring engine.

pub mod dependency;
pub mod maintainer;
pub mod publish;
