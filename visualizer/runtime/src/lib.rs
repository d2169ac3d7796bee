#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use netpol_visualizer_core as core;
pub use netpol_visualizer_k8s_api as k8s;
pub use netpol_visualizer_k8s_index as index;

mod analyzer;
mod args;
mod cache;
mod source;

pub use self::{
    analyzer::{Analyzer, PolicyDetails, ResourceDetails},
    args::Args,
    cache::SnapshotCache,
    source::{ClusterSource, Snapshot, Source},
};
