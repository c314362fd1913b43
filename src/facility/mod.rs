//! Facility-status bridge: typed NERSC/ALCF status views.

pub mod client;
pub mod format;
pub mod schemas;

pub use client::FacilityClient;
pub use schemas::{
    AlcfActivity, AlcfJob, AlcfMotd, AlcfStatusSummary, JobCounts, JobPage, MaintenanceInfo,
    NerscSystem,
};
