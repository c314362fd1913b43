//! Typed views of the NERSC and ALCF status documents.
//!
//! The NERSC document is strict: an unknown field means the upstream
//! format changed and the bridge should say so rather than guess. The
//! ALCF job entries carry site-specific extras, so those stay tolerant.

use serde::{Deserialize, Serialize};

/// One NERSC system as reported by the status API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NerscSystem {
    pub name: String,
    pub full_name: String,
    pub description: String,
    /// compute, filesystem, service or storage.
    pub system_type: String,
    pub notes: Vec<String>,
    pub status: String,
    pub updated_at: String,
}

impl NerscSystem {
    pub fn matches_name(&self, search_name: &str) -> bool {
        self.name.eq_ignore_ascii_case(search_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlcfJob {
    #[serde(default)]
    pub jobid: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub starttime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlcfMotd {
    pub display_end: String,
    pub display_start: String,
    pub message: String,
    pub resource: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The raw ALCF activity document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlcfActivity {
    #[serde(default)]
    pub maint: Option<bool>,
    /// Maintenance window start, epoch seconds.
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub running: Vec<AlcfJob>,
    #[serde(default)]
    pub starting: Vec<AlcfJob>,
    #[serde(default)]
    pub queued: Vec<AlcfJob>,
    #[serde(default)]
    pub reservation: Vec<AlcfJob>,
    #[serde(default)]
    pub motd_info: Vec<AlcfMotd>,
    #[serde(default)]
    pub updated: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaintenanceInfo {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobCounts {
    pub running: usize,
    pub starting: usize,
    pub queued: usize,
    pub reservation: usize,
}

/// Summarized availability view of the ALCF document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlcfStatusSummary {
    pub is_operational: bool,
    pub motd_info: Vec<AlcfMotd>,
    pub maintenance_info: MaintenanceInfo,
    pub job_counts: JobCounts,
    pub last_updated: Option<i64>,
}

/// One page of jobs; `total` is always the unsliced queue length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPage {
    pub total: usize,
    pub tasks: Vec<AlcfJob>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nersc_system_rejects_unknown_fields() {
        let extra = r#"{
            "name": "perlmutter", "full_name": "Perlmutter", "description": "ok",
            "system_type": "compute", "notes": [], "status": "active",
            "updated_at": "2026-01-01T00:00:00", "surprise": true
        }"#;
        assert!(serde_json::from_str::<NerscSystem>(extra).is_err());
    }

    #[test]
    fn test_alcf_job_tolerates_extra_fields() {
        let job: AlcfJob = serde_json::from_str(
            r#"{"jobid": "123", "project": "Catalyst", "walltime": "6:00:00", "nodes": 16}"#,
        )
        .unwrap();
        assert_eq!(job.jobid.as_deref(), Some("123"));
        assert_eq!(job.queue, None);
    }

    #[test]
    fn test_alcf_activity_defaults_missing_queues() {
        let activity: AlcfActivity =
            serde_json::from_str(r#"{"maint": false, "updated": 1700000000}"#).unwrap();
        assert!(activity.running.is_empty());
        assert!(activity.motd_info.is_empty());
        assert_eq!(activity.updated, Some(1_700_000_000));
    }

    #[test]
    fn test_case_insensitive_name_match() {
        let system: NerscSystem = serde_json::from_str(
            r#"{
                "name": "perlmutter", "full_name": "Perlmutter", "description": "ok",
                "system_type": "compute", "notes": [], "status": "active",
                "updated_at": "2026-01-01T00:00:00"
            }"#,
        )
        .unwrap();
        assert!(system.matches_name("PerlMutter"));
        assert!(!system.matches_name("cori"));
    }
}
