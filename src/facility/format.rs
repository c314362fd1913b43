//! Human-readable rendering, lookup and pagination for facility views.

use super::schemas::{
    AlcfActivity, AlcfStatusSummary, JobCounts, JobPage, MaintenanceInfo, NerscSystem,
};

fn status_glyph(status: &str) -> &'static str {
    match status.to_ascii_lowercase().as_str() {
        "active" | "available" | "up" => "✅",
        "degraded" | "limited" => "⚠️",
        _ => "❌",
    }
}

/// Display block for one system, matching the summary layout.
pub fn format_system_lines(system: &NerscSystem) -> Vec<String> {
    let formatted_name = system.full_name.replace('_', " ");
    let mut lines = vec![
        format!("🖥️  {} ({}):", formatted_name, system.name),
        format!("   Status: {} {}", status_glyph(&system.status), system.status),
    ];
    if !system.description.is_empty() && system.description != system.status {
        lines.push(format!("   Info: {}", system.description));
    }
    lines.push(format!("   Last Updated: {}", system.updated_at));
    lines
}

/// Multi-line summary of every system, sorted by display name.
pub fn format_status_summary(systems: &[NerscSystem]) -> String {
    if systems.is_empty() {
        return "No status data available from NERSC API.".to_string();
    }

    let mut sorted: Vec<&NerscSystem> = systems.iter().collect();
    sorted.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    let mut lines = vec![
        "NERSC System Status Summary".to_string(),
        "=".repeat(30),
        String::new(),
    ];
    for system in sorted {
        lines.extend(format_system_lines(system));
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn find_system<'a>(systems: &'a [NerscSystem], name: &str) -> Option<&'a NerscSystem> {
    systems.iter().find(|s| s.matches_name(name))
}

/// Miss message listing the valid system names, sorted.
pub fn system_not_found_message(systems: &[NerscSystem], name: &str) -> String {
    let mut available: Vec<&str> = systems.iter().map(|s| s.name.as_str()).collect();
    available.sort_unstable();
    format!(
        "System '{}' not found. Available systems: {}",
        name,
        available.join(", ")
    )
}

/// Detail view for a single system, with type and notes.
pub fn format_single_system(system: &NerscSystem) -> String {
    let header = format!("Status for {}", system.full_name);
    let mut lines = vec![header.clone(), "=".repeat(header.len()), String::new()];
    lines.extend(format_system_lines(system));
    lines.push(format!("   System Type: {}", system.system_type));
    let notes = if system.notes.is_empty() {
        "None".to_string()
    } else {
        system.notes.join(", ")
    };
    lines.push(format!("   Notes: {}", notes));
    lines.join("\n")
}

/// Collapse the raw activity document into the availability summary.
///
/// The machine is non-operational during a maintenance flag or while any
/// MOTD of type `MAINT` is displayed.
pub fn summarize_activity(activity: &AlcfActivity) -> AlcfStatusSummary {
    let in_maintenance = activity.maint.unwrap_or(false)
        || activity.motd_info.iter().any(|motd| motd.kind == "MAINT");

    AlcfStatusSummary {
        is_operational: !in_maintenance,
        motd_info: activity.motd_info.clone(),
        maintenance_info: MaintenanceInfo {
            start: activity.start,
            end: activity.end,
        },
        job_counts: JobCounts {
            running: activity.running.len(),
            starting: activity.starting.len(),
            queued: activity.queued.len(),
            reservation: activity.reservation.len(),
        },
        last_updated: activity.updated,
    }
}

/// Clamped pagination: the slice shrinks to what exists, `total` always
/// reports the unsliced count, and out-of-range pages are empty rather
/// than errors.
pub fn paginate<T: Clone>(items: &[T], skip: usize, n: usize) -> JobPageOf<T> {
    let total = items.len();
    let start = skip.min(total);
    let end = start.saturating_add(n).min(total);
    JobPageOf {
        total,
        tasks: items[start..end].to_vec(),
    }
}

/// Generic page; aliased to [`JobPage`] for the ALCF queues.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPageOf<T> {
    pub total: usize,
    pub tasks: Vec<T>,
}

impl From<JobPageOf<super::schemas::AlcfJob>> for JobPage {
    fn from(page: JobPageOf<super::schemas::AlcfJob>) -> Self {
        JobPage {
            total: page.total,
            tasks: page.tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::schemas::{AlcfJob, AlcfMotd};
    use super::*;

    fn system(name: &str, full_name: &str, status: &str) -> NerscSystem {
        NerscSystem {
            name: name.to_string(),
            full_name: full_name.to_string(),
            description: "desc".to_string(),
            system_type: "compute".to_string(),
            notes: vec![],
            status: status.to_string(),
            updated_at: "2026-01-01T00:00:00".to_string(),
        }
    }

    #[test]
    fn test_summary_sorts_by_display_name() {
        let systems = vec![
            system("z", "Zeta", "active"),
            system("a", "Alpha", "degraded"),
        ];
        let summary = format_status_summary(&systems);
        let alpha = summary.find("Alpha").unwrap();
        let zeta = summary.find("Zeta").unwrap();
        assert!(alpha < zeta);
        assert!(summary.contains("⚠️ degraded"));
        assert!(summary.contains("✅ active"));
    }

    #[test]
    fn test_unknown_status_gets_down_glyph() {
        let lines = format_system_lines(&system("s", "S", "unavailable"));
        assert!(lines[1].contains("❌"));
    }

    #[test]
    fn test_not_found_message_lists_sorted_names() {
        let systems = vec![system("z", "Z", "active"), system("a", "A", "active")];
        let message = system_not_found_message(&systems, "cori");
        assert_eq!(
            message,
            "System 'cori' not found. Available systems: a, z"
        );
    }

    #[test]
    fn test_maintenance_motd_marks_non_operational() {
        let activity = AlcfActivity {
            motd_info: vec![AlcfMotd {
                display_end: String::new(),
                display_start: String::new(),
                message: "down for maintenance".to_string(),
                resource: "polaris".to_string(),
                kind: "MAINT".to_string(),
            }],
            ..AlcfActivity::default()
        };
        assert!(!summarize_activity(&activity).is_operational);

        let quiet = AlcfActivity::default();
        assert!(summarize_activity(&quiet).is_operational);
    }

    #[test]
    fn test_job_counts_come_from_queue_lengths() {
        let activity = AlcfActivity {
            running: vec![AlcfJob::default(); 3],
            queued: vec![AlcfJob::default(); 2],
            ..AlcfActivity::default()
        };
        let summary = summarize_activity(&activity);
        assert_eq!(summary.job_counts.running, 3);
        assert_eq!(summary.job_counts.queued, 2);
        assert_eq!(summary.job_counts.starting, 0);
    }

    #[test]
    fn test_pagination_clamps_and_reports_full_total() {
        let items: Vec<i32> = (0..7).collect();

        let page = paginate(&items, 5, 3);
        assert_eq!(page.total, 7);
        assert_eq!(page.tasks, vec![5, 6]);

        let past_end = paginate(&items, 10, 3);
        assert_eq!(past_end.total, 7);
        assert!(past_end.tasks.is_empty());

        let all = paginate(&items, 0, 100);
        assert_eq!(all.tasks.len(), 7);
    }
}
