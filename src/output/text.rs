//! Plain-text tables for terminal output.

use crate::aggregator::{ErrorReport, FunnelReport, LossReason, SessionEvents, StepDetails, UserOverview};

const BAR_WIDTH: usize = 40;

/// Funnel table with a bar per step
pub fn render_funnel(report: &FunnelReport) -> String {
    let mut lines = Vec::new();

    lines.push("  📊 CONVERSION FUNNEL".to_string());
    lines.push("  ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━┳━━━━━━━━━━┳━━━━━━━━━━┓".to_string());
    lines.push(format!("  ┃ {:<28} ┃ {:>8} ┃ {:>8} ┃ {:>8} ┃", "Step", "Sessions", "Conv.", "Dropped"));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━╋━━━━━━━━━━╋━━━━━━━━━━┫".to_string());

    for row in &report.steps {
        lines.push(format!(
            "  ┃ {:<28} ┃ {:>8} ┃ {:>7.1}% ┃ {:>8} ┃",
            truncate(&row.label, 28),
            row.count,
            row.conversion_rate * 100.0,
            row.dropped
        ));
    }

    lines.push("  ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━┻━━━━━━━━━━┻━━━━━━━━━━┛".to_string());
    lines.push(String::new());

    let widest = report.steps.first().map(|r| r.count).unwrap_or(0).max(1);
    for row in &report.steps {
        let filled = row.count * BAR_WIDTH / widest;
        lines.push(format!("  {:<28} {}", truncate(&row.label, 28), "█".repeat(filled)));
    }

    lines.push(String::new());
    lines.push(format!(
        "  Sessions: {} | Unmatched: {} | Overall conversion: {:.1}%",
        report.total_sessions,
        report.unmatched,
        report.overall_conversion() * 100.0
    ));

    lines.join("\n")
}

/// "Who moved forward and who didn't" panel plus matching events
pub fn render_step_details(details: &StepDetails, events: &[SessionEvents], limit: usize) -> String {
    let mut lines = Vec::new();

    lines.push(format!("  🔎 STEP {}: {}", details.index + 1, details.label));
    lines.push(format!(
        "  Total sessions at this step: {} | Moved forward: {} | Dropped here: {}",
        details.total, details.moved_forward, details.dropped
    ));

    if !details.dropped_sessions.is_empty() {
        lines.push(String::new());
        lines.push("  Dropped sessions:".to_string());
        for id in details.dropped_sessions.iter().take(limit) {
            lines.push(format!("    - {}", id));
        }
        if details.dropped_sessions.len() > limit {
            lines.push(format!("    ... and {} more", details.dropped_sessions.len() - limit));
        }
    }

    lines.push(String::new());
    if events.is_empty() {
        lines.push("  No events matched this step.".to_string());
    }

    for group in events.iter().take(limit) {
        lines.push(format!("  Session {} ({} events)", group.session_id, group.events.len()));
        for event in &group.events {
            lines.push(format!(
                "    {}  {:<24} {:<24} {}{}",
                event.event_time.format("%Y-%m-%d %H:%M:%S"),
                truncate(&event.path, 24),
                truncate(&event.css, 24),
                event.text,
                event.value.as_deref().map(|v| format!(" [{}]", v)).unwrap_or_default()
            ));
        }
    }

    lines.join("\n")
}

/// Error categories with abandonment rates
pub fn render_errors(report: &ErrorReport) -> String {
    let mut lines = Vec::new();

    lines.push("  ⚠️  ERRORS BY CATEGORY".to_string());
    lines.push("  ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━┳━━━━━━━━━━┳━━━━━━━━━━━━━┓".to_string());
    lines.push(format!(
        "  ┃ {:<28} ┃ {:>8} ┃ {:>8} ┃ {:>11} ┃",
        "Category", "Events", "Sessions", "No purchase"
    ));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━╋━━━━━━━━━━╋━━━━━━━━━━━━━┫".to_string());

    for stats in report.categories.iter().filter(|c| c.occurrences > 0) {
        lines.push(format!(
            "  ┃ {:<28} ┃ {:>8} ┃ {:>8} ┃ {:>10.1}% ┃",
            truncate(&stats.label, 28),
            stats.occurrences,
            stats.sessions,
            stats.abandonment_rate * 100.0
        ));
    }

    lines.push("  ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━┻━━━━━━━━━━┻━━━━━━━━━━━━━┛".to_string());
    lines.push(format!("  Total error events: {}", report.total_errors));

    lines.join("\n")
}

/// Why shoppers did not complete their order
pub fn render_loss_reasons(reasons: &[LossReason]) -> String {
    if reasons.is_empty() {
        return "  No non-converting sessions found.".to_string();
    }

    let total: usize = reasons.iter().map(|r| r.count).sum();
    let mut lines = vec!["  🛒 WHAT STOPPED SHOPPERS FROM COMPLETING CHECKOUT".to_string()];

    for reason in reasons {
        let share = reason.count as f64 / total as f64 * 100.0;
        lines.push(format!("  {:>6} ({:>5.1}%)  {}", reason.count, share, reason.reason));
    }

    lines.join("\n")
}

pub fn render_overview(overview: &UserOverview) -> String {
    format!(
        "  Users: {} ({} with multiple sessions, {} with one) | Sessions: {} | Events: {}",
        overview.users,
        overview.multi_session_users,
        overview.single_session_users,
        overview.sessions,
        overview.events
    )
}

/// **Private** - cut to `width` characters, marking the cut with "…"
fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
