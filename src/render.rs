//! Plain-text presentation of dashboard state and events.

use crate::domain::model::{
    BusinessMetrics, BusinessQuery, DashboardEvent, DashboardSnapshot, NotificationLevel,
    Operation, RequestStatus,
};

pub const EMPTY_STATE_TITLE: &str = "Ready to Analyze Your Business?";
pub const EMPTY_STATE_HINT: &str = "Enter your business name and location above to get simulated Google Business metrics and AI-generated SEO headlines.";

pub fn analyze_label(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Idle => "Analyze Business",
        RequestStatus::InFlight => "Analyzing Business...",
    }
}

pub fn regenerate_label(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Idle => "Regenerate",
        RequestStatus::InFlight => "Generating...",
    }
}

pub fn format_rating(rating: f64) -> String {
    format!("{}/5.0", rating)
}

/// Groups digits in threes: `1287` → `1,287`.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_metrics(query: &BusinessQuery, metrics: &BusinessMetrics) -> String {
    [
        format!("Business Analytics  ({} • {})", query.name, query.location),
        format!("  Google Rating:  {}", format_rating(metrics.rating)),
        format!("  Total Reviews:  {}", format_count(metrics.review_count)),
        format!("  SEO Headline:   \"{}\"", metrics.headline),
    ]
    .join("\n")
}

pub fn render_snapshot(snapshot: &DashboardSnapshot) -> String {
    let mut lines = vec![format!(
        "Business Name: {:?}  Location: {:?}",
        snapshot.query.name, snapshot.query.location
    )];

    match &snapshot.metrics {
        Some(metrics) => {
            lines.push(render_metrics(&snapshot.query, metrics));
            lines.push(format!("  [{}]", regenerate_label(snapshot.regeneration)));
        }
        None => {
            lines.push(EMPTY_STATE_TITLE.to_string());
            lines.push(EMPTY_STATE_HINT.to_string());
        }
    }

    lines.push(format!("[{}]", analyze_label(snapshot.analysis)));
    lines.join("\n")
}

/// One line per event worth showing; metric updates are rendered from
/// snapshots instead.
pub fn render_event(event: &DashboardEvent) -> Option<String> {
    match event {
        DashboardEvent::Notification(notification) => {
            let icon = match notification.level {
                NotificationLevel::Success => "✅",
                NotificationLevel::Warning => "⚠️ ",
                NotificationLevel::Error => "❌",
            };
            Some(format!("{} {}", icon, notification.message))
        }
        DashboardEvent::StatusChanged { operation, status } if status.is_in_flight() => {
            let label = match operation {
                Operation::Analysis => analyze_label(*status),
                Operation::Regeneration => regenerate_label(*status),
            };
            Some(format!("⏳ {}", label))
        }
        DashboardEvent::StatusChanged { .. } | DashboardEvent::MetricsUpdated(_) => None,
        DashboardEvent::ResponseDiscarded { operation } => {
            Some(format!("↩️  Ignored an outdated {} response", operation))
        }
    }
}
