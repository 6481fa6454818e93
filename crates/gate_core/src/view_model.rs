use crate::{ActivationState, JobState, LicenseId, ProgressSnapshot, ResultItem, ScrapeParameters};

/// Characters of the title shown on a compact card.
const CARD_TITLE_CHARS: usize = 10;
const UNKNOWN_TITLE: &str = "Unknown item";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub identity: Option<String>,
    pub activation: ActivationState,
    pub license_id: Option<LicenseId>,
    pub remaining_days: Option<i64>,
    pub job: JobState,
    pub start_pending: bool,
    pub parameters: Option<ScrapeParameters>,
    pub metrics: MetricsView,
    pub collected_badge: u64,
    /// Newest first.
    pub compact: Vec<CompactCard>,
    /// Newest first.
    pub detailed: Vec<DetailRow>,
    /// Oldest first; the viewport follows `activity_scroll_to`.
    pub activity: Vec<String>,
    pub activity_scroll_to: Option<usize>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsView {
    pub visited: u64,
    pub collected: u64,
    pub filtered: u64,
    pub avg_price: String,
    pub avg_pinned: String,
    pub output_file: Option<String>,
}

impl MetricsView {
    pub(crate) fn from_snapshot(snapshot: &ProgressSnapshot) -> Self {
        Self {
            visited: snapshot.visited,
            collected: snapshot.collected,
            filtered: snapshot.filtered,
            avg_price: format_average(snapshot.avg_price, |v| format!("¥{v:.2}")),
            avg_pinned: format_average(snapshot.avg_pinned, |v| format!("{v:.0}")),
            output_file: snapshot.output_file.clone(),
        }
    }
}

/// Absent or zero averages render as `--`.
fn format_average(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => render(v),
        _ => "--".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompactCard {
    pub index: usize,
    pub title: String,
    pub price: f64,
    pub pinned_count: u64,
    pub review_count: u64,
}

impl CompactCard {
    pub(crate) fn from_item(index: usize, item: &ResultItem) -> Self {
        Self {
            index,
            title: short_title(&item.title),
            price: item.price,
            pinned_count: item.pinned_count,
            review_count: item.review_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub title: String,
    pub url: Option<String>,
    pub price: f64,
    pub pinned_count: u64,
    pub review_count: u64,
}

impl DetailRow {
    pub(crate) fn from_item(item: ResultItem) -> Self {
        let title = if item.title.is_empty() {
            UNKNOWN_TITLE.to_string()
        } else {
            item.title
        };
        Self {
            title,
            url: item.url.filter(|url| !url.is_empty()),
            price: item.price,
            pinned_count: item.pinned_count,
            review_count: item.review_count,
        }
    }
}

pub(crate) fn short_title(title: &str) -> String {
    title.chars().take(CARD_TITLE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_average_renders_placeholder() {
        let view = MetricsView::from_snapshot(&ProgressSnapshot {
            avg_price: Some(0.0),
            avg_pinned: Some(12.6),
            ..ProgressSnapshot::default()
        });
        assert_eq!(view.avg_price, "--");
        assert_eq!(view.avg_pinned, "13");
    }

    #[test]
    fn short_title_counts_characters_not_bytes() {
        assert_eq!(short_title("拼多多拼多多拼多多拼多多"), "拼多多拼多多拼多多拼");
    }
}
