use gate_core::{ActivationState, AppViewModel, CompactCard, JobState, Notice, NoticeLevel};

const STATUS_CARD_LIMIT: usize = 10;
const STATUS_ACTIVITY_LIMIT: usize = 10;

pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level() {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => " ok ",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "fail",
    };
    format!("[{tag}] {notice}")
}

/// One-line license and job summary; printed whenever it changes.
pub fn summary_line(view: &AppViewModel) -> String {
    let license = match view.activation {
        ActivationState::Unactivated => "License: not activated".to_string(),
        ActivationState::Expired => "License: expired (0 days left)".to_string(),
        ActivationState::Activated => match view.remaining_days {
            Some(days) => format!("License: active, {days} days left"),
            None => "License: active".to_string(),
        },
    };
    let job = match (view.job, view.start_pending) {
        (JobState::Running, _) => "running",
        (JobState::Idle, true) => "starting",
        (JobState::Idle, false) => "idle",
    };
    format!("{license} | Job: {job} | Collected: {}", view.collected_badge)
}

/// Full snapshot for the `status` command.
pub fn render_status(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![summary_line(view)];

    lines.push(format!(
        "Device: {}{}",
        view.identity.as_deref().unwrap_or("(resolving)"),
        view.license_id
            .as_ref()
            .map(|id| format!(" | License #{id}"))
            .unwrap_or_default()
    ));

    let metrics = &view.metrics;
    lines.push(format!(
        "Visited {} | Collected {} | Filtered {} | Avg price {} | Avg pinned {}",
        metrics.visited, metrics.collected, metrics.filtered, metrics.avg_price, metrics.avg_pinned
    ));
    if let Some(output) = &metrics.output_file {
        lines.push(format!("Output: {output}"));
    }

    if let Some(parameters) = &view.parameters {
        lines.push(format!(
            "Form: keyword={:?} price>={} pinned>={} reviews>={} dir={:?}",
            parameters.keyword,
            parameters.price_floor,
            parameters.min_pinned,
            parameters.min_reviews,
            parameters.export_dir
        ));
    }

    if !view.compact.is_empty() {
        lines.push(format!(
            "Latest items ({} shown, {} kept):",
            view.compact.len().min(STATUS_CARD_LIMIT),
            view.detailed.len()
        ));
        lines.extend(view.compact.iter().take(STATUS_CARD_LIMIT).map(format_card));
    }

    let skip = view.activity.len().saturating_sub(STATUS_ACTIVITY_LIMIT);
    lines.extend(view.activity.iter().skip(skip).map(|line| format!("  > {line}")));
    lines
}

fn format_card(card: &CompactCard) -> String {
    format!(
        "  #{:<3} {:<10} ¥{:.2}  pinned {}  reviews {}",
        card.index, card.title, card.price, card.pinned_count, card.review_count
    )
}

/// Lines of `next` not yet shown, given the previously shown `prev`.
///
/// The log is bounded and evicts from the front, so the overlap is the
/// longest suffix of `prev` that starts `next`.
pub fn new_activity<'a>(prev: &[String], next: &'a [String]) -> &'a [String] {
    for shift in 0..=prev.len() {
        let tail = &prev[shift..];
        if next.len() >= tail.len() && next[..tail.len()] == *tail {
            return &next[tail.len()..];
        }
    }
    next
}
