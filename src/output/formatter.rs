use crate::scoring::{HonorBadge, HonorBreakdown, RecomputeOutcome};
use crate::store::types::Provider;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a provider's honor score breakdown as a multi-line report.
pub fn format_breakdown(provider: &Provider, breakdown: &HonorBreakdown, use_colors: bool) -> String {
    let badge = HonorBadge::for_score(breakdown.total);

    let header = if use_colors {
        let (r, g, b) = badge.color_rgb();
        format!(
            "{} ({}) | {} {}",
            provider.full_name.bold(),
            provider.service_name.cyan(),
            breakdown.total,
            badge.label().truecolor(r, g, b).bold()
        )
    } else {
        format!(
            "{} ({}) | {} {}",
            provider.full_name, provider.service_name, breakdown.total, badge.label()
        )
    };

    format!(
        "{}\n  Rating:     {:>5} / 40\n  Completion: {:>5} / 30\n  Response:   {:>5} / 15\n  Reviews:    {:>5} / 10\n  Experience: {:>5} / 5\n  Jobs done: {}  Reviews: {}  Avg rating: {}",
        header,
        breakdown.rating_score,
        breakdown.completion_score,
        breakdown.response_score,
        breakdown.review_bonus,
        breakdown.experience_bonus,
        provider.total_jobs,
        provider.total_reviews,
        provider.rating,
    )
}

/// Format batch recompute outcomes as one line per provider.
pub fn format_outcomes(outcomes: &[RecomputeOutcome], use_colors: bool) -> String {
    if outcomes.is_empty() {
        return "No verified providers to recompute.".to_string();
    }

    outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(breakdown) => {
                let badge = HonorBadge::for_score(breakdown.total);
                if use_colors {
                    let (r, g, b) = badge.color_rgb();
                    format!(
                        "provider {:>4}  {:>5}  {}",
                        outcome.provider_id,
                        breakdown.total,
                        badge.label().truecolor(r, g, b)
                    )
                } else {
                    format!(
                        "provider {:>4}  {:>5}  {}",
                        outcome.provider_id,
                        breakdown.total,
                        badge.label()
                    )
                }
            }
            Err(e) => {
                if use_colors {
                    format!("provider {:>4}  {}", outcome.provider_id, format!("failed: {}", e).red())
                } else {
                    format!("provider {:>4}  failed: {}", outcome.provider_id, e)
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
