mod formatter;

pub use formatter::{format_breakdown, format_outcomes, should_use_colors};
