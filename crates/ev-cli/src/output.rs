//! Shared output helpers for human and JSON modes.
//!
//! Human mode prints primary data to stdout and notices to stderr. JSON mode
//! wraps responses in `{ data, warnings? }` and respects `--pretty` and
//! `--quiet`.

use std::io::Write;

use anyhow::Result;
use ev_session::{RatingHistogram, VotableItem, Vote, VoteState};
use serde_json::{Value, json};

use crate::opts::SiteOpts;

const BAR_WIDTH: i64 = 20;

pub fn print_success(
    opts: &SiteOpts,
    data: Value,
    human: impl FnOnce() -> String,
    mut warnings: Vec<String>,
) -> Result<()> {
    if opts.quiet {
        warnings.clear();
    }
    if opts.pretty || opts.json {
        print_json(opts, data, warnings)
    } else {
        let mut stderr = std::io::stderr();
        for w in warnings {
            writeln!(stderr, "notice: {w}")?;
        }
        print!("{}", human());
        Ok(())
    }
}

fn print_json(opts: &SiteOpts, data: Value, warnings: Vec<String>) -> Result<()> {
    let mut root = json!({ "data": data });
    if !warnings.is_empty() {
        if let Some(object) = root.as_object_mut() {
            object.insert(
                "warnings".into(),
                warnings.into_iter().map(Value::String).collect(),
            );
        }
    }
    if opts.pretty {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("{}", serde_json::to_string(&root)?);
    }
    Ok(())
}

pub fn item_json(index: usize, item: &VotableItem, state: &VoteState) -> Value {
    json!({
        "index": index,
        "editorial": item.editorial(),
        "link": item.raw(),
        "score": state.score,
        "current_vote": state.current_vote,
        "histogram": state
            .histogram
            .buckets()
            .iter()
            .enumerate()
            .map(|(bucket, score)| json!({
                "range": RatingHistogram::bucket_label(bucket),
                "score": score,
            }))
            .collect::<Vec<_>>(),
    })
}

/// One item as text: a header line and, when anyone voted, a histogram.
pub fn item_text(index: usize, item: &VotableItem, state: &VoteState) -> String {
    let mut out = format!("[{index}] {}  score {:+}", item.editorial(), state.score);
    if state.current_vote != Vote::None {
        out.push_str(&format!("  (you: {})", state.current_vote));
    }
    out.push('\n');
    out.push_str(&histogram_text(&state.histogram));
    out
}

/// Horizontal bars per rating bucket; empty when every bucket is zero.
pub fn histogram_text(histogram: &RatingHistogram) -> String {
    let buckets = histogram.buckets();
    let peak = buckets.iter().map(|v| v.abs()).max().unwrap_or(0);
    if peak == 0 {
        return String::new();
    }
    let mut out = String::new();
    for (bucket, value) in buckets.iter().enumerate() {
        let len = (value.abs() * BAR_WIDTH + peak - 1) / peak;
        let glyph = if *value < 0 { "-" } else { "#" };
        out.push_str(&format!(
            "    {:>9} | {:<width$} {value:+}\n",
            RatingHistogram::bucket_label(bucket),
            glyph.repeat(len as usize),
            width = BAR_WIDTH as usize,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_scales_bars_to_peak() {
        let text = histogram_text(&RatingHistogram::new([2, 0, 0, 0, 0, 0, -1, 4]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].contains("0-399 | ##########"));
        assert!(lines[6].contains("-----"));
        assert!(lines[7].contains(&"#".repeat(20)));
        assert!(lines[7].trim_end().ends_with("+4"));
    }

    #[test]
    fn empty_histogram_prints_nothing() {
        assert!(histogram_text(&RatingHistogram::default()).is_empty());
    }

    #[test]
    fn item_text_shows_own_vote() {
        let item = VotableItem::from_link("https://blog.example/e");
        let state = VoteState {
            score: 3,
            current_vote: Vote::Up,
            histogram: RatingHistogram::default(),
        };
        assert_eq!(
            item_text(2, &item, &state),
            "[2] https://blog.example/e  score +3  (you: up)\n"
        );
    }
}
