use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::models::{ChoiceResult, Poll, PollResults};

/// Tally the poll. Percentages are rounded per choice and are not
/// guaranteed to sum to exactly 100.
pub fn poll_results(poll: &Poll) -> PollResults {
    let total_votes = poll.total_votes();
    let results = poll
        .choices
        .iter()
        .map(|choice| ChoiceResult {
            choice: choice.text.clone(),
            votes: choice.votes,
            percentage: percentage(choice.votes, total_votes),
        })
        .collect();

    PollResults {
        question: poll.question.clone(),
        total_votes,
        results,
        exported_at: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
    }
}

fn percentage(votes: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        ((f64::from(votes) / f64::from(total)) * 100.0).round() as u32
    }
}

pub fn to_csv(poll: &Poll) -> String {
    let results = poll_results(poll);
    let mut lines = Vec::with_capacity(results.results.len() + 2);
    lines.push("Choice,Votes,Percentage".to_string());
    for result in &results.results {
        lines.push(format!("{},{},{}%", result.choice, result.votes, result.percentage));
    }
    lines.push(format!("Total,{},100%", results.total_votes));
    lines.join("\n")
}

pub fn to_json(poll: &Poll) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&poll_results(poll))
}
