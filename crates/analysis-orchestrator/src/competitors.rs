use analysis_core::AnalysisError;
use std::collections::HashSet;

const MAX_TICKER_LEN: usize = 10;

/// Turns a completion service's competitor answer into a clean ticker list.
///
/// The answer is expected to be a JSON array of tickers, possibly wrapped in
/// markdown code fences. Tickers are uppercased, deduplicated, the target is
/// dropped, and at most `max_peers` are kept.
pub fn parse_competitor_list(response: &str, target: &str, max_peers: usize) -> Result<Vec<String>, AnalysisError> {
    let cleaned = strip_code_fences(response);

    let raw: Vec<String> = match serde_json::from_str(&cleaned) {
        Ok(list) => list,
        Err(_) => {
            // tolerate a sentence around the array
            let start = cleaned.find('[');
            let end = cleaned.rfind(']');
            match (start, end) {
                (Some(s), Some(e)) if s < e => serde_json::from_str(&cleaned[s..=e])?,
                _ => {
                    return Err(AnalysisError::Serialization(format!(
                        "competitor list is not a JSON array: {:?}",
                        truncate(&cleaned, 80)
                    )))
                }
            }
        }
    };

    let target = target.trim().to_uppercase();
    let mut seen = HashSet::new();
    let tickers = raw
        .into_iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| is_plausible_ticker(t) && *t != target)
        .filter(|t| seen.insert(t.clone()))
        .take(max_peers)
        .collect();

    Ok(tickers)
}

fn strip_code_fences(text: &str) -> String {
    text.trim().replace("```json", "").replace("```", "").trim().to_string()
}

fn is_plausible_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
