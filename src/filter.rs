/// Incremental fuzzy filter over a fixed candidate list.
///
/// The user builds a query key by key while the top matches are redrawn
/// live; Enter confirms the current top matches, Escape abandons the whole
/// session. `FuzzyFilter` holds the pure state machine so the key handling
/// and ranking can be exercised without a terminal; `run_filter` wraps it
/// in the raw-mode read/redraw loop.
use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::error::Cancelled;
use crate::term;

/// The ranked match list is capped at this many entries regardless of how
/// many candidates are supplied.
pub const MAX_MATCHES: usize = 10;

/// What a single key event did to the filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The query changed; the match list must be recomputed and redrawn.
    Edited,
    /// Nothing changed; keep waiting for the next key.
    Ignored,
    /// Enter: the current match list is the result.
    Confirmed,
    /// Escape or Ctrl-C: abandon all buffered input.
    Cancelled,
}

pub struct FuzzyFilter {
    candidates: Vec<String>,
    matcher: SkimMatcherV2,
    query: String,
}

impl FuzzyFilter {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            matcher: SkimMatcherV2::default(),
            query: String::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Feeds one key event into the filter state.
    pub fn apply_key(&mut self, key: &KeyEvent) -> KeyOutcome {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return KeyOutcome::Cancelled;
        }

        match key.code {
            KeyCode::Enter => KeyOutcome::Confirmed,
            KeyCode::Esc => KeyOutcome::Cancelled,
            KeyCode::Backspace => {
                // Backspace on an empty buffer is a no-op, not an error.
                match self.query.pop() {
                    Some(_) => KeyOutcome::Edited,
                    None => KeyOutcome::Ignored,
                }
            }
            KeyCode::Char(c)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                self.query.push(c);
                KeyOutcome::Edited
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Scores every candidate against the current query and returns the top
    /// matches, best first. Ties keep the candidates' original order.
    ///
    /// Scoring is total: candidates the matcher rejects score 0, and an
    /// empty query scores everything 0, so an immediate confirm returns the
    /// first `MAX_MATCHES` candidates as supplied.
    pub fn top_matches(&self) -> Vec<String> {
        let mut scored: Vec<(i64, &str)> = self
            .candidates
            .iter()
            .map(|c| (self.score(c), c.as_str()))
            .collect();
        // sort_by is stable, so equal scores preserve candidate order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(MAX_MATCHES)
            .map(|(_, c)| c.to_string())
            .collect()
    }

    fn score(&self, candidate: &str) -> i64 {
        if self.query.is_empty() {
            return 0;
        }
        self.matcher
            .fuzzy_match(candidate, &self.query)
            .unwrap_or(0)
    }
}

/// Runs the interactive filter loop and returns the ranked matches for the
/// final query. Fails with [`Cancelled`] if the user presses Escape.
pub fn run_filter(candidates: Vec<String>, subject: &str) -> Result<Vec<String>> {
    let mut filter = FuzzyFilter::new(candidates);
    let _raw = term::RawModeGuard::enable().context("failed to enable raw terminal mode")?;
    let mut stdout = io::stdout();

    redraw(&mut stdout, &filter, subject)?;

    loop {
        let event = event::read().context("failed to read terminal event")?;
        let Event::Key(key) = event else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match filter.apply_key(&key) {
            KeyOutcome::Edited => redraw(&mut stdout, &filter, subject)?,
            KeyOutcome::Ignored => {}
            KeyOutcome::Confirmed => {
                // The list on screen was computed from this exact query, so
                // the returned result is never stale.
                return Ok(filter.top_matches());
            }
            KeyOutcome::Cancelled => return Err(Cancelled.into()),
        }
    }
}

fn redraw(out: &mut impl Write, filter: &FuzzyFilter, subject: &str) -> Result<()> {
    term::clear_screen(out)?;
    for name in filter.top_matches() {
        term::write_line(out, &format!("  {}", name))?;
    }
    term::write_line(out, &"-".repeat(60))?;
    write!(
        out,
        "Please type in the name of the {} to filter the results: {}",
        subject,
        filter.query()
    )?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(filter: &mut FuzzyFilter, s: &str) {
        for c in s.chars() {
            assert_eq!(filter.apply_key(&key(KeyCode::Char(c))), KeyOutcome::Edited);
        }
    }

    fn sample() -> Vec<String> {
        vec![
            "Billing API".to_string(),
            "Billing Portal".to_string(),
            "Inventory Service".to_string(),
        ]
    }

    #[test]
    fn test_empty_query_returns_original_order() {
        let filter = FuzzyFilter::new(sample());
        assert_eq!(filter.top_matches(), sample());
    }

    #[test]
    fn test_result_capped_at_ten() {
        let candidates: Vec<String> = (0..25).map(|i| format!("app-{:02}", i)).collect();
        let filter = FuzzyFilter::new(candidates.clone());
        assert_eq!(filter.top_matches(), candidates[..MAX_MATCHES].to_vec());
    }

    #[test]
    fn test_result_never_exceeds_candidate_count() {
        let filter = FuzzyFilter::new(vec!["only one".to_string()]);
        assert_eq!(filter.top_matches().len(), 1);
    }

    #[test]
    fn test_empty_candidate_set_yields_empty_matches() {
        let mut filter = FuzzyFilter::new(Vec::new());
        assert!(filter.top_matches().is_empty());
        type_str(&mut filter, "anything");
        assert!(filter.top_matches().is_empty());
    }

    #[test]
    fn test_bil_ranks_billing_entries_first() {
        let mut filter = FuzzyFilter::new(sample());
        type_str(&mut filter, "bil");
        let matches = filter.top_matches();
        assert_eq!(matches.len(), 3);
        assert!(matches[0].starts_with("Billing"));
        assert!(matches[1].starts_with("Billing"));
        assert_eq!(matches[2], "Inventory Service");
    }

    #[test]
    fn test_scores_sorted_descending_with_stable_ties() {
        let mut filter = FuzzyFilter::new(sample());
        type_str(&mut filter, "bil");
        let scores: Vec<i64> = filter
            .top_matches()
            .iter()
            .map(|m| filter.score(m))
            .collect();
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        // All-equal scores must not reorder anything.
        let untouched = FuzzyFilter::new(sample());
        assert_eq!(untouched.top_matches(), sample());
    }

    #[test]
    fn test_backspace_edits_query() {
        let mut filter = FuzzyFilter::new(sample());
        type_str(&mut filter, "bix");
        assert_eq!(
            filter.apply_key(&key(KeyCode::Backspace)),
            KeyOutcome::Edited
        );
        assert_eq!(filter.query(), "bi");
    }

    #[test]
    fn test_backspace_on_empty_query_is_noop() {
        let mut filter = FuzzyFilter::new(sample());
        assert_eq!(
            filter.apply_key(&key(KeyCode::Backspace)),
            KeyOutcome::Ignored
        );
        assert_eq!(filter.query(), "");
    }

    #[test]
    fn test_space_appends_to_query() {
        let mut filter = FuzzyFilter::new(sample());
        type_str(&mut filter, "billing p");
        assert_eq!(filter.query(), "billing p");
    }

    #[test]
    fn test_escape_cancels_regardless_of_buffer() {
        let mut filter = FuzzyFilter::new(sample());
        assert_eq!(filter.apply_key(&key(KeyCode::Esc)), KeyOutcome::Cancelled);
        type_str(&mut filter, "bil");
        assert_eq!(filter.apply_key(&key(KeyCode::Esc)), KeyOutcome::Cancelled);
    }

    #[test]
    fn test_ctrl_c_cancels() {
        let mut filter = FuzzyFilter::new(sample());
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(filter.apply_key(&ctrl_c), KeyOutcome::Cancelled);
    }

    #[test]
    fn test_unhandled_keys_are_ignored() {
        let mut filter = FuzzyFilter::new(sample());
        type_str(&mut filter, "bil");
        for code in [KeyCode::Up, KeyCode::Tab, KeyCode::F(5), KeyCode::Home] {
            assert_eq!(filter.apply_key(&key(code)), KeyOutcome::Ignored);
        }
        assert_eq!(filter.query(), "bil");
    }

    #[test]
    fn test_enter_confirms_without_changing_query() {
        let mut filter = FuzzyFilter::new(sample());
        type_str(&mut filter, "bil");
        assert_eq!(filter.apply_key(&key(KeyCode::Enter)), KeyOutcome::Confirmed);
        assert_eq!(filter.query(), "bil");
    }
}
