//! Free-text search over record fields.
//!
//! The engine tokenizes a query, scores every candidate record field by
//! field, and keeps records with a positive total score, most relevant
//! first.
//!
//! # Scoring
//!
//! For each searchable field and each query token:
//!
//! - a case-insensitive substring match adds `1.0`;
//! - otherwise, with fuzzy matching on, the share of the token's characters
//!   that occur anywhere in the field text is computed and, above the
//!   configured threshold (default `0.6`), adds `ratio * fuzzy_factor`
//!   (default `0.5`).
//!
//! The field's sum is multiplied by its weight (default `1.0`) and the
//! weighted field scores are added up. Records scoring zero are dropped.
//! Ties keep input order.
//!
//! An empty query switches to pass-through mode: every record comes back
//! with score `1.0`, in input order, without highlights.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::record::{resolve, FieldKind, Record};

/// Characters trimmed from both ends of each query token.
const TOKEN_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Score given to every record when the query is empty.
pub const PASS_THROUGH_SCORE: f64 = 1.0;

const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "if", "in", "into", "is", "it", "its", "just", "may", "more", "most",
    "no", "not", "of", "on", "or", "other", "our", "out", "over", "she", "should", "so", "some",
    "such", "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "those", "to", "too", "under", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "why", "will", "with", "would", "you", "your",
];

const DEFAULT_FIELD_KEYWORDS: &[&str] =
    &["name", "title", "description", "content", "text", "email"];

/// Vocabulary and tuning for the search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Words left out of the extracted top terms.
    pub stop_words: Vec<String>,
    /// Field-name fragments that make a field searchable by default.
    pub default_field_keywords: Vec<String>,
    /// Marker inserted before a highlighted match.
    pub highlight_pre: String,
    /// Marker inserted after a highlighted match.
    pub highlight_post: String,
    /// Characters of context kept on each side of a highlighted match.
    pub highlight_context: usize,
    /// Character-overlap ratio a fuzzy match must exceed.
    pub fuzzy_threshold: f64,
    /// Multiplier applied to the ratio of a fuzzy match.
    pub fuzzy_factor: f64,
    /// Tokens must be longer than this to count as top terms.
    pub min_term_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            default_field_keywords: DEFAULT_FIELD_KEYWORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
            highlight_pre: "<mark>".to_string(),
            highlight_post: "</mark>".to_string(),
            highlight_context: 50,
            fuzzy_threshold: 0.6,
            fuzzy_factor: 0.5,
            min_term_length: 2,
        }
    }
}

/// Per-request search options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Field paths to search. Empty means the record's default fields.
    pub fields: Vec<String>,
    /// Weight per field path; unlisted fields weigh `1.0`.
    pub field_weights: HashMap<String, f64>,
    /// Enables approximate matching for tokens without an exact match.
    pub fuzzy: bool,
    /// Enables highlighted snippets.
    pub highlight: bool,
    /// Caps the number of results when set and positive.
    pub max_results: Option<usize>,
}

/// A free-text query and its options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        SearchRequest {
            query: query.into(),
            options: SearchOptions::default(),
        }
    }

    /// Restricts the search to the given field paths.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the weight of one field.
    pub fn weight(mut self, field: impl Into<String>, weight: f64) -> Self {
        self.options.field_weights.insert(field.into(), weight);
        self
    }

    pub fn fuzzy(mut self, enabled: bool) -> Self {
        self.options.fuzzy = enabled;
        self
    }

    pub fn highlight(mut self, enabled: bool) -> Self {
        self.options.highlight = enabled;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.options.max_results = Some(max);
        self
    }
}

/// A record that survived the search stage.
pub struct SearchHit<'a, T> {
    /// The matching record.
    pub record: &'a T,
    /// Position of the record in the searched sequence.
    pub position: usize,
    /// Sum of weighted field scores.
    pub score: f64,
    /// Highlighted snippet per field path.
    pub highlights: BTreeMap<String, String>,
}

impl<T> Clone for SearchHit<'_, T> {
    fn clone(&self) -> Self {
        SearchHit {
            record: self.record,
            position: self.position,
            score: self.score,
            highlights: self.highlights.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SearchHit<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchHit")
            .field("record", self.record)
            .field("position", &self.position)
            .field("score", &self.score)
            .field("highlights", &self.highlights)
            .finish()
    }
}

/// Aggregate statistics for one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchMetrics {
    /// Number of results returned.
    pub total_results: usize,
    /// Wall time spent scoring.
    pub query_time: Duration,
    /// Significant query terms: lowercase, de-duplicated, stop words removed.
    pub top_terms: Vec<String>,
    /// Number of records that matched in each field.
    pub field_matches: BTreeMap<String, usize>,
}

/// Splits a query into tokens.
///
/// Tokens are whitespace separated, trimmed of surrounding `.,!?;:`, and
/// empty tokens are dropped. Order is preserved.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|token| token.trim_matches(TOKEN_PUNCTUATION))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Share of `token`'s characters that occur anywhere in `text`.
///
/// Both arguments are expected to be lowercase already.
pub fn char_overlap_ratio(token: &str, text: &str) -> f64 {
    let total = token.chars().count();
    if total == 0 {
        return 0.0;
    }
    let present = token.chars().filter(|c| text.contains(*c)).count();
    present as f64 / total as f64
}

/// Lowercases `text` one character at a time, the same way
/// [`find_ignore_case`] folds the text it scans.
///
/// Word context is ignored and the final sigma `ς` folds to `σ`.
fn lowercase_chars(text: &str) -> String {
    text.chars().flat_map(fold_char).collect()
}

fn fold_char(c: char) -> impl Iterator<Item = char> {
    c.to_lowercase().map(|l| if l == 'ς' { 'σ' } else { l })
}

/// Finds `needle` in `text` ignoring case.
///
/// `needle` must already be lowercase (with `ς` written as `σ`). Returns the
/// byte range of the match in `text`.
pub fn find_ignore_case(text: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }

    for (start, _) in text.char_indices() {
        let mut expected = needle.chars().peekable();
        let mut end = start;
        let mut matched = false;

        'walk: for (offset, c) in text[start..].char_indices() {
            for lowered in fold_char(c) {
                match expected.next() {
                    Some(e) if e == lowered => {}
                    _ => break 'walk,
                }
            }
            end = start + offset + c.len_utf8();
            if expected.peek().is_none() {
                matched = true;
                break;
            }
        }

        if matched {
            return Some((start, end));
        }
    }
    None
}

/// Stateless search engine configured with a vocabulary.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    config: SearchConfig,
    stop_words: HashSet<String>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new(SearchConfig::default())
    }
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        let stop_words = config
            .stop_words
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        SearchEngine { config, stop_words }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Extracts significant terms from query tokens.
    pub fn top_terms(&self, tokens: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        tokens
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| t.chars().count() > self.config.min_term_length)
            .filter(|t| !self.stop_words.contains(t))
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Field paths searched when a request names none.
    ///
    /// String fields, plus scalar fields whose name contains one of the
    /// configured keywords.
    pub fn default_fields<T: Record>(&self) -> Vec<String> {
        T::fields()
            .iter()
            .filter(|def| match def.kind {
                FieldKind::String => true,
                FieldKind::Nested => false,
                _ => {
                    let name = def.name.to_lowercase();
                    self.config
                        .default_field_keywords
                        .iter()
                        .any(|k| name.contains(&k.to_lowercase()))
                }
            })
            .map(|def| def.name.to_string())
            .collect()
    }

    /// Wraps every record as a hit with the pass-through score.
    pub fn pass_through<'a, T>(&self, records: &[&'a T]) -> (Vec<SearchHit<'a, T>>, SearchMetrics) {
        let hits: Vec<_> = records
            .iter()
            .enumerate()
            .map(|(position, record)| SearchHit {
                record: *record,
                position,
                score: PASS_THROUGH_SCORE,
                highlights: BTreeMap::new(),
            })
            .collect();
        let metrics = SearchMetrics {
            total_results: hits.len(),
            ..SearchMetrics::default()
        };
        (hits, metrics)
    }

    /// Scores and ranks records against a request.
    ///
    /// `None` or an empty query runs in pass-through mode.
    pub fn search<'a, T: Record>(
        &self,
        records: &[&'a T],
        request: Option<&SearchRequest>,
    ) -> (Vec<SearchHit<'a, T>>, SearchMetrics) {
        let started = Instant::now();

        let Some(request) = request else {
            return self.pass_through(records);
        };
        let tokens = tokenize(&request.query);
        if tokens.is_empty() {
            return self.pass_through(records);
        }
        let lowered: Vec<String> = tokens.iter().map(|t| lowercase_chars(t)).collect();

        let options = &request.options;
        let fields: Vec<String> = if options.fields.is_empty() {
            self.default_fields::<T>()
        } else {
            options
                .fields
                .iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect()
        };
        debug!(
            query = %request.query,
            tokens = lowered.len(),
            fields = ?fields,
            candidates = records.len(),
            "running search"
        );

        let mut field_matches: BTreeMap<String, usize> = BTreeMap::new();
        let mut hits = Vec::new();

        for (position, record) in records.iter().enumerate() {
            let mut score = 0.0;
            let mut highlights = BTreeMap::new();

            for field in &fields {
                let value = resolve(*record, field);
                let Some(text) = value.to_text() else {
                    continue;
                };
                let weight = options
                    .field_weights
                    .get(field)
                    .copied()
                    .unwrap_or(1.0)
                    .max(0.0);
                let (field_score, highlight) = self.score_field(&text, &lowered, options);
                let weighted = field_score * weight;
                if weighted <= 0.0 {
                    continue;
                }

                score += weighted;
                *field_matches.entry(field.clone()).or_insert(0) += 1;
                if let Some(snippet) = highlight {
                    highlights.insert(field.clone(), snippet);
                }
            }

            if score > 0.0 {
                trace!(position, score, "search match");
                hits.push(SearchHit {
                    record: *record,
                    position,
                    score,
                    highlights,
                });
            }
        }

        // Stable: equal scores keep input order.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(max) = options.max_results.filter(|max| *max > 0) {
            hits.truncate(max);
        }

        let metrics = SearchMetrics {
            total_results: hits.len(),
            query_time: started.elapsed(),
            top_terms: self.top_terms(&tokens),
            field_matches,
        };
        debug!(
            results = metrics.total_results,
            elapsed = ?metrics.query_time,
            "search finished"
        );
        (hits, metrics)
    }

    /// Scores one field's text against lowercase tokens.
    ///
    /// Returns the unweighted score and, when highlighting is enabled, a
    /// snippet for the first token with an exact match.
    fn score_field(
        &self,
        text: &str,
        tokens: &[String],
        options: &SearchOptions,
    ) -> (f64, Option<String>) {
        let mut lower: Option<String> = None;
        let mut score = 0.0;
        let mut highlight = None;

        for token in tokens {
            if let Some((start, end)) = find_ignore_case(text, token) {
                score += 1.0;
                if options.highlight && highlight.is_none() {
                    highlight = Some(self.snippet(text, start, end));
                }
            } else if options.fuzzy {
                let lower = lower.get_or_insert_with(|| lowercase_chars(text));
                let ratio = char_overlap_ratio(token, lower);
                if ratio > self.config.fuzzy_threshold {
                    score += ratio * self.config.fuzzy_factor;
                }
            }
        }

        (score, highlight)
    }

    /// Builds a snippet around the first case-insensitive match of `token`.
    pub fn highlight(&self, text: &str, token: &str) -> Option<String> {
        let (start, end) = find_ignore_case(text, &lowercase_chars(token))?;
        Some(self.snippet(text, start, end))
    }

    /// Wraps `text[start..end]` in markers with surrounding context.
    fn snippet(&self, text: &str, start: usize, end: usize) -> String {
        let context = self.config.highlight_context;

        let snippet_start = text[..start]
            .char_indices()
            .rev()
            .take(context)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(start);
        let snippet_end = text[end..]
            .char_indices()
            .nth(context)
            .map(|(i, _)| end + i)
            .unwrap_or(text.len());

        format!(
            "{}{}{}{}{}",
            &text[snippet_start..start],
            self.config.highlight_pre,
            &text[start..end],
            self.config.highlight_post,
            &text[end..snippet_end],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldDef;
    use crate::value::{Number, Value};

    struct Venue {
        name: String,
        description: Option<String>,
        capacity: u32,
    }

    impl Record for Venue {
        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "name" => Value::String(&self.name),
                "description" => match &self.description {
                    Some(d) => Value::String(d),
                    None => Value::Absent,
                },
                "capacity" => Value::Number(Number::from(self.capacity)),
                _ => Value::Absent,
            }
        }

        fn fields() -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[
                FieldDef::new("name", FieldKind::String, false),
                FieldDef::new("description", FieldKind::String, true),
                FieldDef::new("capacity", FieldKind::Number, false),
            ];
            FIELDS
        }
    }

    fn venue(name: &str, description: Option<&str>) -> Venue {
        Venue {
            name: name.to_string(),
            description: description.map(str::to_string),
            capacity: 10,
        }
    }

    #[test]
    fn tokenize_trims_punctuation() {
        assert_eq!(
            tokenize("  Hello, world!  fitness? ;: "),
            vec!["Hello", "world", "fitness"]
        );
        assert!(tokenize("... ,,, !").is_empty());
    }

    #[test]
    fn overlap_ratio() {
        assert_eq!(char_overlap_ratio("recieve", "receive this message"), 1.0);
        assert_eq!(char_overlap_ratio("xyz", "abc"), 0.0);
        assert_eq!(char_overlap_ratio("", "abc"), 0.0);
    }

    #[test]
    fn find_ignores_case() {
        assert_eq!(find_ignore_case("Downtown Fitness", "fitness"), Some((9, 16)));
        assert_eq!(find_ignore_case("abc", "d"), None);
        assert_eq!(find_ignore_case("ÉCOLE", "école"), Some((0, 6)));
    }

    #[test]
    fn default_fields_use_kinds_and_keywords() {
        let engine = SearchEngine::default();
        assert_eq!(engine.default_fields::<Venue>(), vec!["name", "description"]);
    }

    #[test]
    fn keyword_named_numeric_fields_are_searchable_by_default() {
        let config = SearchConfig {
            default_field_keywords: vec!["capacity".into()],
            ..SearchConfig::default()
        };
        let engine = SearchEngine::new(config);
        assert_eq!(
            engine.default_fields::<Venue>(),
            vec!["name", "description", "capacity"]
        );
    }

    #[test]
    fn empty_query_passes_through() {
        let venues = [venue("A", None), venue("B", None)];
        let refs: Vec<&Venue> = venues.iter().collect();
        let engine = SearchEngine::default();

        let (hits, metrics) = engine.search(&refs, Some(&SearchRequest::new("  ")));
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.score == PASS_THROUGH_SCORE));
        assert!(hits.iter().all(|h| h.highlights.is_empty()));
        assert_eq!(hits[1].position, 1);
        assert_eq!(metrics.total_results, 2);
        assert!(metrics.top_terms.is_empty());
    }

    #[test]
    fn exact_tokens_score_one_each() {
        let venues = [
            venue("Hub", Some("Downtown Fitness Center")),
            venue("Other", Some("Quiet library")),
        ];
        let refs: Vec<&Venue> = venues.iter().collect();
        let engine = SearchEngine::default();

        let request = SearchRequest::new("fitness center").fields(["description"]);
        let (hits, metrics) = engine.search(&refs, Some(&request));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 2.0);
        assert_eq!(metrics.field_matches.get("description"), Some(&1));
        assert_eq!(metrics.top_terms, vec!["fitness", "center"]);
    }

    #[test]
    fn weights_multiply_field_scores() {
        let venues = [venue("Yoga Loft", Some("Yoga and pilates"))];
        let refs: Vec<&Venue> = venues.iter().collect();
        let engine = SearchEngine::default();

        let request = SearchRequest::new("yoga").weight("name", 3.0);
        let (hits, _) = engine.search(&refs, Some(&request));
        assert_eq!(hits[0].score, 4.0);
    }

    #[test]
    fn fuzzy_matching_scores_below_exact() {
        let venues = [venue("Inbox", Some("receive this message"))];
        let refs: Vec<&Venue> = venues.iter().collect();
        let engine = SearchEngine::default();

        let strict = SearchRequest::new("recieve").fields(["description"]);
        assert!(engine.search(&refs, Some(&strict)).0.is_empty());

        let fuzzy = strict.fuzzy(true);
        let (hits, _) = engine.search(&refs, Some(&fuzzy));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 0.5);
    }

    #[test]
    fn results_rank_by_score_with_stable_ties() {
        let venues = [
            venue("gym", None),
            venue("gym gym studio", Some("studio")),
            venue("gym", None),
        ];
        let refs: Vec<&Venue> = venues.iter().collect();
        let engine = SearchEngine::default();

        let (hits, _) = engine.search(&refs, Some(&SearchRequest::new("gym studio")));
        let positions: Vec<_> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 0, 2]);

        let (hits, metrics) = engine.search(
            &refs,
            Some(&SearchRequest::new("gym studio").max_results(2)),
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(metrics.total_results, 2);
    }

    #[test]
    fn highlight_wraps_first_match_with_context() {
        let engine = SearchEngine::default();
        assert_eq!(
            engine.highlight("Downtown Fitness Center", "fitness").as_deref(),
            Some("Downtown <mark>Fitness</mark> Center")
        );

        let long = format!("{}needle{}", "a".repeat(80), "b".repeat(80));
        let snippet = engine.highlight(&long, "needle").unwrap();
        assert_eq!(
            snippet,
            format!("{}<mark>needle</mark>{}", "a".repeat(50), "b".repeat(50))
        );
    }

    #[test]
    fn highlights_are_attached_per_field() {
        let venues = [venue("Fitness Hub", Some("Best fitness in town"))];
        let refs: Vec<&Venue> = venues.iter().collect();
        let engine = SearchEngine::default();

        let request = SearchRequest::new("fitness").highlight(true);
        let (hits, _) = engine.search(&refs, Some(&request));
        assert_eq!(
            hits[0].highlights.get("name").map(String::as_str),
            Some("<mark>Fitness</mark> Hub")
        );
        assert_eq!(
            hits[0].highlights.get("description").map(String::as_str),
            Some("Best <mark>fitness</mark> in town")
        );
    }

    #[test]
    fn final_sigma_matches_and_highlights() {
        let venues = [venue("ΟΔΟΣ", None), venue("Agora", None)];
        let refs: Vec<&Venue> = venues.iter().collect();
        let engine = SearchEngine::default();

        let request = SearchRequest::new("ΟΔΟΣ").fields(["name"]).highlight(true);
        let (hits, _) = engine.search(&refs, Some(&request));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 1.0);
        assert_eq!(
            hits[0].highlights.get("name").map(String::as_str),
            Some("<mark>ΟΔΟΣ</mark>")
        );

        // Lowercase query with a final sigma finds the capitalised text too
        let request = SearchRequest::new("οδος").fields(["name"]).highlight(true);
        let (hits, _) = engine.search(&refs, Some(&request));
        assert_eq!(hits.len(), 1);
        assert!(hits[0].highlights.contains_key("name"));
    }

    #[test]
    fn top_terms_drop_stop_words_and_duplicates() {
        let engine = SearchEngine::default();
        let tokens = tokenize("The gym and THE Gym in town");
        assert_eq!(engine.top_terms(&tokens), vec!["gym", "town"]);
    }
}
