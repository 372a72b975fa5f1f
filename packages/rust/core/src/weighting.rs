//! Weighting-driven response depth.
//!
//! Question identifiers and their weightings are read from the decomposition
//! text, and each question is assigned a [`DepthTier`]:
//!
//! | weighting      | tier       |
//! |----------------|------------|
//! | above 15 %     | `Deep`     |
//! | 10 % to 15 %   | `Standard` |
//! | below 10 %     | `Surgical` |

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(question|q|section|criterion|clause|lot)\s*[-#:.]?\s*(\d+(?:\.\d+)*[a-z]?)\b")
        .expect("valid regex")
});

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*%").expect("valid regex"));

static LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d[\d,]*)\s*(words?|characters?|chars|pages?)\b").expect("valid regex")
});

static WEIGHT_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bweight(?:ing|ed)?s?\b").expect("valid regex"));

/// "20% weighting", "20 % weighted".
static PERCENT_BEFORE_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*%\s*weight(?:ing|ed)?\b").expect("valid regex")
});

/// A table cell holding nothing but a percentage.
static PERCENT_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}(?:\.\d+)?)\s*%$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Depth tiers
// ---------------------------------------------------------------------------

/// How much depth a response gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthTier {
    /// Weighting above 15 %.
    Deep,
    /// Weighting from 10 % to 15 % inclusive.
    Standard,
    /// Weighting below 10 %.
    Surgical,
}

impl DepthTier {
    pub fn for_weight(percent: f64) -> Self {
        if percent > 15.0 {
            Self::Deep
        } else if percent < 10.0 {
            Self::Surgical
        } else {
            Self::Standard
        }
    }

    /// Drafting instruction for this tier.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Deep => "use deep evidence and quantitative KPIs",
            Self::Standard => {
                "use balanced evidence: one concrete, verifiable proof point per requirement, moderate length"
            }
            Self::Surgical => {
                "provide surgical compliance clarity: brief, direct confirmation of each requirement"
            }
        }
    }
}

impl fmt::Display for DepthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deep => write!(f, "DEEP"),
            Self::Standard => write!(f, "STANDARD"),
            Self::Surgical => write!(f, "SURGICAL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Question extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdKind {
    Question,
    Named(&'static str),
}

/// A scored question found in the decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Canonical identifier, e.g. `Q3`, `Q2.1`, `Section 4`.
    pub id: String,
    /// Weighting in percent, if stated.
    pub weight: Option<f64>,
    /// Word/character/page limit as written, if stated.
    pub limit: Option<String>,
    kind: IdKind,
    number: String,
}

impl Question {
    /// Whether `text` mentions this question's identifier.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        let prefix = match self.kind {
            IdKind::Question => "(?:question|q)".to_string(),
            IdKind::Named(word) => regex::escape(word),
        };
        let pattern = format!(
            r"(?i)\b{prefix}\s*[-#:.]?\s*{}(?:$|[^\w.]|\.(?:\W|$))",
            regex::escape(&self.number)
        );
        Regex::new(&pattern).map(|re| re.is_match(text)).unwrap_or(false)
    }
}

fn canonical(kind_word: &str, number: &str) -> (IdKind, String) {
    let kind = match kind_word.to_lowercase().as_str() {
        "q" | "question" => IdKind::Question,
        "section" => IdKind::Named("Section"),
        "criterion" => IdKind::Named("Criterion"),
        "clause" => IdKind::Named("Clause"),
        _ => IdKind::Named("Lot"),
    };
    let id = match kind {
        IdKind::Question => format!("Q{number}"),
        IdKind::Named(word) => format!("{word} {number}"),
    };
    (kind, id)
}

fn percent_value(digits: &str) -> Option<f64> {
    digits
        .parse::<f64>()
        .ok()
        .filter(|p| (0.0..=100.0).contains(p))
}

fn parse_percent(text: &str) -> Option<f64> {
    PERCENT_RE.captures(text).and_then(|c| percent_value(&c[1]))
}

/// Percentage tied to a weighting keyword: "weighting: 20%", "weighted at 20%",
/// "20% weighting".
fn keyword_percent(text: &str) -> Option<f64> {
    if let Some(c) = PERCENT_BEFORE_KEYWORD_RE.captures(text) {
        return percent_value(&c[1]);
    }
    WEIGHT_KEYWORD_RE
        .find_iter(text)
        .find_map(|m| parse_percent(&text[m.end()..]))
}

fn parse_limit(text: &str) -> Option<String> {
    LIMIT_RE
        .captures(text)
        .map(|c| format!("{} {}", &c[1], c[2].to_lowercase()))
}

/// One identifier seen on a line, with the facts the line attaches to it.
struct Mention {
    kind: IdKind,
    id: String,
    number: String,
    weight: Option<f64>,
    limit: Option<String>,
}

impl Mention {
    fn new(
        caps: &regex::Captures<'_>,
        weight: impl FnOnce(IdKind) -> Option<f64>,
        limit: Option<String>,
    ) -> Self {
        let (kind, id) = canonical(&caps[1], &caps[2]);
        Self {
            kind,
            id,
            number: caps[2].to_string(),
            weight: weight(kind),
            limit,
        }
    }
}

fn is_table_row(line: &str) -> bool {
    line.matches('|').count() >= 2
}

/// `Q3 | Service availability of 99.9% | 5% | 200 words`
///
/// Identifiers come from the first cell that has any. The weighting is the
/// first cell holding only a percentage, so figures inside titles are ignored.
fn table_mentions(line: &str) -> Vec<Mention> {
    let cells: Vec<&str> = line.split('|').map(str::trim).collect();
    let Some(key) = cells.iter().position(|c| QUESTION_RE.is_match(c)) else {
        return Vec::new();
    };
    let rest = &cells[key + 1..];
    let rest_text = rest.join(" | ");
    let cell_weight = rest
        .iter()
        .find_map(|c| PERCENT_CELL_RE.captures(*c))
        .and_then(|c| percent_value(&c[1]));
    let stated = cell_weight.or_else(|| keyword_percent(&rest_text));
    let limit = parse_limit(&rest_text);

    QUESTION_RE
        .captures_iter(cells[key])
        .map(|caps| {
            Mention::new(
                &caps,
                |kind| match kind {
                    IdKind::Question => stated.or_else(|| parse_percent(&rest_text)),
                    IdKind::Named(_) => stated,
                },
                limit.clone(),
            )
        })
        .collect()
}

/// Free text such as `Q1 and Q2 are each weighted 20%` or `Q2.1 Delivery (15%)`.
///
/// Each identifier first looks at the text up to the next identifier. Section
/// and clause references only take a percentage tied to a weighting keyword.
fn prose_mentions(line: &str) -> Vec<Mention> {
    let matches: Vec<regex::Captures<'_>> = QUESTION_RE.captures_iter(line).collect();
    let bounds: Vec<(usize, usize)> = matches
        .iter()
        .filter_map(|c| c.get(0))
        .map(|m| (m.start(), m.end()))
        .collect();
    let line_weight = keyword_percent(line);
    let tail = bounds.last().map_or("", |&(_, end)| &line[end..]);

    matches
        .iter()
        .zip(&bounds)
        .enumerate()
        .map(|(i, (caps, &(_, end)))| {
            let next = bounds.get(i + 1).map_or(line.len(), |&(start, _)| start);
            let segment = &line[end..next];
            let stated = keyword_percent(segment).or(line_weight);
            Mention::new(
                caps,
                |kind| match kind {
                    IdKind::Question => stated.or_else(|| parse_percent(segment)),
                    IdKind::Named(_) => stated,
                },
                parse_limit(segment).or_else(|| parse_limit(tail)),
            )
        })
        .collect()
}

/// Scan decomposition text for scored questions, in order of first mention.
///
/// Question/`Q` identifiers are always kept. Section, clause, criterion and
/// lot references are kept only when a weighting is attached, since those
/// words also appear in compliance-gate citations.
pub fn extract_questions(text: &str) -> Vec<Question> {
    let mut found: Vec<Question> = Vec::new();
    let mut last: Option<usize> = None;

    for line in text.lines() {
        let mentions = if is_table_row(line) {
            table_mentions(line)
        } else {
            prose_mentions(line)
        };

        if mentions.is_empty() {
            // Continuation line, e.g. "  - Weighting: 20%" under a question heading.
            if let Some(idx) = last {
                let q = &mut found[idx];
                if q.weight.is_none() {
                    q.weight = keyword_percent(line);
                }
                if q.limit.is_none() {
                    q.limit = parse_limit(line);
                }
            }
            continue;
        }

        for mention in mentions {
            if let Some(idx) = found.iter().position(|q| q.id == mention.id) {
                let q = &mut found[idx];
                q.weight = q.weight.or(mention.weight);
                q.limit = q.limit.take().or(mention.limit);
                last = Some(idx);
                continue;
            }

            found.push(Question {
                id: mention.id,
                weight: mention.weight,
                limit: mention.limit,
                kind: mention.kind,
                number: mention.number,
            });
            last = Some(found.len() - 1);
        }
    }

    found.retain(|q| q.kind == IdKind::Question || q.weight.is_some());
    found
}

// ---------------------------------------------------------------------------
// Response plan
// ---------------------------------------------------------------------------

/// One planned response.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedResponse {
    pub question: Question,
    pub tier: Option<DepthTier>,
}

/// Per-question depth assignments for the response stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponsePlan {
    entries: Vec<PlannedResponse>,
}

impl ResponsePlan {
    pub fn from_decomposition(text: &str) -> Self {
        let entries = extract_questions(text)
            .into_iter()
            .map(|question| PlannedResponse {
                tier: question.weight.map(DepthTier::for_weight),
                question,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[PlannedResponse] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tier_of(&self, id: &str) -> Option<DepthTier> {
        self.entries
            .iter()
            .find(|e| e.question.id == id)
            .and_then(|e| e.tier)
    }

    /// Prompt section listing every question with its depth directive.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "No question identifiers could be read from the decomposition. \
                    Derive them from the decomposition text and apply the depth rules."
                .to_string();
        }

        let mut out = String::from("Respond to each identifier below, in this order:\n");
        for entry in &self.entries {
            let q = &entry.question;
            let mut facts = Vec::new();
            if let Some(w) = q.weight {
                facts.push(format!("weighting {w}%"));
            }
            if let Some(limit) = &q.limit {
                facts.push(format!("limit {limit}"));
            }
            let facts = if facts.is_empty() {
                String::new()
            } else {
                format!(" ({})", facts.join(", "))
            };
            let directive = match entry.tier {
                Some(tier) => format!("{tier}: {}", tier.directive()),
                None => "weighting not stated: apply the global instructions".to_string(),
            };
            out.push_str(&format!("- {}{facts}: {directive}\n", q.id));
        }
        out
    }

    /// Identifiers the response text never mentions.
    pub fn missing_in(&self, output: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.question.is_mentioned_in(output))
            .map(|e| e.question.id.clone())
            .collect()
    }
}
