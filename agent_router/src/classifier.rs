//! Keyword-based topic detection.
//!
//! Each scored category owns a fixed keyword set. A category's score is the
//! number of *distinct* keywords found as substrings of the lower-cased text.
//! The unique highest score wins; no match, or a tie at the top, yields
//! [`Category::General`].

use crate::model::Category;
use tracing::debug;

const TECHNOLOGY: &[&str] = &[
    "tech",
    "software",
    "artificial intelligence",
    "computer",
    "programming",
    "code",
    "algorithm",
    "data",
    "system",
];

const SCIENCE: &[&str] = &[
    "research",
    "experiment",
    "theory",
    "study",
    "biology",
    "chemistry",
    "physics",
    "scientific",
];

const BUSINESS: &[&str] = &[
    "market",
    "company",
    "finance",
    "strategy",
    "revenue",
    "profit",
    "management",
    "enterprise",
];

const EDUCATION: &[&str] = &[
    "learn",
    "study",
    "school",
    "university",
    "course",
    "training",
    "knowledge",
    "teaching",
];

const ENTERTAINMENT: &[&str] = &[
    "movie",
    "music",
    "game",
    "fun",
    "entertainment",
    "show",
    "sport",
    "hobby",
];

const HEALTH: &[&str] = &[
    "health",
    "medical",
    "doctor",
    "medicine",
    "fitness",
    "wellness",
    "disease",
    "treatment",
];

#[derive(Debug, Clone)]
pub struct TopicClassifier {
    /// Scanned in `Category::ALL` order.
    keywords: Vec<(Category, Vec<String>)>,
}

impl Default for TopicClassifier {
    fn default() -> Self {
        let table: [(Category, &[&str]); 6] = [
            (Category::Technology, TECHNOLOGY),
            (Category::Science, SCIENCE),
            (Category::Business, BUSINESS),
            (Category::Education, EDUCATION),
            (Category::Entertainment, ENTERTAINMENT),
            (Category::Health, HEALTH),
        ];

        Self {
            keywords: table
                .into_iter()
                .map(|(category, words)| (category, words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        }
    }
}

impl TopicClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keywords(&self, category: Category) -> Option<&[String]> {
        self.keywords
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, words)| words.as_slice())
    }

    fn distinct_matches(words: &[String], lowered: &str) -> usize {
        words.iter().filter(|w| lowered.contains(w.as_str())).count()
    }

    /// Per-category scores, in declaration order.
    pub fn scores(&self, text: &str) -> Vec<(Category, usize)> {
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .map(|(category, words)| (*category, Self::distinct_matches(words, &lowered)))
            .collect()
    }

    pub fn detect_topic(&self, text: &str) -> Category {
        let scores = self.scores(text);
        let best = scores.iter().map(|(_, score)| *score).max().unwrap_or(0);

        if best == 0 {
            return Category::General;
        }

        let mut leaders = scores.iter().filter(|(_, score)| *score == best);
        let detected = match (leaders.next(), leaders.next()) {
            (Some((category, _)), None) => *category,
            _ => Category::General,
        };

        debug!(?scores, %detected, "Classified request text");
        detected
    }

    /// Fraction of the category's keywords present in `text`; 0.0 for a
    /// category without keywords.
    pub fn relevance_score(&self, text: &str, category: Category) -> f64 {
        match self.keywords(category) {
            Some(words) if !words.is_empty() => {
                let lowered = text.to_lowercase();
                Self::distinct_matches(words, &lowered) as f64 / words.len() as f64
            }
            _ => 0.0,
        }
    }
}
