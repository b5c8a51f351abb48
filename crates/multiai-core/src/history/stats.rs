//! Aggregates behind the history trend chart and word cloud.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::record::PromptRecord;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "was", "our", "out",
    "his", "her", "has", "had", "how", "its", "who", "did", "get", "him", "she", "too", "use",
    "that", "this", "with", "from", "have", "what", "when", "where", "which", "will", "would",
    "there", "their", "them", "then", "than", "they", "into", "your", "about", "some", "like",
    "just", "also", "more", "please", "is", "it", "in", "on", "of", "to", "a", "an", "be", "do",
    "if", "or", "as", "at", "by", "me", "my", "we", "so", "no", "up", "am", "i",
    "的", "了", "是", "在", "我", "你", "他", "她", "它", "们", "和", "与", "吗", "呢", "吧", "啊",
    "这", "那", "有", "就", "也", "都", "请", "一个",
];

/// Summary counts over the whole history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub favorites: usize,
    /// Last N days ending today, oldest first, zero-filled.
    pub daily: Vec<(NaiveDate, usize)>,
    /// Frame host to number of prompts sent there, most used first.
    pub platforms: Vec<(String, usize)>,
    /// Most frequent words, most frequent first.
    pub top_words: Vec<(String, usize)>,
}

impl HistoryStats {
    pub fn compute(records: &[PromptRecord], today: NaiveDate, days: usize, top: usize) -> Self {
        let favorites = records.iter().filter(|r| r.favorite).count();

        let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
        for record in records {
            *per_day.entry(record.datetime().date_naive()).or_default() += 1;
        }
        // Days before the earliest representable date are left out.
        let daily = (0..days)
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(offset as u64)))
            .map(|day| (day, per_day.get(&day).copied().unwrap_or(0)))
            .collect();

        let mut per_host: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            for frame in &record.frames {
                *per_host.entry(frame.host()).or_default() += 1;
            }
        }

        let mut words: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            for word in tokenize(&record.content) {
                *words.entry(word).or_default() += 1;
            }
        }

        Self {
            total: records.len(),
            favorites,
            daily,
            platforms: ranked(per_host, usize::MAX),
            top_words: ranked(words, top),
        }
    }
}

/// Descending by count; ties keep key order.
fn ranked(counts: BTreeMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(limit);
    entries
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{3040}'..='\u{30FF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{F900}'..='\u{FAFF}')
}

/// Lowercased words of two or more characters without stop-words.
/// Runs of CJK characters are split into overlapping bigrams.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut cjk: Vec<char> = Vec::new();

    let flush_word = |word: &mut String, tokens: &mut Vec<String>| {
        if word.chars().count() >= 2 && !STOPWORDS.contains(&word.as_str()) {
            tokens.push(word.clone());
        }
        word.clear();
    };
    let flush_cjk = |cjk: &mut Vec<char>, tokens: &mut Vec<String>| {
        for pair in cjk.windows(2) {
            let bigram: String = pair.iter().collect();
            if !STOPWORDS.contains(&bigram.as_str()) && !pair.iter().any(|c| is_stop_char(*c)) {
                tokens.push(bigram);
            }
        }
        cjk.clear();
    };

    for c in text.chars() {
        if is_cjk(c) {
            flush_word(&mut word, &mut tokens);
            cjk.push(c);
        } else if c.is_alphanumeric() {
            flush_cjk(&mut cjk, &mut tokens);
            word.extend(c.to_lowercase());
        } else {
            flush_word(&mut word, &mut tokens);
            flush_cjk(&mut cjk, &mut tokens);
        }
    }
    flush_word(&mut word, &mut tokens);
    flush_cjk(&mut cjk, &mut tokens);
    tokens
}

fn is_stop_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    STOPWORDS.contains(&&*c.encode_utf8(&mut buf))
}
