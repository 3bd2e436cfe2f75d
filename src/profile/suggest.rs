//! "Did you mean" suggestions for unresolved identifiers

use crate::config::Config;

/// Suggestions scoring below this are dropped
pub const MIN_SCORE: u8 = 50;

/// Similarity of two strings on a 0–100 scale
///
/// Based on the insert/delete edit distance: `100 * (len_a + len_b - dist) /
/// (len_a + len_b)`, rounded. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }

    let distance = total - 2 * longest_common_subsequence(&a, &b);
    let score = 100.0 * (total - distance) as f64 / total as f64;
    score.round() as u8
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev[b.len()]
}

/// Lowercase, turn anything that is not a letter or digit into a space, trim
fn clean(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<String>()
            } else {
                " ".to_string()
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// All `"<location> <network>"` and `"<location> <alias>"` strings
fn candidates(config: &Config) -> Vec<String> {
    let mut all = Vec::new();
    for (location, loc) in &config.profiles {
        for (network, net) in &loc.networks {
            all.push(format!("{} {}", location, network));
            for alias in &net.aliases {
                all.push(format!("{} {}", location, alias));
            }
        }
    }
    all
}

/// Scored candidates, best first, at most `max`, none below [`MIN_SCORE`]
///
/// Scoring ignores case and punctuation; candidates are returned as
/// configured. Equal scores keep configuration order.
pub fn ranked(config: &Config, input: &str, max: usize) -> Vec<(String, u8)> {
    let input = clean(input);
    let mut scored: Vec<(String, u8)> = candidates(config)
        .into_iter()
        .map(|candidate| {
            let score = ratio(&input, &clean(&candidate));
            (candidate, score)
        })
        .filter(|(_, score)| *score >= MIN_SCORE)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(max);
    scored
}

/// Suggested profile names for an input that did not resolve
pub fn suggest(config: &Config, input: &str, max: usize) -> Vec<String> {
    ranked(config, input, max)
        .into_iter()
        .map(|(candidate, _)| candidate)
        .collect()
}
