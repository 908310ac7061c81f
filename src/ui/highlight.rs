//! Line highlighting
//!
//! A single pass per line that assigns a theme role to every character:
//! keywords, `def`/`class`, quoted strings and `#` comments. Later rules win.

use crate::config::Role;
use crate::editor::document::is_word_char;

const KEYWORDS: &[&str] = &[
    "if", "else", "elif", "while", "for", "in", "import", "from", "as", "return", "yield", "try",
    "except", "finally", "with", "pass", "break", "continue", "None", "True", "False", "and",
    "or", "not", "is", "lambda",
];

const DEFINITIONS: &[&str] = &["def", "class"];

/// One role per character of `line`
pub fn highlight(line: &str) -> Vec<Role> {
    let chars: Vec<char> = line.chars().collect();
    let mut roles = vec![Role::Foreground; chars.len()];

    mark_words(&chars, &mut roles);
    mark_strings(&chars, &mut roles);

    if let Some(start) = chars.iter().position(|&c| c == '#') {
        roles[start..].fill(Role::Comment);
    }

    roles
}

fn mark_words(chars: &[char], roles: &mut [Role]) {
    let mut i = 0;
    while i < chars.len() {
        if !is_word_char(chars[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && is_word_char(chars[i]) {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();
        if DEFINITIONS.contains(&word.as_str()) {
            roles[start..i].fill(Role::Definition);
        } else if KEYWORDS.contains(&word.as_str()) {
            roles[start..i].fill(Role::Keyword);
        }
    }
}

/// Shortest `"..."` or `'...'` runs, left to right. An unmatched quote is plain text.
fn mark_strings(chars: &[char], roles: &mut [Role]) {
    let mut i = 0;
    while i < chars.len() {
        let quote = chars[i];
        if quote != '"' && quote != '\'' {
            i += 1;
            continue;
        }
        match chars[i + 1..].iter().position(|&c| c == quote) {
            Some(offset) => {
                let end = i + 1 + offset;
                roles[i..=end].fill(Role::String);
                i = end + 1;
            }
            None => i += 1,
        }
    }
}
