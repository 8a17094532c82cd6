//! Derived post fields: slug, read time and excerpt.
//!
//! Pure functions with no I/O. The repository calls them on every write that
//! touches `title` or `content`; nothing else should.

use std::sync::LazyLock;

use regex::Regex;

pub const WORDS_PER_MINUTE: usize = 200;
pub const DEFAULT_EXCERPT_LEN: usize = 150;
pub const ELLIPSIS: &str = "...";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// URL slug for a title.
///
/// Lowercases, keeps `[a-z0-9]`, turns whitespace and hyphen runs into a
/// single hyphen, drops everything else and trims hyphens at both ends.
/// The output only ever contains `[a-z0-9-]`, so applying it twice is a no-op.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch == '-' || ch.is_whitespace() {
            pending_hyphen = true;
        }
    }

    slug
}

/// Reading time in whole minutes, never less than one.
pub fn read_time(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// Tag-free text with whitespace collapsed to single spaces.
pub fn plain_text(content: &str) -> String {
    let stripped = TAG_RE.replace_all(content, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text preview of at most `max_len` characters plus [`ELLIPSIS`].
///
/// Truncation happens on a word boundary; a first word longer than `max_len`
/// yields just the ellipsis.
pub fn excerpt(content: &str, max_len: usize) -> String {
    let plain = plain_text(content);
    if plain.chars().count() <= max_len {
        return plain;
    }

    let mut out = String::new();
    let mut len = 0usize;
    for word in plain.split(' ') {
        let word_len = word.chars().count();
        let needed = if len == 0 { word_len } else { len + 1 + word_len };
        if needed > max_len {
            break;
        }
        if len > 0 {
            out.push(' ');
        }
        out.push_str(word);
        len = needed;
    }

    out.push_str(ELLIPSIS);
    out
}
