/// Average adult silent-reading speed, words per minute.
const WORDS_PER_MINUTE: usize = 238;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whole minutes to read `words`; any non-empty text takes at least one.
pub fn reading_time_minutes(words: usize) -> usize {
    if words == 0 {
        0
    } else {
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }
}
