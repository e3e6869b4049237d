//! Reconciliation of streamed text fragments into accumulated part content.
//!
//! Providers are not consistent about what a "delta" is: some send pure
//! incremental fragments, others send cumulative snapshots that repeat part
//! or all of the text already seen. [`merge`] computes the appendage that
//! grows the accumulated text without losing or duplicating characters for
//! either style.

/// Maximum suffix length, in characters, searched for an overlap.
///
/// Bounds the cost of the suffix/prefix scan on long accumulations; overlaps
/// longer than this are handled by the whole-prefix check above it.
pub const OVERLAP_WINDOW: usize = 200;

/// Compute the suffix of `incoming` that should be appended to `previous`.
///
/// Rules, in order:
/// 1. empty `incoming` appends nothing;
/// 2. empty `previous` appends all of `incoming`;
/// 3. if `incoming` starts with the entirety of `previous` (cumulative
///    snapshot), only the remainder is appended;
/// 4. otherwise the longest suffix of `previous` (within the last
///    [`OVERLAP_WINDOW`] characters) that equals a prefix of `incoming` is
///    dropped from the front of `incoming`;
/// 5. with no overlap at all, `incoming` is appended verbatim. A provider
///    that sends disjoint snapshots can duplicate text here; that is the
///    accepted trade against silently dropping output.
///
/// All comparisons respect character boundaries, so multi-byte text never
/// splits mid-character.
pub fn merge<'a>(previous: &str, incoming: &'a str) -> &'a str {
    if incoming.is_empty() {
        return "";
    }
    if previous.is_empty() {
        return incoming;
    }
    if let Some(rest) = incoming.strip_prefix(previous) {
        return rest;
    }

    // Longest suffix of the bounded window that prefixes `incoming`.
    let window = suffix_window(previous, OVERLAP_WINDOW);
    for (start, _) in window.char_indices() {
        let candidate = &window[start..];
        if let Some(rest) = incoming.strip_prefix(candidate) {
            return rest;
        }
    }

    incoming
}

/// The suffix of `text` holding at most `chars` characters.
fn suffix_window(text: &str, chars: usize) -> &str {
    let skipped: usize = text.chars().rev().take(chars).map(char::len_utf8).sum();
    &text[text.len() - skipped..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_incoming_is_noop() {
        assert_eq!(merge("hello", ""), "");
        assert_eq!(merge("", ""), "");
    }

    #[test]
    fn test_empty_previous_passes_through() {
        assert_eq!(merge("", "hello"), "hello");
    }

    #[test]
    fn test_full_repeat_appends_nothing() {
        assert_eq!(merge("hello", "hello"), "");
    }

    #[test]
    fn test_pure_append() {
        assert_eq!(merge("hello", " world"), " world");
    }

    #[test]
    fn test_snapshot_growth() {
        assert_eq!(merge("hello", "hello world"), " world");
    }

    #[test]
    fn test_partial_suffix_overlap() {
        assert_eq!(merge("abcXYZ", "XYZdef"), "def");
    }

    #[test]
    fn test_no_overlap_appends_verbatim() {
        assert_eq!(merge("abc", "xyz"), "xyz");
    }

    #[test]
    fn test_longest_overlap_wins() {
        // Both "a" and "aba" are suffix/prefix matches; the longer one must win
        assert_eq!(merge("xaba", "abab"), "b");
    }

    #[test]
    fn test_overlap_beyond_window_falls_back_to_prefix_rule() {
        // Previous far longer than the window, incoming repeats all of it
        let previous = "x".repeat(OVERLAP_WINDOW * 3);
        let incoming = format!("{previous}tail");
        assert_eq!(merge(&previous, &incoming), "tail");
    }

    #[test]
    fn test_window_bounds_partial_overlap_search() {
        // The overlap is exactly the window size, anchored at its start
        let head = "h".repeat(50);
        let overlap = "o".repeat(OVERLAP_WINDOW);
        let previous = format!("{head}{overlap}");
        let incoming = format!("{overlap}tail");
        assert_eq!(merge(&previous, &incoming), "tail");
    }

    #[test]
    fn test_repeated_application_accumulates_once() {
        let mut acc = String::new();
        for delta in ["he", "hell", "hello", "hello wo", "hello world"] {
            let appendage = merge(&acc, delta);
            acc.push_str(appendage);
        }
        assert_eq!(acc, "hello world");
    }

    #[test]
    fn test_multibyte_overlap() {
        assert_eq!(merge("你好世界", "世界！"), "！");
        assert_eq!(merge("héllo", "héllo wörld"), " wörld");
    }

    #[test]
    fn test_multibyte_window_boundary() {
        // Window computed in characters, not bytes
        let previous = "漢".repeat(OVERLAP_WINDOW + 10);
        let incoming = format!("{}after", "漢".repeat(OVERLAP_WINDOW));
        assert_eq!(merge(&previous, &incoming), "after");
    }
}
