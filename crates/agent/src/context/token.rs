//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. Only used for
//! diagnostics; the history bound is counted in messages, not tokens.

use seriesai_core::message::PromptTurn;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate tokens for a single turn including per-message overhead.
///
/// Each message costs ~4 tokens of overhead for role name, delimiters,
/// and formatting markers in the API wire format.
pub fn estimate_turn_tokens(turn: &PromptTurn) -> usize {
    let overhead = 4;
    overhead + estimate_tokens(&turn.content)
}

/// Estimate tokens for a slice of turns.
pub fn estimate_turns_tokens(turns: &[PromptTurn]) -> usize {
    turns.iter().map(estimate_turn_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use seriesai_core::message::Role;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn turns_include_overhead() {
        let turns = vec![
            PromptTurn::new(Role::User, "hello"),      // 2 tokens + 4 overhead
            PromptTurn::new(Role::Assistant, "world"), // 2 tokens + 4 overhead
        ];
        assert_eq!(estimate_turns_tokens(&turns), 12);
    }
}
