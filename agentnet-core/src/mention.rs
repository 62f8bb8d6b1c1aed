//! Mention detection for message content.
//!
//! A mention is a whitespace-separated token of the form `@name`. Wrapping
//! quotes or brackets and trailing punctuation are ignored, and the name is
//! compared case-insensitively.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::identity::agent_key;

static MENTION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[\("'\[<]*@([^\s@]+?)[\)"'\]>,.!?:;]*$"#).expect("Invalid mention regex")
});

/// Extracts the normalized names mentioned in `content`, in order of
/// appearance. Repeated mentions are kept.
pub fn extract_mentions(content: &str) -> Vec<String> {
    content
        .split_whitespace()
        .filter_map(|token| MENTION_TOKEN.captures(token))
        .filter_map(|caps| caps.get(1).map(|m| agent_key(m.as_str())))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Counts how many times `agent_name` is mentioned in `content`.
pub fn count_mentions(content: &str, agent_name: &str) -> usize {
    let key = agent_key(agent_name);
    if key.is_empty() {
        return 0;
    }
    extract_mentions(content)
        .iter()
        .filter(|name| **name == key)
        .count()
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: joining N mention tokens with arbitrary filler words
        /// yields exactly N mentions of that name.
        #[test]
        fn prop_mention_count_matches_tokens(
            name in "[a-z][a-z0-9_-]{0,11}",
            filler in prop::collection::vec("[a-z]{1,8}", 0..6),
            n in 0usize..5,
        ) {
            let mut words: Vec<String> = filler.clone();
            for _ in 0..n {
                words.push(format!("@{}", name.to_uppercase()));
            }
            let content = words.join(" ");
            prop_assert_eq!(count_mentions(&content, &name), n);
        }
    }
}
