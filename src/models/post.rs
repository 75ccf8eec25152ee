use serde::{Deserialize, Serialize};

/// Words replaced by `****` when a chirp is stored.
const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

const MASK: &str = "****";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub author_id: u64,
    pub body: String,
}

/// Masks profane words. Words are split on single spaces and compared
/// case-insensitively, so punctuation attached to a word keeps it intact.
pub fn mask_profanity(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(&word.to_lowercase().as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
