//! Product name normalization used as the cross-source merge key.

/// Marketing noise that says nothing about which product it is.
pub const DEFAULT_NOISE_WORDS: &[&str] = &[
    "new",
    "original",
    "free shipping",
    "חדש",
    "מקורי",
    "משלוח חינם",
];

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    /// Each phrase as lowercase tokens, longest first
    noise: Vec<Vec<String>>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_WORDS.iter().copied())
    }
}

impl NameNormalizer {
    pub fn new<I, S>(noise_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut noise: Vec<Vec<String>> = noise_words
            .into_iter()
            .map(|phrase| {
                phrase
                    .as_ref()
                    .to_lowercase()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|tokens| !tokens.is_empty())
            .collect();

        noise.sort_by(|a, b| b.len().cmp(&a.len()));
        noise.dedup();

        Self { noise }
    }

    /// Lowercase, collapse whitespace and drop noise phrases as whole words.
    ///
    /// Removal repeats until nothing changes, so normalizing a key again
    /// returns the same key.
    pub fn normalize(&self, name: &str) -> String {
        let mut tokens: Vec<String> = name
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        loop {
            let stripped = self.strip_noise(&tokens);
            if stripped.len() == tokens.len() {
                break;
            }
            tokens = stripped;
        }

        tokens.join(" ")
    }

    fn strip_noise(&self, tokens: &[String]) -> Vec<String> {
        let mut kept = Vec::with_capacity(tokens.len());
        let mut i = 0;

        while i < tokens.len() {
            let matched = self
                .noise
                .iter()
                .find(|phrase| tokens[i..].starts_with(phrase.as_slice()));

            match matched {
                Some(phrase) => i += phrase.len(),
                None => {
                    kept.push(tokens[i].clone());
                    i += 1;
                }
            }
        }

        kept
    }
}
