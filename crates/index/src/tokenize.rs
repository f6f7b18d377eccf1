/// Split text into lowercase terms.
///
/// Every character that is not alphanumeric separates terms, so punctuation never ends up
/// inside a term (`"abnormality—something"` yields `abnormality`, `something`). Empty
/// tokens are discarded.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lowercases_and_drops_punctuation() {
        assert_eq!(
            tokenize("Aberrant. (Botany) Atypical—rare; N.B."),
            vec!["aberrant", "botany", "atypical", "rare", "n", "b"]
        );
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(tokenize("Café  naïve"), vec!["café", "naïve"]);
    }

    #[test]
    fn empty_and_punctuation_only_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" ... -- ").is_empty());
    }
}
