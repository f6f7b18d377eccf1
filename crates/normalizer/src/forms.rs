use std::collections::HashMap;

/// Surface forms per word, in first-seen word order.
///
/// Merge rule: the first lexeme of a word seeds its list with the word itself, then every
/// lexeme sharing the word appends its forms in order. Nothing is deduplicated, so a form
/// listed by two lexemes appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormsTable {
    slots: HashMap<String, usize>,
    entries: Vec<(String, Vec<String>)>,
}

impl FormsTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, word: &str, forms: impl IntoIterator<Item = String>) {
        let slot = match self.slots.get(word) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.slots.insert(word.to_string(), slot);
                self.entries.push((word.to_string(), vec![word.to_string()]));
                slot
            }
        };
        self.entries[slot].1.extend(forms);
    }

    #[must_use]
    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.slots
            .get(word)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(word, forms)| (word.as_str(), forms.as_slice()))
    }

    /// One `(word, form)` row per stored form
    pub fn explode(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .flat_map(|(word, forms)| forms.iter().map(move |form| (word, form.as_str())))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn forms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn concatenates_across_lexemes_and_keeps_repeats() {
        let mut table = FormsTable::new();
        table.extend("run", forms(&["runs", "ran"]));
        table.extend("walk", forms(&["walks"]));
        table.extend("run", forms(&["runs"]));

        assert_eq!(
            table.get("run").unwrap(),
            forms(&["run", "runs", "ran", "runs"]).as_slice()
        );
        let rows: Vec<(&str, &str)> = table.explode().collect();
        assert_eq!(
            rows,
            vec![
                ("run", "run"),
                ("run", "runs"),
                ("run", "ran"),
                ("run", "runs"),
                ("walk", "walk"),
                ("walk", "walks"),
            ]
        );
    }

    #[test]
    fn word_without_forms_still_lists_itself() {
        let mut table = FormsTable::new();
        table.extend("aberrant", Vec::new());
        assert_eq!(table.get("aberrant").unwrap(), forms(&["aberrant"]).as_slice());
        assert!(table.get("missing").is_none());
    }
}
