use crate::types::{RelationRaw, RelationType};
use serde::Deserialize;

/// Linkage lists of a wiktextract entry, at entry level and per sense.
///
/// Only the fields needed to derive [`RelationRaw`] records are read; everything else on the
/// line is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkedEntry {
    pub word: String,
    #[serde(flatten)]
    pub links: LinkageLists,
    #[serde(default)]
    pub senses: Vec<LinkedSense>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkedSense {
    #[serde(flatten)]
    pub links: LinkageLists,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkageLists {
    #[serde(default)]
    pub synonyms: Vec<Linkage>,
    #[serde(default)]
    pub antonyms: Vec<Linkage>,
    #[serde(default)]
    pub hypernyms: Vec<Linkage>,
    #[serde(default)]
    pub holonyms: Vec<Linkage>,
    #[serde(default)]
    pub meronyms: Vec<Linkage>,
    #[serde(default)]
    pub coordinate_terms: Vec<Linkage>,
    #[serde(default)]
    pub derived: Vec<Linkage>,
    #[serde(default)]
    pub related: Vec<Linkage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Linkage {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub sense: Option<String>,
}

impl LinkageLists {
    fn iter(&self) -> impl Iterator<Item = (RelationType, &Linkage)> {
        [
            (RelationType::Synonym, &self.synonyms),
            (RelationType::Antonym, &self.antonyms),
            (RelationType::Hypernym, &self.hypernyms),
            (RelationType::Holonym, &self.holonyms),
            (RelationType::Meronym, &self.meronyms),
            (RelationType::CoordinateTerm, &self.coordinate_terms),
            (RelationType::Derived, &self.derived),
            (RelationType::Related, &self.related),
        ]
        .into_iter()
        .flat_map(|(kind, links)| links.iter().map(move |link| (kind.clone(), link)))
    }
}

impl LinkedEntry {
    /// Relations declared by this entry, entry-level linkages first, then each sense in order.
    ///
    /// Linkages without a target word are skipped; a missing `sense` becomes an empty gloss
    /// fragment.
    #[must_use]
    pub fn relations(&self) -> Vec<RelationRaw> {
        let lists = std::iter::once(&self.links).chain(self.senses.iter().map(|s| &s.links));
        let mut out = Vec::new();
        for list in lists {
            for (kind, link) in list.iter() {
                let Some(target) = link.word.as_deref() else {
                    continue;
                };
                let gloss = link.sense.as_deref().unwrap_or_default();
                match RelationRaw::new(self.word.as_str(), kind, target, gloss) {
                    Ok(relation) => out.push(relation),
                    Err(err) => log::debug!("Skipping linkage of '{}': {err}", self.word),
                }
            }
        }
        out
    }
}

/// Relation records declared by a wiktextract-shaped entry
#[must_use]
pub fn relations_from_lexeme(entry: &LinkedEntry) -> Vec<RelationRaw> {
    entry.relations()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_entry_and_sense_linkages_in_order() {
        let entry: LinkedEntry = serde_json::from_str(
            r#"{
                "word": "odd",
                "synonyms": [{"word": "aberrant", "sense": "abnormal"}, {"sense": "no word"}],
                "senses": [
                    {"glosses": ["strange"], "antonyms": [{"word": "normal"}]},
                    {"glosses": ["uneven"], "coordinate_terms": [{"word": "even"}]}
                ]
            }"#,
        )
        .unwrap();

        let relations = entry.relations();
        let summary: Vec<(String, String, String)> = relations
            .iter()
            .map(|r| {
                (
                    r.relation_type().to_string(),
                    r.target_word().to_string(),
                    r.gloss_fragment().to_string(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("synonym".into(), "aberrant".into(), "abnormal".into()),
                ("antonym".into(), "normal".into(), String::new()),
                ("coordinate_term".into(), "even".into(), String::new()),
            ]
        );
        assert!(relations.iter().all(|r| r.source_word() == "odd"));
    }
}
