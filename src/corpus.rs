//! Three-tier template corpus.
//!
//! Each tier maps a [`TemplateKey`] to every entry inserted under it. The
//! frequency of a key is its raw insertion count; export keeps only the first
//! inserted entry as the representative.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

use crate::mol::MoleculeRecord;
use crate::signature::TemplateKey;

/// Keys seen fewer times than this are left out of the library.
pub const DEFAULT_MIN_FREQUENCY: usize = 2;

/// Level of generalization a template was stored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Every reduction of an accepted ring system. Export walks this tier.
    Full,
    /// Whole-molecule rings containing a heteroatom.
    Skeleton,
    /// Whole-molecule carbocycles, element-erased.
    Anonymous,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Full, Tier::Skeleton, Tier::Anonymous];

    fn slot(self) -> usize {
        match self {
            Tier::Full => 0,
            Tier::Skeleton => 1,
            Tier::Anonymous => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Full => "full",
            Tier::Skeleton => "skeleton",
            Tier::Anonymous => "anonymous",
        };
        f.write_str(name)
    }
}

/// One stored template: a reduced graph with its coordinates and title.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEntry {
    structure: MoleculeRecord,
}

impl TemplateEntry {
    pub fn new(structure: MoleculeRecord) -> Self {
        Self { structure }
    }

    pub fn structure(&self) -> &MoleculeRecord {
        &self.structure
    }

    pub fn into_structure(self) -> MoleculeRecord {
        self.structure
    }

    pub fn title(&self) -> Option<&str> {
        self.structure.title()
    }

    /// Atom coordinates in atom index order.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.structure
            .atoms()
            .map(|idx| self.structure.atom(idx).position)
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct TemplateCorpus {
    tiers: [HashMap<TemplateKey, Vec<TemplateEntry>>; 3],
}

impl TemplateCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tier: Tier, key: TemplateKey, entry: TemplateEntry) {
        self.tiers[tier.slot()].entry(key).or_default().push(entry);
    }

    pub fn frequency_of(&self, tier: Tier, key: &TemplateKey) -> usize {
        self.tiers[tier.slot()].get(key).map_or(0, Vec::len)
    }

    pub fn contains(&self, tier: Tier, key: &TemplateKey) -> bool {
        self.tiers[tier.slot()].contains_key(key)
    }

    /// First inserted entry under `key`.
    pub fn representative(&self, tier: Tier, key: &TemplateKey) -> Option<&TemplateEntry> {
        self.tiers[tier.slot()].get(key).and_then(|entries| entries.first())
    }

    /// Number of distinct keys in `tier`.
    pub fn len(&self, tier: Tier) -> usize {
        self.tiers[tier.slot()].len()
    }

    /// Number of entries across all tiers.
    pub fn total_entries(&self) -> usize {
        self.tiers
            .iter()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(HashMap::is_empty)
    }

    /// Representatives of every key in `tier` seen at least `min_frequency`
    /// times, most frequent first; equal frequencies are ordered by key.
    pub fn export_tier(
        &self,
        tier: Tier,
        min_frequency: usize,
    ) -> Vec<(TemplateKey, &TemplateEntry)> {
        let mut selected: Vec<(&TemplateKey, &Vec<TemplateEntry>)> = self.tiers[tier.slot()]
            .iter()
            .filter(|(_, entries)| entries.len() >= min_frequency)
            .collect();
        selected.sort_by(|(ka, ea), (kb, eb)| {
            Reverse(ea.len()).cmp(&Reverse(eb.len())).then_with(|| ka.cmp(kb))
        });
        selected
            .into_iter()
            .filter_map(|(key, entries)| entries.first().map(|entry| (key.clone(), entry)))
            .collect()
    }

    /// The library selection: full-tier keys meeting the threshold, in
    /// export order, each represented by its most general stored form.
    ///
    /// A key present in the anonymous tier is taken from there, otherwise
    /// from the skeleton tier, otherwise from the full tier.
    pub fn export_library(&self, min_frequency: usize) -> Vec<(TemplateKey, &TemplateEntry)> {
        self.export_tier(Tier::Full, min_frequency)
            .into_iter()
            .map(|(key, full)| {
                let entry = self
                    .representative(Tier::Anonymous, &key)
                    .or_else(|| self.representative(Tier::Skeleton, &key))
                    .unwrap_or(full);
                (key, entry)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::signature;
    use crate::smiles::parse_smiles;

    fn entry(s: &str, title: &str) -> (TemplateKey, TemplateEntry) {
        let mut mol = parse_smiles(s).unwrap();
        mol.set_title(Some(title.to_owned()));
        (signature(&mol).unwrap(), TemplateEntry::new(mol))
    }

    fn insert(corpus: &mut TemplateCorpus, tier: Tier, s: &str, title: &str) -> TemplateKey {
        let (key, e) = entry(s, title);
        corpus.insert(tier, key.clone(), e);
        key
    }

    #[test]
    fn frequency_counts_insertions() {
        let mut corpus = TemplateCorpus::new();
        let key = insert(&mut corpus, Tier::Full, "C1CCCCC1", "a");
        insert(&mut corpus, Tier::Full, "C1CCCCC1", "a");
        assert_eq!(corpus.frequency_of(Tier::Full, &key), 2);
        assert_eq!(corpus.frequency_of(Tier::Skeleton, &key), 0);
        assert_eq!(corpus.len(Tier::Full), 1);
        assert_eq!(corpus.total_entries(), 2);
    }

    #[test]
    fn threshold_filters_singletons() {
        let mut corpus = TemplateCorpus::new();
        let once = insert(&mut corpus, Tier::Skeleton, "C1CCNCC1", "x");
        assert!(corpus.export_tier(Tier::Skeleton, 2).is_empty());
        let exported = corpus.export_tier(Tier::Skeleton, 1);
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].0, once);
    }

    #[test]
    fn export_orders_by_frequency_then_key() {
        let mut corpus = TemplateCorpus::new();
        for _ in 0..3 {
            insert(&mut corpus, Tier::Full, "C1CCC1", "four");
        }
        for _ in 0..2 {
            insert(&mut corpus, Tier::Full, "C1CCCCC1", "six");
            insert(&mut corpus, Tier::Full, "C1CCCC1", "five");
        }
        let keys: Vec<String> = corpus
            .export_tier(Tier::Full, 2)
            .into_iter()
            .map(|(k, _)| k.into_string())
            .collect();
        assert_eq!(keys, ["C1CCC1", "C1CCCC1", "C1CCCCC1"]);
    }

    #[test]
    fn representative_is_first_inserted() {
        let mut corpus = TemplateCorpus::new();
        insert(&mut corpus, Tier::Full, "C1CCCCC1", "first");
        insert(&mut corpus, Tier::Full, "C1CCCCC1", "second");
        let exported = corpus.export_tier(Tier::Full, 1);
        assert_eq!(exported[0].1.title(), Some("first"));
    }

    #[test]
    fn library_prefers_most_general_tier() {
        let mut corpus = TemplateCorpus::new();
        insert(&mut corpus, Tier::Full, "C1CCCCC1", "full");
        insert(&mut corpus, Tier::Full, "C1CCCCC1", "full");
        insert(&mut corpus, Tier::Skeleton, "C1CCCCC1", "skeleton");
        insert(&mut corpus, Tier::Anonymous, "C1CCCCC1", "anonymous");
        insert(&mut corpus, Tier::Full, "C1CCNCC1", "full-n");
        insert(&mut corpus, Tier::Full, "C1CCNCC1", "full-n");
        insert(&mut corpus, Tier::Skeleton, "C1CCNCC1", "skeleton-n");

        let library = corpus.export_library(2);
        let titles: Vec<Option<&str>> = library.iter().map(|(_, e)| e.title()).collect();
        assert_eq!(titles, [Some("anonymous"), Some("skeleton-n")]);
    }

    #[test]
    fn empty_corpus() {
        let corpus = TemplateCorpus::new();
        assert!(corpus.is_empty());
        assert!(corpus.export_library(1).is_empty());
    }
}
