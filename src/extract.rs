//! Per-record template extraction.
//!
//! [`TemplateExtractor::add`] runs one record through ring perception, the
//! reductions and signing, and files the results in its corpus. Records that
//! cannot yield an unambiguous template are skipped, never treated as errors.

use std::collections::HashSet;
use std::fmt;

use crate::corpus::{TemplateCorpus, TemplateEntry, Tier};
use crate::mol::MoleculeRecord;
use crate::reduce::{
    anonymous, has_explicit_hydrogens, has_template_orders, ring_only, ring_with_stubs, skeleton,
    suppress_hydrogens, whole_ring_kind, WholeRingKind,
};
use crate::rings::ring_systems;
use crate::signature::{signature, TemplateKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoRings,
    MultipleRingSystems,
    /// A ring bond is not a localized single or double bond.
    UnsupportedBondOrder,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoRings => "no rings",
            SkipReason::MultipleRingSystems => "more than one ring system",
            SkipReason::UnsupportedBondOrder => "ring bond order outside 1..=2",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The record was accepted; `inserted` entries went into the corpus.
    Accepted { inserted: usize },
    Skipped(SkipReason),
}

/// Running totals over every record passed to an extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub records: usize,
    pub accepted: usize,
    pub skipped: usize,
    /// Reductions dropped because they could not be signed.
    pub unsigned: usize,
}

#[derive(Debug, Default)]
pub struct TemplateExtractor {
    corpus: TemplateCorpus,
    stats: ExtractStats,
}

impl TemplateExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn corpus(&self) -> &TemplateCorpus {
        &self.corpus
    }

    pub fn into_corpus(self) -> TemplateCorpus {
        self.corpus
    }

    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    /// Process every record of `records`.
    pub fn extend<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a MoleculeRecord>,
    {
        for record in records {
            self.add(record);
        }
    }

    /// Process one record.
    ///
    /// An accepted record always files its ring-only skeleton and the
    /// anonymous ring in the full tier. When substituents are present the
    /// ring-with-stubs skeleton is filed there too. A molecule that is only
    /// its ring seeds the anonymous tier (all carbon) or the skeleton tier
    /// (with heteroatoms) instead of producing stubs. A key is filed at most
    /// once per tier for one record.
    pub fn add(&mut self, record: &MoleculeRecord) -> Outcome {
        self.stats.records += 1;
        let outcome = self.add_record(record);
        match outcome {
            Outcome::Accepted { .. } => self.stats.accepted += 1,
            Outcome::Skipped(reason) => {
                self.stats.skipped += 1;
                log::debug!(
                    "skipping record {:?}: {reason}",
                    record.title().unwrap_or_default()
                );
            }
        }
        outcome
    }

    fn add_record(&mut self, record: &MoleculeRecord) -> Outcome {
        let folded;
        let mol = if has_explicit_hydrogens(record) {
            folded = suppress_hydrogens(record);
            &folded
        } else {
            record
        };

        let systems = ring_systems(mol);
        if systems.is_empty() {
            return Outcome::Skipped(SkipReason::NoRings);
        }
        let Some(system) = systems.single() else {
            return Outcome::Skipped(SkipReason::MultipleRingSystems);
        };

        let ring = ring_only(mol, system);
        if !has_template_orders(&ring) {
            return Outcome::Skipped(SkipReason::UnsupportedBondOrder);
        }

        let mut filing = Filing::default();
        match whole_ring_kind(mol, system) {
            Some(WholeRingKind::AllCarbon) => {
                self.file(&mut filing, Tier::Anonymous, anonymous(&ring));
            }
            Some(WholeRingKind::Heteroatom) => {
                self.file(&mut filing, Tier::Skeleton, skeleton(&ring));
            }
            None => {
                let stubbed = ring_with_stubs(mol, system);
                self.file(&mut filing, Tier::Full, skeleton(&stubbed));
            }
        }
        self.file(&mut filing, Tier::Full, skeleton(&ring));
        self.file(&mut filing, Tier::Full, anonymous(&ring));

        Outcome::Accepted {
            inserted: filing.inserted,
        }
    }

    fn file(&mut self, filing: &mut Filing, tier: Tier, reduced: MoleculeRecord) {
        let key = match signature(&reduced) {
            Ok(key) => key,
            Err(err) => {
                self.stats.unsigned += 1;
                log::debug!(
                    "dropping {tier} reduction of {:?}: {err}",
                    reduced.title().unwrap_or_default()
                );
                return;
            }
        };
        if filing.seen.insert((tier, key.clone())) {
            self.corpus.insert(tier, key, TemplateEntry::new(reduced));
            filing.inserted += 1;
        }
    }
}

/// Keys filed for the record being processed.
#[derive(Default)]
struct Filing {
    seen: HashSet<(Tier, TemplateKey)>,
    inserted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;
    use crate::smiles::parse_smiles;

    fn record(s: &str) -> MoleculeRecord {
        parse_smiles(s).unwrap()
    }

    fn key(s: &str) -> TemplateKey {
        signature(&record(s)).unwrap()
    }

    #[test]
    fn acyclic_is_skipped() {
        let mut ex = TemplateExtractor::new();
        assert_eq!(ex.add(&record("CCCO")), Outcome::Skipped(SkipReason::NoRings));
        assert!(ex.corpus().is_empty());
    }

    #[test]
    fn two_ring_systems_are_skipped() {
        let mut ex = TemplateExtractor::new();
        assert_eq!(
            ex.add(&record("C1CCCCC1CCC1CCNCC1")),
            Outcome::Skipped(SkipReason::MultipleRingSystems)
        );
        assert!(ex.corpus().is_empty());
    }

    #[test]
    fn non_template_ring_orders_are_skipped() {
        let mut ex = TemplateExtractor::new();
        assert_eq!(
            ex.add(&record("C1CCCC#CCC1")),
            Outcome::Skipped(SkipReason::UnsupportedBondOrder)
        );
        let mut aromatic = record("C1CCCCC1");
        let edge = aromatic.bonds().next().unwrap();
        aromatic.bond_mut(edge).order = BondOrder::Aromatic;
        assert_eq!(
            ex.add(&aromatic),
            Outcome::Skipped(SkipReason::UnsupportedBondOrder)
        );
        assert!(ex.corpus().is_empty());
        assert_eq!(ex.stats().skipped, 2);
    }

    #[test]
    fn exocyclic_triple_bond_is_accepted() {
        let mut ex = TemplateExtractor::new();
        assert!(matches!(ex.add(&record("N#CC1CCCC1")), Outcome::Accepted { .. }));
    }

    #[test]
    fn carbocycle_seeds_anonymous_tier() {
        let mut ex = TemplateExtractor::new();
        assert_eq!(ex.add(&record("C1CCCCC1")), Outcome::Accepted { inserted: 2 });
        let corpus = ex.corpus();
        let ring = key("C1CCCCC1");
        assert_eq!(corpus.frequency_of(Tier::Anonymous, &ring), 1);
        assert_eq!(corpus.frequency_of(Tier::Full, &ring), 1);
        assert_eq!(corpus.len(Tier::Skeleton), 0);
    }

    #[test]
    fn heterocycle_seeds_skeleton_tier() {
        let mut ex = TemplateExtractor::new();
        assert_eq!(ex.add(&record("C1=CC=NC=C1")), Outcome::Accepted { inserted: 3 });
        let corpus = ex.corpus();
        assert_eq!(corpus.frequency_of(Tier::Skeleton, &key("C1=CC=NC=C1")), 1);
        assert_eq!(corpus.frequency_of(Tier::Full, &key("C1=CC=NC=C1")), 1);
        assert_eq!(corpus.frequency_of(Tier::Full, &key("C1CCCCC1")), 1);
        assert_eq!(corpus.len(Tier::Anonymous), 0);
    }

    #[test]
    fn substituted_ring_files_stubs() {
        let mut ex = TemplateExtractor::new();
        assert_eq!(ex.add(&record("CCCC1CCNCC1")), Outcome::Accepted { inserted: 3 });
        let corpus = ex.corpus();
        assert_eq!(corpus.frequency_of(Tier::Full, &key("CC1CCNCC1")), 1);
        assert_eq!(corpus.frequency_of(Tier::Full, &key("C1CCNCC1")), 1);
        assert_eq!(corpus.frequency_of(Tier::Full, &key("C1CCCCC1")), 1);
        assert_eq!(corpus.len(Tier::Skeleton), 0);
        assert_eq!(corpus.len(Tier::Anonymous), 0);
    }

    #[test]
    fn hydrogen_counts_do_not_split_keys() {
        let mut ex = TemplateExtractor::new();
        ex.add(&record("[CH2]1[CH2][CH2][NH][CH2][CH2]1"));
        ex.add(&record("C1CCNCC1"));
        assert_eq!(ex.corpus().frequency_of(Tier::Skeleton, &key("C1CCNCC1")), 2);
    }

    #[test]
    fn explicit_hydrogens_are_not_ring_substituents() {
        let mut ex = TemplateExtractor::new();
        ex.add(&record("[H]C1([H])CCCC1"));
        assert_eq!(ex.corpus().frequency_of(Tier::Anonymous, &key("C1CCCC1")), 1);
    }

    #[test]
    fn title_is_carried_into_entries() {
        let mut mol = record("OC1CCCC1");
        mol.set_title(Some("cyclopentanol".to_owned()));
        let mut ex = TemplateExtractor::new();
        ex.add(&mol);
        let entry = ex
            .corpus()
            .representative(Tier::Full, &key("OC1CCCC1"))
            .unwrap();
        assert_eq!(entry.title(), Some("cyclopentanol"));
    }

    #[test]
    fn stats_track_records() {
        let mut ex = TemplateExtractor::new();
        let records = [record("C1CC1"), record("CC"), record("C1CC1")];
        ex.extend(&records);
        assert_eq!(
            ex.stats(),
            ExtractStats {
                records: 3,
                accepted: 2,
                skipped: 1,
                unsigned: 0,
            }
        );
    }
}
