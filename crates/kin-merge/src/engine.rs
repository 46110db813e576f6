//! Public entry point for merges.

use std::sync::Arc;

use kin_store::{Datastore, IntegrityIssue, Transaction};
use kin_types::{EntityKind, Family, Handle, Person};
use tracing::{info, warn};

use crate::alignment::SlotAlignment;
use crate::config::MergeConfig;
use crate::error::{MergeError, MergeResult};
use crate::family;
use crate::person;
use crate::session::Session;
use crate::summary::MergeSummary;
use crate::validator::check_person_pair;

/// Runs person and family merges against a datastore.
///
/// Every call is all-or-nothing: it either commits one transaction holding
/// the whole cascade or leaves the datastore exactly as it found it.
pub struct MergeEngine {
    store: Arc<dyn Datastore>,
    config: MergeConfig,
}

impl MergeEngine {
    pub fn new(store: Arc<dyn Datastore>, config: MergeConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: Arc<dyn Datastore>) -> Self {
        Self::new(store, MergeConfig::default())
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Datastore> {
        &self.store
    }

    /// Merge person `casualty` into person `survivor`.
    pub fn merge_person(&self, survivor: Handle, casualty: Handle) -> MergeResult<MergeSummary> {
        let (kept, gone) = self.person_pair(survivor, casualty)?;
        check_person_pair(&kept, &gone)?;

        let mut session = Session::new(
            Transaction::begin(self.store.as_ref(), "Merge Person"),
            &self.config,
        );
        let outcome = person::merge_persons(&mut session, survivor, casualty);
        self.conclude(session, outcome, EntityKind::Person, survivor, casualty)
    }

    /// Merge family `casualty` into family `survivor`, pairing parents by
    /// [`SlotAlignment::detect`].
    pub fn merge_family(&self, survivor: Handle, casualty: Handle) -> MergeResult<MergeSummary> {
        let (kept, gone) = self.family_pair(survivor, casualty)?;
        let alignment = SlotAlignment::detect(&kept, &gone);
        self.merge_family_aligned(survivor, casualty, alignment)
    }

    /// Merge family `casualty` into family `survivor` with an explicit
    /// pairing of parents.
    pub fn merge_family_aligned(
        &self,
        survivor: Handle,
        casualty: Handle,
        alignment: SlotAlignment,
    ) -> MergeResult<MergeSummary> {
        let (kept, gone) = self.family_pair(survivor, casualty)?;
        family::prevalidate(self.store.as_ref(), &kept, &gone, alignment)?;

        let mut session = Session::new(
            Transaction::begin(self.store.as_ref(), "Merge Family"),
            &self.config,
        );
        let outcome = family::merge_families(&mut session, survivor, casualty, alignment);
        self.conclude(session, outcome, EntityKind::Family, survivor, casualty)
    }

    /// Run the person checks without writing anything.
    pub fn can_merge_persons(&self, p1: Handle, p2: Handle) -> MergeResult<()> {
        let (a, b) = self.person_pair(p1, p2)?;
        check_person_pair(&a, &b)
    }

    /// Run the family checks without writing anything. Returns the
    /// alignment a [`merge_family`](Self::merge_family) call would use.
    pub fn can_merge_families(&self, f1: Handle, f2: Handle) -> MergeResult<SlotAlignment> {
        let (a, b) = self.family_pair(f1, f2)?;
        let alignment = SlotAlignment::detect(&a, &b);
        family::prevalidate(self.store.as_ref(), &a, &b, alignment)?;
        Ok(alignment)
    }

    pub fn can_merge_families_aligned(
        &self,
        f1: Handle,
        f2: Handle,
        alignment: SlotAlignment,
    ) -> MergeResult<()> {
        let (a, b) = self.family_pair(f1, f2)?;
        family::prevalidate(self.store.as_ref(), &a, &b, alignment)
    }

    pub fn check_integrity(&self) -> MergeResult<Vec<IntegrityIssue>> {
        Ok(self.store.check_integrity()?)
    }

    fn conclude(
        &self,
        session: Session<'_>,
        outcome: MergeResult<()>,
        kind: EntityKind,
        survivor: Handle,
        casualty: Handle,
    ) -> MergeResult<MergeSummary> {
        if let Err(err) = outcome {
            session.abort();
            warn!(
                %kind,
                survivor = %survivor.short_id(),
                casualty = %casualty.short_id(),
                error = %err,
                "merge rolled back"
            );
            return Err(err);
        }

        let summary = session.finish(kind, survivor)?;
        info!(
            %kind,
            survivor = %survivor.short_id(),
            casualty = %casualty.short_id(),
            persons_merged = summary.persons_merged.len(),
            families_collapsed = summary.families_collapsed.len(),
            "merge committed"
        );

        if self.config.check_integrity_after_merge {
            for issue in self.store.check_integrity()? {
                warn!(%issue, "integrity issue after merge");
            }
        }
        Ok(summary)
    }

    fn check_handles(first: Handle, second: Handle) -> MergeResult<()> {
        if first.is_null() || second.is_null() {
            return Err(MergeError::NullHandle);
        }
        if first == second {
            return Err(MergeError::SameHandle(first));
        }
        Ok(())
    }

    fn person_pair(&self, first: Handle, second: Handle) -> MergeResult<(Person, Person)> {
        Self::check_handles(first, second)?;
        let fetch = |h: Handle| {
            self.store.get_person(&h)?.ok_or(MergeError::NotFound {
                kind: EntityKind::Person,
                handle: h,
            })
        };
        Ok((fetch(first)?, fetch(second)?))
    }

    fn family_pair(&self, first: Handle, second: Handle) -> MergeResult<(Family, Family)> {
        Self::check_handles(first, second)?;
        let fetch = |h: Handle| {
            self.store.get_family(&h)?.ok_or(MergeError::NotFound {
                kind: EntityKind::Family,
                handle: h,
            })
        };
        Ok((fetch(first)?, fetch(second)?))
    }
}

impl std::fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TreeBuilder;
    use kin_store::InMemoryDatastore;
    use proptest::prelude::*;

    #[test]
    fn null_and_same_handles_rejected() {
        let engine = MergeEngine::with_defaults(Arc::new(InMemoryDatastore::new()));
        let h = Handle::new();
        assert!(matches!(
            engine.merge_person(Handle::null(), h),
            Err(MergeError::NullHandle)
        ));
        assert!(matches!(
            engine.merge_family(h, h),
            Err(MergeError::SameHandle(x)) if x == h
        ));
    }

    #[test]
    fn can_merge_persons_reports_conflict_without_writing() {
        let mut tree = TreeBuilder::new();
        let (a, b, c) = (tree.person("I1"), tree.person("I2"), tree.person("I3"));
        tree.family("F1", Some(a), Some(b), &[]);
        let store = tree.build();
        let engine = MergeEngine::with_defaults(store.clone());

        assert!(engine.can_merge_persons(a, b).is_err());
        assert!(engine.can_merge_persons(a, c).is_ok());
        assert_eq!(store.person_count().unwrap(), 3);
    }

    #[test]
    fn depth_limit_rolls_back() {
        // A family merge that merges a parent needs depth 2.
        let mut tree = TreeBuilder::new();
        let (d1, d2, m) = (tree.person("I1"), tree.person("I2"), tree.person("I3"));
        let f1 = tree.family("F1", Some(d1), Some(m), &[]);
        let f2 = tree.family("F2", Some(d2), Some(m), &[]);
        let store = tree.build();
        let before = store.snapshot().unwrap();
        let config = MergeConfig {
            max_cascade_depth: 1,
            ..Default::default()
        };
        let engine = MergeEngine::new(store.clone(), config);

        let err = engine.merge_family(f1, f2).unwrap_err();
        assert!(matches!(err, MergeError::CascadeDepthExceeded { depth: 1 }));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn casualty_handle_is_retired() {
        let mut tree = TreeBuilder::new();
        let (a, b) = (tree.person("I1"), tree.person("I2"));
        let store = tree.build();
        let engine = MergeEngine::with_defaults(store.clone());

        engine.merge_person(a, b).unwrap();
        assert!(store.is_retired(&b).unwrap());
        let err = engine.merge_person(a, b).unwrap_err();
        assert!(matches!(err, MergeError::NotFound { .. }));
    }

    #[test]
    fn audited_merge_succeeds() {
        let mut tree = TreeBuilder::new();
        let (a, b) = (tree.person("I1"), tree.person("I2"));
        let store = tree.build();
        let engine = MergeEngine::new(store, MergeConfig::audited());
        let summary = engine.merge_person(a, b).unwrap();
        assert_eq!(summary.survivor, a);
        assert!(engine.check_integrity().unwrap().is_empty());
    }

    #[test]
    fn summary_serializes() {
        let mut tree = TreeBuilder::new();
        let (a, b) = (tree.person("I1"), tree.person("I2"));
        let engine = MergeEngine::with_defaults(tree.build());
        let summary = engine.merge_person(a, b).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kind"], "Person");
        assert_eq!(json["persons_merged"].as_array().unwrap().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Merging two people from unrelated families always succeeds and
        /// leaves the datastore consistent.
        #[test]
        fn unrelated_people_always_merge(
            s_kids in 0usize..3,
            c_kids in 0usize..3,
            share_spouse in any::<bool>(),
            s_is_child in any::<bool>(),
            c_is_child in any::<bool>(),
        ) {
            let mut tree = TreeBuilder::new();
            let s = tree.person("S");
            let c = tree.person("C");
            let w1 = tree.person("W1");
            let w2 = if share_spouse { w1 } else { tree.person("W2") };

            let s_children: Vec<Handle> = (0..s_kids).map(|i| tree.person(&format!("SK{i}"))).collect();
            let c_children: Vec<Handle> = (0..c_kids).map(|i| tree.person(&format!("CK{i}"))).collect();
            tree.family("FS", Some(s), Some(w1), &s_children);
            tree.family("FC", Some(c), Some(w2), &c_children);
            if s_is_child {
                let gp = tree.person("GP1");
                tree.family("FG1", Some(gp), None, &[s]);
            }
            if c_is_child {
                let gp = tree.person("GP2");
                tree.family("FG2", None, Some(gp), &[c]);
            }
            let store = tree.build();
            let engine = MergeEngine::with_defaults(store.clone());

            let summary = engine.merge_person(s, c).unwrap();
            prop_assert_eq!(summary.persons_merged, vec![c]);
            prop_assert_eq!(summary.families_collapsed.len(), usize::from(share_spouse));
            prop_assert!(store.get_person(&c).unwrap().is_none());
            prop_assert!(store.find_backlink_handles(&c).unwrap().is_empty());
            prop_assert!(store.check_integrity().unwrap().is_empty());

            let kept = store.get_person(&s).unwrap().unwrap();
            let expected_families = if share_spouse { 1 } else { 2 };
            prop_assert_eq!(kept.family_list.len(), expected_families);
            prop_assert_eq!(kept.parent_family_list.len(), usize::from(s_is_child) + usize::from(c_is_child));
        }
    }
}
