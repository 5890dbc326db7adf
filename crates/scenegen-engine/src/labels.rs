//! Label registry: symbolic cross-references between declarations.
//!
//! Labels are declared before any placement by every declaration that
//! attaches them, which leaves a placeholder per label. As declarations
//! complete they register their objects and settle their labels. A label
//! is only resolvable once every declaration providing it has settled;
//! until then lookups report [`Resolution::Pending`] and the planner
//! defers the dependent declaration.
//!
//! Resolving a group to a single object pins the choice, so later lookups
//! of the same label return the same object.

use indexmap::{IndexMap, IndexSet};
use rand::Rng;
use scenegen_core::{GenerationError, Label, ObjectId};

/// Outcome of a label lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The label is settled and non-empty.
    Ready(T),
    /// Some providing declaration has not run yet.
    Pending,
    /// Every provider ran but none created an object.
    Empty,
}

#[derive(Clone, Debug, Default)]
struct Group {
    members: Vec<ObjectId>,
    pending_providers: u32,
    pinned: Option<ObjectId>,
}

/// Label to object-group registry with dependency tracking.
#[derive(Clone, Debug, Default)]
pub struct LabelRegistry {
    groups: IndexMap<Label, Group>,
    deps: IndexMap<Label, IndexSet<Label>>,
}

impl LabelRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that one more declaration will provide `label`.
    pub fn declare(&mut self, label: &Label) {
        self.groups.entry(label.clone()).or_default().pending_providers += 1;
    }

    /// Whether any declaration provides `label`.
    pub fn is_declared(&self, label: &str) -> bool {
        self.groups.contains_key(label)
    }

    /// Add an object to a label's group, creating the label if needed.
    pub fn register(&mut self, label: &Label, id: ObjectId) {
        let group = self.groups.entry(label.clone()).or_default();
        if !group.members.contains(&id) {
            group.members.push(id);
        }
    }

    /// Mark one providing declaration of `label` as finished.
    pub fn settle(&mut self, label: &Label) {
        if let Some(group) = self.groups.get_mut(label.as_str()) {
            group.pending_providers = group.pending_providers.saturating_sub(1);
        }
    }

    /// Whether the label can be resolved now.
    pub fn is_settled(&self, label: &str) -> bool {
        self.groups
            .get(label)
            .is_some_and(|g| g.pending_providers == 0)
    }

    /// Resolve a label to one object. The first call on a settled group
    /// draws a member at random and pins it.
    ///
    /// # Errors
    ///
    /// [`GenerationError::Configuration`] if no declaration provides the
    /// label.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        label: &Label,
        rng: &mut R,
    ) -> Result<Resolution<ObjectId>, GenerationError> {
        let group = self
            .groups
            .get_mut(label.as_str())
            .ok_or_else(|| unknown(label))?;
        if group.pending_providers > 0 {
            return Ok(Resolution::Pending);
        }
        if let Some(id) = group.pinned {
            return Ok(Resolution::Ready(id));
        }
        if group.members.is_empty() {
            return Ok(Resolution::Empty);
        }
        let id = group.members[rng.random_range(0..group.members.len())];
        group.pinned = Some(id);
        Ok(Resolution::Ready(id))
    }

    /// Every object registered under a settled label, in registration
    /// order.
    ///
    /// # Errors
    ///
    /// [`GenerationError::Configuration`] if no declaration provides the
    /// label.
    pub fn resolve_group(&self, label: &Label) -> Result<Resolution<&[ObjectId]>, GenerationError> {
        let group = self.groups.get(label.as_str()).ok_or_else(|| unknown(label))?;
        Ok(if group.pending_providers > 0 {
            Resolution::Pending
        } else if group.members.is_empty() {
            Resolution::Empty
        } else {
            Resolution::Ready(&group.members)
        })
    }

    /// Record that objects labelled `dependent` are placed relative to
    /// objects labelled `dependency`.
    pub fn add_dependency(&mut self, dependent: &Label, dependency: &Label) {
        self.deps
            .entry(dependent.clone())
            .or_default()
            .insert(dependency.clone());
    }

    /// Fail if the dependency graph has a cycle.
    ///
    /// # Errors
    ///
    /// [`GenerationError::CyclicLabelDependency`] listing the labels
    /// along the first cycle found, with the first label repeated at the
    /// end.
    pub fn check_acyclic(&self) -> Result<(), GenerationError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }
        let mut marks: IndexMap<&Label, Mark> =
            self.deps.keys().map(|l| (l, Mark::New)).collect();
        for root in self.deps.keys() {
            if marks.get(root) != Some(&Mark::New) {
                continue;
            }
            let mut path: Vec<&Label> = vec![root];
            let mut stack: Vec<indexmap::set::Iter<'_, Label>> =
                vec![self.deps[root].iter()];
            marks.insert(root, Mark::Active);
            while let Some(iter) = stack.last_mut() {
                match iter.next() {
                    Some(next) => match marks.get(next).copied().unwrap_or(Mark::New) {
                        Mark::Active => {
                            let start = path.iter().position(|l| *l == next).unwrap_or(0);
                            let mut cycle: Vec<String> =
                                path[start..].iter().map(|l| l.to_string()).collect();
                            cycle.push(next.to_string());
                            return Err(GenerationError::CyclicLabelDependency { cycle });
                        }
                        Mark::Done => {}
                        Mark::New => {
                            marks.insert(next, Mark::Active);
                            path.push(next);
                            match self.deps.get(next) {
                                Some(children) => stack.push(children.iter()),
                                None => {
                                    marks.insert(next, Mark::Done);
                                    path.pop();
                                }
                            }
                        }
                    },
                    None => {
                        stack.pop();
                        if let Some(done) = path.pop() {
                            marks.insert(done, Mark::Done);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Labels with a provider that never settled.
    pub fn unresolved(&self) -> Vec<Label> {
        self.groups
            .iter()
            .filter(|(_, g)| g.pending_providers > 0)
            .map(|(l, _)| l.clone())
            .collect()
    }
}

fn unknown(label: &Label) -> GenerationError {
    GenerationError::config(
        format!("label `{label}`"),
        "referenced but not attached to any declaration",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn l(s: &str) -> Label {
        Label::from(s)
    }

    #[test]
    fn resolution_is_pinned() {
        let mut reg = LabelRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        reg.declare(&l("box"));
        for i in 0..5 {
            reg.register(&l("box"), ObjectId(i));
        }
        reg.settle(&l("box"));
        let first = reg.resolve(&l("box"), &mut rng).unwrap();
        for _ in 0..10 {
            assert_eq!(reg.resolve(&l("box"), &mut rng).unwrap(), first);
        }
    }

    #[test]
    fn placeholder_is_pending_until_every_provider_settles() {
        let mut reg = LabelRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        reg.declare(&l("t"));
        reg.declare(&l("t"));
        reg.register(&l("t"), ObjectId(0));
        reg.settle(&l("t"));
        assert_eq!(reg.resolve(&l("t"), &mut rng).unwrap(), Resolution::Pending);
        reg.settle(&l("t"));
        assert_eq!(
            reg.resolve(&l("t"), &mut rng).unwrap(),
            Resolution::Ready(ObjectId(0))
        );
        assert!(reg.unresolved().is_empty());
    }

    #[test]
    fn settled_empty_label_is_empty() {
        let mut reg = LabelRegistry::new();
        reg.declare(&l("none"));
        reg.settle(&l("none"));
        assert_eq!(reg.resolve_group(&l("none")).unwrap(), Resolution::Empty);
    }

    #[test]
    fn unknown_label_is_a_configuration_error() {
        let reg = LabelRegistry::new();
        assert!(matches!(
            reg.resolve_group(&l("ghost")),
            Err(GenerationError::Configuration { .. })
        ));
    }

    #[test]
    fn detects_cycle() {
        let mut reg = LabelRegistry::new();
        reg.add_dependency(&l("a"), &l("b"));
        reg.add_dependency(&l("b"), &l("c"));
        reg.add_dependency(&l("c"), &l("a"));
        match reg.check_acyclic() {
            Err(GenerationError::CyclicLabelDependency { cycle }) => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn diamond_is_acyclic() {
        let mut reg = LabelRegistry::new();
        reg.add_dependency(&l("a"), &l("b"));
        reg.add_dependency(&l("a"), &l("c"));
        reg.add_dependency(&l("b"), &l("d"));
        reg.add_dependency(&l("c"), &l("d"));
        assert!(reg.check_acyclic().is_ok());
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut reg = LabelRegistry::new();
        reg.add_dependency(&l("a"), &l("a"));
        assert!(reg.check_acyclic().is_err());
    }
}
