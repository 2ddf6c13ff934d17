use super::compartment::Compartment;
use super::engine::Engine;
use crate::NodeId;
use crate::sampling::groups::Groups;
use crate::sampling::tree::SumTree;

/// a value-typed copy of everything that changes during a run:
/// compartments, inert list, tree, groups, counters. restoring one
/// reproduces subsequent dynamics exactly (given the same generator
/// stream). snapshots never alias engine storage; the
/// quasistationary reservoir owns its slots outright.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub(crate) states: Vec<Compartment>,
    pub(crate) inert: Vec<NodeId>,
    pub(crate) tree: SumTree,
    pub(crate) groups: Groups,
    pub(crate) infected: usize,
    pub(crate) recovered: usize,
}

impl From<&Engine> for Snapshot {
    fn from(engine: &Engine) -> Self {
        Self {
            states: engine.states.clone(),
            inert: engine.inert.clone(),
            tree: engine.tree.clone(),
            groups: engine.groups.clone(),
            infected: engine.infected,
            recovered: engine.recovered,
        }
    }
}

impl Engine {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(self)
    }
    /// overwrite the dynamic state wholesale. O(N + G + members).
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.states.clone_from(&snapshot.states);
        self.inert.clone_from(&snapshot.inert);
        self.tree.clone_from(&snapshot.tree);
        self.groups.clone_from(&snapshot.groups);
        self.infected = snapshot.infected;
        self.recovered = snapshot.recovered;
    }
}
