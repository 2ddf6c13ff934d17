use super::binning::Binning;
use crate::GroupIndex;
use crate::NodeId;
use crate::Propensity;

/// dense per-bin membership lists for the rejection sampler.
///
/// each group is an insertion-ordered but position-meaningless
/// vector of (node, propensity). removal swaps the victim with the
/// tail and pops, so both insert and remove are O(1); nothing
/// outside the group ever holds an in-group position across events.
/// each group also carries its rejection envelope: the largest
/// propensity its bin can contain, which bounds the expected number
/// of rejections per event by the bin base.
#[derive(Debug, Clone, PartialEq)]
pub struct Groups {
    members: Vec<Vec<(NodeId, Propensity)>>,
    envelopes: Vec<Propensity>,
}

impl From<&Binning> for Groups {
    fn from(binning: &Binning) -> Self {
        let bins = binning.bins();
        let mut envelopes = (0..bins)
            .map(|k| binning.min() * binning.base().powi(k as i32 + 1))
            .collect::<Vec<_>>();
        envelopes[bins - 1] = binning.max();
        Self {
            members: vec![Vec::new(); bins],
            envelopes,
        }
    }
}

impl Groups {
    /// reserve capacity so the steady state never reallocates.
    pub fn reserve(mut self, nodes: usize) -> Self {
        for group in self.members.iter_mut() {
            group.reserve(nodes);
        }
        self
    }
    pub fn groups(&self) -> usize {
        self.members.len()
    }
    pub fn len(&self, k: GroupIndex) -> usize {
        self.members[k].len()
    }
    pub fn is_empty(&self, k: GroupIndex) -> bool {
        self.members[k].is_empty()
    }
    pub fn at(&self, k: GroupIndex, i: usize) -> (NodeId, Propensity) {
        self.members[k][i]
    }
    pub fn envelope(&self, k: GroupIndex) -> Propensity {
        self.envelopes[k]
    }
    /// sum of member propensities; mirrors the tree leaf for
    /// invariant checks, not used on the event path.
    pub fn rate(&self, k: GroupIndex) -> f64 {
        self.members[k].iter().map(|(_, p)| p).sum()
    }
    pub fn push(&mut self, k: GroupIndex, node: NodeId, propensity: Propensity) -> usize {
        self.members[k].push((node, propensity));
        self.members[k].len() - 1
    }
    pub fn remove(&mut self, k: GroupIndex, i: usize) -> (NodeId, Propensity) {
        let group = &mut self.members[k];
        assert!(i < group.len(), "removal from group {} at empty slot {}", k, i);
        group.swap_remove(i)
    }
}
