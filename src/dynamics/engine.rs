use super::compartment::Compartment;
use super::rates::Model;
use super::rates::Rates;
use crate::GroupIndex;
use crate::NodeId;
use crate::Rate;
use crate::graph::Graph;
use crate::sampling::binning::Binning;
use crate::sampling::groups::Groups;
use crate::sampling::tree::SumTree;
use std::sync::Arc;

/// the mutable core of one simulation: per-node compartments, the
/// propensity groups, the sum tree over group rates, and the I/R
/// counters. the graph is shared read-only; everything else is
/// exclusively owned and sized once at construction.
///
/// infected nodes carry propensity beta * degree + gamma in the bin
/// cached for their degree; recovered nodes carry alpha in the
/// waning bin, but only under SIRS. recovered nodes of an SIR run
/// are inert and sit in a side list so reset stays O(I + R).
pub struct Engine {
    pub(crate) graph: Arc<Graph>,
    pub(crate) rates: Rates,
    pub(crate) groups: Groups,
    pub(crate) tree: SumTree,
    pub(crate) states: Vec<Compartment>,
    pub(crate) inert: Vec<NodeId>,
    pub(crate) infected: usize,
    pub(crate) recovered: usize,
    pub(crate) degree_group: Vec<GroupIndex>,
    pub(crate) waning_group: Option<GroupIndex>,
}

impl Engine {
    pub fn new(graph: Arc<Graph>, rates: Rates, base: f64) -> anyhow::Result<Self> {
        anyhow::ensure!(graph.size() > 0, "graph must contain at least one node");
        let (lo, hi) = graph.degree_bounds();
        let (min, max) = match rates.model() {
            Model::SIRS => (
                rates.propensity(lo).min(rates.waning()),
                rates.propensity(hi).max(rates.waning()),
            ),
            _ => (rates.propensity(lo), rates.propensity(hi)),
        };
        let binning = Binning::new(min, max, base)?;
        let groups = Groups::from(&binning).reserve(graph.size());
        let tree = SumTree::new(binning.bins());
        let degree_group = (0..=hi)
            .map(|d| match d < lo {
                true => 0,
                false => binning.index(rates.propensity(d)),
            })
            .collect();
        let waning_group = match rates.model() {
            Model::SIRS => Some(binning.index(rates.waning())),
            _ => None,
        };
        Ok(Self {
            states: vec![Compartment::Susceptible; graph.size()],
            inert: Vec::with_capacity(graph.size()),
            infected: 0,
            recovered: 0,
            graph,
            rates,
            groups,
            tree,
            degree_group,
            waning_group,
        })
    }

    pub fn size(&self) -> usize {
        self.graph.size()
    }
    pub fn rates(&self) -> &Rates {
        &self.rates
    }
    pub fn model(&self) -> Model {
        self.rates.model()
    }
    pub fn is_susceptible(&self, node: NodeId) -> bool {
        self.states[node] == Compartment::Susceptible
    }
    pub fn is_infected(&self, node: NodeId) -> bool {
        self.states[node] == Compartment::Infected
    }
    pub fn is_recovered(&self, node: NodeId) -> bool {
        self.states[node] == Compartment::Recovered
    }
    pub fn infected(&self) -> usize {
        self.infected
    }
    pub fn recovered(&self) -> usize {
        self.recovered
    }
    pub fn susceptible(&self) -> usize {
        self.size() - self.infected - self.recovered
    }
    /// instantaneous global event rate; the root of the sum tree.
    pub fn total_rate(&self) -> Rate {
        self.tree.total()
    }
    pub fn prevalence(&self) -> f64 {
        self.infected as f64 / self.size() as f64
    }
    pub fn incidence(&self) -> f64 {
        self.recovered as f64 / self.size() as f64
    }
    fn collect(&self, compartment: Compartment) -> Vec<NodeId> {
        self.states
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == compartment)
            .map(|(u, _)| u)
            .collect()
    }
    pub fn susceptible_set(&self) -> Vec<NodeId> {
        self.collect(Compartment::Susceptible)
    }
    pub fn infected_set(&self) -> Vec<NodeId> {
        self.collect(Compartment::Infected)
    }
    pub fn recovered_set(&self) -> Vec<NodeId> {
        self.collect(Compartment::Recovered)
    }

    /// no event can change the infected count ever again. SIR and SI
    /// absorb at extinction; SIS and SIRS only once immunity has
    /// fully waned too. SI additionally freezes at saturation: with
    /// no recovery, a fully infected neighborhood can only produce
    /// rejected contacts forever.
    pub fn is_absorbed(&self) -> bool {
        match self.model() {
            Model::SIR => self.infected == 0,
            Model::SI => self.infected == 0 || self.susceptible() == 0,
            Model::SIS | Model::SIRS => self.infected == 0 && self.recovered == 0,
        }
    }

    /// susceptible -> infected. the node enters the bin cached for
    /// its degree with propensity beta * degree + gamma.
    pub fn infect(&mut self, node: NodeId) {
        assert!(
            self.is_susceptible(node),
            "cannot infect node {}: not susceptible",
            node
        );
        let propensity = self.rates.propensity(self.graph.degree(node));
        let group = self.degree_group[self.graph.degree(node)];
        self.states[node] = Compartment::Infected;
        self.groups.push(group, node, propensity);
        self.tree.add(group, propensity);
        self.infected += 1;
    }

    /// infected -> out of the infectious compartment, addressed by
    /// its (group, slot) as handed out by the sampler. where the
    /// node lands depends on the model.
    pub fn recover(&mut self, group: GroupIndex, slot: usize) {
        let (node, propensity) = self.groups.at(group, slot);
        assert!(
            self.is_infected(node),
            "cannot recover node {}: not infected",
            node
        );
        self.groups.remove(group, slot);
        self.tree.add(group, -propensity);
        self.infected -= 1;
        match self.model() {
            Model::SIS => {
                self.states[node] = Compartment::Susceptible;
            }
            Model::SIRS => {
                self.states[node] = Compartment::Recovered;
                self.recovered += 1;
                let waning = self.waning_group.expect("waning bin exists under SIRS");
                self.groups.push(waning, node, self.rates.waning());
                self.tree.add(waning, self.rates.waning());
            }
            Model::SIR | Model::SI => {
                self.states[node] = Compartment::Recovered;
                self.recovered += 1;
                self.inert.push(node);
            }
        }
    }

    /// recovered -> susceptible; SIRS only.
    pub fn immunity_loss(&mut self, group: GroupIndex, slot: usize) {
        let (node, propensity) = self.groups.at(group, slot);
        assert!(
            self.is_recovered(node),
            "cannot wane node {}: not recovered",
            node
        );
        self.groups.remove(group, slot);
        self.tree.add(group, -propensity);
        self.states[node] = Compartment::Susceptible;
        self.recovered -= 1;
    }

    /// place a susceptible node straight into the recovered
    /// compartment. initialization and R0 setup only.
    pub fn set_recovered(&mut self, node: NodeId) {
        assert!(
            self.is_susceptible(node),
            "cannot set node {} recovered: not susceptible",
            node
        );
        match self.model() {
            Model::SIR => {
                self.states[node] = Compartment::Recovered;
                self.recovered += 1;
                self.inert.push(node);
            }
            Model::SIRS => {
                self.states[node] = Compartment::Recovered;
                self.recovered += 1;
                let waning = self.waning_group.expect("waning bin exists under SIRS");
                self.groups.push(waning, node, self.rates.waning());
                self.tree.add(waning, self.rates.waning());
            }
            model => panic!("recovered compartment undefined under {:?}", model),
        }
    }

    /// drain every group and the inert list back to all-susceptible
    /// in O(I + R). group contents are popped from the tail through
    /// the regular transitions so the tree and counters wind down
    /// with them; the one subtlety is SIRS, where draining an
    /// infected node refills the waning bin and that bin must be
    /// drained last.
    pub fn reset(&mut self) {
        for group in 0..self.groups.groups() {
            self.drain(group);
        }
        if let Some(waning) = self.waning_group {
            self.drain(waning);
        }
        while let Some(node) = self.inert.pop() {
            self.states[node] = Compartment::Susceptible;
            self.recovered -= 1;
        }
        debug_assert!(self.infected == 0 && self.recovered == 0);
        debug_assert!(self.tree.total().abs() < 1e-9);
        self.tree.reset();
    }

    fn drain(&mut self, group: GroupIndex) {
        while !self.groups.is_empty(group) {
            let slot = self.groups.len(group) - 1;
            let (node, _) = self.groups.at(group, slot);
            match self.states[node] {
                Compartment::Infected => self.recover(group, slot),
                Compartment::Recovered => self.immunity_loss(group, slot),
                Compartment::Susceptible => {
                    unreachable!("susceptible node {} held a propensity", node)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(edges: Vec<(NodeId, NodeId)>, rates: (f64, f64, f64)) -> Engine {
        let graph = Arc::new(Graph::from(edges));
        let rates = Rates::new(rates.0, rates.1, rates.2).unwrap();
        Engine::new(graph, rates, 2.).unwrap()
    }

    /// the one node-keyed lookup in the codebase, deliberately kept
    /// out of the hot path: tests only.
    fn locate(engine: &Engine, node: NodeId) -> Option<(GroupIndex, usize)> {
        (0..engine.groups.groups()).find_map(|k| {
            (0..engine.groups.len(k))
                .find(|&i| engine.groups.at(k, i).0 == node)
                .map(|i| (k, i))
        })
    }

    fn group_rate_sum(engine: &Engine) -> f64 {
        (0..engine.groups.groups())
            .map(|k| engine.groups.rate(k))
            .sum()
    }

    #[test]
    fn infection_files_the_node_under_its_degree_bin() {
        let mut engine = engine(vec![(0, 1), (1, 2), (1, 3)], (1., 2., 0.));
        engine.infect(1);
        assert_eq!(engine.infected(), 1);
        assert!(engine.is_infected(1));
        let (k, i) = locate(&engine, 1).unwrap();
        assert_eq!(engine.groups.at(k, i), (1, 5.));
        assert!((engine.total_rate() - 5.).abs() < 1e-12);
        assert!((group_rate_sum(&engine) - engine.total_rate()).abs() < 1e-12);
    }

    #[test]
    fn sis_recovery_returns_the_node_to_susceptible() {
        let mut engine = engine(vec![(0, 1)], (1., 1., f64::INFINITY));
        engine.infect(0);
        let (k, i) = locate(&engine, 0).unwrap();
        engine.recover(k, i);
        assert!(engine.is_susceptible(0));
        assert_eq!(engine.infected(), 0);
        assert_eq!(engine.recovered(), 0);
        assert!(engine.total_rate().abs() < 1e-12);
        assert!(engine.is_absorbed());
    }

    #[test]
    fn sir_recovery_goes_inert() {
        let mut engine = engine(vec![(0, 1)], (1., 1., 0.));
        engine.infect(0);
        let (k, i) = locate(&engine, 0).unwrap();
        engine.recover(k, i);
        assert!(engine.is_recovered(0));
        assert_eq!(engine.recovered(), 1);
        assert_eq!(engine.inert, vec![0]);
        assert!(locate(&engine, 0).is_none());
        assert!(engine.is_absorbed());
    }

    #[test]
    fn sirs_recovery_files_the_node_under_the_waning_bin() {
        let mut engine = engine(vec![(0, 1), (0, 2)], (1., 1., 0.5));
        engine.infect(0);
        engine.infect(1);
        let (k, i) = locate(&engine, 0).unwrap();
        engine.recover(k, i);
        assert!(engine.is_recovered(0));
        assert_eq!(engine.recovered(), 1);
        let (waning, slot) = locate(&engine, 0).unwrap();
        assert_eq!(engine.groups.at(waning, slot), (0, 0.5));
        assert!(!engine.is_absorbed());
        engine.immunity_loss(waning, slot);
        assert!(engine.is_susceptible(0));
        assert_eq!(engine.recovered(), 0);
        assert!((group_rate_sum(&engine) - engine.total_rate()).abs() < 1e-12);
    }

    #[test]
    fn each_active_node_appears_in_exactly_one_bin() {
        let mut engine = engine(vec![(0, 1), (1, 2), (2, 3), (3, 4)], (2., 1., 0.25));
        engine.infect(1);
        engine.infect(3);
        engine.set_recovered(0);
        let members = (0..engine.groups.groups())
            .flat_map(|k| (0..engine.groups.len(k)).map(move |i| (k, i)))
            .count();
        assert_eq!(members, 3);
        for node in [0, 1, 3] {
            assert!(locate(&engine, node).is_some());
        }
    }

    #[test]
    fn si_freezes_at_saturation() {
        let mut engine = engine(vec![(0, 1)], (1., 0., 0.));
        engine.infect(0);
        assert!(!engine.is_absorbed());
        engine.infect(1);
        assert!(engine.is_absorbed());
    }

    #[test]
    fn reset_restores_the_all_susceptible_state() {
        let mut engine = engine(vec![(0, 1), (1, 2), (0, 2), (2, 3)], (1., 1., 0.5));
        engine.infect(0);
        engine.infect(2);
        engine.set_recovered(3);
        let (k, i) = locate(&engine, 0).unwrap();
        engine.recover(k, i);
        engine.reset();
        assert_eq!(engine.infected(), 0);
        assert_eq!(engine.recovered(), 0);
        assert_eq!(engine.susceptible(), 4);
        assert_eq!(engine.total_rate(), 0.);
        assert!((0..engine.groups.groups()).all(|k| engine.groups.is_empty(k)));
        assert!(engine.states.iter().all(|&c| c == Compartment::Susceptible));
    }

    #[test]
    fn reset_drains_the_sir_inert_list() {
        let mut engine = engine(vec![(0, 1), (1, 2)], (1., 1., 0.));
        engine.infect(0);
        let (k, i) = locate(&engine, 0).unwrap();
        engine.recover(k, i);
        engine.set_recovered(2);
        engine.reset();
        assert!(engine.inert.is_empty());
        assert_eq!(engine.susceptible(), 3);
    }

    #[test]
    #[should_panic]
    fn infecting_an_infected_node_is_a_bug() {
        let mut engine = engine(vec![(0, 1)], (1., 1., 0.));
        engine.infect(0);
        engine.infect(0);
    }

    #[test]
    #[should_panic]
    fn set_recovered_is_undefined_under_sis() {
        let mut engine = engine(vec![(0, 1)], (1., 1., f64::INFINITY));
        engine.set_recovered(0);
    }

    #[test]
    fn sets_reflect_the_state_vector() {
        let mut engine = engine(vec![(0, 1), (1, 2), (2, 3)], (1., 1., 0.));
        engine.infect(1);
        engine.set_recovered(3);
        assert_eq!(engine.susceptible_set(), vec![0, 2]);
        assert_eq!(engine.infected_set(), vec![1]);
        assert_eq!(engine.recovered_set(), vec![3]);
        assert_eq!(engine.susceptible(), 2);
    }
}
