use super::compartment::Compartment;
use super::engine::Engine;
use crate::NodeId;
use rand::Rng;
use rand::rngs::SmallRng;

/// what a single draw from the process did. the facade uses this to
/// trace transmission chains; everything else only needs to know an
/// event was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// a susceptible neighbor caught the infection
    Transmission { source: NodeId, target: NodeId },
    /// an infected node left the infectious compartment
    Recovery(NodeId),
    /// a recovered node lost its immunity (SIRS)
    Waning(NodeId),
    /// a transmission attempt hit a non-susceptible neighbor;
    /// the event is consumed but nothing changes
    Contact { source: NodeId, target: NodeId },
    /// nothing can fire: the total event rate is zero
    Stalled,
}

impl Engine {
    /// draw and apply one event.
    ///
    /// group selection walks the sum tree, so a group is chosen in
    /// proportion to its aggregate rate; the node within the group
    /// is found by acceptance-rejection against the group envelope,
    /// which accepts each member with probability proportional to
    /// its propensity. combined, node u fires with probability
    /// rho(u) / R per event, at expected O(base) rejections.
    pub fn update_event(&mut self, rng: &mut SmallRng) -> Event {
        let group = match self.tree.sample(rng.random::<f64>()) {
            Some(group) => group,
            None => return Event::Stalled,
        };
        if self.groups.is_empty(group) {
            // reachable only through a boundary tie on a zero
            // weight leaf; consume the draw without an event
            return Event::Stalled;
        }
        let envelope = self.groups.envelope(group);
        let (slot, node, propensity) = loop {
            let slot = (rng.random::<f64>() * self.groups.len(group) as f64) as usize;
            let (node, propensity) = self.groups.at(group, slot);
            if rng.random::<f64>() < propensity / envelope {
                break (slot, node, propensity);
            }
        };
        match self.states[node] {
            Compartment::Recovered => {
                self.immunity_loss(group, slot);
                Event::Waning(node)
            }
            Compartment::Infected => {
                if rng.random::<f64>() < self.rates.recovery() / propensity {
                    self.recover(group, slot);
                    Event::Recovery(node)
                } else {
                    let neighbors = self.graph.neighbors(node);
                    let pick = (rng.random::<f64>() * neighbors.len() as f64) as usize;
                    let target = neighbors[pick];
                    if self.is_susceptible(target) {
                        self.infect(target);
                        Event::Transmission {
                            source: node,
                            target,
                        }
                    } else {
                        Event::Contact {
                            source: node,
                            target,
                        }
                    }
                }
            }
            Compartment::Susceptible => {
                unreachable!("susceptible node {} held a propensity", node)
            }
        }
    }
}
