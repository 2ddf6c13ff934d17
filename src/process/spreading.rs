use super::series::Sample;
use super::series::TimeSeries;
use crate::DEFAULT_BASE;
use crate::DEFAULT_SEED;
use crate::NodeId;
use crate::Time;
use crate::dynamics::engine::Engine;
use crate::dynamics::rates::Model;
use crate::dynamics::rates::Rates;
use crate::dynamics::sampler::Event;
use crate::graph::Graph;
use crate::sampling::lifetime::Exponential;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::BTreeSet;
use std::sync::Arc;

/// the simulation facade: one engine, one generator, the lifetime
/// table, and the recorded history of one run.
///
/// a run is a pure function of (graph, rates, seed, initial
/// condition, horizon): every draw goes through the single owned
/// generator, so reruns reproduce the time series bit for bit.
/// `reset` deliberately does not reseed; only `initialize_*` takes
/// a seed.
pub struct Spreading {
    pub(crate) engine: Engine,
    pub(crate) rng: SmallRng,
    pub(crate) lifetimes: Exponential,
    pub(crate) series: TimeSeries,
    pub(crate) transmissions: Vec<(NodeId, NodeId)>,
    pub(crate) tracing: bool,
}

impl Spreading {
    pub fn new(graph: Graph, rates: Rates) -> anyhow::Result<Self> {
        Self::with_base(graph, rates, DEFAULT_BASE)
    }
    pub fn with_base(graph: Graph, rates: Rates, base: f64) -> anyhow::Result<Self> {
        Ok(Self {
            engine: Engine::new(Arc::new(graph), rates, base)?,
            rng: SmallRng::seed_from_u64(DEFAULT_SEED),
            lifetimes: Exponential::default(),
            series: TimeSeries::default(),
            transmissions: Vec::new(),
            tracing: false,
        })
    }

    pub fn size(&self) -> usize {
        self.engine.size()
    }
    pub fn infected(&self) -> usize {
        self.engine.infected()
    }
    pub fn recovered(&self) -> usize {
        self.engine.recovered()
    }
    pub fn susceptible(&self) -> usize {
        self.engine.susceptible()
    }
    pub fn is_absorbed(&self) -> bool {
        self.engine.is_absorbed()
    }
    pub fn time_series(&self) -> &TimeSeries {
        &self.series
    }
    pub fn susceptible_set(&self) -> Vec<NodeId> {
        self.engine.susceptible_set()
    }
    pub fn infected_set(&self) -> Vec<NodeId> {
        self.engine.infected_set()
    }
    pub fn recovered_set(&self) -> Vec<NodeId> {
        self.engine.recovered_set()
    }
    /// record (source, target) for every successful transmission.
    /// the trace lives until the flag is dropped or the process is
    /// reset.
    pub fn set_tracing(&mut self, tracing: bool) {
        self.tracing = tracing;
    }
    pub fn transmissions(&self) -> &[(NodeId, NodeId)] {
        &self.transmissions
    }

    /// infect uniformly chosen nodes until a fraction of the
    /// population is infected, then record the initial sample.
    pub fn initialize_random(&mut self, fraction: f64, seed: u64) -> anyhow::Result<()> {
        anyhow::ensure!(
            (0. ..=1.).contains(&fraction),
            "initial infected fraction must lie in [0, 1], got {}",
            fraction
        );
        self.rng = SmallRng::seed_from_u64(seed);
        let target = (fraction * self.size() as f64).floor() as usize;
        while self.engine.infected() < target {
            let node = (self.rng.random::<f64>() * self.size() as f64) as usize;
            if self.engine.is_susceptible(node) {
                self.engine.infect(node);
            }
        }
        self.mark();
        log::info!(
            "initialized {} of {} nodes infected",
            self.infected(),
            self.size()
        );
        Ok(())
    }

    /// infect and immunize explicit node sets, optionally reseeding
    /// the generator, then record the initial sample.
    pub fn initialize(&mut self, infected: &[NodeId], recovered: &[NodeId], seed: Option<u64>) {
        for &node in infected {
            self.engine.infect(node);
        }
        for &node in recovered {
            self.engine.set_recovered(node);
        }
        if let Some(seed) = seed {
            self.rng = SmallRng::seed_from_u64(seed);
        }
        self.mark();
    }

    fn mark(&mut self) {
        self.series.push(Sample {
            time: 0.,
            infected: self.engine.infected(),
            recovered: self.engine.recovered(),
        });
    }

    /// clear the history and return the engine to all-susceptible.
    /// the generator keeps its stream.
    pub fn reset(&mut self) {
        self.series.clear();
        self.transmissions.clear();
        self.engine.reset();
    }

    /// advance through events until the infected count moves, then
    /// record one sample. sub-steps that leave the infected count
    /// unchanged (rejected contacts, waning) are coalesced into the
    /// same sample; their lifetimes still accumulate. a step that
    /// absorbs the process records its sample and stops even if the
    /// infected count held still (a waning-only tail can die out
    /// without ever touching it).
    pub fn next_state(&mut self) {
        if self.is_absorbed() {
            return;
        }
        let last = *self.series.last().expect("initialized before stepping");
        let mut elapsed = 0.;
        loop {
            elapsed += self.lifetimes.draw(&mut self.rng, self.engine.total_rate());
            let event = self.engine.update_event(&mut self.rng);
            if self.tracing {
                if let Event::Transmission { source, target } = event {
                    self.transmissions.push((source, target));
                }
            }
            if self.engine.infected() != last.infected || self.is_absorbed() {
                break;
            }
        }
        self.series.push(Sample {
            time: last.time + elapsed,
            infected: self.engine.infected(),
            recovered: self.engine.recovered(),
        });
    }

    /// run productive steps until the horizon is crossed or the
    /// process absorbs. an infinite horizon runs to absorption.
    pub fn evolve(&mut self, duration: Time) {
        let Some(start) = self.series.last().map(|sample| sample.time) else {
            return;
        };
        while !self.is_absorbed() && self.series.last().expect("non-empty").time - start < duration
        {
            self.next_state();
        }
    }

    /// estimate the basic reproduction number: over `sample` trials
    /// seed one uniformly chosen susceptible source (on top of an
    /// optional immunized set), run until the source leaves the
    /// infectious compartment, and count the distinct nodes it
    /// infected. returns the sample mean and standard deviation.
    pub fn estimate_r0(
        &mut self,
        sample: usize,
        seed: u64,
        recovered: &[NodeId],
    ) -> anyhow::Result<(f64, f64)> {
        anyhow::ensure!(
            self.engine.rates().transmission() > 0.,
            "transmission rate must be greater than 0"
        );
        anyhow::ensure!(sample > 0, "sample count must be positive");
        anyhow::ensure!(
            recovered.len() < self.size(),
            "no susceptible node left to seed"
        );
        let prior = self.tracing;
        self.tracing = true;
        self.rng = SmallRng::seed_from_u64(seed);
        let mut cases = Vec::with_capacity(sample);
        for _ in 0..sample {
            self.reset();
            for &node in recovered {
                self.engine.set_recovered(node);
            }
            let source = loop {
                let node = (self.rng.random::<f64>() * self.size() as f64) as usize;
                if self.engine.is_susceptible(node) {
                    break node;
                }
            };
            self.engine.infect(source);
            self.mark();
            while self.engine.is_infected(source) && !self.is_absorbed() {
                self.next_state();
            }
            let secondary = self
                .transmissions
                .iter()
                .filter(|(from, _)| *from == source)
                .map(|(_, to)| *to)
                .collect::<BTreeSet<_>>();
            cases.push(secondary.len() as f64);
        }
        self.reset();
        self.tracing = prior;
        let mean = cases.iter().sum::<f64>() / sample as f64;
        let variance = cases.iter().map(|c| (c - mean) * (c - mean)).sum::<f64>() / sample as f64;
        log::debug!("R0 over {} trials: {} +- {}", sample, mean, variance.sqrt());
        Ok((mean, variance.sqrt()))
    }

    /// sample the final outbreak size R / N of an SIR epidemic from
    /// one uniformly chosen source per trial, keeping sizes above
    /// the threshold.
    pub fn final_size_sample(
        &mut self,
        sample: usize,
        seed: u64,
        threshold: f64,
    ) -> anyhow::Result<Vec<f64>> {
        anyhow::ensure!(
            self.engine.model() == Model::SIR,
            "final size sampling requires SIR dynamics"
        );
        self.rng = SmallRng::seed_from_u64(seed);
        let mut sizes = Vec::with_capacity(sample);
        for _ in 0..sample {
            self.reset();
            let source = (self.rng.random::<f64>() * self.size() as f64) as usize;
            self.initialize(&[source], &[], None);
            self.evolve(f64::INFINITY);
            let size = self.engine.incidence();
            if size > threshold {
                sizes.push(size);
            }
        }
        self.reset();
        Ok(sizes)
    }
}
