use super::series::TimeSeries;
use super::spreading::Spreading;
use crate::NodeId;
use crate::Rate;
use crate::Time;
use crate::dynamics::snapshot::Snapshot;
use rand::Rng;

/// quasistationary dynamics: the process conditioned on survival,
/// approximated by reflecting off the absorbing state into a
/// reservoir of configurations the run has already visited.
///
/// the reservoir is refreshed at exponential intervals by evicting
/// a uniformly chosen slot with a swap-pop-push: the evicted slot
/// is swapped to the tail, popped, and the fresh snapshot pushed.
/// combined with uniform reflection this keeps every slot an
/// unbiased draw from the saved history; overwriting in place
/// would weight the reservoir differently and change the
/// stationary distribution.
pub struct Quasistationary {
    inner: Spreading,
    reservoir: Vec<Snapshot>,
    update_rate: Rate,
    capacity: usize,
}

/// the customary reservoir: 100 slots refreshed at rate 0.1.
impl From<Spreading> for Quasistationary {
    fn from(inner: Spreading) -> Self {
        Self::new(inner, 0.1, 100).expect("default reservoir parameters are valid")
    }
}

impl Quasistationary {
    pub fn new(inner: Spreading, update_rate: Rate, capacity: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(
            update_rate > 0. && update_rate.is_finite(),
            "reservoir update rate must be positive and finite, got {}",
            update_rate
        );
        anyhow::ensure!(capacity >= 1, "reservoir needs at least one slot");
        Ok(Self {
            inner,
            reservoir: Vec::with_capacity(capacity),
            update_rate,
            capacity,
        })
    }

    pub fn set_update_history_rate(&mut self, update_rate: Rate) -> anyhow::Result<()> {
        anyhow::ensure!(
            update_rate > 0. && update_rate.is_finite(),
            "reservoir update rate must be positive and finite, got {}",
            update_rate
        );
        self.update_rate = update_rate;
        Ok(())
    }

    pub fn initialize_random(&mut self, fraction: f64, seed: u64) -> anyhow::Result<()> {
        self.inner.initialize_random(fraction, seed)?;
        self.fill();
        Ok(())
    }

    pub fn initialize(&mut self, infected: &[NodeId], recovered: &[NodeId], seed: Option<u64>) {
        self.inner.initialize(infected, recovered, seed);
        self.fill();
    }

    pub fn reset(&mut self) {
        self.inner.reset();
        self.reservoir.clear();
    }

    /// every reservoir slot starts as the initial configuration.
    fn fill(&mut self) {
        let snapshot = self.inner.engine.snapshot();
        self.reservoir.clear();
        self.reservoir
            .extend(std::iter::repeat_with(|| snapshot.clone()).take(self.capacity));
    }

    /// advance for a duration, saving into the reservoir at rate
    /// update_rate and reflecting out of any absorbing state hit
    /// along the way. time here is bookkept locally: the inner time
    /// series is not extended, and the facade exposes none.
    pub fn evolve(&mut self, duration: Time) {
        let mut elapsed = 0.;
        let mut next_save = self
            .inner
            .lifetimes
            .draw(&mut self.inner.rng, self.update_rate);
        let mut lifetime = self
            .inner
            .lifetimes
            .draw(&mut self.inner.rng, self.inner.engine.total_rate());
        while elapsed + lifetime < duration {
            elapsed += lifetime;
            if elapsed >= next_save {
                self.record();
                next_save += self
                    .inner
                    .lifetimes
                    .draw(&mut self.inner.rng, self.update_rate);
            }
            self.inner.engine.update_event(&mut self.inner.rng);
            if self.inner.is_absorbed() {
                self.reflect();
            }
            lifetime = self
                .inner
                .lifetimes
                .draw(&mut self.inner.rng, self.inner.engine.total_rate());
        }
    }

    fn record(&mut self) {
        let slot = self.inner.rng.random_range(0..self.reservoir.len());
        let last = self.reservoir.len() - 1;
        self.reservoir.swap(slot, last);
        self.reservoir.pop();
        self.reservoir.push(self.inner.engine.snapshot());
    }

    fn reflect(&mut self) {
        let slot = self.inner.rng.random_range(0..self.reservoir.len());
        self.inner.engine.restore(&self.reservoir[slot]);
        log::debug!(
            "absorbed; reflected into reservoir slot {} at prevalence {}",
            slot,
            self.inner.engine.prevalence()
        );
    }

    fn unsupported<T>(operation: &str) -> anyhow::Result<T> {
        anyhow::bail!(
            "operation not supported under quasistationary dynamics: {}",
            operation
        )
    }

    pub fn next_state(&mut self) -> anyhow::Result<()> {
        Self::unsupported("next_state")
    }
    pub fn time_series(&self) -> anyhow::Result<&TimeSeries> {
        Self::unsupported("time_series")
    }
    pub fn estimate_r0(
        &mut self,
        _sample: usize,
        _seed: u64,
        _recovered: &[NodeId],
    ) -> anyhow::Result<(f64, f64)> {
        Self::unsupported("estimate_r0")
    }
    pub fn final_size_sample(
        &mut self,
        _sample: usize,
        _seed: u64,
        _threshold: f64,
    ) -> anyhow::Result<Vec<f64>> {
        Self::unsupported("final_size_sample")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::rates::Rates;
    use crate::graph::Graph;

    fn quasistationary(update_rate: f64, capacity: usize) -> Quasistationary {
        let graph = Graph::from(vec![(0, 1), (1, 2), (2, 0)]);
        let rates = Rates::new(1., 1., f64::INFINITY).unwrap();
        let inner = Spreading::new(graph, rates).unwrap();
        Quasistationary::new(inner, 0.5, capacity)
            .and_then(|mut quasistationary| {
                quasistationary.set_update_history_rate(update_rate)?;
                Ok(quasistationary)
            })
            .unwrap()
    }

    #[test]
    fn reflection_keeps_the_process_alive() {
        let mut quasistationary = quasistationary(0.5, 10);
        quasistationary.initialize(&[0], &[], Some(11));
        quasistationary.evolve(200.);
        assert!(!quasistationary.inner.is_absorbed());
        assert!(quasistationary.inner.infected() >= 1);
        assert_eq!(quasistationary.reservoir.len(), 10);
    }

    #[test]
    fn reservoir_fills_with_the_initial_configuration() {
        let mut quasistationary = quasistationary(1., 4);
        quasistationary.initialize(&[1], &[], Some(2));
        let first = quasistationary.inner.engine.snapshot();
        assert_eq!(quasistationary.reservoir.len(), 4);
        assert!(quasistationary.reservoir.iter().all(|s| *s == first));
    }

    #[test]
    fn seeded_quasistationary_runs_are_bit_identical() {
        let run = || {
            let mut quasistationary = quasistationary(0.8, 6);
            quasistationary.initialize_random(0.5, 31).unwrap();
            quasistationary.evolve(50.);
            quasistationary.inner.engine.snapshot()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn reset_clears_the_reservoir() {
        let mut quasistationary = quasistationary(0.5, 3);
        quasistationary.initialize(&[0], &[], Some(5));
        quasistationary.evolve(10.);
        quasistationary.reset();
        assert!(quasistationary.reservoir.is_empty());
        assert_eq!(quasistationary.inner.infected(), 0);
        assert!(quasistationary.inner.time_series().is_empty());
    }

    #[test]
    fn sampling_facilities_are_unsupported() {
        let mut quasistationary = quasistationary(0.5, 2);
        quasistationary.initialize(&[0], &[], None);
        let failure = quasistationary.next_state().unwrap_err().to_string();
        assert!(failure.contains("not supported"));
        assert!(quasistationary.time_series().is_err());
        assert!(quasistationary.estimate_r0(10, 0, &[]).is_err());
        assert!(quasistationary.final_size_sample(10, 0, 0.).is_err());
    }

    #[test]
    fn default_reservoir_has_a_hundred_slots() {
        let graph = Graph::from(vec![(0, 1), (1, 2)]);
        let rates = Rates::new(1., 1., f64::INFINITY).unwrap();
        let inner = Spreading::new(graph, rates).unwrap();
        let mut quasistationary = Quasistationary::from(inner);
        quasistationary.initialize(&[0], &[], Some(1));
        assert_eq!(quasistationary.reservoir.len(), 100);
        assert_eq!(quasistationary.update_rate, 0.1);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        let graph = Graph::from(vec![(0, 1)]);
        let rates = Rates::new(1., 1., f64::INFINITY).unwrap();
        let inner = Spreading::new(graph, rates).unwrap();
        assert!(Quasistationary::new(inner, 0., 10).is_err());
        let graph = Graph::from(vec![(0, 1)]);
        let rates = Rates::new(1., 1., f64::INFINITY).unwrap();
        let inner = Spreading::new(graph, rates).unwrap();
        assert!(Quasistationary::new(inner, 0.1, 0).is_err());
    }
}
