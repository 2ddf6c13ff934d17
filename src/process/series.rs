use crate::Time;

/// one observed point of the process: the time of a productive
/// event and the population counts right after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: Time,
    pub infected: usize,
    pub recovered: usize,
}

/// the (t, I, R) history of a run. grows by one sample per
/// productive event; cleared on reset.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TimeSeries(Vec<Sample>);

impl TimeSeries {
    pub fn push(&mut self, sample: Sample) {
        self.0.push(sample);
    }
    pub fn last(&self) -> Option<&Sample> {
        self.0.last()
    }
    pub fn samples(&self) -> &[Sample] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl std::fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for sample in self.samples() {
            writeln!(f, "{} {} {}", sample.time, sample.infected, sample.recovered)?;
        }
        Ok(())
    }
}
