use crate::GroupIndex;
use crate::Propensity;

/// maps a propensity onto its logarithmic bin.
///
/// bin k collects propensities in [min * base^k, min * base^(k+1)),
/// except the last bin which is closed at exactly `max`. when
/// max / min is an exact non-unity power of the base, `max` itself
/// would land one past the end, so it is folded back into the last
/// real bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binning {
    min: Propensity,
    max: Propensity,
    base: f64,
    bins: usize,
    exact_power: bool,
}

impl Binning {
    pub fn new(min: Propensity, max: Propensity, base: f64) -> anyhow::Result<Self> {
        anyhow::ensure!(base > 1., "bin base must be greater than 1, got {}", base);
        anyhow::ensure!(
            min > 0. && min.is_finite(),
            "smallest propensity must be positive and finite, got {}",
            min
        );
        anyhow::ensure!(
            max >= min && max.is_finite(),
            "largest propensity must be finite and at least {}, got {}",
            min,
            max
        );
        let magnitude = (max / min).log2() / base.log2();
        let bins = (magnitude.ceil() as usize).max(1);
        let exact_power = magnitude.floor() == magnitude.ceil() && max != min;
        Ok(Self {
            min,
            max,
            base,
            bins,
            exact_power,
        })
    }
    pub fn bins(&self) -> usize {
        self.bins
    }
    pub fn min(&self) -> Propensity {
        self.min
    }
    pub fn max(&self) -> Propensity {
        self.max
    }
    pub fn base(&self) -> f64 {
        self.base
    }
    /// bin index for a propensity in [min, max]. behavior outside
    /// that range is unspecified; callers never query out of range.
    pub fn index(&self, propensity: Propensity) -> GroupIndex {
        let index = ((propensity / self.min).log2() / self.base.log2()).floor() as GroupIndex;
        if self.exact_power && propensity == self.max {
            index - 1
        } else {
            index.min(self.bins - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bin_when_range_is_degenerate() {
        let binning = Binning::new(1., 1., 2.).unwrap();
        assert_eq!(binning.bins(), 1);
        assert_eq!(binning.index(1.), 0);
    }

    #[test]
    fn bins_follow_powers_of_the_base() {
        let binning = Binning::new(1., 10., 2.).unwrap();
        assert_eq!(binning.bins(), 4);
        assert_eq!(binning.index(1.), 0);
        assert_eq!(binning.index(1.9), 0);
        assert_eq!(binning.index(2.), 1);
        assert_eq!(binning.index(5.), 2);
        assert_eq!(binning.index(10.), 3);
    }

    #[test]
    fn exact_power_folds_the_top_into_the_last_bin() {
        let binning = Binning::new(1., 8., 2.).unwrap();
        assert_eq!(binning.bins(), 3);
        assert_eq!(binning.index(7.9), 2);
        assert_eq!(binning.index(8.), 2);
        let wide = Binning::new(0.5, 8., 4.).unwrap();
        assert_eq!(wide.bins(), 2);
        assert_eq!(wide.index(1.9), 0);
        assert_eq!(wide.index(2.), 1);
        assert_eq!(wide.index(8.), 1);
    }

    #[test]
    fn other_bases_are_honored() {
        let binning = Binning::new(1., 10., 3.).unwrap();
        assert_eq!(binning.bins(), 3);
        assert_eq!(binning.index(1.), 0);
        assert_eq!(binning.index(2.9), 0);
        assert_eq!(binning.index(3.1), 1);
        assert_eq!(binning.index(10.), 2);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(Binning::new(1., 2., 1.).is_err());
        assert!(Binning::new(0., 2., 2.).is_err());
        assert!(Binning::new(2., 1., 2.).is_err());
        assert!(Binning::new(1., f64::INFINITY, 2.).is_err());
    }
}
