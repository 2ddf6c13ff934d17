use crate::Propensity;
use crate::Rate;

/// which compartmental model a rate triple describes. never stored:
/// always rederived from (recovery, waning) so the discriminating
/// branch stays a couple of float compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    SI,
    SIS,
    SIR,
    SIRS,
}

/// the three per-node rates of the dynamics.
///
/// transmission (beta) applies per infected-susceptible contact,
/// recovery (gamma) per infected node, waning (alpha) per recovered
/// node. waning zero freezes immunity (SIR), waning infinity skips
/// the recovered compartment entirely (SIS), and recovery zero
/// removes recovery altogether (SI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    transmission: Rate,
    recovery: Rate,
    waning: Rate,
}

impl Rates {
    pub fn new(transmission: Rate, recovery: Rate, waning: Rate) -> anyhow::Result<Self> {
        anyhow::ensure!(
            transmission >= 0. && transmission.is_finite(),
            "transmission rate must be finite and non-negative, got {}",
            transmission
        );
        anyhow::ensure!(
            recovery >= 0. && recovery.is_finite(),
            "recovery rate must be finite and non-negative, got {}",
            recovery
        );
        anyhow::ensure!(
            waning >= 0.,
            "waning immunity rate must be non-negative, got {}",
            waning
        );
        Ok(Self {
            transmission,
            recovery,
            waning,
        })
    }
    pub fn transmission(&self) -> Rate {
        self.transmission
    }
    pub fn recovery(&self) -> Rate {
        self.recovery
    }
    pub fn waning(&self) -> Rate {
        self.waning
    }
    pub fn model(&self) -> Model {
        if self.recovery == 0. {
            Model::SI
        } else if self.waning == 0. {
            Model::SIR
        } else if self.waning.is_infinite() {
            Model::SIS
        } else {
            Model::SIRS
        }
    }
    /// event rate of an infected node: transmission across every
    /// incident edge plus its own recovery.
    pub fn propensity(&self, degree: usize) -> Propensity {
        self.transmission * degree as f64 + self.recovery
    }
}
