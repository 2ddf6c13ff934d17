/// the epidemiological state of a single node. every node is in
/// exactly one compartment at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compartment {
    #[default]
    Susceptible,
    Infected,
    Recovered,
}
