use crate::Arbitrary;
use crate::NodeId;
use anyhow::Context;

/// an immutable undirected network stored as an adjacency list.
///
/// nodes are dense indices 0..N where N is one past the largest
/// id seen in the edge list. self-loops and parallel edges are kept
/// verbatim: they raise a node's degree and therefore its weight in
/// uniform neighbor selection, which is exactly the multiplicity
/// semantics the event sampler expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph(Vec<Vec<NodeId>>);

impl Graph {
    pub fn size(&self) -> usize {
        self.0.len()
    }
    pub fn degree(&self, node: NodeId) -> usize {
        self.0[node].len()
    }
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.0[node]
    }
    /// smallest and largest degree over all nodes.
    /// the engine sizes its propensity bins from these.
    pub fn degree_bounds(&self) -> (usize, usize) {
        match self.0.is_empty() {
            true => (0, 0),
            false => self.0.iter().fold((usize::MAX, 0), |(lo, hi), adj| {
                (lo.min(adj.len()), hi.max(adj.len()))
            }),
        }
    }
    /// read an edge-list file: one `u v` pair of node ids per line.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        std::fs::read_to_string(path)
            .with_context(|| format!("read edge list {}", path.display()))?
            .parse()
    }
}

impl From<&[(NodeId, NodeId)]> for Graph {
    fn from(edges: &[(NodeId, NodeId)]) -> Self {
        let n = edges
            .iter()
            .map(|&(u, v)| u.max(v) + 1)
            .max()
            .unwrap_or(0);
        let mut adjacency = vec![Vec::new(); n];
        for &(u, v) in edges {
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
        Self(adjacency)
    }
}

impl From<Vec<(NodeId, NodeId)>> for Graph {
    fn from(edges: Vec<(NodeId, NodeId)>) -> Self {
        Self::from(edges.as_slice())
    }
}

impl std::str::FromStr for Graph {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut edges = Vec::new();
        for (i, line) in s.lines().enumerate() {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (None, _) => continue,
                (Some(u), Some(v)) => {
                    let u = u.parse().with_context(|| format!("line {}: {}", i + 1, line))?;
                    let v = v.parse().with_context(|| format!("line {}: {}", i + 1, line))?;
                    edges.push((u, v));
                }
                (Some(_), None) => anyhow::bail!("line {}: expected two node ids: {}", i + 1, line),
            }
        }
        Ok(Self::from(edges))
    }
}

impl std::fmt::Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Graph({} nodes)", self.size())
    }
}

/// a modest Erdos-Renyi graph, dense enough that the giant
/// component spans essentially every node.
impl Arbitrary for Graph {
    fn random() -> Self {
        let n = 128;
        let p = 10. / (n - 1) as f64;
        let mut edges = Vec::new();
        for u in 0..n {
            for v in (u + 1)..n {
                if rand::random::<f64>() < p {
                    edges.push((u, v));
                }
            }
        }
        // anchor the last id so size is always n
        edges.push((0, n - 1));
        Self::from(edges)
    }
}
