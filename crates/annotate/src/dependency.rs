use std::collections::{HashMap, HashSet, VecDeque};

use crate::analysis::DependencyGraph;
use crate::error::{ConversionError, Result};
use crate::index_map::IndexMapper;
use crate::schema::Dependency;

/// Relation carried by the self-loop emitted for every graph root.
pub const ROOT_RELATION: &str = "root";

/// Rewrites a sentence's dependency graph onto document-wide token indices.
#[derive(Debug, Clone, Default)]
pub struct DependencyRemapper {
    /// Reject graphs where some token cannot be reached from a root
    strict: bool,
}

impl DependencyRemapper {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn remap(&self, graph: &DependencyGraph, mapper: &IndexMapper) -> Result<Vec<Dependency>> {
        let mut dependencies = Vec::with_capacity(graph.roots.len() + graph.edges.len());

        for &root in &graph.roots {
            let index = mapper.resolve(root)?;
            dependencies.push(Dependency {
                gov_index: index,
                dep_index: index,
                relation: ROOT_RELATION.to_string(),
            });
        }

        for edge in &graph.edges {
            dependencies.push(Dependency {
                gov_index: mapper.resolve(edge.governor)?,
                dep_index: mapper.resolve(edge.dependent)?,
                relation: edge.relation.clone(),
            });
        }

        if self.strict {
            check_connected(graph, mapper)?;
        }

        Ok(dependencies)
    }
}

/// Every token of the sentence must be reachable from some root.
fn check_connected(graph: &DependencyGraph, mapper: &IndexMapper) -> Result<()> {
    let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();
    for edge in &graph.edges {
        adjacency.entry(edge.governor).or_default().push(edge.dependent);
    }

    let mut reached: HashSet<u32> = graph.roots.iter().copied().collect();
    let mut queue: VecDeque<u32> = graph.roots.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        for &next in adjacency.get(&id).into_iter().flatten() {
            if reached.insert(next) {
                queue.push_back(next);
            }
        }
    }

    // Report the earliest unreached token so the error is deterministic
    match mapper.native_ids().filter(|id| !reached.contains(id)).min() {
        Some(id) => Err(ConversionError::Disconnected { id }),
        None => Ok(()),
    }
}
