//! Dependency graph ordering.
//!
//! Nodes are indices into the caller's service list; an edge `d -> n` means
//! `n` depends on `d`. Ordering is Kahn's algorithm with a ready set keyed by
//! input index, so independent services keep their input order.

use std::collections::BTreeSet;

use crate::domain::error::DomainError;

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    names: Vec<String>,
    /// `dependencies[n]` lists the nodes `n` depends on.
    dependencies: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new(names: Vec<String>) -> Self {
        let len = names.len();
        Self {
            names,
            dependencies: vec![Vec::new(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Record that `node` depends on `dependency`. Self-edges and duplicates
    /// are ignored.
    pub fn add_dependency(&mut self, node: usize, dependency: usize) {
        if node == dependency || node >= self.len() || dependency >= self.len() {
            return;
        }
        if !self.dependencies[node].contains(&dependency) {
            self.dependencies[node].push(dependency);
        }
    }

    /// Topological order of node indices, dependencies first.
    ///
    /// Nodes left over once no node is ready form (or feed) a cycle and are
    /// reported by name.
    pub fn order(&self) -> Result<Vec<usize>, DomainError> {
        let len = self.len();
        let mut in_degree: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); len];
        for (node, deps) in self.dependencies.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(node);
            }
        }

        let mut ready: BTreeSet<usize> = (0..len).filter(|&n| in_degree[n] == 0).collect();
        let mut order = Vec::with_capacity(len);

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &dependent in &dependents[node] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() == len {
            Ok(order)
        } else {
            let nodes = (0..len)
                .filter(|n| in_degree[*n] > 0)
                .map(|n| self.names[n].clone())
                .collect();
            Err(DomainError::DependencyCycle { nodes })
        }
    }
}
