use std::any::TypeId;
use std::collections::HashMap;

use tracing::debug;

use crate::di::container::Container;
use crate::di::dependency::{ClassEntry, DependencyKind};
use crate::di::error::DiError;

impl Container {
    /// Static manifest check over every registered class.
    ///
    /// Fails with [`DiError::Cycle`] (full path) when the graph of by-type and
    /// class-backed by-name dependencies has a cycle, or with
    /// [`DiError::Unresolvable`] when a required by-name dependency matches no
    /// binding, provider or class. Nothing is constructed.
    pub fn validate(&self) -> Result<(), DiError> {
        // 1) collect nodes: registered classes plus everything reachable by type
        let mut nodes: Vec<ClassEntry> = Vec::new();
        let mut index: HashMap<TypeId, usize> = HashMap::new();
        let mut pending = self.classes();
        while let Some(entry) = pending.pop() {
            let entry = self.effective(entry);
            if index.contains_key(&entry.type_id()) {
                continue;
            }
            index.insert(entry.type_id(), nodes.len());
            nodes.push(entry);
            for dep in entry.dependencies() {
                match dep.kind() {
                    DependencyKind::ByType(target) => pending.push(*target),
                    DependencyKind::ByName => {
                        if let Some(target) = self.class_for_name(dep.name()) {
                            pending.push(target);
                        }
                    }
                }
            }
        }

        // 2) edges and unresolvable names
        let mut adj = vec![Vec::<usize>::new(); nodes.len()];
        for (u, entry) in nodes.iter().enumerate() {
            for dep in entry.dependencies() {
                let target = match dep.kind() {
                    DependencyKind::ByType(target) => Some(self.effective(*target)),
                    DependencyKind::ByName => {
                        if !self.knows_name(dep.name()) {
                            if dep.is_required() {
                                return Err(DiError::Unresolvable {
                                    dependency: dep.name().to_string(),
                                    consumer: entry.type_name().to_string(),
                                });
                            }
                            continue;
                        }
                        self.class_for_name(dep.name()).map(|t| self.effective(t))
                    }
                };
                if let Some(v) = target.and_then(|t| index.get(&t.type_id()).copied()) {
                    adj[u].push(v);
                }
            }
        }

        // 3) DFS with path tracking
        let names: Vec<&'static str> = nodes.iter().map(ClassEntry::type_name).collect();
        if let Some(path) = detect_cycle_with_path(&names, &adj) {
            return Err(DiError::Cycle {
                path: path.into_iter().map(str::to_string).collect(),
            });
        }

        debug!(classes = nodes.len(), "dependency graph validated");
        Ok(())
    }

    /// The class actually constructed for `entry` once type overrides apply.
    fn effective(&self, entry: ClassEntry) -> ClassEntry {
        match self.type_override(entry.type_id()) {
            Some(crate::di::Override::Class(replacement)) => replacement,
            _ => entry,
        }
    }
}

fn detect_cycle_with_path(names: &[&'static str], adj: &[Vec<usize>]) -> Option<Vec<&'static str>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White, // unvisited
        Gray,  // on the current path
        Black, // finished
    }

    fn dfs(
        node: usize,
        names: &[&'static str],
        adj: &[Vec<usize>],
        colors: &mut [Color],
        path: &mut Vec<usize>,
    ) -> Option<Vec<&'static str>> {
        colors[node] = Color::Gray;
        path.push(node);

        for &neighbor in &adj[node] {
            match colors[neighbor] {
                Color::Gray => {
                    // back edge: the cycle starts where `neighbor` entered the path
                    if let Some(start) = path.iter().position(|&n| n == neighbor) {
                        let mut cycle: Vec<&'static str> = path[start..].iter().map(|&i| names[i]).collect();
                        cycle.push(names[neighbor]);
                        return Some(cycle);
                    }
                }
                Color::White => {
                    if let Some(cycle) = dfs(neighbor, names, adj, colors, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors[node] = Color::Black;
        None
    }

    let mut colors = vec![Color::White; names.len()];
    let mut path = Vec::new();
    for i in 0..names.len() {
        if colors[i] == Color::White {
            if let Some(cycle) = dfs(i, names, adj, &mut colors, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}
