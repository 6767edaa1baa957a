//! Rule dependency graph over supported, non-fact rules.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::ast::Rule;
use crate::classify::{Classification, ClassifiedStatement};
use crate::types::Signature;

/// Arena of rules with integer edges. An edge `u -> v` means rule `v` has a
/// body atom (of either polarity) that the head of rule `u` may produce.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    rules: Vec<Rule>,
    successors: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    /// Builds the graph in input order. Facts are skipped, and a rule that
    /// prints the same as an earlier one is the same node.
    pub fn build(rules: &[Rule]) -> Self {
        let mut seen = HashSet::new();
        let rules: Vec<Rule> = rules
            .iter()
            .filter(|r| !r.is_fact())
            .filter(|r| seen.insert(r.to_string()))
            .cloned()
            .collect();

        let mut producers: BTreeMap<Signature, Vec<usize>> = BTreeMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            for sig in rule.head_signatures() {
                producers.entry(sig).or_default().push(idx);
            }
        }

        let mut successors = vec![BTreeSet::new(); rules.len()];
        for (v, rule) in rules.iter().enumerate() {
            for sig in rule.body_signatures() {
                if let Some(us) = producers.get(&sig) {
                    for &u in us {
                        successors[u].insert(v);
                    }
                }
            }
        }

        Self { rules, successors }
    }

    pub fn from_classified(classified: &[ClassifiedStatement]) -> Self {
        let rules: Vec<Rule> = classified
            .iter()
            .filter(|c| c.classification == Classification::Supported)
            .filter_map(|c| c.statement.rule().cloned())
            .collect();
        Self::build(&rules)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, idx: usize) -> Option<&Rule> {
        self.rules.get(idx)
    }

    /// Rules that depend on rule `idx`. Empty for an unknown index.
    pub fn successors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors.get(idx).into_iter().flatten().copied()
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.successors.get(from).is_some_and(|s| s.contains(&to))
    }

    pub fn has_self_loop(&self, idx: usize) -> bool {
        self.has_edge(idx, idx)
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(BTreeSet::len).sum()
    }

    /// A component is recursive when it has several rules or a self-loop.
    pub fn is_recursive(&self, component: &[usize]) -> bool {
        component.len() > 1 || component.first().is_some_and(|&r| self.has_self_loop(r))
    }

    /// Tarjan's algorithm, iterative. Components come out in reverse
    /// topological order, each sorted by rule index.
    pub fn strongly_connected_components(&self) -> Vec<Vec<usize>> {
        const UNVISITED: usize = usize::MAX;
        let n = self.rules.len();
        let succ: Vec<Vec<usize>> = self
            .successors
            .iter()
            .map(|s| s.iter().copied().collect())
            .collect();

        let mut index = vec![UNVISITED; n];
        let mut lowlink = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut next_index = 0usize;
        let mut components = Vec::new();

        for root in 0..n {
            if index[root] != UNVISITED {
                continue;
            }
            index[root] = next_index;
            lowlink[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;
            let mut calls: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = calls.last_mut() {
                let v = frame.0;
                if frame.1 < succ[v].len() {
                    let w = succ[v][frame.1];
                    frame.1 += 1;
                    if index[w] == UNVISITED {
                        index[w] = next_index;
                        lowlink[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        calls.push((w, 0));
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index[w]);
                    }
                    continue;
                }

                calls.pop();
                if let Some(&(parent, _)) = calls.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
                if lowlink[v] == index[v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    component.sort_unstable();
                    components.push(component);
                }
            }
        }

        components
    }

    /// Contracts every component to a single node.
    pub fn condense(&self) -> Condensation {
        let components = self.strongly_connected_components();
        let mut component_of = vec![0usize; self.rules.len()];
        for (c, members) in components.iter().enumerate() {
            for &r in members {
                component_of[r] = c;
            }
        }
        let mut edges = vec![BTreeSet::new(); components.len()];
        for (u, targets) in self.successors.iter().enumerate() {
            for &v in targets {
                let (cu, cv) = (component_of[u], component_of[v]);
                if cu != cv {
                    edges[cu].insert(cv);
                }
            }
        }
        let recursive = components.iter().map(|c| self.is_recursive(c)).collect();
        Condensation {
            components,
            edges,
            recursive,
        }
    }
}

/// The acyclic graph of components.
#[derive(Debug, Clone)]
pub struct Condensation {
    pub components: Vec<Vec<usize>>,
    pub edges: Vec<BTreeSet<usize>>,
    pub recursive: Vec<bool>,
}

impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, rule) in self.rules.iter().enumerate() {
            let targets = self
                .successors(idx)
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "{idx}: {rule} -> [{targets}]")?;
        }
        Ok(())
    }
}
