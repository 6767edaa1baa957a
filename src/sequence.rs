use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::ast::Rule;
use crate::graph::DependencyGraph;
use crate::hash::hash_rules;

/// A group of rules explained together: one non-recursive rule, or a whole
/// strongly connected component.
#[derive(Debug, Clone)]
pub struct Transformation {
    pub id: usize,
    pub rules: Vec<Rule>,
    pub reified: Vec<Rule>,
    pub recursive: bool,
    pub hash: String,
}

impl Transformation {
    pub fn new(id: usize, rules: Vec<Rule>, recursive: bool) -> Self {
        let hash = hash_rules(&rules);
        Self {
            id,
            rules,
            reified: Vec::new(),
            recursive,
            hash,
        }
    }

    pub fn contains(&self, rule: &Rule) -> bool {
        self.rules.contains(rule)
    }
}

impl PartialEq for Transformation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.rules.len() == other.rules.len()
            && other.rules.iter().all(|r| self.contains(r))
    }
}

impl Eq for Transformation {}

/// Orders the condensed graph topologically. Components with no path between
/// them follow the input position of their first rule.
pub fn sequence(graph: &DependencyGraph) -> Vec<Transformation> {
    let condensation = graph.condense();
    let count = condensation.components.len();

    let mut indegree = vec![0usize; count];
    for targets in &condensation.edges {
        for &t in targets {
            indegree[t] += 1;
        }
    }

    let first_rule = |c: usize| condensation.components[c][0];
    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = (0..count)
        .filter(|&c| indegree[c] == 0)
        .map(|c| Reverse((first_rule(c), c)))
        .collect();

    let mut out = Vec::with_capacity(count);
    while let Some(Reverse((_, c))) = ready.pop() {
        let rules = condensation.components[c]
            .iter()
            .filter_map(|&r| graph.rule(r).cloned())
            .collect();
        out.push(Transformation::new(
            out.len() + 1,
            rules,
            condensation.recursive[c],
        ));
        for &t in &condensation.edges[c] {
            indegree[t] -= 1;
            if indegree[t] == 0 {
                ready.push(Reverse((first_rule(t), t)));
            }
        }
    }

    out
}
