use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet, VecDeque};

use changeplan_core::{BumpLevel, ReleaseStrategy};
use petgraph::graph::NodeIndex;

use crate::error::GraphError;
use crate::graph::WorkspaceGraph;

/// A package that must be considered for release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageImpact {
    pub name: String,
    /// Whether the package has changes of its own in the range.
    pub direct: bool,
    /// The changed upstream this package is attributed to, if any.
    pub via_dependency: Option<String>,
    /// Hops from `via_dependency`; `0` when there is none.
    pub distance: usize,
}

impl PackageImpact {
    fn direct(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direct: true,
            via_dependency: None,
            distance: 0,
        }
    }
}

/// Candidate upstream for a dependent, ordered so that the best candidate is
/// the minimum: highest bump, then shortest distance, then first name.
type Candidate<'a> = (Reverse<BumpLevel>, usize, &'a str);

/// Determines which packages are affected by the directly changed ones.
///
/// `direct` maps each changed package to the bump implied by its own changes.
/// The result is sorted by package name and lists each package once.
///
/// # Errors
///
/// Returns `GraphError::UnknownPackage` if `direct` names a package that is
/// not in `graph`.
pub fn compute_impact(
    direct: &BTreeMap<String, BumpLevel>,
    graph: &WorkspaceGraph,
    strategy: ReleaseStrategy,
) -> Result<Vec<PackageImpact>, GraphError> {
    for name in direct.keys() {
        graph.node(name)?;
    }

    let impacts = match strategy {
        ReleaseStrategy::Independent => direct.keys().map(|n| PackageImpact::direct(n)).collect(),
        ReleaseStrategy::Ripple => ripple(direct, graph)?,
        ReleaseStrategy::Lockstep => lockstep(direct, graph),
    };

    Ok(impacts)
}

fn distances_from(graph: &WorkspaceGraph, start: NodeIndex) -> Vec<(NodeIndex, usize)> {
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0usize)]);
    let mut reached = Vec::new();

    while let Some((node, distance)) = queue.pop_front() {
        for dependent in graph.dependent_nodes(node) {
            if visited.insert(dependent) {
                reached.push((dependent, distance + 1));
                queue.push_back((dependent, distance + 1));
            }
        }
    }

    reached
}

fn ripple(
    direct: &BTreeMap<String, BumpLevel>,
    graph: &WorkspaceGraph,
) -> Result<Vec<PackageImpact>, GraphError> {
    let mut best: BTreeMap<&str, Candidate<'_>> = BTreeMap::new();

    for (name, &bump) in direct {
        if bump.is_none() {
            continue;
        }
        let start = graph.node(name)?;
        for (node, distance) in distances_from(graph, start) {
            let candidate = (Reverse(bump), distance, name.as_str());
            best.entry(graph.name(node))
                .and_modify(|current| {
                    if candidate < *current {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }
    }

    let mut impacts: BTreeMap<&str, PackageImpact> = direct
        .keys()
        .map(|name| (name.as_str(), PackageImpact::direct(name)))
        .collect();

    for (name, (Reverse(bump), distance, via)) in best {
        tracing::debug!(package = name, via, %bump, distance, "ripple candidate");
        let impact = impacts.entry(name).or_insert_with(|| PackageImpact {
            name: name.to_string(),
            direct: false,
            via_dependency: None,
            distance: 0,
        });
        impact.via_dependency = Some(via.to_string());
        impact.distance = distance;
    }

    Ok(impacts.into_values().collect())
}

fn lockstep(direct: &BTreeMap<String, BumpLevel>, graph: &WorkspaceGraph) -> Vec<PackageImpact> {
    // first name wins among equal bumps
    let leader = direct
        .iter()
        .filter(|(_, bump)| !bump.is_none())
        .max_by_key(|(name, bump)| (**bump, Reverse(name.as_str())))
        .map(|(name, _)| name.clone());

    graph
        .packages()
        .map(|name| PackageImpact {
            name: name.to_string(),
            direct: direct.contains_key(name),
            via_dependency: leader.clone().filter(|leader| leader != name),
            distance: 0,
        })
        .collect()
}
