//! Network topology with precomputed shortest paths.
//!
//! A [`Topology`] is built once from a [`TopologyDescriptor`] and never
//! changes afterwards: node roles, link attributes, node degrees and the
//! all-pairs shortest-path table (by link delay) are fixed at construction.
//! It is the core's implementation of [`TopologyView`].

use serde::{Deserialize, Serialize};
use sfcsim_policies::{LinkType, NodeId, NodeRole, SfcError, TopologyView, VnfType};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A node as declared in the topology descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(default)]
    pub role: NodeRole,
    /// Cache capacity override for this node (NFV-capable nodes only).
    #[serde(default)]
    pub capacity: Option<f64>,
    /// VNFs instantiated before the first request arrives.
    #[serde(default)]
    pub vnfs: Vec<VnfType>,
}

/// A link as declared in the topology descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub from: NodeId,
    pub to: NodeId,
    pub delay: f64,
    #[serde(rename = "type", default)]
    pub link_type: LinkType,
}

/// Declarative description of a network, as found in the `[topology]` config section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    /// When false every link is usable in both directions.
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

impl TopologyDescriptor {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            ..Default::default()
        }
    }

    /// Add a node with default capacity and no pre-instantiated VNFs.
    pub fn node(mut self, id: NodeId, role: NodeRole) -> Self {
        self.nodes.push(NodeSpec {
            id,
            role,
            capacity: None,
            vnfs: Vec::new(),
        });
        self
    }

    /// Add an internal link.
    pub fn link(mut self, from: NodeId, to: NodeId, delay: f64) -> Self {
        self.links.push(LinkSpec {
            from,
            to,
            delay,
            link_type: LinkType::Internal,
        });
        self
    }

    /// Line topology `0 - 1 - ... - n`: ingress at 0, egress at `n`, every
    /// interior node NFV-capable.
    pub fn line(delays: &[f64]) -> Self {
        let last = delays.len() as NodeId;
        let mut desc = Self::new(false);
        for id in 0..=last {
            let role = if id == 0 {
                NodeRole::Ingress
            } else if id == last {
                NodeRole::Egress
            } else {
                NodeRole::NfvCapable
            };
            desc = desc.node(id, role);
        }
        for (i, &delay) in delays.iter().enumerate() {
            desc = desc.link(i as NodeId, i as NodeId + 1, delay);
        }
        desc
    }
}

/// Static attributes of a directed link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub delay: f64,
    pub link_type: LinkType,
}

#[derive(Debug, Clone)]
struct Route {
    distance: f64,
    path: Vec<NodeId>,
}

/// Immutable network graph.
#[derive(Debug, Clone)]
pub struct Topology {
    roles: BTreeMap<NodeId, NodeRole>,
    links: HashMap<(NodeId, NodeId), Link>,
    /// Outgoing neighbours, ascending by id.
    adjacency: BTreeMap<NodeId, Vec<NodeId>>,
    routes: HashMap<(NodeId, NodeId), Route>,
    directed: bool,
}

impl Topology {
    /// Validate a descriptor and precompute every shortest path.
    pub fn from_descriptor(desc: &TopologyDescriptor) -> Result<Self, SfcError> {
        let mut roles = BTreeMap::new();
        for node in &desc.nodes {
            if roles.insert(node.id, node.role).is_some() {
                return Err(SfcError::InvalidTopology(format!(
                    "node {} declared twice",
                    node.id
                )));
            }
        }

        let mut links = HashMap::new();
        for decl in &desc.links {
            for end in [decl.from, decl.to] {
                if !roles.contains_key(&end) {
                    return Err(SfcError::InvalidTopology(format!(
                        "link {} -> {} references undeclared node {}",
                        decl.from, decl.to, end
                    )));
                }
            }
            if decl.from == decl.to {
                return Err(SfcError::InvalidTopology(format!(
                    "self-loop at node {}",
                    decl.from
                )));
            }
            if !decl.delay.is_finite() || decl.delay < 0.0 {
                return Err(SfcError::InvalidTopology(format!(
                    "link {} -> {} has invalid delay {}",
                    decl.from, decl.to, decl.delay
                )));
            }

            let link = Link {
                delay: decl.delay,
                link_type: decl.link_type,
            };
            let mut keys = vec![(decl.from, decl.to)];
            if !desc.directed {
                keys.push((decl.to, decl.from));
            }
            for key in keys {
                if links.insert(key, link).is_some() {
                    return Err(SfcError::InvalidTopology(format!(
                        "link {} -> {} declared twice",
                        key.0, key.1
                    )));
                }
            }
        }

        let mut adjacency: BTreeMap<NodeId, Vec<NodeId>> =
            roles.keys().map(|&id| (id, Vec::new())).collect();
        for &(u, v) in links.keys() {
            if let Some(out) = adjacency.get_mut(&u) {
                out.push(v);
            }
        }
        for out in adjacency.values_mut() {
            out.sort_unstable();
        }

        let mut topology = Self {
            roles,
            links,
            adjacency,
            routes: HashMap::new(),
            directed: desc.directed,
        };
        let sources: Vec<NodeId> = topology.roles.keys().copied().collect();
        for source in sources {
            topology.dijkstra_from(source);
        }
        Ok(topology)
    }

    /// Single-source Dijkstra. Among equally distant unvisited nodes the
    /// smallest id is settled first; a predecessor is only replaced by a
    /// strictly shorter route.
    fn dijkstra_from(&mut self, source: NodeId) {
        let mut distance: BTreeMap<NodeId, f64> = BTreeMap::new();
        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        distance.insert(source, 0.0);

        loop {
            let mut relax: Option<(NodeId, f64)> = None;
            for (&node, &d) in &distance {
                if visited.contains(&node) {
                    continue;
                }
                if relax.map_or(true, |(_, best)| d < best) {
                    relax = Some((node, d));
                }
            }
            let Some((node, d)) = relax else { break };
            visited.insert(node);

            for &next in &self.adjacency[&node] {
                if visited.contains(&next) {
                    continue;
                }
                let candidate = d + self.links[&(node, next)].delay;
                if distance.get(&next).map_or(true, |&cur| candidate < cur) {
                    distance.insert(next, candidate);
                    parent.insert(next, node);
                }
            }
        }

        for (&target, &dist) in &distance {
            let mut path = vec![target];
            let mut cur = target;
            while cur != source {
                cur = parent[&cur];
                path.push(cur);
            }
            path.reverse();
            self.routes.insert(
                (source, target),
                Route {
                    distance: dist,
                    path,
                },
            );
        }
    }

    fn require(&self, node: NodeId) -> Result<(), SfcError> {
        if self.roles.contains_key(&node) {
            Ok(())
        } else {
            Err(SfcError::NotFound(format!("node {}", node)))
        }
    }

    fn route(&self, from: NodeId, to: NodeId) -> Result<&Route, SfcError> {
        self.require(from)?;
        self.require(to)?;
        self.routes
            .get(&(from, to))
            .ok_or_else(|| SfcError::NotFound(format!("no path {} -> {}", from, to)))
    }

    fn link(&self, u: NodeId, v: NodeId) -> Result<&Link, SfcError> {
        self.links
            .get(&(u, v))
            .ok_or_else(|| SfcError::NotFound(format!("link {} -> {}", u, v)))
    }

    pub fn node_count(&self) -> usize {
        self.roles.len()
    }

    /// Number of directed links (an undirected link counts twice).
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// All node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roles.keys().copied()
    }

    /// All directed links, sorted by endpoints.
    pub fn links(&self) -> Vec<((NodeId, NodeId), Link)> {
        let mut all: Vec<_> = self.links.iter().map(|(k, l)| (*k, *l)).collect();
        all.sort_by_key(|(k, _)| *k);
        all
    }

    /// Outgoing neighbours of a node, ascending by id.
    pub fn neighbours(&self, node: NodeId) -> Result<&[NodeId], SfcError> {
        self.require(node)?;
        Ok(&self.adjacency[&node])
    }
}

impl TopologyView for Topology {
    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Vec<NodeId>, SfcError> {
        Ok(self.route(from, to)?.path.clone())
    }

    fn path_distance(&self, from: NodeId, to: NodeId) -> Result<f64, SfcError> {
        Ok(self.route(from, to)?.distance)
    }

    fn link_delay(&self, u: NodeId, v: NodeId) -> Result<f64, SfcError> {
        Ok(self.link(u, v)?.delay)
    }

    fn link_type(&self, u: NodeId, v: NodeId) -> Result<LinkType, SfcError> {
        Ok(self.link(u, v)?.link_type)
    }

    fn node_role(&self, node: NodeId) -> Result<NodeRole, SfcError> {
        self.roles
            .get(&node)
            .copied()
            .ok_or_else(|| SfcError::NotFound(format!("node {}", node)))
    }

    fn degree(&self, node: NodeId) -> Result<usize, SfcError> {
        Ok(self.neighbours(node)?.len())
    }

    fn nfv_nodes(&self) -> Vec<NodeId> {
        self.roles
            .iter()
            .filter(|(_, role)| **role == NodeRole::NfvCapable)
            .map(|(id, _)| *id)
            .collect()
    }
}
