//! Candidate pairing graph
//!
//! One node per team, one weighted edge per unordered pair of teams. Nodes
//! are kept in team-name order so that everything downstream iterates in a
//! fixed order.

use crate::error::{FixturingError, Result};
use crate::fixturing::history::FixtureHistory;
use crate::fixturing::quality::GameQualityScorer;
use crate::types::{EloTable, TeamId};
use std::collections::BTreeSet;

/// Undirected weighted edge between two node indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEdge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

/// Weighted graph handed to the matcher
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateGraph {
    nodes: Vec<TeamId>,
    edges: Vec<WeightedEdge>,
}

impl CandidateGraph {
    /// Build the complete graph of candidate games for a round
    pub fn build(
        teams: &BTreeSet<TeamId>,
        elos: &EloTable,
        history: &FixtureHistory,
        scorer: &GameQualityScorer,
    ) -> Result<Self> {
        if teams.len() < 2 {
            return Err(FixturingError::InsufficientTeams { count: teams.len() }.into());
        }

        let nodes: Vec<TeamId> = teams.iter().cloned().collect();
        let mut edges = Vec::with_capacity(nodes.len() * (nodes.len() - 1) / 2);
        for u in 0..nodes.len() {
            for v in (u + 1)..nodes.len() {
                let weight = scorer.score(&nodes[u], &nodes[v], elos, history)?;
                edges.push(WeightedEdge { u, v, weight });
            }
        }

        Ok(Self { nodes, edges })
    }

    /// Build an arbitrary (not necessarily complete) graph
    pub fn from_edges(nodes: Vec<TeamId>, edges: Vec<WeightedEdge>) -> Result<Self> {
        for edge in &edges {
            if edge.u == edge.v || edge.u >= nodes.len() || edge.v >= nodes.len() {
                return Err(FixturingError::ConfigurationError {
                    message: format!("Invalid edge {} - {}", edge.u, edge.v),
                }
                .into());
            }
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(FixturingError::ConfigurationError {
                    message: format!("Edge weight must be non-negative, got {}", edge.weight),
                }
                .into());
            }
        }

        Ok(Self { nodes, edges })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[TeamId] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &str {
        &self.nodes[index]
    }

    pub fn edges(&self) -> &[WeightedEdge] {
        &self.edges
    }

    pub fn index_of(&self, team: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node == team)
    }

    /// Weight of the edge between two nodes, if there is one
    pub fn weight(&self, u: usize, v: usize) -> Option<f64> {
        self.edges
            .iter()
            .find(|edge| (edge.u == u && edge.v == v) || (edge.u == v && edge.v == u))
            .map(|edge| edge.weight)
    }
}
