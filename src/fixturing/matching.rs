//! Maximum-weight matching on general graphs
//!
//! [`BlossomMatcher`] is the primal-dual Edmonds algorithm with blossom
//! shrinking and expansion, O(n³). Weights are quantised to even integers
//! before solving so every dual adjustment, including the halved slack used
//! for S-S edges, stays exact.
//!
//! Ties between equally heavy matchings are broken by iteration order: nodes
//! in graph order (teams sorted by name) and edges in the order the graph
//! lists them. Identical graphs therefore always give identical matchings.

use crate::fixturing::graph::CandidateGraph;
use serde::{Deserialize, Serialize};

/// Number of quantisation steps per unit of edge weight
pub const WEIGHT_SCALE: f64 = 1_000_000.0;

/// Convert an edge weight to the integer the solver works with
pub fn quantize_weight(weight: f64) -> i64 {
    (weight * WEIGHT_SCALE).round() as i64 * 2
}

/// Set of disjoint edges, stored as each node's partner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matching {
    mates: Vec<Option<usize>>,
}

impl Matching {
    pub fn from_mates(mates: Vec<Option<usize>>) -> Self {
        Self { mates }
    }

    pub fn mate(&self, node: usize) -> Option<usize> {
        self.mates.get(node).copied().flatten()
    }

    /// Matched pairs `(u, v)` with `u < v`, ordered by `u`
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.mates
            .iter()
            .enumerate()
            .filter_map(|(u, mate)| match mate {
                Some(v) if u < *v => Some((u, *v)),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pairs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mates.iter().all(Option::is_none)
    }

    pub fn unmatched(&self) -> Vec<usize> {
        self.mates
            .iter()
            .enumerate()
            .filter(|(_, mate)| mate.is_none())
            .map(|(node, _)| node)
            .collect()
    }

    pub fn is_perfect(&self) -> bool {
        self.mates.iter().all(Option::is_some)
    }

    /// Sum of the matched edge weights in `graph`
    pub fn total_weight(&self, graph: &CandidateGraph) -> f64 {
        self.pairs()
            .into_iter()
            .filter_map(|(u, v)| graph.weight(u, v))
            .sum()
    }
}

/// Trait for maximum-weight matching algorithms
pub trait WeightedMatcher: Send + Sync {
    /// Compute a matching with the largest total edge weight
    fn match_maximum_weight(&self, graph: &CandidateGraph) -> Matching;
}

/// Edmonds blossom matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlossomMatcher {
    /// Only consider matchings of maximum cardinality
    ///
    /// On a complete graph this guarantees a perfect matching for an even
    /// node count and exactly one unmatched node for an odd count.
    pub max_cardinality: bool,
}

impl BlossomMatcher {
    pub fn new(max_cardinality: bool) -> Self {
        Self { max_cardinality }
    }
}

impl Default for BlossomMatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WeightedMatcher for BlossomMatcher {
    fn match_maximum_weight(&self, graph: &CandidateGraph) -> Matching {
        let edges: Vec<(usize, usize, i64)> = graph
            .edges()
            .iter()
            .map(|edge| (edge.u, edge.v, quantize_weight(edge.weight)))
            .collect();

        let mates = if edges.is_empty() {
            vec![None; graph.node_count()]
        } else {
            BlossomState::new(graph.node_count(), &edges, self.max_cardinality).solve()
        };

        Matching::from_mates(mates)
    }
}

const FREE: u8 = 0;
const S_LABEL: u8 = 1;
const T_LABEL: u8 = 2;
const BREADCRUMB: u8 = 4;

/// Dual adjustment chosen at the end of a stage step
enum DeltaKind {
    /// No further improvement possible
    Finish,
    /// Make an edge from an S-vertex to a free vertex tight
    GrowEdge(usize),
    /// Make an edge between two S-blossoms tight
    BlossomEdge(usize),
    /// Expand a T-blossom whose dual reached zero
    ExpandBlossom(usize),
}

/// Index into a cyclic child list with Python-style negative wrapping
fn cyclic(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}

/// Working state of one blossom run
///
/// Vertices are `0..n`, non-trivial blossoms `n..2n`. Edge `k` has the two
/// endpoints `2k` and `2k + 1`; `endpoint[p]` is the vertex at endpoint `p`
/// and `p ^ 1` is the opposite end of the same edge.
struct BlossomState<'a> {
    n: usize,
    edges: &'a [(usize, usize, i64)],
    max_cardinality: bool,
    endpoint: Vec<usize>,
    /// Remote endpoints of the edges incident to each vertex
    neighbend: Vec<Vec<usize>>,
    /// Remote endpoint of each vertex's matched edge
    mate: Vec<Option<usize>>,
    label: Vec<u8>,
    /// Endpoint through which a vertex or blossom got its label
    label_end: Vec<Option<usize>>,
    /// Top-level blossom containing each vertex
    in_blossom: Vec<usize>,
    blossom_parent: Vec<Option<usize>>,
    blossom_childs: Vec<Vec<usize>>,
    blossom_base: Vec<Option<usize>>,
    blossom_endps: Vec<Vec<usize>>,
    /// Least-slack edge to a different S-blossom, or from a free vertex to an S-vertex
    best_edge: Vec<Option<usize>>,
    blossom_best_edges: Vec<Option<Vec<usize>>>,
    unused_blossoms: Vec<usize>,
    dual_var: Vec<i64>,
    allow_edge: Vec<bool>,
    queue: Vec<usize>,
}

impl<'a> BlossomState<'a> {
    fn new(n: usize, edges: &'a [(usize, usize, i64)], max_cardinality: bool) -> Self {
        let max_weight = edges.iter().map(|&(_, _, w)| w).max().unwrap_or(0).max(0);

        let mut endpoint = Vec::with_capacity(2 * edges.len());
        let mut neighbend = vec![Vec::new(); n];
        for (k, &(i, j, _)) in edges.iter().enumerate() {
            endpoint.push(i);
            endpoint.push(j);
            neighbend[i].push(2 * k + 1);
            neighbend[j].push(2 * k);
        }

        let mut blossom_base: Vec<Option<usize>> = (0..n).map(Some).collect();
        blossom_base.extend(std::iter::repeat(None).take(n));

        let mut dual_var = vec![max_weight; n];
        dual_var.extend(std::iter::repeat(0).take(n));

        Self {
            n,
            edges,
            max_cardinality,
            endpoint,
            neighbend,
            mate: vec![None; n],
            label: vec![FREE; 2 * n],
            label_end: vec![None; 2 * n],
            in_blossom: (0..n).collect(),
            blossom_parent: vec![None; 2 * n],
            blossom_childs: vec![Vec::new(); 2 * n],
            blossom_base,
            blossom_endps: vec![Vec::new(); 2 * n],
            best_edge: vec![None; 2 * n],
            blossom_best_edges: vec![None; 2 * n],
            unused_blossoms: (n..2 * n).collect(),
            dual_var,
            allow_edge: vec![false; edges.len()],
            queue: Vec::new(),
        }
    }

    fn slack(&self, k: usize) -> i64 {
        let (i, j, w) = self.edges[k];
        self.dual_var[i] + self.dual_var[j] - 2 * w
    }

    fn blossom_leaves(&self, b: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        self.collect_leaves(b, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, b: usize, leaves: &mut Vec<usize>) {
        if b < self.n {
            leaves.push(b);
        } else {
            for &child in &self.blossom_childs[b] {
                self.collect_leaves(child, leaves);
            }
        }
    }

    fn assign_label(&mut self, w: usize, t: u8, p: Option<usize>) {
        let b = self.in_blossom[w];
        self.label[w] = t;
        self.label[b] = t;
        self.label_end[w] = p;
        self.label_end[b] = p;
        self.best_edge[w] = None;
        self.best_edge[b] = None;

        if t == S_LABEL {
            let leaves = self.blossom_leaves(b);
            self.queue.extend(leaves);
        } else if t == T_LABEL {
            // The base of a T-blossom is always matched; its mate becomes S
            let base = self.blossom_base[b].expect("T-blossom has a base");
            let mate = self.mate[base].expect("T-blossom base is matched");
            self.assign_label(self.endpoint[mate], S_LABEL, Some(mate ^ 1));
        }
    }

    /// Trace back from two S-vertices; returns the base of the new blossom,
    /// or `None` when the paths reach different roots (augmenting path found)
    fn scan_blossom(&mut self, v: usize, w: usize) -> Option<usize> {
        let mut path = Vec::new();
        let mut base = None;
        let mut v = Some(v);
        let mut w = Some(w);

        while let Some(current) = v {
            let b = self.in_blossom[current];
            if self.label[b] & BREADCRUMB != 0 {
                base = self.blossom_base[b];
                break;
            }
            path.push(b);
            self.label[b] = S_LABEL | BREADCRUMB;

            v = match self.label_end[b] {
                None => None,
                Some(p) => {
                    let t_blossom = self.in_blossom[self.endpoint[p]];
                    self.label_end[t_blossom].map(|q| self.endpoint[q])
                }
            };

            if w.is_some() {
                std::mem::swap(&mut v, &mut w);
            }
        }

        for b in path {
            self.label[b] = S_LABEL;
        }
        base
    }

    /// Shrink the odd cycle closed by edge `k` into a new S-blossom
    fn add_blossom(&mut self, base: usize, k: usize) {
        let (v, w, _) = self.edges[k];
        let bb = self.in_blossom[base];
        let mut bv = self.in_blossom[v];
        let mut bw = self.in_blossom[w];

        let b = self
            .unused_blossoms
            .pop()
            .expect("at most n non-trivial blossoms exist");
        self.blossom_base[b] = Some(base);
        self.blossom_parent[b] = None;
        self.blossom_parent[bb] = Some(b);

        let mut path = Vec::new();
        let mut endps = Vec::new();
        while bv != bb {
            self.blossom_parent[bv] = Some(b);
            path.push(bv);
            let p = self.label_end[bv].expect("sub-blossom on cycle is labelled");
            endps.push(p);
            bv = self.in_blossom[self.endpoint[p]];
        }
        path.push(bb);
        path.reverse();
        endps.reverse();
        endps.push(2 * k);
        while bw != bb {
            self.blossom_parent[bw] = Some(b);
            path.push(bw);
            let p = self.label_end[bw].expect("sub-blossom on cycle is labelled");
            endps.push(p ^ 1);
            bw = self.in_blossom[self.endpoint[p]];
        }

        self.label[b] = S_LABEL;
        self.label_end[b] = self.label_end[bb];
        self.dual_var[b] = 0;
        self.blossom_childs[b] = path.clone();
        self.blossom_endps[b] = endps;

        for leaf in self.blossom_leaves(b) {
            if self.label[self.in_blossom[leaf]] == T_LABEL {
                // Former T-vertices become S-vertices inside the blossom
                self.queue.push(leaf);
            }
            self.in_blossom[leaf] = b;
        }

        let mut best_edge_to: Vec<Option<usize>> = vec![None; 2 * self.n];
        for &sub in &path {
            let edge_lists: Vec<Vec<usize>> = match self.blossom_best_edges[sub].take() {
                Some(list) => vec![list],
                None => self
                    .blossom_leaves(sub)
                    .into_iter()
                    .map(|leaf| self.neighbend[leaf].iter().map(|p| p / 2).collect())
                    .collect(),
            };

            for edge in edge_lists.into_iter().flatten() {
                let (i, j, _) = self.edges[edge];
                let far = if self.in_blossom[j] == b { i } else { j };
                let bj = self.in_blossom[far];
                if bj != b
                    && self.label[bj] == S_LABEL
                    && best_edge_to[bj].map_or(true, |cur| self.slack(edge) < self.slack(cur))
                {
                    best_edge_to[bj] = Some(edge);
                }
            }

            self.best_edge[sub] = None;
        }

        let best: Vec<usize> = best_edge_to.into_iter().flatten().collect();
        self.best_edge[b] = None;
        for &edge in &best {
            if self.best_edge[b].map_or(true, |cur| self.slack(edge) < self.slack(cur)) {
                self.best_edge[b] = Some(edge);
            }
        }
        self.blossom_best_edges[b] = Some(best);
    }

    /// Undo a blossom, relabelling its children when it was a T-blossom mid-stage
    fn expand_blossom(&mut self, b: usize, end_stage: bool) {
        let childs = self.blossom_childs[b].clone();
        for &sub in &childs {
            self.blossom_parent[sub] = None;
            if sub < self.n {
                self.in_blossom[sub] = sub;
            } else if end_stage && self.dual_var[sub] == 0 {
                self.expand_blossom(sub, end_stage);
            } else {
                for leaf in self.blossom_leaves(sub) {
                    self.in_blossom[leaf] = sub;
                }
            }
        }

        if !end_stage && self.label[b] == T_LABEL {
            let len = childs.len();
            let entry = self.label_end[b].expect("T-blossom is labelled");
            let entry_child = self.in_blossom[self.endpoint[entry ^ 1]];
            let position = childs
                .iter()
                .position(|&child| child == entry_child)
                .expect("entry child belongs to the blossom");

            // Walk from the entry child to the base along the even-length side
            let mut j = position as isize;
            let (j_step, endp_trick): (isize, usize) = if j & 1 != 0 {
                j -= len as isize;
                (1, 0)
            } else {
                (-1, 1)
            };

            let mut p = entry;
            while j != 0 {
                self.label[self.endpoint[p ^ 1]] = FREE;
                let q = self.blossom_endps[b][cyclic(j - endp_trick as isize, len)];
                self.label[self.endpoint[q ^ endp_trick ^ 1]] = FREE;
                self.assign_label(self.endpoint[p ^ 1], T_LABEL, Some(p));
                self.allow_edge[q / 2] = true;
                j += j_step;
                p = self.blossom_endps[b][cyclic(j - endp_trick as isize, len)] ^ endp_trick;
                self.allow_edge[p / 2] = true;
                j += j_step;
            }

            // Relabel the base sub-blossom without stepping through to its mate
            let base_child = childs[cyclic(j, len)];
            let far = self.endpoint[p ^ 1];
            self.label[far] = T_LABEL;
            self.label[base_child] = T_LABEL;
            self.label_end[far] = Some(p);
            self.label_end[base_child] = Some(p);
            self.best_edge[base_child] = None;

            // Children on the odd side may still be reachable from outside
            j += j_step;
            while childs[cyclic(j, len)] != entry_child {
                let sub = childs[cyclic(j, len)];
                if self.label[sub] == S_LABEL {
                    j += j_step;
                    continue;
                }

                let labelled = self
                    .blossom_leaves(sub)
                    .into_iter()
                    .find(|&leaf| self.label[leaf] != FREE);
                if let Some(leaf) = labelled {
                    self.label[leaf] = FREE;
                    let base = self.blossom_base[sub].expect("sub-blossom has a base");
                    let mate = self.mate[base].expect("sub-blossom base is matched");
                    self.label[self.endpoint[mate]] = FREE;
                    self.assign_label(leaf, T_LABEL, self.label_end[leaf]);
                }
                j += j_step;
            }
        }

        self.label[b] = FREE;
        self.label_end[b] = None;
        self.blossom_childs[b].clear();
        self.blossom_endps[b].clear();
        self.blossom_base[b] = None;
        self.blossom_best_edges[b] = None;
        self.best_edge[b] = None;
        self.unused_blossoms.push(b);
    }

    /// Swap matched and unmatched edges on the path from `v` to the base of `b`
    fn augment_blossom(&mut self, b: usize, v: usize) {
        let mut t = v;
        while self.blossom_parent[t] != Some(b) {
            t = self.blossom_parent[t].expect("vertex is nested inside the blossom");
        }
        if t >= self.n {
            self.augment_blossom(t, v);
        }

        let len = self.blossom_childs[b].len();
        let start = self.blossom_childs[b]
            .iter()
            .position(|&child| child == t)
            .expect("child belongs to the blossom");

        let mut j = start as isize;
        let (j_step, endp_trick): (isize, usize) = if start & 1 != 0 {
            j -= len as isize;
            (1, 0)
        } else {
            (-1, 1)
        };

        while j != 0 {
            j += j_step;
            let child = self.blossom_childs[b][cyclic(j, len)];
            let p = self.blossom_endps[b][cyclic(j - endp_trick as isize, len)] ^ endp_trick;
            if child >= self.n {
                self.augment_blossom(child, self.endpoint[p]);
            }
            j += j_step;
            let child = self.blossom_childs[b][cyclic(j, len)];
            if child >= self.n {
                self.augment_blossom(child, self.endpoint[p ^ 1]);
            }
            self.mate[self.endpoint[p]] = Some(p ^ 1);
            self.mate[self.endpoint[p ^ 1]] = Some(p);
        }

        // The child containing v becomes the new base
        self.blossom_childs[b].rotate_left(start);
        self.blossom_endps[b].rotate_left(start);
        self.blossom_base[b] = self.blossom_base[self.blossom_childs[b][0]];
    }

    /// Flip the augmenting path through edge `k` between two S-vertices
    fn augment_matching(&mut self, k: usize) {
        let (v, w, _) = self.edges[k];
        for (start, first_p) in [(v, 2 * k + 1), (w, 2 * k)] {
            let mut s = start;
            let mut p = first_p;
            loop {
                let bs = self.in_blossom[s];
                if bs >= self.n {
                    self.augment_blossom(bs, s);
                }
                self.mate[s] = Some(p);

                // Reached a single vertex root
                let Some(label_end) = self.label_end[bs] else {
                    break;
                };

                let t = self.endpoint[label_end];
                let bt = self.in_blossom[t];
                let bt_end = self.label_end[bt].expect("T-blossom is labelled");
                s = self.endpoint[bt_end];
                let j = self.endpoint[bt_end ^ 1];
                if bt >= self.n {
                    self.augment_blossom(bt, j);
                }
                self.mate[j] = Some(bt_end);
                p = bt_end ^ 1;
            }
        }
    }

    fn min_vertex_dual(&self) -> i64 {
        self.dual_var[..self.n].iter().copied().min().unwrap_or(0)
    }

    fn choose_delta(&self) -> (i64, DeltaKind) {
        let mut delta: Option<(i64, DeltaKind)> = None;

        if !self.max_cardinality {
            delta = Some((self.min_vertex_dual(), DeltaKind::Finish));
        }

        for v in 0..self.n {
            if self.label[self.in_blossom[v]] == FREE {
                if let Some(edge) = self.best_edge[v] {
                    let d = self.slack(edge);
                    if delta.as_ref().map_or(true, |(cur, _)| d < *cur) {
                        delta = Some((d, DeltaKind::GrowEdge(edge)));
                    }
                }
            }
        }

        for b in 0..2 * self.n {
            if self.blossom_parent[b].is_none() && self.label[b] == S_LABEL {
                if let Some(edge) = self.best_edge[b] {
                    let d = self.slack(edge) / 2;
                    if delta.as_ref().map_or(true, |(cur, _)| d < *cur) {
                        delta = Some((d, DeltaKind::BlossomEdge(edge)));
                    }
                }
            }
        }

        for b in self.n..2 * self.n {
            if self.blossom_base[b].is_some()
                && self.blossom_parent[b].is_none()
                && self.label[b] == T_LABEL
                && delta.as_ref().map_or(true, |(cur, _)| self.dual_var[b] < *cur)
            {
                delta = Some((self.dual_var[b], DeltaKind::ExpandBlossom(b)));
            }
        }

        // Max-cardinality mode with nothing left to grow: final dual cleanup
        delta.unwrap_or_else(|| (self.min_vertex_dual().max(0), DeltaKind::Finish))
    }

    fn scan_queue(&mut self) -> bool {
        while let Some(v) = self.queue.pop() {
            for idx in 0..self.neighbend[v].len() {
                let p = self.neighbend[v][idx];
                let k = p / 2;
                let w = self.endpoint[p];
                if self.in_blossom[v] == self.in_blossom[w] {
                    continue;
                }

                let mut k_slack = 0;
                if !self.allow_edge[k] {
                    k_slack = self.slack(k);
                    if k_slack <= 0 {
                        self.allow_edge[k] = true;
                    }
                }

                if self.allow_edge[k] {
                    let w_label = self.label[self.in_blossom[w]];
                    if w_label == FREE {
                        self.assign_label(w, T_LABEL, Some(p ^ 1));
                    } else if w_label == S_LABEL {
                        match self.scan_blossom(v, w) {
                            Some(base) => self.add_blossom(base, k),
                            None => {
                                self.augment_matching(k);
                                return true;
                            }
                        }
                    } else if self.label[w] == FREE {
                        // w is inside a T-blossom but not yet reached
                        self.label[w] = T_LABEL;
                        self.label_end[w] = Some(p ^ 1);
                    }
                } else if self.label[self.in_blossom[w]] == S_LABEL {
                    let b = self.in_blossom[v];
                    if self.best_edge[b].map_or(true, |cur| k_slack < self.slack(cur)) {
                        self.best_edge[b] = Some(k);
                    }
                } else if self.label[w] == FREE
                    && self.best_edge[w].map_or(true, |cur| k_slack < self.slack(cur))
                {
                    self.best_edge[w] = Some(k);
                }
            }
        }
        false
    }

    fn apply_delta(&mut self, delta: i64) {
        for v in 0..self.n {
            match self.label[self.in_blossom[v]] {
                S_LABEL => self.dual_var[v] -= delta,
                T_LABEL => self.dual_var[v] += delta,
                _ => {}
            }
        }
        for b in self.n..2 * self.n {
            if self.blossom_base[b].is_some() && self.blossom_parent[b].is_none() {
                match self.label[b] {
                    S_LABEL => self.dual_var[b] += delta,
                    T_LABEL => self.dual_var[b] -= delta,
                    _ => {}
                }
            }
        }
    }

    fn reset_stage(&mut self) {
        self.label.iter_mut().for_each(|label| *label = FREE);
        self.best_edge.iter_mut().for_each(|edge| *edge = None);
        for b in self.n..2 * self.n {
            self.blossom_best_edges[b] = None;
        }
        self.allow_edge.iter_mut().for_each(|allowed| *allowed = false);
        self.queue.clear();

        for v in 0..self.n {
            if self.mate[v].is_none() && self.label[self.in_blossom[v]] == FREE {
                self.assign_label(v, S_LABEL, None);
            }
        }
    }

    /// Run up to n stages; each stage either augments or proves optimality
    fn solve(mut self) -> Vec<Option<usize>> {
        for _ in 0..self.n {
            self.reset_stage();

            let augmented = loop {
                if self.scan_queue() {
                    break true;
                }

                let (delta, kind) = self.choose_delta();
                self.apply_delta(delta);

                match kind {
                    DeltaKind::Finish => break false,
                    DeltaKind::GrowEdge(edge) => {
                        self.allow_edge[edge] = true;
                        let (i, j, _) = self.edges[edge];
                        let s_vertex = if self.label[self.in_blossom[i]] == FREE {
                            j
                        } else {
                            i
                        };
                        self.queue.push(s_vertex);
                    }
                    DeltaKind::BlossomEdge(edge) => {
                        self.allow_edge[edge] = true;
                        let (i, _, _) = self.edges[edge];
                        self.queue.push(i);
                    }
                    DeltaKind::ExpandBlossom(b) => self.expand_blossom(b, false),
                }
            };

            if !augmented {
                break;
            }

            // Expand S-blossoms whose dual dropped to zero
            for b in self.n..2 * self.n {
                if self.blossom_parent[b].is_none()
                    && self.blossom_base[b].is_some()
                    && self.label[b] == S_LABEL
                    && self.dual_var[b] == 0
                {
                    self.expand_blossom(b, true);
                }
            }
        }

        self.mate
            .iter()
            .map(|mate| mate.map(|p| self.endpoint[p]))
            .collect()
    }
}
