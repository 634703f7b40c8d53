//! Primal-dual search state of the blossom algorithm.
//!
//! Ids `0..n` are vertices and ids `n..2n` are non-trivial blossoms. A
//! vertex that is not inside any blossom acts as its own trivial top-level
//! blossom, so every table below is indexed by the shared id space.
//!
//! Vertex duals use the doubled convention: the slack of edge `(u, v)` is
//! `y(u) + y(v) - 2 w(u, v)`, and blossom duals `z(b)` enter the slack of
//! edges inside `b` with factor two.

use log::trace;

use super::graph::WeightedGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Label {
    Free,
    Outer,
    Inner,
}

/// An edge traversed in a fixed direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Link {
    pub edge: usize,
    pub from: usize,
    pub to: usize,
}

impl Link {
    #[inline]
    pub fn reversed(self) -> Self {
        Self {
            edge: self.edge,
            from: self.to,
            to: self.from,
        }
    }
}

/// The dual adjustment chosen when the queue runs dry.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Delta {
    /// Outer vertex duals reach zero; nothing else can change.
    Shrink,
    /// An edge from an outer to a free vertex becomes tight.
    Grow(usize),
    /// An edge between two outer blossoms becomes tight.
    Merge(usize),
    /// An inner blossom's dual reaches zero.
    Expand(usize),
}

/// Depth-first walk over the vertices contained in a (possibly nested)
/// blossom.
pub(super) struct Leaves<'a> {
    n: usize,
    children: &'a [Vec<usize>],
    stack: Vec<usize>,
}

impl<'a> Leaves<'a> {
    pub fn new(children: &'a [Vec<usize>], n: usize, b: usize) -> Self {
        Self {
            n,
            children,
            stack: vec![b],
        }
    }
}

impl Iterator for Leaves<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some(t) = self.stack.pop() {
            if t < self.n {
                return Some(t);
            }
            self.stack.extend(self.children[t].iter().copied());
        }
        None
    }
}

/// All mutable state of one solve, owned by the solving call.
pub(super) struct SearchContext<'g> {
    pub(super) graph: &'g WeightedGraph,
    pub(super) n: usize,
    pub(super) max_cardinality: bool,

    /// `mate[v]` leads from `v` to its partner.
    pub(super) mate: Vec<Option<Link>>,
    label: Vec<Label>,
    /// Edge through which a top-level blossom got its label, pointing into
    /// the blossom. For a vertex inside an inner blossom, the edge through
    /// which it is reachable from outside.
    label_link: Vec<Option<Link>>,
    /// Top-level blossom containing each vertex.
    in_blossom: Vec<usize>,
    pub(super) parent: Vec<Option<usize>>,
    /// Sub-blossoms in cyclic order, starting with the one holding the base.
    pub(super) children: Vec<Vec<usize>>,
    /// `links[b][i]` joins `children[b][i]` to `children[b][i + 1]`.
    pub(super) links: Vec<Vec<Link>>,
    base: Vec<usize>,
    /// Least-slack edge towards an outer blossom (for free vertices and
    /// top-level outer blossoms).
    best_edge: Vec<Option<usize>>,
    /// Least-slack edges from a non-trivial outer blossom to each
    /// neighbouring outer blossom; `None` until computed.
    best_edges_out: Vec<Option<Vec<usize>>>,
    free_ids: Vec<usize>,
    pub(super) dual: Vec<f64>,
    allowed: Vec<bool>,
    breadcrumb: Vec<bool>,
    queue: Vec<usize>,
}

impl<'g> SearchContext<'g> {
    pub fn new(graph: &'g WeightedGraph, max_cardinality: bool) -> Self {
        let n = graph.node_count();
        let init = graph.max_weight().unwrap_or(0.0).max(0.0);
        let mut dual = vec![init; n];
        dual.resize(2 * n, 0.0);

        Self {
            graph,
            n,
            max_cardinality,
            mate: vec![None; n],
            label: vec![Label::Free; 2 * n],
            label_link: vec![None; 2 * n],
            in_blossom: (0..n).collect(),
            parent: vec![None; 2 * n],
            children: vec![Vec::new(); 2 * n],
            links: vec![Vec::new(); 2 * n],
            base: (0..n).chain(std::iter::repeat(0).take(n)).collect(),
            best_edge: vec![None; 2 * n],
            best_edges_out: vec![None; 2 * n],
            free_ids: (n..2 * n).rev().collect(),
            dual,
            allowed: vec![false; graph.edge_count()],
            breadcrumb: vec![false; 2 * n],
            queue: Vec::new(),
        }
    }

    /// Whether id `b` currently denotes a vertex or an allocated blossom.
    #[inline]
    pub(super) fn is_live(&self, b: usize) -> bool {
        b < self.n || !self.children[b].is_empty()
    }

    #[inline]
    pub(super) fn slack(&self, k: usize) -> f64 {
        let e = self.graph.edge(k);
        self.dual[e.u] + self.dual[e.v] - 2.0 * e.weight
    }

    #[inline]
    fn child_at(&self, b: usize, j: isize) -> usize {
        let c = &self.children[b];
        c[j.rem_euclid(c.len() as isize) as usize]
    }

    #[inline]
    fn link_at(&self, b: usize, j: isize) -> Link {
        let l = &self.links[b];
        l[j.rem_euclid(l.len() as isize) as usize]
    }

    fn leaves_of(&self, b: usize) -> Vec<usize> {
        Leaves::new(&self.children, self.n, b).collect()
    }

    /// Matched pairs `(u, v)` with `u < v`, ordered by `u`.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        (0..self.n)
            .filter_map(|v| self.mate[v].map(|l| (v, l.to)))
            .filter(|&(u, v)| u < v)
            .collect()
    }

    /// Runs one stage: grows alternating trees from every exposed vertex
    /// until the matching is augmented (`true`) or shown optimal (`false`).
    pub fn run_stage(&mut self) -> bool {
        self.begin_stage();
        loop {
            if self.scan_queue() {
                return true;
            }

            let (delta, kind) = self.choose_delta();
            trace!("blossom: delta {delta} ({kind:?})");
            self.apply_delta(delta);

            match kind {
                Delta::Shrink => return false,
                Delta::Grow(k) | Delta::Merge(k) => {
                    self.allowed[k] = true;
                    let e = self.graph.edge(k);
                    let v = if self.label[self.in_blossom[e.u]] == Label::Outer {
                        e.u
                    } else {
                        e.v
                    };
                    self.queue.push(v);
                }
                Delta::Expand(b) => self.expand_blossom(b, false),
            }
        }
    }

    /// Dissolves top-level outer blossoms whose dual dropped to zero.
    pub fn expand_spent_blossoms(&mut self) {
        for b in self.n..2 * self.n {
            if self.is_live(b)
                && self.parent[b].is_none()
                && self.label[b] == Label::Outer
                && self.dual[b] <= 0.0
            {
                self.expand_blossom(b, true);
            }
        }
    }

    fn begin_stage(&mut self) {
        self.label.fill(Label::Free);
        self.label_link.fill(None);
        self.best_edge.fill(None);
        self.best_edges_out.fill(None);
        self.allowed.fill(false);
        self.queue.clear();

        for v in 0..self.n {
            if self.mate[v].is_none() && self.label[self.in_blossom[v]] == Label::Free {
                self.assign_label(v, Label::Outer, None);
            }
        }
    }

    /// Scans edges out of queued outer vertices. Returns `true` once an
    /// augmenting path has been applied.
    fn scan_queue(&mut self) -> bool {
        let graph = self.graph;
        while let Some(v) = self.queue.pop() {
            debug_assert_eq!(self.label[self.in_blossom[v]], Label::Outer);

            for &k in graph.incident(v) {
                let w = graph.edge(k).other(v);
                let bv = self.in_blossom[v];
                let bw = self.in_blossom[w];
                if bv == bw {
                    continue;
                }

                let mut kslack = 0.0;
                if !self.allowed[k] {
                    kslack = self.slack(k);
                    if kslack <= 0.0 {
                        self.allowed[k] = true;
                    }
                }

                if self.allowed[k] {
                    let link = Link {
                        edge: k,
                        from: v,
                        to: w,
                    };
                    match self.label[bw] {
                        Label::Free => self.assign_label(w, Label::Inner, Some(link)),
                        Label::Outer => match self.scan_blossom(v, w) {
                            Some(base) => self.add_blossom(base, link),
                            None => {
                                self.augment_matching(link);
                                return true;
                            }
                        },
                        Label::Inner => {
                            if self.label[w] == Label::Free {
                                self.label[w] = Label::Inner;
                                self.label_link[w] = Some(link);
                            }
                        }
                    }
                } else if self.label[bw] == Label::Outer {
                    if self.best_edge[bv].map_or(true, |e| kslack < self.slack(e)) {
                        self.best_edge[bv] = Some(k);
                    }
                } else if self.label[w] == Label::Free
                    && self.best_edge[w].map_or(true, |e| kslack < self.slack(e))
                {
                    self.best_edge[w] = Some(k);
                }
            }
        }
        false
    }

    fn choose_delta(&self) -> (f64, Delta) {
        let min_vertex_dual = self.dual[..self.n]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);

        let mut best: Option<(f64, Delta)> = None;
        if !self.max_cardinality {
            best = Some((min_vertex_dual, Delta::Shrink));
        }
        let mut consider = |d: f64, kind: Delta| {
            if best.map_or(true, |(current, _)| d < current) {
                best = Some((d, kind));
            }
        };

        for v in 0..self.n {
            if self.label[self.in_blossom[v]] == Label::Free {
                if let Some(k) = self.best_edge[v] {
                    consider(self.slack(k), Delta::Grow(k));
                }
            }
        }
        for b in 0..2 * self.n {
            if self.is_live(b) && self.parent[b].is_none() && self.label[b] == Label::Outer {
                if let Some(k) = self.best_edge[b] {
                    consider(self.slack(k) / 2.0, Delta::Merge(k));
                }
            }
        }
        for b in self.n..2 * self.n {
            if self.is_live(b) && self.parent[b].is_none() && self.label[b] == Label::Inner {
                consider(self.dual[b], Delta::Expand(b));
            }
        }

        // Only reachable under max_cardinality: no further growth is possible.
        best.unwrap_or((min_vertex_dual.max(0.0), Delta::Shrink))
    }

    fn apply_delta(&mut self, delta: f64) {
        for v in 0..self.n {
            match self.label[self.in_blossom[v]] {
                Label::Outer => self.dual[v] -= delta,
                Label::Inner => self.dual[v] += delta,
                Label::Free => {}
            }
        }
        for b in self.n..2 * self.n {
            if self.is_live(b) && self.parent[b].is_none() {
                match self.label[b] {
                    Label::Outer => self.dual[b] += delta,
                    Label::Inner => self.dual[b] -= delta,
                    Label::Free => {}
                }
            }
        }
    }

    /// Labels the top-level blossom containing `w`. An inner label is
    /// immediately followed by an outer label on the mate of its base.
    fn assign_label(&mut self, w: usize, label: Label, link: Option<Link>) {
        let (mut w, mut label, mut link) = (w, label, link);
        loop {
            let b = self.in_blossom[w];
            debug_assert!(self.label[w] == Label::Free && self.label[b] == Label::Free);
            self.label[w] = label;
            self.label[b] = label;
            self.label_link[w] = link;
            self.label_link[b] = link;
            self.best_edge[w] = None;
            self.best_edge[b] = None;

            if label == Label::Outer {
                self.queue
                    .extend(Leaves::new(&self.children, self.n, b));
                return;
            }

            let base = self.base[b];
            let m = self.mate[base].expect("the base of an inner blossom is matched");
            w = m.to;
            label = Label::Outer;
            link = Some(m);
        }
    }

    /// Traces back from `v` and `w` towards the tree roots. Returns the base
    /// of the new blossom if both paths meet, or `None` if they end at two
    /// different exposed vertices (an augmenting path).
    fn scan_blossom(&mut self, v: usize, w: usize) -> Option<usize> {
        let mut path = Vec::new();
        let mut base = None;
        let (mut v, mut w) = (Some(v), Some(w));

        while let Some(x) = v {
            let b = self.in_blossom[x];
            if self.breadcrumb[b] {
                base = Some(self.base[b]);
                break;
            }
            debug_assert_eq!(self.label[b], Label::Outer);
            path.push(b);
            self.breadcrumb[b] = true;

            v = self.label_link[b].and_then(|l| {
                let bt = self.in_blossom[l.from];
                debug_assert_eq!(self.label[bt], Label::Inner);
                self.label_link[bt].map(|t| t.from)
            });
            if w.is_some() {
                std::mem::swap(&mut v, &mut w);
            }
        }

        for b in path {
            self.breadcrumb[b] = false;
        }
        base
    }

    /// Contracts the odd cycle closed by `link` (joining two outer vertices
    /// of one tree) into a new outer blossom with the given base.
    fn add_blossom(&mut self, base: usize, link: Link) {
        let n = self.n;
        let bb = self.in_blossom[base];
        let mut bv = self.in_blossom[link.from];
        let mut bw = self.in_blossom[link.to];

        let b = self
            .free_ids
            .pop()
            .expect("at most n/2 blossoms exist at once");
        self.base[b] = base;
        self.parent[b] = None;
        self.parent[bb] = Some(b);

        let mut path = Vec::new();
        let mut chain = vec![link];
        while bv != bb {
            self.parent[bv] = Some(b);
            path.push(bv);
            let l = self.label_link[bv].expect("labelled blossoms below the base carry a link");
            chain.push(l);
            bv = self.in_blossom[l.from];
        }
        path.push(bb);
        path.reverse();
        chain.reverse();
        while bw != bb {
            self.parent[bw] = Some(b);
            path.push(bw);
            let l = self.label_link[bw].expect("labelled blossoms below the base carry a link");
            chain.push(l.reversed());
            bw = self.in_blossom[l.from];
        }

        debug_assert_eq!(self.label[bb], Label::Outer);
        self.label[b] = Label::Outer;
        self.label_link[b] = self.label_link[bb];
        self.dual[b] = 0.0;
        self.children[b] = path;
        self.links[b] = chain;

        for v in self.leaves_of(b) {
            if self.label[self.in_blossom[v]] == Label::Inner {
                // Inner vertices turn outer inside the new blossom.
                self.queue.push(v);
            }
            self.in_blossom[v] = b;
        }

        let graph = self.graph;
        let mut best_to: Vec<Option<usize>> = vec![None; 2 * n];
        for i in 0..self.children[b].len() {
            let sub = self.children[b][i];
            let candidates: Vec<usize> = match self.best_edges_out[sub].take() {
                Some(list) => list,
                None => Leaves::new(&self.children, n, sub)
                    .flat_map(|x| graph.incident(x).iter().copied())
                    .collect(),
            };
            for k in candidates {
                let e = graph.edge(k);
                let j = if self.in_blossom[e.v] == b { e.u } else { e.v };
                let bj = self.in_blossom[j];
                if bj != b
                    && self.label[bj] == Label::Outer
                    && best_to[bj].map_or(true, |cur| self.slack(k) < self.slack(cur))
                {
                    best_to[bj] = Some(k);
                }
            }
            self.best_edge[sub] = None;
        }

        let list: Vec<usize> = best_to.into_iter().flatten().collect();
        let mut best = None;
        for &k in &list {
            if best.map_or(true, |cur| self.slack(k) < self.slack(cur)) {
                best = Some(k);
            }
        }
        self.best_edge[b] = best;
        self.best_edges_out[b] = Some(list);

        trace!(
            "blossom: contracted {} sub-blossoms into {b} (base {base})",
            self.children[b].len()
        );
    }

    /// Turns the children of top-level blossom `b` back into top-level
    /// blossoms. During a stage an inner blossom's children are relabelled
    /// so the alternating tree stays consistent; at the end of a stage,
    /// zero-dual sub-blossoms are dissolved as well.
    fn expand_blossom(&mut self, b: usize, endstage: bool) {
        let mut pending = vec![b];
        while let Some(b) = pending.pop() {
            for i in 0..self.children[b].len() {
                let s = self.children[b][i];
                self.parent[s] = None;
                if s < self.n {
                    self.in_blossom[s] = s;
                } else if endstage && self.dual[s] <= 0.0 {
                    pending.push(s);
                } else {
                    for v in self.leaves_of(s) {
                        self.in_blossom[v] = s;
                    }
                }
            }

            if !endstage && self.label[b] == Label::Inner {
                self.relabel_expanded(b);
            }
            self.release(b);
            trace!("blossom: expanded {b} (endstage: {endstage})");
        }
    }

    /// Relabels the children of an inner blossom being expanded mid-stage:
    /// the even-length path from the entry child to the base becomes part of
    /// the alternating tree, and children off that path are relabelled only
    /// if reachable from an outer vertex.
    fn relabel_expanded(&mut self, b: usize) {
        let entry = self.label_link[b].expect("an inner blossom carries a label link");
        let entry_child = self.in_blossom[entry.to];
        let len = self.children[b].len() as isize;
        let mut j = self.children[b]
            .iter()
            .position(|&c| c == entry_child)
            .expect("the entry child belongs to the blossom") as isize;
        let step: isize = if j & 1 == 1 {
            j -= len;
            1
        } else {
            -1
        };

        let mut link = entry;
        while j != 0 {
            let next = if step == 1 {
                self.link_at(b, j)
            } else {
                self.link_at(b, j - 1).reversed()
            };
            self.label[link.to] = Label::Free;
            self.label[next.to] = Label::Free;
            self.assign_label(link.to, Label::Inner, Some(link));
            self.allowed[next.edge] = true;
            j += step;

            link = if step == 1 {
                self.link_at(b, j)
            } else {
                self.link_at(b, j - 1).reversed()
            };
            self.allowed[link.edge] = true;
            j += step;
        }

        // The base child becomes inner without labelling through its mate.
        let bw = self.child_at(b, j);
        self.label[link.to] = Label::Inner;
        self.label[bw] = Label::Inner;
        self.label_link[link.to] = Some(link);
        self.label_link[bw] = Some(link);
        self.best_edge[bw] = None;
        j += step;

        while self.child_at(b, j) != entry_child {
            let bv = self.child_at(b, j);
            if self.label[bv] == Label::Outer {
                j += step;
                continue;
            }
            let reached = if bv < self.n {
                (self.label[bv] != Label::Free).then_some(bv)
            } else {
                Leaves::new(&self.children, self.n, bv).find(|&v| self.label[v] != Label::Free)
            };
            if let Some(v) = reached {
                debug_assert_eq!(self.label[v], Label::Inner);
                debug_assert_eq!(self.in_blossom[v], bv);
                self.label[v] = Label::Free;
                let m = self.mate[self.base[bv]].expect("a sub-blossom base is matched");
                self.label[m.to] = Label::Free;
                let via = self.label_link[v];
                self.assign_label(v, Label::Inner, via);
            }
            j += step;
        }
    }

    fn release(&mut self, b: usize) {
        self.label[b] = Label::Free;
        self.label_link[b] = None;
        self.best_edge[b] = None;
        self.best_edges_out[b] = None;
        self.children[b].clear();
        self.links[b].clear();
        self.parent[b] = None;
        self.dual[b] = 0.0;
        self.free_ids.push(b);
    }

    /// Flips matched and unmatched edges on the alternating path from `v`
    /// to the base of blossom `b`, making `v` the new base.
    fn augment_blossom(&mut self, b: usize, v: usize) {
        let mut pending = vec![(b, v)];
        while let Some((b, v)) = pending.pop() {
            let mut t = v;
            while self.parent[t] != Some(b) {
                t = self.parent[t].expect("v lies inside b");
            }
            if t >= self.n {
                pending.push((t, v));
            }

            let len = self.children[b].len() as isize;
            let i = self.children[b]
                .iter()
                .position(|&c| c == t)
                .expect("t is a child of b");
            let mut j = i as isize;
            let step: isize = if i & 1 == 1 {
                j -= len;
                1
            } else {
                -1
            };

            while j != 0 {
                j += step;
                let first = self.child_at(b, j);
                let l = if step == 1 {
                    self.link_at(b, j)
                } else {
                    self.link_at(b, j - 1).reversed()
                };
                if first >= self.n {
                    pending.push((first, l.from));
                }
                j += step;
                let second = self.child_at(b, j);
                if second >= self.n {
                    pending.push((second, l.to));
                }
                self.mate[l.from] = Some(l);
                self.mate[l.to] = Some(l.reversed());
            }

            self.children[b].rotate_left(i);
            self.links[b].rotate_left(i);
            self.base[b] = v;
        }
    }

    /// Applies the augmenting path through `link`, which joins outer
    /// vertices of two different trees.
    fn augment_matching(&mut self, link: Link) {
        for start in [link, link.reversed()] {
            let mut l = start;
            loop {
                let s = l.from;
                let bs = self.in_blossom[s];
                debug_assert_eq!(self.label[bs], Label::Outer);
                if bs >= self.n {
                    self.augment_blossom(bs, s);
                }
                self.mate[s] = Some(l);

                let Some(back) = self.label_link[bs] else {
                    break;
                };
                let bt = self.in_blossom[back.from];
                debug_assert_eq!(self.label[bt], Label::Inner);
                let inner = self.label_link[bt].expect("inner blossoms carry a label link");
                if bt >= self.n {
                    self.augment_blossom(bt, inner.to);
                }
                self.mate[inner.to] = Some(inner.reversed());
                l = inner;
            }
        }
        trace!("blossom: augmented through edge {}", link.edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaves_walks_nested_children() {
        // Vertices 0..4, blossom 5 = {0, 1, 6}, blossom 6 = {2, 3, 4}.
        let mut children = vec![Vec::new(); 10];
        children[5] = vec![0, 1, 6];
        children[6] = vec![2, 3, 4];
        let mut leaves: Vec<usize> = Leaves::new(&children, 5, 5).collect();
        leaves.sort_unstable();
        assert_eq!(leaves, vec![0, 1, 2, 3, 4]);

        let single: Vec<usize> = Leaves::new(&children, 5, 3).collect();
        assert_eq!(single, vec![3]);
    }

    #[test]
    fn test_link_reversed() {
        let l = Link {
            edge: 4,
            from: 1,
            to: 2,
        };
        assert_eq!(
            l.reversed(),
            Link {
                edge: 4,
                from: 2,
                to: 1
            }
        );
        assert_eq!(l.reversed().reversed(), l);
    }

    #[test]
    fn test_initial_duals_and_slack() {
        let g = WeightedGraph::from_edges(3, [(0, 1, 4.0), (1, 2, -1.0)]).unwrap();
        let ctx = SearchContext::new(&g, false);
        assert_eq!(&ctx.dual[..3], &[4.0, 4.0, 4.0]);
        assert_eq!(ctx.slack(0), 0.0);
        assert_eq!(ctx.slack(1), 10.0);
        assert!(ctx.is_live(2));
        assert!(!ctx.is_live(3));
    }

    #[test]
    fn test_single_stage_on_one_edge() {
        let g = WeightedGraph::from_edges(2, [(0, 1, 1.0)]).unwrap();
        let mut ctx = SearchContext::new(&g, false);
        assert!(ctx.run_stage());
        assert_eq!(ctx.pairs(), vec![(0, 1)]);
        assert!(!ctx.run_stage());
    }

    #[test]
    fn test_odd_cycle_with_pendant() {
        // The pentagon is contracted before the pendant edge augments.
        let g = WeightedGraph::from_edges(
            6,
            [
                (0, 1, 6.0),
                (1, 2, 6.0),
                (2, 3, 6.0),
                (3, 4, 6.0),
                (4, 0, 6.0),
                (4, 5, 1.0),
            ],
        )
        .unwrap();
        let mut ctx = SearchContext::new(&g, false);
        while ctx.run_stage() {
            ctx.expand_spent_blossoms();
        }
        let pairs = ctx.pairs();
        assert_eq!(pairs.len(), 3);
        let total: f64 = pairs
            .iter()
            .map(|&(u, v)| g.weight_between(u, v).unwrap())
            .sum();
        assert!((total - 13.0).abs() < 1e-12);
    }
}
