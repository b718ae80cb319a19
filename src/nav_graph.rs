//! Waypoint graphs over a room's standable surfaces.
//!
//! Building happens in two breadth-first passes over the room's occupancy grid. The scan pass
//! floods the room from its spawn point and drops nodes on ledges. Every platform or floor run
//! gets a node at both ends and every `platform_node_spacing` cells in between. The link pass
//! floods a bounded window around each node and adds an edge from every other node found there,
//! provided the straight segment between the two stays clear of the room's walls. Edges point
//! toward the node whose window found them. A pair is linked both ways only when each window can
//! walk to the other node.

use crate::{
    config::NavConfig,
    geometry::{GridPoint, Hitbox, Line, Vector2F},
    grid::{CellState, Direction, Grid, OccupancyGrid, ALL_DIRECTIONS},
    room::Room,
    spatial::SpatialIndex,
};

use log::{info, warn};
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeSet, VecDeque};

pub type NodeId = GridPoint;

const SIDES: [Direction; 2] = [Direction::Left, Direction::Right];

/// A room's navigation graph. Immutable once built.
#[derive(Clone, Debug)]
pub struct NavGraph {
    origin: Vector2F,
    grid: OccupancyGrid,
    graph: DiGraphMap<NodeId, ()>,
    index: SpatialIndex<NodeId>,
}

impl NavGraph {
    pub fn build(room: &Room, config: &NavConfig) -> Self {
        let grid = OccupancyGrid::build(room, config);
        let origin = room.offset();
        let seed = match room.nav_seed() {
            Some(p) => p,
            None => {
                warn!(
                    "Room from template {} has no player or enemy spawn; scanning from its center",
                    room.template_index()
                );
                room.center()
            }
        };

        let mut builder = Builder {
            config,
            walls: room.walls().iter().map(|w| w.translated(-origin)).collect(),
            grid,
            nodes: BTreeSet::new(),
        };
        let seed_cell = builder.grid.cell_of(seed - origin);
        builder.scan(seed_cell);

        let mut graph = DiGraphMap::new();
        for node in builder.nodes.iter() {
            graph.add_node(*node);
        }
        for anchor in builder.nodes.iter() {
            for far in builder.linkable_to(*anchor) {
                graph.add_edge(far, *anchor, ());
            }
        }

        let cell_size = builder.grid.cell_size();
        let index = SpatialIndex::build(
            builder
                .nodes
                .iter()
                .map(|n| (origin + n.center(cell_size), *n)),
        );

        info!(
            "Built navigation graph for room from template {}: {} nodes, {} edges",
            room.template_index(),
            graph.node_count(),
            graph.edge_count()
        );

        NavGraph {
            origin,
            grid: builder.grid,
            graph,
            index,
        }
    }

    /// The occupancy grid the graph was built from, in room-local cells. Node cells are `Visited`.
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.nodes()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.graph.contains_node(node)
    }

    pub fn contains_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.graph.contains_edge(from, to)
    }

    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.graph.all_edges().map(|(a, b, _)| (a, b))
    }

    /// World-space position of `node`.
    pub fn position(&self, node: NodeId) -> Vector2F {
        self.origin + node.center(self.grid.cell_size())
    }

    /// The node closest to the world-space `point`. `None` only for a graph without nodes.
    pub fn nearest(&self, point: Vector2F) -> Option<NodeId> {
        self.index.nearest(point)
    }

    /// Nodes reachable from `node` along one edge, in insertion order.
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        if !self.graph.contains_node(node) {
            return Vec::new();
        }

        self.graph.neighbors(node).collect()
    }
}

struct Builder<'a> {
    config: &'a NavConfig,
    /// Room walls in room-local space.
    walls: Vec<Hitbox>,
    grid: OccupancyGrid,
    nodes: BTreeSet<NodeId>,
}

impl<'a> Builder<'a> {
    fn state(&self, p: GridPoint) -> CellState {
        self.grid.state_or_empty(p)
    }

    fn add_node(&mut self, p: GridPoint) {
        self.nodes.insert(p);
        self.grid.set(p, CellState::Visited);
    }

    fn scan(&mut self, seed: GridPoint) {
        let cells = self.grid.cells();
        let mut seen = Grid::new(cells.size(), -cells.extent().0.x, false);
        let mut queue = VecDeque::new();
        seen[seed] = true;
        queue.push_back(seed);

        while let Some(cur) = queue.pop_front() {
            if cur != seed {
                match self.state(cur) {
                    // Doorways lead out of the room.
                    CellState::Opening => continue,
                    CellState::Empty => self.classify(cur),
                    CellState::Solid | CellState::Visited => {}
                }
            }

            for dir in ALL_DIRECTIONS.iter() {
                if let Some(n) = self.grid.cells().neighbor(cur, *dir) {
                    if !seen[n] && self.state(n) != CellState::Solid {
                        seen[n] = true;
                        queue.push_back(n);
                    }
                }
            }
        }
    }

    /// Decides whether an unclaimed cell is a ledge worth a waypoint.
    fn classify(&mut self, cur: GridPoint) {
        if !self.state(cur.below()).is_floor() {
            return;
        }

        let side = |b: &Self, d: Direction| b.state(d.step(cur));
        let drops = |b: &Self, d: Direction| !b.state(d.step(cur).below()).is_floor();

        // Edge of a platform: walk back along it.
        if let Some(d) = SIDES
            .iter()
            .copied()
            .find(|d| side(self, *d).is_open() && drops(self, *d))
        {
            self.platform_run(cur, d.negate());
            return;
        }

        let walled: Vec<Direction> = SIDES
            .iter()
            .copied()
            .filter(|d| side(self, *d) == CellState::Solid)
            .collect();
        match walled.as_slice() {
            // Corner against a wall: walk away from it.
            [d] => self.platform_run(cur, d.negate()),
            // A one-cell perch between two walls.
            [_, _] => self.add_node(cur),
            _ => {
                let threshold = SIDES
                    .iter()
                    .any(|d| side(self, *d) == CellState::Opening && drops(self, *d));
                if threshold {
                    self.add_node(cur);
                }
            }
        }
    }

    /// Claims every cell of the run starting at `start` and heading `dir`, placing nodes at both
    /// ends and every `platform_node_spacing` cells in between.
    fn platform_run(&mut self, start: GridPoint, dir: Direction) {
        let spacing = self.config.platform_node_spacing.max(1);
        let mut cur = start;
        let mut steps = 0;
        loop {
            self.grid.set(cur, CellState::Visited);

            let next = dir.step(cur);
            let ends = match self.grid.state(next) {
                Some(CellState::Empty) => !self.state(next.below()).is_floor(),
                _ => true,
            };
            if steps % spacing == 0 || ends {
                self.add_node(cur);
            }
            if ends {
                break;
            }

            cur = next;
            steps += 1;
        }
    }

    fn in_link_window(&self, anchor: GridPoint, p: GridPoint) -> bool {
        let dx = p.x - anchor.x;
        let dy = p.y - anchor.y;

        dx.abs() <= self.config.max_link_dx
            && dy.abs() <= self.config.max_link_dy
            && p.euclidean_distance(&anchor) <= self.config.link_radius
    }

    /// Nodes in the window around `anchor` that can reach it without walking or seeing through a
    /// wall.
    fn linkable_to(&self, anchor: GridPoint) -> Vec<NodeId> {
        let cells = self.grid.cells();
        let cell_size = self.grid.cell_size();
        let target = anchor.center(cell_size);

        let mut found = Vec::new();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        seen.insert(anchor);
        queue.push_back(anchor);
        while let Some(cur) = queue.pop_front() {
            if cur != anchor && self.nodes.contains(&cur) {
                let sight = Line::new(cur.center(cell_size), target);
                if !sight.crosses_any(self.walls.iter()) {
                    found.push(cur);
                }
            }

            for dir in ALL_DIRECTIONS.iter() {
                let n = match cells.neighbor(cur, *dir) {
                    Some(n) => n,
                    None => continue,
                };
                let passable = match self.state(n) {
                    CellState::Empty | CellState::Visited => true,
                    CellState::Solid | CellState::Opening => false,
                };
                if passable && self.in_link_window(anchor, n) && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }

        found
    }
}

/// Builds the navigation graph for one placed room.
pub fn build_nav_graph(room: &Room, config: &NavConfig) -> NavGraph {
    NavGraph::build(room, config)
}
