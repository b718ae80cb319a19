use crate::{
    config::NavConfig,
    geometry::{GridPoint, Hitbox, Vector2F},
    room::Room,
};

use std::ops::{Index, IndexMut, RangeInclusive};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn negate(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn step(self, p: GridPoint) -> GridPoint {
        let (dx, dy) = self.offset();

        p.offset(dx, dy)
    }
}

/// A square, dense 2D array addressed by `GridPoint`s. Point `(0, 0)` lives at array position
/// `(bias, bias)`, so negative points are valid down to `-bias`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    size: usize,
    bias: i32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(size: usize, bias: i32, fill: T) -> Self {
        Grid {
            size,
            bias,
            cells: vec![fill; size * size],
        }
    }
}

impl<T> Grid<T> {
    pub fn size(&self) -> usize {
        self.size
    }

    /// The smallest and largest points the grid covers.
    pub fn extent(&self) -> (GridPoint, GridPoint) {
        let lo = -self.bias;
        let hi = self.size as i32 - 1 - self.bias;

        (GridPoint::new(lo, lo), GridPoint::new(hi, hi))
    }

    fn linear_index(&self, p: GridPoint) -> Option<usize> {
        let x = p.x + self.bias;
        let y = p.y + self.bias;
        let size = self.size as i32;
        if x < 0 || y < 0 || x >= size || y >= size {
            return None;
        }

        Some(y as usize * self.size + x as usize)
    }

    pub fn contains(&self, p: GridPoint) -> bool {
        self.linear_index(p).is_some()
    }

    pub fn get(&self, p: GridPoint) -> Option<&T> {
        self.linear_index(p).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, p: GridPoint) -> Option<&mut T> {
        match self.linear_index(p) {
            Some(i) => Some(&mut self.cells[i]),
            None => None,
        }
    }

    /// The adjacent point in `dir`, if the grid covers it.
    pub fn neighbor(&self, p: GridPoint, dir: Direction) -> Option<GridPoint> {
        let n = dir.step(p);
        if self.contains(n) {
            Some(n)
        } else {
            None
        }
    }

    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        let (lo, hi) = self.extent();
        (lo.y..=hi.y).flat_map(move |y| (lo.x..=hi.x).map(move |x| GridPoint::new(x, y)))
    }

    fn out_of_bounds(&self, p: GridPoint) -> ! {
        let (lo, hi) = self.extent();
        panic!(
            "Grid point {:?} lies outside the allocated grid {:?}..={:?}",
            p, lo, hi
        );
    }
}

/// Out-of-bounds access is a sizing bug, not a runtime condition, so it panics.
impl<T> Index<GridPoint> for Grid<T> {
    type Output = T;

    fn index(&self, p: GridPoint) -> &T {
        match self.linear_index(p) {
            Some(i) => &self.cells[i],
            None => self.out_of_bounds(p),
        }
    }
}

impl<T> IndexMut<GridPoint> for Grid<T> {
    fn index_mut(&mut self, p: GridPoint) -> &mut T {
        match self.linear_index(p) {
            Some(i) => &mut self.cells[i],
            None => self.out_of_bounds(p),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CellState {
    Empty,
    Solid,
    Opening,
    /// Claimed by a navigation node or platform run.
    Visited,
}

impl CellState {
    /// Something an agent can stand on.
    pub fn is_floor(self) -> bool {
        matches!(self, CellState::Solid | CellState::Opening)
    }

    /// Air an agent can occupy or fall through.
    pub fn is_open(self) -> bool {
        matches!(self, CellState::Empty | CellState::Visited)
    }
}

/// One room's walls and entrance openings, rasterized in room-local space.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    cells: Grid<CellState>,
    cell_size: f32,
}

impl OccupancyGrid {
    pub fn empty(config: &NavConfig) -> Self {
        OccupancyGrid {
            cells: Grid::new(config.grid_size, config.grid_bias(), CellState::Empty),
            cell_size: config.cell_size,
        }
    }

    /// Rasterizes `room` relative to its offset. Walls always win over openings.
    ///
    /// Panics if any hitbox falls outside the grid; `NavConfig::grid_size` must cover every room.
    pub fn build(room: &Room, config: &NavConfig) -> Self {
        let mut grid = Self::empty(config);
        let to_local = room.offset().negated();

        for wall in room.walls() {
            grid.fill(&wall.translated(to_local), |_| CellState::Solid);
        }
        for e in room.entrances() {
            grid.fill(&e.hitbox().translated(to_local), |s| match s {
                CellState::Solid => CellState::Solid,
                _ => CellState::Opening,
            });
        }

        grid
    }

    fn fill(&mut self, hitbox: &Hitbox, paint: impl Fn(CellState) -> CellState) {
        let xs = self.cell_span(hitbox.left, hitbox.right);
        let ys = self.cell_span(hitbox.top, hitbox.bottom);
        for y in ys {
            for x in xs.clone() {
                let cell = &mut self.cells[GridPoint::new(x, y)];
                *cell = paint(*cell);
            }
        }
    }

    /// Cells touched by `[lo, hi]` along one axis. A degenerate span still covers one cell.
    fn cell_span(&self, lo: f32, hi: f32) -> RangeInclusive<i32> {
        let first = (lo / self.cell_size).floor() as i32;
        let last = ((hi / self.cell_size).ceil() as i32 - 1).max(first);

        first..=last
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cells(&self) -> &Grid<CellState> {
        &self.cells
    }

    /// Cell containing a room-local point.
    pub fn cell_of(&self, local: Vector2F) -> GridPoint {
        local.to_grid(self.cell_size)
    }

    /// Room-local center of a cell.
    pub fn cell_center(&self, p: GridPoint) -> Vector2F {
        p.center(self.cell_size)
    }

    pub fn state(&self, p: GridPoint) -> Option<CellState> {
        self.cells.get(p).copied()
    }

    /// Like `state`, but reads cells beyond the grid edge as empty.
    pub fn state_or_empty(&self, p: GridPoint) -> CellState {
        self.state(p).unwrap_or(CellState::Empty)
    }

    pub(crate) fn set(&mut self, p: GridPoint, state: CellState) {
        self.cells[p] = state;
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.cells.iter().filter(|s| **s == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Entrance, RoomTemplate, SpawnMarkers};

    fn single_wall_room(wall: Hitbox, offset: Vector2F) -> Room {
        let template = RoomTemplate::new(vec![wall], Vec::new(), SpawnMarkers::default());

        Room::instantiate(0, &template, offset)
    }

    #[test]
    fn test_small_wall_marks_only_its_cell() {
        let config = NavConfig::default();
        let room = single_wall_room(Hitbox::new(0.0, 0.0, 10.0, 10.0), Vector2F::ZERO);
        let grid = OccupancyGrid::build(&room, &config);

        assert_eq!(grid.state(GridPoint::new(0, 0)), Some(CellState::Solid));
        assert_eq!(grid.count(CellState::Solid), 1);
        assert_eq!(
            grid.count(CellState::Empty),
            config.grid_size * config.grid_size - 1
        );
    }

    #[test]
    fn test_wall_covers_exactly_its_cells() {
        let config = NavConfig::default();
        let wall = Hitbox::new(-2000.0, 1000.0, 3000.0, 2500.0);
        // Rasterization happens relative to the room's offset.
        let room = single_wall_room(wall, Vector2F::new(70_000.0, -40_000.0));
        let grid = OccupancyGrid::build(&room, &config);

        let solid: Vec<GridPoint> = grid
            .cells()
            .points()
            .filter(|p| grid.state(*p) == Some(CellState::Solid))
            .collect();
        let mut expected = Vec::new();
        for y in 1..=2 {
            for x in -2..=2 {
                expected.push(GridPoint::new(x, y));
            }
        }

        assert_eq!(solid, expected);
    }

    #[test]
    fn test_wall_wins_over_opening() {
        let config = NavConfig::default();
        let mut template = RoomTemplate::new(
            vec![Hitbox::new(9000.0, 0.0, 10_000.0, 10_000.0)],
            vec![Entrance::new([10_000.0, 5000.0].into(), [11_000.0, 5000.0].into())],
            SpawnMarkers::default(),
        );
        let room = Room::instantiate(0, &template, Vector2F::ZERO);
        let grid = OccupancyGrid::build(&room, &config);

        // The opening spans rows 4..=5 of column 9, all under the wall.
        assert_eq!(grid.state(GridPoint::new(9, 4)), Some(CellState::Solid));
        assert_eq!(grid.state(GridPoint::new(9, 5)), Some(CellState::Solid));
        assert_eq!(grid.count(CellState::Opening), 0);

        // Without the wall the same cells become openings.
        template.walls.clear();
        let room = Room::instantiate(0, &template, Vector2F::ZERO);
        let grid = OccupancyGrid::build(&room, &config);
        assert_eq!(grid.state(GridPoint::new(9, 4)), Some(CellState::Opening));
        assert_eq!(grid.state(GridPoint::new(9, 5)), Some(CellState::Opening));
        assert_eq!(grid.count(CellState::Opening), 2);
    }

    #[test]
    #[should_panic(expected = "outside the allocated grid")]
    fn test_room_larger_than_grid_is_fatal() {
        let config = NavConfig {
            grid_size: 10,
            ..NavConfig::default()
        };
        let room = single_wall_room(Hitbox::new(0.0, 0.0, 20_000.0, 1000.0), Vector2F::ZERO);

        OccupancyGrid::build(&room, &config);
    }

    #[test]
    fn test_neighbor_stops_at_edge() {
        let grid = Grid::new(4, 2, 0u8);
        let (lo, hi) = grid.extent();

        assert_eq!(lo, GridPoint::new(-2, -2));
        assert_eq!(hi, GridPoint::new(1, 1));
        assert_eq!(grid.neighbor(hi, Direction::Right), None);
        assert_eq!(
            grid.neighbor(hi, Direction::Up),
            Some(GridPoint::new(1, 0))
        );
        assert_eq!(grid.get(GridPoint::new(2, 0)), None);
        assert_eq!(grid.points().count(), 16);
    }
}
