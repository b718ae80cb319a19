use crate::geometry::{bounding_hitbox, Hitbox, Vector2F};

use serde::{Deserialize, Serialize};

/// A designated opening in a room boundary.
///
/// `location` sits on the room boundary; `connection` sits just outside it, where the matching
/// entrance of a neighbor must put its own `location`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Entrance {
    location: Vector2F,
    connection: Vector2F,
    connected: bool,
}

impl Entrance {
    pub fn new(location: Vector2F, connection: Vector2F) -> Self {
        Entrance {
            location,
            connection,
            connected: false,
        }
    }

    pub fn location(&self) -> Vector2F {
        self.location
    }

    pub fn connection(&self) -> Vector2F {
        self.connection
    }

    pub fn direction(&self) -> Vector2F {
        self.connection - self.location
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self) {
        self.connected = true;
    }

    /// Two entrances connect when they face each other across the same gap.
    pub fn connects(&self, other: &Entrance) -> bool {
        let d = self.direction();

        !d.is_zero() && (d + other.direction()).is_zero()
    }

    /// The gap in the wall. Spans one `direction` inward from `location` and one `|direction|`
    /// to either side, so it never reaches past the connection point.
    pub fn hitbox(&self) -> Hitbox {
        let d = self.direction();
        let reach = d.x.abs().max(d.y.abs());
        let inner = self.location - d;
        let side = if d.x == 0.0 {
            Vector2F::new(reach, 0.0)
        } else {
            Vector2F::new(0.0, reach)
        };

        Hitbox::from_corners(inner - side, self.location + side)
    }

    pub fn translated(&self, by: Vector2F) -> Self {
        Entrance {
            location: self.location + by,
            connection: self.connection + by,
            connected: self.connected,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SpawnMarkers {
    pub player: Vec<Vector2F>,
    pub item: Vec<Vector2F>,
    pub enemy: Vec<Vector2F>,
}

impl SpawnMarkers {
    pub fn translated(&self, by: Vector2F) -> Self {
        SpawnMarkers {
            player: shift_points(&self.player, by),
            item: shift_points(&self.item, by),
            enemy: shift_points(&self.enemy, by),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector2F> {
        self.player.iter().chain(self.item.iter()).chain(self.enemy.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.player.is_empty() && self.item.is_empty() && self.enemy.is_empty()
    }
}

fn shift_points(points: &[Vector2F], by: Vector2F) -> Vec<Vector2F> {
    points.iter().map(|p| *p + by).collect()
}

/// An unplaced, immutable room blueprint in room-local coordinates.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RoomTemplate {
    pub walls: Vec<Hitbox>,
    pub entrances: Vec<Entrance>,
    pub spawns: SpawnMarkers,
}

impl RoomTemplate {
    pub fn new(walls: Vec<Hitbox>, entrances: Vec<Entrance>, spawns: SpawnMarkers) -> Self {
        RoomTemplate {
            walls,
            entrances,
            spawns,
        }
    }

    /// A closed box of four walls, each `thickness` thick, whose outer edges span the given
    /// rectangle.
    pub fn rectangle(left: f32, top: f32, width: f32, height: f32, thickness: f32) -> Self {
        let right = left + width;
        let bottom = top + height;
        let walls = vec![
            Hitbox::new(left, top, right, top + thickness),
            Hitbox::new(left, bottom - thickness, right, bottom),
            Hitbox::new(left, top, left + thickness, bottom),
            Hitbox::new(right - thickness, top, right, bottom),
        ];

        RoomTemplate::new(walls, Vec::new(), SpawnMarkers::default())
    }

    pub fn translated(&self, by: Vector2F) -> Self {
        RoomTemplate {
            walls: self.walls.iter().map(|w| w.translated(by)).collect(),
            entrances: self.entrances.iter().map(|e| e.translated(by)).collect(),
            spawns: self.spawns.translated(by),
        }
    }

    pub fn bounds(&self) -> Option<Hitbox> {
        footprint_bounds(&self.walls, &self.entrances)
    }

    pub fn center(&self) -> Vector2F {
        self.bounds().map(|b| b.center()).unwrap_or_default()
    }
}

fn footprint_bounds(walls: &[Hitbox], entrances: &[Entrance]) -> Option<Hitbox> {
    let openings: Vec<Hitbox> = entrances.iter().map(Entrance::hitbox).collect();

    bounding_hitbox(walls.iter().chain(openings.iter()))
}

/// A template instantiated at a world position. Owns its geometry and its entrance state.
#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    template_index: usize,
    offset: Vector2F,
    walls: Vec<Hitbox>,
    entrances: Vec<Entrance>,
    spawns: SpawnMarkers,
    bounds: Option<Hitbox>,
}

impl Room {
    /// Copies `template` into world space, displaced by `offset`. All entrances start unconnected.
    pub fn instantiate(template_index: usize, template: &RoomTemplate, offset: Vector2F) -> Self {
        let placed = template.translated(offset);
        let entrances: Vec<Entrance> = placed
            .entrances
            .into_iter()
            .map(|e| Entrance::new(e.location, e.connection))
            .collect();
        let bounds = footprint_bounds(&placed.walls, &entrances);

        Room {
            template_index,
            offset,
            walls: placed.walls,
            entrances,
            spawns: placed.spawns,
            bounds,
        }
    }

    pub fn template_index(&self) -> usize {
        self.template_index
    }

    /// World position of the template's local origin.
    pub fn offset(&self) -> Vector2F {
        self.offset
    }

    pub fn walls(&self) -> &[Hitbox] {
        &self.walls
    }

    pub fn entrances(&self) -> &[Entrance] {
        &self.entrances
    }

    pub fn entrance(&self, index: usize) -> &Entrance {
        &self.entrances[index]
    }

    pub fn spawns(&self) -> &SpawnMarkers {
        &self.spawns
    }

    pub fn bounds(&self) -> Option<Hitbox> {
        self.bounds
    }

    pub fn center(&self) -> Vector2F {
        self.bounds.map(|b| b.center()).unwrap_or(self.offset)
    }

    /// Where the navigation scan starts: the first player spawn, else the first enemy spawn.
    pub fn nav_seed(&self) -> Option<Vector2F> {
        self.spawns
            .player
            .first()
            .or_else(|| self.spawns.enemy.first())
            .copied()
    }

    pub fn translate(&mut self, by: Vector2F) {
        self.offset = self.offset + by;
        for w in self.walls.iter_mut() {
            *w = w.translated(by);
        }
        for e in self.entrances.iter_mut() {
            *e = e.translated(by);
        }
        self.spawns = self.spawns.translated(by);
        self.bounds = self.bounds.map(|b| b.translated(by));
    }

    /// Walls plus entrance openings: everything another room must stay clear of.
    pub fn footprint(&self) -> impl Iterator<Item = Hitbox> + '_ {
        self.walls
            .iter()
            .copied()
            .chain(self.entrances.iter().map(Entrance::hitbox))
    }

    /// Bounding-box pre-check. Never runs the pairwise test.
    pub fn quick_intersect(&self, other: &Room) -> bool {
        match (self.bounds, other.bounds) {
            (Some(a), Some(b)) => a.quick_intersect(&b),
            _ => false,
        }
    }

    /// Exact pairwise footprint test. Quadratic in hitbox count; gate it with `quick_intersect`.
    /// A room nested inside the other's bounds counts as overlapping even when no hitboxes touch.
    pub fn intersects(&self, other: &Room) -> bool {
        if let (Some(a), Some(b)) = (self.bounds, other.bounds) {
            if a.contains(&b) || b.contains(&a) {
                return true;
            }
        }

        let theirs: Vec<Hitbox> = other.footprint().collect();

        self.footprint()
            .any(|mine| theirs.iter().any(|t| mine.intersects(t)))
    }

    pub fn mark_connected(&mut self, entrance: usize) {
        self.entrances[entrance].set_connected();
    }

    /// Closes every still-open entrance by walling over its opening. Returns how many were sealed.
    pub fn close_entrances(&mut self) -> usize {
        let mut sealed = 0;
        for e in self.entrances.iter_mut() {
            if e.is_connected() {
                continue;
            }
            e.set_connected();
            self.walls.push(e.hitbox());
            sealed += 1;
        }

        sealed
    }
}
