use crate::{
    config::DungeonConfig,
    graph::{is_connected, longest_path_to_point_in_tree, reachable_from},
    room::{Entrance, Room, RoomTemplate},
    sampling::{choose, choose_index, small_rng},
    symmetric_map::SymmetricMap,
};

use log::{debug, info, warn};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::Rng;
use stats::OnlineStats;
use std::collections::VecDeque;

/// One side of a connection: an entrance of a placed room.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Attachment {
    pub room: usize,
    pub entrance: usize,
}

/// Two placed rooms joined through a pair of facing entrances.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Connection {
    pub from: Attachment,
    pub to: Attachment,
}

impl Connection {
    /// The entrance `room` uses for this connection, if it takes part in it.
    pub fn entrance_in(&self, room: usize) -> Option<usize> {
        if self.from.room == room {
            Some(self.from.entrance)
        } else if self.to.room == room {
            Some(self.to.entrance)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationStats {
    /// Open entrances we tried to attach a neighbor to.
    pub attempts: usize,
    pub dead_ends: usize,
    /// Entrances walled over in the final pass.
    pub sealed: usize,
    /// Mean number of surviving candidates per attempt.
    pub mean_candidates: f64,
}

/// A generated level: placed rooms and how they connect. Room 0 is the seed room.
#[derive(Clone, Debug, Default)]
pub struct Dungeon {
    rooms: Vec<Room>,
    connections: SymmetricMap<Connection>,
    room_graph: UnGraph<usize, ()>,
    stats: GenerationStats,
}

impl Dungeon {
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, index: usize) -> &Room {
        &self.rooms[index]
    }

    pub fn into_rooms(self) -> Vec<Room> {
        self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn seed_room(&self) -> Option<usize> {
        if self.rooms.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn connection(&self, a: usize, b: usize) -> Option<&Connection> {
        self.connections.get(a, b)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Nodes are weighted with room indices.
    pub fn room_graph(&self) -> &UnGraph<usize, ()> {
        &self.room_graph
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    pub fn is_connected(&self) -> bool {
        is_connected(&self.room_graph)
    }

    /// Rooms reachable from `room` through connected entrances, including `room` itself.
    pub fn reachable_from(&self, room: usize) -> Vec<usize> {
        reachable_from(&self.room_graph, NodeIndex::new(room))
            .into_iter()
            .map(|n| self.room_graph[n])
            .collect()
    }

    /// The longest chain of rooms ending at the seed room, starting from the room farthest away.
    pub fn deepest_room_path(&self) -> Vec<usize> {
        if self.rooms.is_empty() {
            return Vec::new();
        }

        longest_path_to_point_in_tree(&self.room_graph, NodeIndex::new(0))
            .into_iter()
            .map(|n| self.room_graph[n])
            .collect()
    }

    fn add_room(&mut self, room: Room) -> usize {
        let index = self.rooms.len();
        self.rooms.push(room);
        let node = self.room_graph.add_node(index);
        debug_assert_eq!(node.index(), index);

        index
    }

    fn attach(&mut self, from: Attachment, candidate: Candidate) -> usize {
        let Candidate { entrance, mut room } = candidate;
        room.mark_connected(entrance);
        self.rooms[from.room].mark_connected(from.entrance);

        let index = self.add_room(room);
        self.room_graph
            .add_edge(NodeIndex::new(from.room), NodeIndex::new(index), ());
        self.connections.insert(
            from.room,
            index,
            Connection {
                from,
                to: Attachment {
                    room: index,
                    entrance,
                },
            },
        );

        index
    }
}

/// A template already positioned against an open entrance, known not to overlap anything placed.
#[derive(Debug)]
struct Candidate {
    entrance: usize,
    room: Room,
}

/// Finds, for each template, the first of its entrances that faces `anchor` and lets the
/// template sit there without overlapping `placed`.
fn find_candidates(
    templates: &[RoomTemplate],
    placed: &[Room],
    anchor: &Entrance,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (template_index, template) in templates.iter().enumerate() {
        for (entrance, e) in template.entrances.iter().enumerate() {
            if !anchor.connects(e) {
                continue;
            }

            // Puts the candidate's connection point on the anchor's location, which also puts the
            // anchor's connection point on the candidate's location.
            let offset = anchor.location() - e.connection();
            let room = Room::instantiate(template_index, template, offset);
            let collides = placed
                .iter()
                .any(|p| room.quick_intersect(p) && room.intersects(p));
            if collides {
                continue;
            }

            candidates.push(Candidate { entrance, room });
            break;
        }
    }

    candidates
}

/// Grows a connected dungeon outward from a random seed room until `target_room_count` rooms are
/// placed or no open entrance can take another room. Entrances left open are sealed.
pub fn generate_with_rng<R: Rng + ?Sized>(
    templates: &[RoomTemplate],
    target_room_count: usize,
    rng: &mut R,
) -> Dungeon {
    let mut dungeon = Dungeon::default();
    if templates.is_empty() || target_room_count == 0 {
        warn!(
            "Nothing to generate: {} templates, target of {} rooms",
            templates.len(),
            target_room_count
        );
        return dungeon;
    }

    // A seed room without entrances could never grow.
    let with_entrances: Vec<usize> = (0..templates.len())
        .filter(|i| !templates[*i].entrances.is_empty())
        .collect();
    let seed_pool: Vec<usize> = if with_entrances.is_empty() {
        (0..templates.len()).collect()
    } else {
        with_entrances
    };
    let seed_index = match choose(rng, &seed_pool) {
        Some(i) => *i,
        None => return dungeon,
    };
    let seed_template = &templates[seed_index];
    dungeon.add_room(Room::instantiate(
        seed_index,
        seed_template,
        seed_template.center().negated(),
    ));

    let mut candidate_counts = OnlineStats::new();
    let mut to_expand = VecDeque::new();
    to_expand.push_back(0);
    while let Some(r) = to_expand.pop_front() {
        for e in 0..dungeon.rooms[r].entrances().len() {
            if dungeon.rooms.len() >= target_room_count {
                break;
            }

            let anchor = dungeon.rooms[r].entrance(e);
            if anchor.is_connected() {
                continue;
            }

            let candidates = find_candidates(templates, &dungeon.rooms, anchor);
            dungeon.stats.attempts += 1;
            candidate_counts.add(candidates.len());

            let chosen =
                choose_index(rng, candidates.len()).and_then(|c| candidates.into_iter().nth(c));
            match chosen {
                Some(candidate) => {
                    let from = Attachment { room: r, entrance: e };
                    let new_room = dungeon.attach(from, candidate);
                    debug!(
                        "Attached room {} (template {}) to entrance {} of room {}",
                        new_room,
                        dungeon.rooms[new_room].template_index(),
                        e,
                        r
                    );
                    to_expand.push_back(new_room);
                }
                None => {
                    dungeon.stats.dead_ends += 1;
                    debug!("Entrance {} of room {} is a dead end", e, r);
                }
            }
        }
        if dungeon.rooms.len() >= target_room_count {
            break;
        }
    }

    dungeon.stats.sealed = dungeon.rooms.iter_mut().map(Room::close_entrances).sum();
    if dungeon.stats.attempts > 0 {
        dungeon.stats.mean_candidates = candidate_counts.mean();
    }

    info!(
        "Generated {} of {} rooms; {} attempts, {} dead ends, {} entrances sealed, {:.2} candidates per attempt",
        dungeon.rooms.len(),
        target_room_count,
        dungeon.stats.attempts,
        dungeon.stats.dead_ends,
        dungeon.stats.sealed,
        dungeon.stats.mean_candidates,
    );

    dungeon
}

/// Seeded generation; the same templates and config always give the same dungeon.
pub fn generate(templates: &[RoomTemplate], config: &DungeonConfig) -> Dungeon {
    let mut rng = small_rng(config.seed);

    generate_with_rng(templates, config.target_room_count, &mut rng)
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Hitbox, Vector2F};

    const SIDE: f32 = 10_000.0;
    const WALL: f32 = 1_000.0;

    fn entrance(x: f32, y: f32, dx: f32, dy: f32) -> Entrance {
        Entrance::new(Vector2F::new(x, y), Vector2F::new(x + dx, y + dy))
    }

    fn east(width: f32) -> Entrance {
        entrance(width, SIDE / 2.0, WALL, 0.0)
    }

    fn west() -> Entrance {
        entrance(0.0, SIDE / 2.0, -WALL, 0.0)
    }

    fn north(width: f32) -> Entrance {
        entrance(width / 2.0, 0.0, 0.0, -WALL)
    }

    fn south(width: f32) -> Entrance {
        entrance(width / 2.0, SIDE, 0.0, WALL)
    }

    fn boxed(width: f32, entrances: Vec<Entrance>) -> RoomTemplate {
        let mut t = RoomTemplate::rectangle(0.0, 0.0, width, SIDE, WALL);
        t.entrances = entrances;
        t
    }

    fn pool() -> Vec<RoomTemplate> {
        vec![
            boxed(SIDE, vec![north(SIDE), east(SIDE), south(SIDE), west()]),
            boxed(SIDE, vec![east(SIDE), west()]),
            boxed(3.0 * SIDE, vec![west(), east(3.0 * SIDE)]),
            boxed(2.0 * SIDE, vec![north(2.0 * SIDE), south(2.0 * SIDE)]),
            boxed(SIDE, vec![west()]),
        ]
    }

    fn scenario_pool() -> Vec<RoomTemplate> {
        let a = RoomTemplate::new(
            Vec::new(),
            vec![Entrance::new([40.0, 0.0].into(), [50.0, 0.0].into())],
            Default::default(),
        );
        let b = RoomTemplate::new(
            Vec::new(),
            vec![Entrance::new([-40.0, 0.0].into(), [-50.0, 0.0].into())],
            Default::default(),
        );
        let c = RoomTemplate::new(
            vec![Hitbox::new(0.0, 0.0, 10.0, 10.0)],
            Vec::new(),
            Default::default(),
        );

        vec![a, b, c]
    }

    fn generate_seeded(templates: &[RoomTemplate], target: usize, seed: u64) -> Dungeon {
        generate(
            templates,
            &DungeonConfig {
                target_room_count: target,
                seed,
            },
        )
    }

    #[test]
    fn test_matching_pair_is_placed_and_incompatible_room_never_is() {
        let templates = scenario_pool();
        for seed in 0..20 {
            let dungeon = generate_seeded(&templates, 2, seed);

            assert_eq!(dungeon.len(), 2);
            let mut used: Vec<usize> = dungeon.rooms().iter().map(Room::template_index).collect();
            used.sort();
            assert_eq!(used, vec![0, 1]);

            let c = dungeon.connection(0, 1).unwrap();
            assert_eq!(c.entrance_in(0), Some(0));
            assert_eq!(c.entrance_in(1), Some(0));
            assert_eq!(c.entrance_in(2), None);
            assert_eq!(dungeon.stats().sealed, 0);

            // The two entrances face each other across one gap.
            let (r0, r1) = (dungeon.room(0), dungeon.room(1));
            assert_eq!(r0.entrance(0).connection(), r1.entrance(0).location());
            assert_eq!(r1.entrance(0).connection(), r0.entrance(0).location());
        }
    }

    #[test]
    fn test_no_rooms_overlap() {
        let templates = pool();
        for seed in 0..10 {
            let dungeon = generate_seeded(&templates, 40, seed);
            let rooms = dungeon.rooms();
            for i in 0..rooms.len() {
                for j in i + 1..rooms.len() {
                    for a in rooms[i].walls() {
                        for b in rooms[j].walls() {
                            assert!(!a.intersects(b), "rooms {} and {} overlap", i, j);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_every_room_reachable_from_seed() {
        let templates = pool();
        for seed in 0..10 {
            let dungeon = generate_seeded(&templates, 40, seed);

            assert!(dungeon.is_connected());
            assert_eq!(dungeon.reachable_from(0).len(), dungeon.len());
            // Every room but the seed hangs off exactly one earlier room.
            assert_eq!(dungeon.connections().count(), dungeon.len() - 1);
            for c in dungeon.connections() {
                let (from, to) = (dungeon.room(c.from.room), dungeon.room(c.to.room));
                assert!(from.entrance(c.from.entrance).connects(to.entrance(c.to.entrance)));
            }
        }
    }

    #[test]
    fn test_every_entrance_is_connected_or_sealed() {
        let templates = pool();
        for seed in 0..10 {
            let dungeon = generate_seeded(&templates, 25, seed);
            let total_entrances: usize = dungeon.rooms().iter().map(|r| r.entrances().len()).sum();

            assert!(dungeon
                .rooms()
                .iter()
                .all(|r| r.entrances().iter().all(Entrance::is_connected)));
            assert_eq!(
                total_entrances,
                2 * dungeon.connections().count() + dungeon.stats().sealed
            );
        }
    }

    #[test]
    fn test_never_exceeds_target() {
        let templates = pool();
        for target in 1..8 {
            let dungeon = generate_seeded(&templates, target, 5);
            assert!(dungeon.len() <= target);
        }
        assert_eq!(generate_seeded(&templates, 1, 5).len(), 1);
    }

    #[test]
    fn test_same_seed_same_dungeon() {
        let templates = pool();
        let a = generate_seeded(&templates, 30, 99);
        let b = generate_seeded(&templates, 30, 99);

        assert_eq!(a.rooms(), b.rooms());
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_seed_room_is_centered() {
        let templates = pool();
        let dungeon = generate_seeded(&templates, 1, 3);

        assert_eq!(dungeon.room(0).center(), Vector2F::ZERO);
    }

    #[test]
    fn test_empty_pool_places_nothing() {
        let dungeon = generate_seeded(&[], 10, 0);

        assert!(dungeon.is_empty());
        assert_eq!(dungeon.seed_room(), None);
        assert!(dungeon.deepest_room_path().is_empty());
    }

    #[test]
    fn test_dead_end_everywhere_stops_early() {
        // Only one-entrance rooms that all face the same way: nothing can ever attach.
        let templates = vec![boxed(SIDE, vec![west()])];
        let dungeon = generate_seeded(&templates, 10, 0);

        assert_eq!(dungeon.len(), 1);
        assert_eq!(dungeon.stats().dead_ends, 1);
        assert_eq!(dungeon.stats().sealed, 1);
        assert_eq!(dungeon.stats().mean_candidates, 0.0);
    }

    #[test]
    fn test_overlapping_candidate_is_rejected() {
        let templates = vec![boxed(SIDE, vec![west()])];
        let anchor_room = Room::instantiate(0, &boxed(SIDE, vec![east(SIDE)]), Vector2F::ZERO);
        let anchor = anchor_room.entrance(0).clone();

        let free = find_candidates(&templates, &[anchor_room.clone()], &anchor);
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].room.offset(), Vector2F::new(SIDE + WALL, 0.0));

        // Something already sits where the candidate would go.
        let blocker = Room::instantiate(0, &templates[0], Vector2F::new(SIDE + 2.0 * WALL, 0.0));
        let blocked = find_candidates(&templates, &[anchor_room.clone(), blocker], &anchor);
        assert!(blocked.is_empty());

        // A small room floating in the candidate's interior, clear of every wall.
        let closet = RoomTemplate::rectangle(0.0, 0.0, 2.0 * WALL, 2.0 * WALL, WALL / 2.0);
        let nested = Room::instantiate(1, &closet, Vector2F::new(15.0 * WALL, 4.0 * WALL));
        let enclosing = find_candidates(&templates, &[anchor_room, nested], &anchor);
        assert!(enclosing.is_empty());
    }

    #[test]
    fn test_deepest_path_ends_at_seed() {
        let templates = pool();
        let dungeon = generate_seeded(&templates, 20, 11);
        let path = dungeon.deepest_room_path();

        assert_eq!(path.last(), Some(&0));
        for pair in path.windows(2) {
            assert!(dungeon.connection(pair[0], pair[1]).is_some());
        }
    }
}
