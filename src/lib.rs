pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod grid;
pub mod map_types;
pub mod nav_graph;
pub mod room;
pub mod sampling;
pub mod spatial;
pub mod template;

mod symmetric_map;

pub use config::{Config, DungeonConfig, NavConfig};
pub use error::{ConfigError, LoadError, ParseError, SaveError};
pub use geometry::{GridPoint, Hitbox, Line, Vector2F};
pub use grid::{CellState, OccupancyGrid};
pub use map_types::dungeon::{generate, generate_with_rng, Dungeon, GenerationStats};
pub use nav_graph::{build_nav_graph, NavGraph, NodeId};
pub use room::{Entrance, Room, RoomTemplate, SpawnMarkers};
pub use template::{load_template, load_templates, save_template, LoadReport};

/// Generates a dungeon and builds a navigation graph for every room in it, in room order.
pub fn generate_with_nav(
    templates: &[RoomTemplate],
    config: &Config,
) -> (Dungeon, Vec<NavGraph>) {
    let dungeon = generate(templates, &config.dungeon);
    let graphs = dungeon
        .rooms()
        .iter()
        .map(|room| build_nav_graph(room, &config.nav))
        .collect();

    (dungeon, graphs)
}
