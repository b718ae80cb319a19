//! Plain-text room template files.
//!
//! A file holds five counted sections, in order: walls (`left top right bottom`), entrances
//! (`location.x location.y connection.x connection.y`), player spawns, item spawns and enemy
//! spawns (`x y`). Every value is a room-local integer.

use crate::{
    error::{LoadError, ParseError, SaveError},
    geometry::{Hitbox, Vector2F},
    room::{Entrance, RoomTemplate, SpawnMarkers},
};

use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

struct Tokens<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Tokens {
            lines: text.lines().enumerate(),
            line: 0,
        }
    }

    /// Reads the next non-blank line, which must hold exactly `n` integers.
    fn record(&mut self, n: usize, expected: &'static str) -> Result<Vec<i64>, ParseError> {
        let fields: Vec<&str> = loop {
            let (i, l) = self
                .lines
                .next()
                .ok_or(ParseError::UnexpectedEof { expected })?;
            self.line = i + 1;
            let fields: Vec<&str> = l.split_whitespace().collect();
            if !fields.is_empty() {
                break fields;
            }
        };
        if fields.len() < n {
            return Err(ParseError::UnexpectedEof { expected });
        }
        if fields.len() > n {
            return Err(ParseError::TrailingData { line: self.line });
        }

        let line = self.line;
        fields
            .into_iter()
            .map(|t| {
                t.parse::<i64>().map_err(|_| ParseError::InvalidInteger {
                    line,
                    token: t.to_string(),
                })
            })
            .collect()
    }

    fn count(&mut self, expected: &'static str) -> Result<usize, ParseError> {
        let value = self.record(1, expected)?[0];
        if value < 0 {
            return Err(ParseError::InvalidInteger {
                line: self.line,
                token: value.to_string(),
            });
        }

        Ok(value as usize)
    }

    fn points(&mut self, expected: &'static str) -> Result<Vec<Vector2F>, ParseError> {
        let n = self.count(expected)?;
        let mut points = Vec::with_capacity(n);
        for _ in 0..n {
            let v = self.record(2, expected)?;
            points.push(Vector2F::new(v[0] as f32, v[1] as f32));
        }

        Ok(points)
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        match self.lines.find(|(_, l)| !l.trim().is_empty()) {
            Some((i, _)) => Err(ParseError::TrailingData { line: i + 1 }),
            None => Ok(()),
        }
    }
}

impl RoomTemplate {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(text);

        let num_walls = tokens.count("wall count")?;
        let mut walls = Vec::with_capacity(num_walls);
        for _ in 0..num_walls {
            let v = tokens.record(4, "wall")?;
            walls.push(Hitbox::new(v[0] as f32, v[1] as f32, v[2] as f32, v[3] as f32));
        }

        let num_entrances = tokens.count("entrance count")?;
        let mut entrances = Vec::with_capacity(num_entrances);
        for _ in 0..num_entrances {
            let v = tokens.record(4, "entrance")?;
            entrances.push(Entrance::new(
                Vector2F::new(v[0] as f32, v[1] as f32),
                Vector2F::new(v[2] as f32, v[3] as f32),
            ));
        }

        let spawns = SpawnMarkers {
            player: tokens.points("player spawn")?,
            item: tokens.points("item spawn")?,
            enemy: tokens.points("enemy spawn")?,
        };
        tokens.finish()?;

        Ok(RoomTemplate::new(walls, entrances, spawns))
    }

    /// The point stored templates are normalized against: the minimum wall x and y, falling back
    /// to entrances and then spawns when there are no walls.
    pub fn origin(&self) -> Vector2F {
        let corners: Vec<Vector2F> = if !self.walls.is_empty() {
            self.walls.iter().map(Hitbox::top_left).collect()
        } else if !self.entrances.is_empty() {
            self.entrances
                .iter()
                .flat_map(|e| vec![e.location(), e.connection()])
                .collect()
        } else {
            self.spawns.iter().copied().collect()
        };

        corners
            .into_iter()
            .fold(None, |acc: Option<Vector2F>, p| match acc {
                Some(m) => Some(Vector2F::new(m.x.min(p.x), m.y.min(p.y))),
                None => Some(p),
            })
            .unwrap_or_default()
    }

    /// Serializes into the file layout, relative to `origin()`.
    pub fn to_text(&self) -> String {
        let t = self.translated(self.origin().negated());
        let int = |v: f32| v.round() as i64;
        let mut out = String::new();

        out.push_str(&format!("{}\n", t.walls.len()));
        for w in t.walls.iter() {
            out.push_str(&format!(
                "{} {} {} {}\n",
                int(w.left),
                int(w.top),
                int(w.right),
                int(w.bottom)
            ));
        }

        out.push_str(&format!("{}\n", t.entrances.len()));
        for e in t.entrances.iter() {
            let (l, c) = (e.location(), e.connection());
            out.push_str(&format!("{} {} {} {}\n", int(l.x), int(l.y), int(c.x), int(c.y)));
        }

        for points in [&t.spawns.player, &t.spawns.item, &t.spawns.enemy].iter() {
            out.push_str(&format!("{}\n", points.len()));
            for p in points.iter() {
                out.push_str(&format!("{} {}\n", int(p.x), int(p.y)));
            }
        }

        out
    }
}

pub fn load_template(path: impl AsRef<Path>) -> Result<RoomTemplate, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    RoomTemplate::parse(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_template(path: impl AsRef<Path>, template: &RoomTemplate) -> Result<(), SaveError> {
    let path = path.as_ref();

    fs::write(path, template.to_text()).map_err(|source| SaveError {
        path: path.to_path_buf(),
        source,
    })
}

/// The outcome of loading a template directory. One bad file never spoils the rest.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub templates: Vec<RoomTemplate>,
    pub paths: Vec<PathBuf>,
    pub errors: Vec<LoadError>,
}

/// Loads every regular file in `dir`, in path order.
pub fn load_templates(dir: impl AsRef<Path>) -> Result<LoadReport, LoadError> {
    let dir = dir.as_ref();
    let io_err = |source: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = LoadReport::default();
    for path in paths {
        match load_template(&path) {
            Ok(t) => {
                report.templates.push(t);
                report.paths.push(path);
            }
            Err(e) => {
                warn!("{}", e);
                report.errors.push(e);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
2
0 0 8000 1000
0 5000 8000 6000
1
8000 3000 9000 3000
1
2000 4000
0
2
3000 4000
5000 4000
";

    #[test]
    fn test_parse_sample() {
        let t = RoomTemplate::parse(SAMPLE).unwrap();

        assert_eq!(t.walls.len(), 2);
        assert_eq!(t.walls[1], Hitbox::new(0.0, 5000.0, 8000.0, 6000.0));
        assert_eq!(t.entrances.len(), 1);
        assert_eq!(t.entrances[0].direction(), Vector2F::new(1000.0, 0.0));
        assert_eq!(t.spawns.player, vec![Vector2F::new(2000.0, 4000.0)]);
        assert!(t.spawns.item.is_empty());
        assert_eq!(t.spawns.enemy.len(), 2);
    }

    #[test]
    fn test_serialize_normalizes_to_origin() {
        let t = RoomTemplate::parse(SAMPLE).unwrap();
        let moved = t.translated(Vector2F::new(-4000.0, 7000.0));

        assert_eq!(moved.origin(), Vector2F::new(-4000.0, 7000.0));
        assert_eq!(moved.to_text(), SAMPLE);
        assert_eq!(RoomTemplate::parse(&moved.to_text()).unwrap(), t);
    }

    #[test]
    fn test_truncated_file() {
        assert_eq!(
            RoomTemplate::parse("1\n0 0 10 10\n"),
            Err(ParseError::UnexpectedEof {
                expected: "entrance count"
            })
        );
        assert_eq!(
            RoomTemplate::parse("1\n0 0 10\n"),
            Err(ParseError::UnexpectedEof { expected: "wall" })
        );
    }

    #[test]
    fn test_garbage_is_reported_with_line() {
        assert_eq!(
            RoomTemplate::parse("1\n0 zero 10 10\n0\n0\n0\n0\n"),
            Err(ParseError::InvalidInteger {
                line: 2,
                token: "zero".to_string()
            })
        );
        assert_eq!(
            RoomTemplate::parse("0\n0\n0\n0\n0\n9\n"),
            Err(ParseError::TrailingData { line: 6 })
        );
    }

    #[test]
    fn test_load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), SAMPLE).unwrap();
        fs::write(dir.path().join("b.txt"), "3\n1 2\n").unwrap();
        save_template(
            dir.path().join("c.txt"),
            &RoomTemplate::rectangle(0.0, 0.0, 4000.0, 4000.0, 1000.0),
        )
        .unwrap();

        let report = load_templates(dir.path()).unwrap();

        assert_eq!(report.templates.len(), 2);
        assert_eq!(report.paths[1], dir.path().join("c.txt"));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path(), &dir.path().join("b.txt"));
        assert!(report.errors[0].to_string().contains("b.txt"));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowhere").join("room.txt");
        let err = save_template(&path, &RoomTemplate::default()).unwrap_err();

        assert_eq!(err.path, path);
        assert!(err.to_string().contains("unable to save template"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_template(dir.path().join("gone.txt")).unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("gone.txt"));
    }
}
