//! Perfect-maze generation, shortest-path solving and the maze navigation game.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;

use super::{AgeGroup, GameError, Score, Scored};
use crate::models::ScoreColumn;
use crate::recorder::{action_key, SessionRecorder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Neighbouring cell in this direction, if it lies inside a `width` x `height` grid
    fn step(self, from: Position, width: usize, height: usize) -> Option<Position> {
        let Position { x, y } = from;
        match self {
            Direction::North if y > 0 => Some(Position::new(x, y - 1)),
            Direction::South if y + 1 < height => Some(Position::new(x, y + 1)),
            Direction::East if x + 1 < width => Some(Position::new(x + 1, y)),
            Direction::West if x > 0 => Some(Position::new(x - 1, y)),
            _ => None,
        }
    }

    /// Direction leading from `from` to an adjacent `to`
    pub fn between(from: Position, to: Position) -> Option<Self> {
        Direction::ALL.into_iter().find(|d| {
            d.step(from, usize::MAX, usize::MAX) == Some(to)
        })
    }
}

/// Boundary flags of one cell; `true` means the wall is standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Walls {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl Walls {
    const CLOSED: Walls = Walls {
        north: true,
        south: true,
        east: true,
        west: true,
    };

    pub fn is_open(&self, direction: Direction) -> bool {
        !match direction {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
        }
    }

    fn knock_down(&mut self, direction: Direction) {
        match direction {
            Direction::North => self.north = false,
            Direction::South => self.south = false,
            Direction::East => self.east = false,
            Direction::West => self.west = false,
        }
    }
}

/// Grid of cells forming a spanning tree: one path between any two cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    width: usize,
    height: usize,
    cells: Vec<Walls>,
}

impl Maze {
    /// Carve a perfect maze by randomized depth-first backtracking from (0, 0).
    ///
    /// Each cell tries its four neighbours in a shuffled order and descends
    /// into the first unvisited one before trying the rest. An explicit stack
    /// stands in for recursion so large grids cannot exhaust the call stack.
    pub fn generate<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut maze = Maze {
            width,
            height,
            cells: vec![Walls::CLOSED; width * height],
        };
        let mut visited = vec![false; width * height];

        let start = Position::new(0, 0);
        visited[maze.index(start)] = true;
        let mut stack = vec![(start, shuffled_directions(rng), 0usize)];

        while let Some((cell, directions, next)) = stack.last_mut() {
            if *next == directions.len() {
                stack.pop();
                continue;
            }
            let direction = directions[*next];
            *next += 1;
            let cell = *cell;

            let Some(neighbour) = direction.step(cell, width, height) else {
                continue;
            };
            let n = maze.index(neighbour);
            if visited[n] {
                continue;
            }
            visited[n] = true;
            let c = maze.index(cell);
            maze.cells[c].knock_down(direction);
            maze.cells[n].knock_down(direction.opposite());
            stack.push((neighbour, shuffled_directions(rng), 0));
        }

        maze
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn start(&self) -> Position {
        Position::new(0, 0)
    }

    pub fn exit(&self) -> Position {
        Position::new(self.width - 1, self.height - 1)
    }

    fn index(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }

    fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn walls(&self, pos: Position) -> Option<Walls> {
        self.contains(pos).then(|| self.cells[self.index(pos)])
    }

    /// Target of a move from `from`, or None when a wall or the edge blocks it
    pub fn neighbour(&self, from: Position, direction: Direction) -> Option<Position> {
        let walls = self.walls(from)?;
        if !walls.is_open(direction) {
            return None;
        }
        direction.step(from, self.width, self.height)
    }

    /// Number of open walls, each shared wall counted once
    pub fn open_connections(&self) -> usize {
        self.cells
            .iter()
            .map(|w| usize::from(w.is_open(Direction::East)) + usize::from(w.is_open(Direction::South)))
            .sum()
    }

    /// Breadth-first shortest path, reconstructed from a predecessor table.
    pub fn shortest_path(&self, from: Position, to: Position) -> Option<Vec<Position>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }

        let mut previous: Vec<Option<usize>> = vec![None; self.cells.len()];
        let mut visited = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([from]);
        visited[self.index(from)] = true;

        while let Some(cell) = queue.pop_front() {
            if cell == to {
                let mut path = vec![cell];
                let mut i = self.index(cell);
                while let Some(p) = previous[i] {
                    path.push(Position::new(p % self.width, p / self.width));
                    i = p;
                }
                path.reverse();
                return Some(path);
            }
            for direction in Direction::ALL {
                if let Some(next) = self.neighbour(cell, direction) {
                    let n = self.index(next);
                    if !visited[n] {
                        visited[n] = true;
                        previous[n] = Some(self.index(cell));
                        queue.push_back(next);
                    }
                }
            }
        }

        None
    }

    /// Moves needed to walk from the start to the exit
    pub fn optimal_moves(&self) -> usize {
        self.shortest_path(self.start(), self.exit())
            .map(|path| path.len() - 1)
            .unwrap_or(0)
    }
}

fn shuffled_directions<R: Rng + ?Sized>(rng: &mut R) -> [Direction; 4] {
    let mut directions = Direction::ALL;
    directions.shuffle(rng);
    directions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeConfig {
    pub count: usize,
    pub width: usize,
    pub height: usize,
}

pub fn config_for(age: AgeGroup) -> MazeConfig {
    match age {
        AgeGroup::Younger => MazeConfig {
            count: 10,
            width: 13,
            height: 11,
        },
        AgeGroup::Older => MazeConfig {
            count: 10,
            width: 19,
            height: 15,
        },
    }
}

const LABELS: [&str; 5] = [
    "Very Poor Navigation",
    "Poor Navigation",
    "Average Navigation",
    "Good Navigation",
    "Excellent Navigation",
];

/// User moves as a percentage of the optimal route
pub fn path_efficiency(user_moves: usize, optimal_moves: usize) -> f64 {
    if optimal_moves == 0 {
        return 100.0;
    }
    user_moves as f64 / optimal_moves as f64 * 100.0
}

pub fn maze_score(age: AgeGroup, user_moves: usize, optimal_moves: usize) -> Score {
    let cuts = match age {
        AgeGroup::Younger => [120.0, 140.0, 170.0, 200.0],
        AgeGroup::Older => [110.0, 125.0, 150.0, 180.0],
    };
    Score::from_ascending_cuts(path_efficiency(user_moves, optimal_moves), cuts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MazeStep {
    pub maze: usize,
    pub from: Position,
    pub to: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MazeSummary {
    pub age_group: AgeGroup,
    pub total_user_moves: usize,
    pub total_optimal_moves: usize,
    pub path_efficiency: f64,
    pub score: Score,
    pub label: &'static str,
}

impl Scored for MazeSummary {
    fn score(&self) -> Score {
        self.score
    }

    fn interpretation(&self) -> &str {
        self.label
    }

    fn column(&self) -> Option<ScoreColumn> {
        Some(ScoreColumn::Maze)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MazePhase {
    Selection,
    Instructions {
        age: AgeGroup,
    },
    Playing {
        age: AgeGroup,
        maze: usize,
        position: Position,
        moves: usize,
    },
    Solved {
        age: AgeGroup,
        maze: usize,
        moves: usize,
    },
    Finished(MazeSummary),
}

pub struct MazeGame {
    phase: MazePhase,
    mazes: Vec<Maze>,
    optimal: Vec<usize>,
    recorder: SessionRecorder<MazeStep>,
}

impl Default for MazeGame {
    fn default() -> Self {
        Self::new()
    }
}

impl MazeGame {
    pub fn new() -> Self {
        Self {
            phase: MazePhase::Selection,
            mazes: Vec::new(),
            optimal: Vec::new(),
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &MazePhase {
        &self.phase
    }

    pub fn current_maze(&self) -> Option<&Maze> {
        match self.phase {
            MazePhase::Playing { maze, .. } | MazePhase::Solved { maze, .. } => self.mazes.get(maze),
            _ => None,
        }
    }

    pub fn select_age(&mut self, age: AgeGroup) -> Result<(), GameError> {
        match self.phase {
            MazePhase::Selection => {
                self.phase = MazePhase::Instructions { age };
                Ok(())
            }
            _ => Err(GameError::WrongPhase),
        }
    }

    /// Generate the age group's mazes and enter the first one
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let MazePhase::Instructions { age } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        let config = config_for(age);
        self.mazes = (0..config.count)
            .map(|_| Maze::generate(config.width, config.height, rng))
            .collect();
        self.optimal = self.mazes.iter().map(Maze::optimal_moves).collect();
        self.recorder.reset();
        self.phase = MazePhase::Playing {
            age,
            maze: 0,
            position: Position::new(0, 0),
            moves: 0,
        };
        Ok(())
    }

    /// Attempt one step. Blocked moves leave the cursor and the move count
    /// untouched and return `Ok(false)`.
    pub fn step(&mut self, direction: Direction) -> Result<bool, GameError> {
        let MazePhase::Playing {
            age,
            maze,
            position,
            moves,
        } = self.phase
        else {
            return Err(GameError::WrongPhase);
        };
        let grid = &self.mazes[maze];
        let Some(to) = grid.neighbour(position, direction) else {
            return Ok(false);
        };
        let exit = grid.exit();

        self.recorder
            .record(
                action_key(maze, moves),
                MazeStep {
                    maze,
                    from: position,
                    to,
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        self.phase = if to == exit {
            MazePhase::Solved {
                age,
                maze,
                moves: moves + 1,
            }
        } else {
            MazePhase::Playing {
                age,
                maze,
                position: to,
                moves: moves + 1,
            }
        };
        Ok(true)
    }

    /// Leave a solved maze. Returns the summary when the last maze is done.
    pub fn next_maze(&mut self) -> Result<Option<MazeSummary>, GameError> {
        let MazePhase::Solved { age, maze, .. } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        if maze + 1 < self.mazes.len() {
            self.phase = MazePhase::Playing {
                age,
                maze: maze + 1,
                position: Position::new(0, 0),
                moves: 0,
            };
            return Ok(None);
        }

        let total_optimal_moves: usize = self.optimal.iter().sum();
        let summary = self
            .recorder
            .reduce(|steps| summarize(age, steps.len(), total_optimal_moves))
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = MazePhase::Finished(summary.clone());
        Ok(Some(summary))
    }
}

fn summarize(age: AgeGroup, total_user_moves: usize, total_optimal_moves: usize) -> MazeSummary {
    let score = maze_score(age, total_user_moves, total_optimal_moves);
    MazeSummary {
        age_group: age,
        total_user_moves,
        total_optimal_moves,
        path_efficiency: path_efficiency(total_user_moves, total_optimal_moves),
        score,
        label: score.label(&LABELS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_mazes_are_connected() {
        let mut rng = StdRng::seed_from_u64(7);
        for (w, h) in [(2, 2), (3, 5), (13, 11), (19, 15), (40, 3)] {
            let maze = Maze::generate(w, h, &mut rng);
            let path = maze.shortest_path(maze.start(), maze.exit());
            assert!(path.is_some_and(|p| !p.is_empty()), "{w}x{h} disconnected");
        }
    }

    #[test]
    fn generated_mazes_are_spanning_trees() {
        let mut rng = StdRng::seed_from_u64(42);
        for seed_round in 0..20 {
            let w = 2 + seed_round % 7;
            let h = 2 + seed_round % 5;
            let maze = Maze::generate(w, h, &mut rng);
            assert_eq!(maze.open_connections(), w * h - 1);
        }
    }

    #[test]
    fn walls_are_symmetric() {
        let mut rng = StdRng::seed_from_u64(3);
        let maze = Maze::generate(9, 7, &mut rng);
        for y in 0..7 {
            for x in 0..9 {
                let here = Position::new(x, y);
                for d in Direction::ALL {
                    if let Some(there) = maze.neighbour(here, d) {
                        assert!(maze.walls(there).unwrap().is_open(d.opposite()));
                    }
                }
            }
        }
    }

    #[test]
    fn shortest_path_steps_between_adjacent_open_cells() {
        let mut rng = StdRng::seed_from_u64(11);
        let maze = Maze::generate(13, 11, &mut rng);
        let path = maze.shortest_path(maze.start(), maze.exit()).unwrap();

        assert_eq!(path.first(), Some(&maze.start()));
        assert_eq!(path.last(), Some(&maze.exit()));
        for pair in path.windows(2) {
            let d = Direction::between(pair[0], pair[1]).unwrap();
            assert_eq!(maze.neighbour(pair[0], d), Some(pair[1]));
        }
        assert_eq!(maze.optimal_moves(), path.len() - 1);
    }

    #[test]
    fn single_cell_maze_needs_no_moves() {
        let mut rng = StdRng::seed_from_u64(0);
        let maze = Maze::generate(1, 1, &mut rng);
        assert_eq!(maze.optimal_moves(), 0);
        assert_eq!(maze.open_connections(), 0);
    }

    #[test]
    fn maze_score_boundaries() {
        assert_eq!(maze_score(AgeGroup::Younger, 120, 100).value(), 5);
        assert_eq!(maze_score(AgeGroup::Younger, 121, 100).value(), 4);
        assert_eq!(maze_score(AgeGroup::Younger, 201, 100).value(), 1);
        assert_eq!(maze_score(AgeGroup::Older, 110, 100).value(), 5);
        assert_eq!(maze_score(AgeGroup::Older, 120, 100).value(), 4);
        assert_eq!(maze_score(AgeGroup::Older, 181, 100).value(), 1);
        assert_eq!(maze_score(AgeGroup::Older, 0, 0).value(), 5);
    }

    #[test]
    fn blocked_step_is_not_counted() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = MazeGame::new();
        game.select_age(AgeGroup::Younger).unwrap();
        game.start(&mut rng).unwrap();

        // The start cell's north and west walls are always outer boundary.
        assert_eq!(game.step(Direction::North), Ok(false));
        assert_eq!(game.step(Direction::West), Ok(false));
        match game.phase() {
            MazePhase::Playing { moves, position, .. } => {
                assert_eq!(*moves, 0);
                assert_eq!(*position, Position::new(0, 0));
            }
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[test]
    fn optimal_playthrough_scores_five() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut game = MazeGame::new();
        game.select_age(AgeGroup::Older).unwrap();
        game.start(&mut rng).unwrap();

        let mut summary = None;
        while summary.is_none() {
            let maze = game.current_maze().unwrap().clone();
            let path = maze.shortest_path(maze.start(), maze.exit()).unwrap();
            for pair in path.windows(2) {
                let d = Direction::between(pair[0], pair[1]).unwrap();
                assert_eq!(game.step(d), Ok(true));
            }
            assert!(matches!(game.phase(), MazePhase::Solved { .. }));
            summary = game.next_maze().unwrap();
        }

        let summary = summary.unwrap();
        assert_eq!(summary.total_user_moves, summary.total_optimal_moves);
        assert_eq!(summary.score.value(), 5);
        assert_eq!(summary.label, "Excellent Navigation");
        assert!(matches!(game.phase(), MazePhase::Finished(_)));
        assert_eq!(game.next_maze(), Err(GameError::WrongPhase));
    }
}
