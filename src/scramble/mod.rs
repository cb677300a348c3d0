pub mod face;
pub mod filter;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::scramble::face::{Face, Move, Turn};
use crate::scramble::filter::{remove_opposite_neighbours, remove_redundant};
use crate::session::solve::PuzzleType;

const MEGAMINX_LINES: usize = 7;
const MEGAMINX_PAIRS_PER_LINE: usize = 5;

/// Number of shuffled six-face permutations concatenated into the draft.
fn permutations_for(puzzle: PuzzleType) -> usize {
    match puzzle {
        PuzzleType::Cube3 => 4,
        PuzzleType::Cube4 => 7,
        PuzzleType::Cube5 => 10,
        PuzzleType::Megaminx => 0,
    }
}

/// Produce a fresh space-separated scramble for `puzzle`.
pub fn generate<R: Rng + ?Sized>(puzzle: PuzzleType, rng: &mut R) -> String {
    match puzzle {
        PuzzleType::Megaminx => megaminx(rng),
        PuzzleType::Cube3 => cube(permutations_for(puzzle), false, rng),
        PuzzleType::Cube4 | PuzzleType::Cube5 => cube(permutations_for(puzzle), true, rng),
    }
}

fn draft<R: Rng + ?Sized>(permutations: usize, rng: &mut R) -> Vec<Face> {
    let mut faces = Vec::with_capacity(permutations * Face::ALL.len());
    for _ in 0..permutations {
        let mut perm = Face::ALL;
        perm.shuffle(rng);
        faces.extend(perm);
    }
    faces
}

fn cube<R: Rng + ?Sized>(permutations: usize, wide_moves: bool, rng: &mut R) -> String {
    let mut faces = draft(permutations, rng);
    if wide_moves {
        remove_opposite_neighbours(&mut faces);
    }
    remove_redundant(&mut faces);

    let outcomes = if wide_moves { 6 } else { 3 };
    faces
        .into_iter()
        .map(|face| {
            let roll = rng.gen_range(0..outcomes);
            let turn = match roll % 3 {
                0 => Turn::Clockwise,
                1 => Turn::CounterClockwise,
                _ => Turn::Double,
            };
            Move {
                face,
                turn,
                wide: roll >= 3,
            }
            .to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn megaminx<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut tokens = Vec::with_capacity(MEGAMINX_LINES * (MEGAMINX_PAIRS_PER_LINE * 2 + 1));
    for _ in 0..MEGAMINX_LINES {
        for _ in 0..MEGAMINX_PAIRS_PER_LINE {
            tokens.push(if rng.gen_bool(0.5) { "R++" } else { "R--" });
            tokens.push(if rng.gen_bool(0.5) { "D++" } else { "D--" });
        }
        tokens.push(if rng.gen_bool(0.5) { "U" } else { "U'" });
    }
    tokens.join(" ")
}

/// The puzzle being timed and the scramble currently shown for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrambleState {
    puzzle: PuzzleType,
    current: String,
}

impl ScrambleState {
    pub fn new<R: Rng + ?Sized>(puzzle: PuzzleType, rng: &mut R) -> Self {
        Self {
            puzzle,
            current: generate(puzzle, rng),
        }
    }

    pub fn puzzle(&self) -> PuzzleType {
        self.puzzle
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        self.current = generate(self.puzzle, rng);
        &self.current
    }

    pub fn set_puzzle<R: Rng + ?Sized>(&mut self, puzzle: PuzzleType, rng: &mut R) -> &str {
        self.puzzle = puzzle;
        self.regenerate(rng)
    }
}
