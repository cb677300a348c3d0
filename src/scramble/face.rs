use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    R,
    L,
    U,
    D,
    F,
    B,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::R, Face::U, Face::D, Face::L, Face::F, Face::B];

    pub fn opposite(self) -> Face {
        match self {
            Face::R => Face::L,
            Face::L => Face::R,
            Face::U => Face::D,
            Face::D => Face::U,
            Face::F => Face::B,
            Face::B => Face::F,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Face::R => 'R',
            Face::L => 'L',
            Face::U => 'U',
            Face::D => 'D',
            Face::F => 'F',
            Face::B => 'B',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Clockwise,
    CounterClockwise,
    Double,
}

impl Turn {
    pub fn suffix(self) -> &'static str {
        match self {
            Turn::Clockwise => "",
            Turn::CounterClockwise => "'",
            Turn::Double => "2",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub face: Face,
    pub turn: Turn,
    /// Turns the outer two layers together (big cubes only).
    pub wide: bool,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wide = if self.wide { "w" } else { "" };
        write!(f, "{}{}{}", self.face.letter(), wide, self.turn.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for face in Face::ALL {
            assert_ne!(face.opposite(), face);
            assert_eq!(face.opposite().opposite(), face);
        }
    }

    #[test]
    fn move_notation() {
        let plain = Move {
            face: Face::R,
            turn: Turn::CounterClockwise,
            wide: false,
        };
        let wide = Move {
            face: Face::U,
            turn: Turn::Double,
            wide: true,
        };
        assert_eq!(plain.to_string(), "R'");
        assert_eq!(wide.to_string(), "Uw2");
    }
}
