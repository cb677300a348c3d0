use crate::scramble::face::Face;

/// Drop a face if it repeats its predecessor, or if it returns to the face two
/// positions back across that face's opposite (`R L R`).
///
/// Single left-to-right pass; after a deletion the cursor steps back two
/// positions so the newly adjacent pair is checked again. This reduces
/// redundancy but does not prove a sequence free of it.
pub fn remove_redundant(faces: &mut Vec<Face>) {
    let mut i = 1;
    while i < faces.len() {
        let repeated = faces[i] == faces[i - 1];
        let sandwiched =
            i >= 2 && faces[i] == faces[i - 2] && faces[i - 1] == faces[i].opposite();
        if repeated || sandwiched {
            faces.remove(i);
            i = i.saturating_sub(2).max(1);
        } else {
            i += 1;
        }
    }
}

/// Stricter pass for wide-move puzzles: drop a face if either neighbour is its
/// opposite. Same cursor discipline as [`remove_redundant`]. Never empties a
/// non-empty sequence, since a face is only removed while a neighbour remains.
pub fn remove_opposite_neighbours(faces: &mut Vec<Face>) {
    let mut i = 0;
    while i < faces.len() {
        let opposite = faces[i].opposite();
        let before = i > 0 && faces[i - 1] == opposite;
        let after = faces.get(i + 1) == Some(&opposite);
        if before || after {
            faces.remove(i);
            i = i.saturating_sub(2);
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Face::*;

    #[test]
    fn removes_immediate_repeats() {
        let mut faces = vec![R, R, U, U, U, F];
        remove_redundant(&mut faces);
        assert_eq!(faces, vec![R, U, F]);
    }

    #[test]
    fn removes_one_gap_opposite_sandwich() {
        let mut faces = vec![R, L, R, U];
        remove_redundant(&mut faces);
        assert_eq!(faces, vec![R, L, U]);
    }

    #[test]
    fn keeps_non_opposite_sandwich() {
        let mut faces = vec![R, U, R];
        remove_redundant(&mut faces);
        assert_eq!(faces, vec![R, U, R]);
    }

    #[test]
    fn rechecks_after_deletion() {
        // F U F is not a sandwich: U is not opposite F.
        let mut faces = vec![F, U, U, F];
        remove_redundant(&mut faces);
        assert_eq!(faces, vec![F, U, F]);

        let mut faces = vec![R, F, F, R, L, R];
        remove_redundant(&mut faces);
        assert_eq!(faces, vec![R, F, R, L]);
    }

    #[test]
    fn handles_short_sequences() {
        let mut empty: Vec<Face> = Vec::new();
        remove_redundant(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![D];
        remove_redundant(&mut single);
        assert_eq!(single, vec![D]);
    }

    #[test]
    fn removes_faces_next_to_their_opposite() {
        let mut faces = vec![R, L, U, F, B, D];
        remove_opposite_neighbours(&mut faces);
        for pair in faces.windows(2) {
            assert_ne!(pair[0].opposite(), pair[1]);
        }
        assert!(!faces.is_empty());
    }

    #[test]
    fn opposite_filter_keeps_one_of_a_pair() {
        let mut faces = vec![U, D];
        remove_opposite_neighbours(&mut faces);
        assert_eq!(faces, vec![D]);
    }
}
