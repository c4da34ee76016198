//! Tetromino definitions, shape table and spawn slots
//!
//! Offsets are in world units (one cell is [`CELL`] wide) relative to the
//! piece pivot. Rotation states follow the SRS layouts; the type order
//! (O, I, L, J, S, Z, T) is also the numeric type index 0..6.

use serde::Serialize;

/// Cell pitch in world units
pub const CELL: i32 = 32;
/// Half a cell; block positions are cell centers
pub const HALF_CELL: i32 = CELL / 2;

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TetrominoType {
    O,
    I,
    L,
    J,
    S,
    Z,
    T,
}

/// Pivot placement class. O and I pivot on cell corners/edges, the other
/// five pivot on their center cell, so each class has its own spawn slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnClass {
    O,
    I,
    Default,
}

impl SpawnClass {
    pub fn index(self) -> usize {
        match self {
            SpawnClass::O => 0,
            SpawnClass::I => 1,
            SpawnClass::Default => 2,
        }
    }

    /// Spawn pivot relative to the container's (left, top) corner
    pub fn spawn_offset(self) -> (i32, i32) {
        match self {
            SpawnClass::O => (5 * CELL, CELL),
            SpawnClass::I => (5 * CELL, HALF_CELL),
            SpawnClass::Default => (4 * CELL + HALF_CELL, CELL + HALF_CELL),
        }
    }
}

type Shape = [(i32, i32); 4];

const C: i32 = CELL;

const O_SHAPE: Shape = [(-HALF_CELL, -HALF_CELL), (HALF_CELL, -HALF_CELL), (-HALF_CELL, HALF_CELL), (HALF_CELL, HALF_CELL)];

// I pivot sits between columns 1 and 2 of its 4x4 box, on the center of row 1.
const I_SHAPES: [Shape; 4] = [
    [(-48, 0), (-16, 0), (16, 0), (48, 0)],
    [(16, -C), (16, 0), (16, C), (16, 2 * C)],
    [(-48, C), (-16, C), (16, C), (48, C)],
    [(-16, -C), (-16, 0), (-16, C), (-16, 2 * C)],
];

// L:  ..O   .O.   ...   OO.
//     OOO   .O.   OOO   .O.
//     ...   .OO   O..   .O.
const L_SHAPES: [Shape; 4] = [
    [(C, -C), (-C, 0), (0, 0), (C, 0)],
    [(0, -C), (0, 0), (0, C), (C, C)],
    [(-C, 0), (0, 0), (C, 0), (-C, C)],
    [(-C, -C), (0, -C), (0, 0), (0, C)],
];

// J:  O..   .OO   ...   .O.
//     OOO   .O.   OOO   .O.
//     ...   .O.   ..O   OO.
const J_SHAPES: [Shape; 4] = [
    [(-C, -C), (-C, 0), (0, 0), (C, 0)],
    [(0, -C), (C, -C), (0, 0), (0, C)],
    [(-C, 0), (0, 0), (C, 0), (C, C)],
    [(0, -C), (0, 0), (-C, C), (0, C)],
];

// S:  .OO   .O.   ...   O..
//     OO.   .OO   .OO   OO.
//     ...   ..O   OO.   .O.
const S_SHAPES: [Shape; 4] = [
    [(0, -C), (C, -C), (-C, 0), (0, 0)],
    [(0, -C), (0, 0), (C, 0), (C, C)],
    [(0, 0), (C, 0), (-C, C), (0, C)],
    [(-C, -C), (-C, 0), (0, 0), (0, C)],
];

// Z:  OO.   ..O   ...   .O.
//     .OO   .OO   OO.   OO.
//     ...   .O.   .OO   O..
const Z_SHAPES: [Shape; 4] = [
    [(-C, -C), (0, -C), (0, 0), (C, 0)],
    [(C, -C), (0, 0), (C, 0), (0, C)],
    [(-C, 0), (0, 0), (0, C), (C, C)],
    [(0, -C), (-C, 0), (0, 0), (-C, C)],
];

// T:  .O.   .O.   ...   .O.
//     OOO   .OO   OOO   OO.
//     ...   .O.   .O.   .O.
const T_SHAPES: [Shape; 4] = [
    [(0, -C), (-C, 0), (0, 0), (C, 0)],
    [(0, -C), (0, 0), (C, 0), (0, C)],
    [(-C, 0), (0, 0), (C, 0), (0, C)],
    [(0, -C), (-C, 0), (0, 0), (0, C)],
];

impl TetrominoType {
    /// Get all tetromino types in type-index order
    pub fn all() -> [TetrominoType; 7] {
        [
            TetrominoType::O,
            TetrominoType::I,
            TetrominoType::L,
            TetrominoType::J,
            TetrominoType::S,
            TetrominoType::Z,
            TetrominoType::T,
        ]
    }

    /// Type from its numeric index (0..6), wrapping out-of-range values
    pub fn from_index(index: usize) -> TetrominoType {
        Self::all()[index % 7]
    }

    pub fn index(self) -> usize {
        match self {
            TetrominoType::O => 0,
            TetrominoType::I => 1,
            TetrominoType::L => 2,
            TetrominoType::J => 3,
            TetrominoType::S => 4,
            TetrominoType::Z => 5,
            TetrominoType::T => 6,
        }
    }

    /// Get the 4 block offsets for this tetromino at a given rotation
    pub fn shape(self, rotation: Rotation) -> [(i32, i32); 4] {
        let r = rotation.index();
        match self {
            TetrominoType::O => O_SHAPE,
            TetrominoType::I => I_SHAPES[r],
            TetrominoType::L => L_SHAPES[r],
            TetrominoType::J => J_SHAPES[r],
            TetrominoType::S => S_SHAPES[r],
            TetrominoType::Z => Z_SHAPES[r],
            TetrominoType::T => T_SHAPES[r],
        }
    }

    pub fn spawn_class(self) -> SpawnClass {
        match self {
            TetrominoType::O => SpawnClass::O,
            TetrominoType::I => SpawnClass::I,
            _ => SpawnClass::Default,
        }
    }

    /// Spawn pivot for a container whose top-left corner is (left, top)
    pub fn spawn_position(self, left: i32, top: i32) -> (i32, i32) {
        let (dx, dy) = self.spawn_class().spawn_offset();
        (left + dx, top + dy)
    }
}

/// Rotation states 0..3 (clockwise order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Rotation {
    #[default]
    North, // Spawn state
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise: North → East → South → West → North
    pub fn cw(self) -> Rotation {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }
}
