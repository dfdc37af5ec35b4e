//! Board topology.
//!
//! Pure functions describing the fixed edge and box layout of a dots grid
//! and the adjacency between an edge and the box(es) it bounds. No game
//! state lives here.
//!
//! A board of W×H boxes has (W+1)×(H+1) dots. Horizontal edges exist at
//! every (row ∈ [0,H], col ∈ [0,W)), vertical edges at every
//! (row ∈ [0,H), col ∈ [0,W]):
//!
//! ```text
//!   •──h00──•──h01──•
//!   │       │       │
//!  v00     v01     v02
//!   │       │       │
//!   •──h10──•──h11──•
//! ```
//!
//! On the wire an edge travels as the token `h-{row}-{col}` or
//! `v-{row}-{col}` and a box as `b-{row}-{col}`; inside the crate both are
//! structured keys and the string form only appears at the wire boundary.

use std::fmt;
use std::str::FromStr;

/// Default grid width in boxes.
pub const DEFAULT_BOXES_X: usize = 4;

/// Default grid height in boxes.
pub const DEFAULT_BOXES_Y: usize = 4;

/// Edge orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "h",
            Self::Vertical => "v",
        }
    }
}

/// Identity of a claimable edge: orientation plus grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId {
    pub orientation: Orientation,
    pub row: usize,
    pub col: usize,
}

impl EdgeId {
    pub fn horizontal(row: usize, col: usize) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            row,
            col,
        }
    }

    pub fn vertical(row: usize, col: usize) -> Self {
        Self {
            orientation: Orientation::Vertical,
            row,
            col,
        }
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.orientation.as_str(), self.row, self.col)
    }
}

impl FromStr for EdgeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseIdError {
            token: s.to_string(),
        };

        let mut parts = s.split('-');
        let orientation = match parts.next() {
            Some("h") => Orientation::Horizontal,
            Some("v") => Orientation::Vertical,
            _ => return Err(bad()),
        };
        let row = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(bad)?;
        let col = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(bad)?;
        if parts.next().is_some() {
            return Err(bad());
        }

        Ok(Self {
            orientation,
            row,
            col,
        })
    }
}

/// Identity of a box cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId {
    pub row: usize,
    pub col: usize,
}

impl BoxId {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b-{}-{}", self.row, self.col)
    }
}

/// Error for a malformed edge or box token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    pub token: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid board token: {:?}", self.token)
    }
}

impl std::error::Error for ParseIdError {}

/// Board dimensions in boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    boxes_x: usize,
    boxes_y: usize,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_BOXES_X, DEFAULT_BOXES_Y)
    }
}

impl Board {
    /// Create a board of `boxes_x` × `boxes_y` boxes.
    pub fn new(boxes_x: usize, boxes_y: usize) -> Self {
        Self { boxes_x, boxes_y }
    }

    pub fn boxes_x(&self) -> usize {
        self.boxes_x
    }

    pub fn boxes_y(&self) -> usize {
        self.boxes_y
    }

    /// Dots per row (one more than boxes per row).
    pub fn dot_cols(&self) -> usize {
        self.boxes_x + 1
    }

    /// Dots per column.
    pub fn dot_rows(&self) -> usize {
        self.boxes_y + 1
    }

    pub fn total_boxes(&self) -> usize {
        self.boxes_x * self.boxes_y
    }

    pub fn total_edges(&self) -> usize {
        // horizontal: (H+1) rows of W, vertical: H rows of (W+1)
        (self.boxes_y + 1) * self.boxes_x + self.boxes_y * (self.boxes_x + 1)
    }

    /// All edges, horizontal rows first, in row-major order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        let horizontal = (0..=self.boxes_y)
            .flat_map(move |row| (0..self.boxes_x).map(move |col| EdgeId::horizontal(row, col)));
        let vertical = (0..self.boxes_y)
            .flat_map(move |row| (0..=self.boxes_x).map(move |col| EdgeId::vertical(row, col)));
        horizontal.chain(vertical)
    }

    /// All boxes in row-major order.
    pub fn boxes(&self) -> impl Iterator<Item = BoxId> + '_ {
        (0..self.boxes_y)
            .flat_map(move |row| (0..self.boxes_x).map(move |col| BoxId::new(row, col)))
    }

    /// Check that an edge exists on this board.
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        match edge.orientation {
            Orientation::Horizontal => edge.row <= self.boxes_y && edge.col < self.boxes_x,
            Orientation::Vertical => edge.row < self.boxes_y && edge.col <= self.boxes_x,
        }
    }

    /// Check that a box exists on this board.
    pub fn contains_box(&self, id: BoxId) -> bool {
        id.row < self.boxes_y && id.col < self.boxes_x
    }

    /// The four edges bounding a box: top, bottom, left, right.
    pub fn bounding_edges(&self, id: BoxId) -> [EdgeId; 4] {
        [
            EdgeId::horizontal(id.row, id.col),
            EdgeId::horizontal(id.row + 1, id.col),
            EdgeId::vertical(id.row, id.col),
            EdgeId::vertical(id.row, id.col + 1),
        ]
    }

    /// The box(es) an edge bounds. At most two; one along the rim.
    pub fn adjacent_boxes(&self, edge: EdgeId) -> Vec<BoxId> {
        let mut boxes = Vec::with_capacity(2);
        match edge.orientation {
            Orientation::Horizontal => {
                if edge.row > 0 {
                    boxes.push(BoxId::new(edge.row - 1, edge.col));
                }
                if edge.row < self.boxes_y {
                    boxes.push(BoxId::new(edge.row, edge.col));
                }
            }
            Orientation::Vertical => {
                if edge.col > 0 {
                    boxes.push(BoxId::new(edge.row, edge.col - 1));
                }
                if edge.col < self.boxes_x {
                    boxes.push(BoxId::new(edge.row, edge.col));
                }
            }
        }
        boxes
    }
}
