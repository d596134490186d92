//! Core types for field components on the staggered grid.

use std::fmt;

/// Number of columns of a per-transition saturation cross-section row.
///
/// Rows are indexed by direction; the two trailing columns are reserved for
/// cylindrical directions and unused on Cartesian grids.
pub const SIGMAT_COLUMNS: usize = 5;

/// A Cartesian direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    X,
    Y,
    Z,
}

impl Direction {
    /// All Cartesian directions in index order.
    pub const ALL: [Direction; 3] = [Direction::X, Direction::Y, Direction::Z];

    /// Index into per-direction tables.
    pub fn index(self) -> usize {
        match self {
            Direction::X => 0,
            Direction::Y => 1,
            Direction::Z => 2,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::X => write!(f, "x"),
            Direction::Y => write!(f, "y"),
            Direction::Z => write!(f, "z"),
        }
    }
}

/// The kind of field a component belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    E,
    H,
    D,
    B,
}

impl FieldType {
    /// The flux-density partner of a field type (E -> D, H -> B).
    ///
    /// Polarization is subtracted from this partner to recover the field.
    pub fn flux_partner(self) -> FieldType {
        match self {
            FieldType::E | FieldType::D => FieldType::D,
            FieldType::H | FieldType::B => FieldType::B,
        }
    }
}

/// Real or imaginary part of a (possibly complex) field array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComplexPart {
    Re,
    Im,
}

impl ComplexPart {
    /// Both parts, real first.
    pub const ALL: [ComplexPart; 2] = [ComplexPart::Re, ComplexPart::Im];

    /// Index into per-part tables.
    pub fn index(self) -> usize {
        match self {
            ComplexPart::Re => 0,
            ComplexPart::Im => 1,
        }
    }

    /// The other part.
    pub fn conjugate(self) -> ComplexPart {
        match self {
            ComplexPart::Re => ComplexPart::Im,
            ComplexPart::Im => ComplexPart::Re,
        }
    }

    /// Sign picked up by this part when multiplied by -i.
    ///
    /// -i (a + ib) = b - ia: the real part lands in the imaginary slot with a
    /// minus sign, the imaginary part lands in the real slot unchanged.
    pub fn minus_i_sign(self) -> f64 {
        match self {
            ComplexPart::Re => -1.0,
            ComplexPart::Im => 1.0,
        }
    }
}

/// A field component on the Yee grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Ex,
    Ey,
    Ez,
    Hx,
    Hy,
    Hz,
    Dx,
    Dy,
    Dz,
    Bx,
    By,
    Bz,
}

/// Number of field components.
pub const NUM_COMPONENTS: usize = 12;

impl Component {
    /// All components in table order.
    pub const ALL: [Component; NUM_COMPONENTS] = [
        Component::Ex,
        Component::Ey,
        Component::Ez,
        Component::Hx,
        Component::Hy,
        Component::Hz,
        Component::Dx,
        Component::Dy,
        Component::Dz,
        Component::Bx,
        Component::By,
        Component::Bz,
    ];

    /// Index into per-component tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Build a component from its field type and direction.
    pub fn new(field_type: FieldType, direction: Direction) -> Component {
        let base = match field_type {
            FieldType::E => 0,
            FieldType::H => 3,
            FieldType::D => 6,
            FieldType::B => 9,
        };
        Component::ALL[base + direction.index()]
    }

    /// The field type of this component.
    pub fn field_type(self) -> FieldType {
        match self.index() / 3 {
            0 => FieldType::E,
            1 => FieldType::H,
            2 => FieldType::D,
            _ => FieldType::B,
        }
    }

    /// The direction this component points along.
    pub fn direction(self) -> Direction {
        Direction::ALL[self.index() % 3]
    }

    /// Same field type, another direction.
    pub fn with_direction(self, direction: Direction) -> Component {
        Component::new(self.field_type(), direction)
    }

    /// Same direction, another field type.
    pub fn with_field_type(self, field_type: FieldType) -> Component {
        Component::new(field_type, self.direction())
    }

    /// Electric-like components (E, D).
    pub fn is_electric(self) -> bool {
        matches!(self.field_type(), FieldType::E | FieldType::D)
    }

    /// Magnetic-like components (H, B).
    pub fn is_magnetic(self) -> bool {
        matches!(self.field_type(), FieldType::H | FieldType::B)
    }

    /// Whether this component sits on an integer grid coordinate along `axis`.
    ///
    /// Electric components live at half-integer positions along their own
    /// direction and on integer positions otherwise; magnetic components are
    /// the dual. Cell centers are half-integer along every axis.
    pub fn on_integer_axis(self, axis: Direction) -> bool {
        let along = axis == self.direction();
        if self.is_electric() {
            !along
        } else {
            along
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.field_type() {
            FieldType::E => "e",
            FieldType::H => "h",
            FieldType::D => "d",
            FieldType::B => "b",
        };
        write!(f, "{}{}", prefix, self.direction())
    }
}
