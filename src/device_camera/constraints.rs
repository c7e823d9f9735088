use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Camera pointing at the user.
    User,
    /// Camera pointing away from the user. Chosen with `Config::facing`.
    #[allow(dead_code)]
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeConstraint {
    Exact { width: u32, height: u32 },
    /// Anything from 0 up to and including the given size.
    AtMost { width: u32, height: u32 },
    Any,
}

impl SizeConstraint {
    #[allow(dead_code)]
    pub fn accepts(&self, width: u32, height: u32) -> bool {
        match *self {
            SizeConstraint::Exact {
                width: w,
                height: h,
            } => width == w && height == h,
            SizeConstraint::AtMost {
                width: w,
                height: h,
            } => width <= w && height <= h,
            SizeConstraint::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: FacingMode,
    pub size: SizeConstraint,
}

impl fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            SizeConstraint::Exact { width, height } => {
                write!(f, "{:?} facing, exactly {}x{}", self.facing, width, height)
            }
            SizeConstraint::AtMost { width, height } => {
                write!(f, "{:?} facing, up to {}x{}", self.facing, width, height)
            }
            SizeConstraint::Any => write!(f, "{:?} facing, any size", self.facing),
        }
    }
}

/// Constraint sets to try, strictest first. Facing is never relaxed.
pub fn fallback_chain(
    facing: FacingMode,
    preferred_width: u32,
    preferred_height: u32,
) -> Vec<StreamConstraints> {
    vec![
        StreamConstraints {
            facing,
            size: SizeConstraint::Exact {
                width: preferred_width,
                height: preferred_height,
            },
        },
        StreamConstraints {
            facing,
            size: SizeConstraint::AtMost {
                width: preferred_width,
                height: preferred_height,
            },
        },
        StreamConstraints {
            facing,
            size: SizeConstraint::Any,
        },
    ]
}
