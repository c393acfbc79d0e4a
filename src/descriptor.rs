use std::fmt::Display;

use crate::grid::{GridPos, GridRect};

/// Widest bus a single pin can carry. Pin values are `u64` bitmasks.
pub const MAX_WIDTH: u32 = 64;

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinKind {
    Input,
    Output,
}

impl Display for PinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => f.write_str("Input"),
            Self::Output => f.write_str("Output"),
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOp {
    And,
    Or,
    Xor,
}

impl GateOp {
    pub fn label(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
        }
    }

    pub fn apply(self, a: u64, b: u64) -> u64 {
        match self {
            Self::And => a & b,
            Self::Or => a | b,
            Self::Xor => a ^ b,
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinDirection {
    In,
    Out,
}

/// A boundary pin of a nested schematic.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub width: u32,
}

impl Port {
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// Electrical and geometric shape of an element, independent of placement.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Not {
        width: u32,
    },
    Gate {
        op: GateOp,
        width: u32,
        num_inputs: u32,
        negated: bool,
    },
    ExposedPin {
        direction: PinDirection,
        width: u32,
    },
    /// Another diagram used as a component. Only its boundary matters here.
    Schematic {
        name: String,
        inputs: Vec<Port>,
        outputs: Vec<Port>,
    },
}

/// Pin position in unrotated local grid units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinLayout {
    pub offset: GridPos,
    pub name: String,
    pub kind: PinKind,
    pub width: u32,
}

impl PinLayout {
    fn input(x: i32, y: i32, name: impl Into<String>, width: u32) -> Self {
        Self {
            offset: GridPos::new(x, y),
            name: name.into(),
            kind: PinKind::Input,
            width,
        }
    }

    fn output(x: i32, y: i32, name: impl Into<String>, width: u32) -> Self {
        Self {
            offset: GridPos::new(x, y),
            name: name.into(),
            kind: PinKind::Output,
            width,
        }
    }
}

impl Descriptor {
    pub fn gate(op: GateOp, negated: bool) -> Self {
        Self::Gate {
            op,
            width: 1,
            num_inputs: 2,
            negated,
        }
    }

    pub fn input(width: u32) -> Self {
        Self::ExposedPin {
            direction: PinDirection::In,
            width,
        }
    }

    pub fn output(width: u32) -> Self {
        Self::ExposedPin {
            direction: PinDirection::Out,
            width,
        }
    }

    pub fn is_schematic(&self) -> bool {
        matches!(self, Self::Schematic { .. })
    }

    /// Exposed pin the user can drive while simulating.
    pub fn is_exposed_input(&self) -> bool {
        matches!(
            self,
            Self::ExposedPin {
                direction: PinDirection::In,
                ..
            }
        )
    }

    pub fn label(&self) -> String {
        match self {
            Self::Not { .. } => "NOT".to_owned(),
            Self::Gate { op, negated, .. } => match (*op, *negated) {
                (GateOp::And, true) => "NAND".to_owned(),
                (GateOp::Or, true) => "NOR".to_owned(),
                (GateOp::Xor, true) => "XNOR".to_owned(),
                (op, false) => op.label().to_owned(),
            },
            Self::ExposedPin {
                direction: PinDirection::In,
                ..
            } => "Input".to_owned(),
            Self::ExposedPin {
                direction: PinDirection::Out,
                ..
            } => "Output".to_owned(),
            Self::Schematic { name, .. } => name.clone(),
        }
    }

    pub fn bounding_rect(&self) -> GridRect {
        match self {
            Self::Not { .. } => GridRect::new(-4, -1, 4, 2),
            Self::Gate { num_inputs, .. } => {
                let h = (*num_inputs / 2) as i32;
                GridRect::new(-4, -h - 1, 4, h * 2 + 2)
            }
            Self::ExposedPin {
                direction: PinDirection::Out,
                width,
            } => GridRect::new(0, -1, *width as i32, 2),
            Self::ExposedPin {
                direction: PinDirection::In,
                width,
            } => GridRect::new(-(*width as i32), -1, *width as i32, 2),
            Self::Schematic {
                inputs, outputs, ..
            } => {
                let (w, h) = schematic_size(inputs.len(), outputs.len());
                GridRect::new(0, 0, w, h)
            }
        }
    }

    pub fn inputs(&self) -> Vec<PinLayout> {
        match self {
            Self::Not { width } => vec![PinLayout::input(-4, 0, "in", *width)],
            Self::Gate {
                width, num_inputs, ..
            } => {
                // Even input counts leave the middle row free so the output lines up.
                let n = *num_inputs as i32;
                let h = n / 2;
                let even = n % 2 == 0;
                (0..n + i32::from(even))
                    .filter(|i| !(even && *i == h))
                    .enumerate()
                    .map(|(index, i)| PinLayout::input(-4, -h + i, format!("in{index}"), *width))
                    .collect()
            }
            Self::ExposedPin {
                direction: PinDirection::Out,
                width,
            } => vec![PinLayout::input(0, 0, "pin", *width)],
            Self::ExposedPin {
                direction: PinDirection::In,
                ..
            } => Vec::new(),
            Self::Schematic { inputs, .. } => inputs
                .iter()
                .enumerate()
                .map(|(i, port)| PinLayout::input(0, i as i32 + 1, port.name.clone(), port.width))
                .collect(),
        }
    }

    pub fn outputs(&self) -> Vec<PinLayout> {
        match self {
            Self::Not { width } | Self::Gate { width, .. } => {
                vec![PinLayout::output(0, 0, "out", *width)]
            }
            Self::ExposedPin {
                direction: PinDirection::In,
                width,
            } => vec![PinLayout::output(0, 0, "pin", *width)],
            Self::ExposedPin {
                direction: PinDirection::Out,
                ..
            } => Vec::new(),
            Self::Schematic {
                inputs, outputs, ..
            } => {
                let (w, _) = schematic_size(inputs.len(), outputs.len());
                outputs
                    .iter()
                    .enumerate()
                    .map(|(i, port)| PinLayout::output(w, i as i32 + 1, port.name.clone(), port.width))
                    .collect()
            }
        }
    }

    /// Inputs followed by outputs, the order hit-testing checks them in.
    pub fn pins(&self) -> Vec<PinLayout> {
        let mut pins = self.inputs();
        pins.extend(self.outputs());
        pins
    }
}

fn schematic_size(num_inputs: usize, num_outputs: usize) -> (i32, i32) {
    let h = num_inputs.max(num_outputs) as i32 + 1;
    // Golden-ratio-ish box, truncated like the lattice expects.
    let w = (h as f32 / 1.61) as i32;
    (w, h)
}
