use std::collections::{BTreeMap, HashMap};

use crate::{
    descriptor::{Descriptor, GateOp, MAX_WIDTH},
    diagram::{Diagram, Element},
};

/// Value of a pin as reported by an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    Known(u64),
    Unknown,
}

impl PinState {
    pub fn bit(self, i: u32) -> Option<bool> {
        match self {
            Self::Known(v) => Some(i < MAX_WIDTH && v & (1 << i) != 0),
            Self::Unknown => None,
        }
    }
}

/// A live simulation backend addressed by pin path.
pub trait Executor {
    fn pin_state(&self, path: &str) -> PinState;
    fn set_pin_state(&mut self, path: &str, value: u64);
    fn step(&mut self);
}

/// Path of the single pin of an exposed pin element.
pub fn exposed_pin_path(name: &str) -> String {
    format!("{name}.pin")
}

/// Path of `pin` on `element`. Nested schematics expose their boundary pins
/// one level deeper.
pub fn pin_path(element: &Element, pin: &str) -> String {
    if element.descriptor.is_schematic() {
        format!("{}.{pin}.pin", element.name)
    } else {
        format!("{}.{pin}", element.name)
    }
}

fn mask(width: u32) -> u64 {
    if width >= MAX_WIDTH {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

/// Optional executor the editor talks to. Detached, every pin is unknown.
#[derive(Default)]
pub struct SimulationLink {
    executor: Option<Box<dyn Executor>>,
}

impl SimulationLink {
    pub fn attach(&mut self, executor: Box<dyn Executor>) {
        log::info!("simulation attached");
        self.executor = Some(executor);
    }

    pub fn detach(&mut self) {
        if self.executor.take().is_some() {
            log::info!("simulation detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.executor.is_some()
    }

    pub fn pin_state(&self, path: &str) -> PinState {
        self.executor
            .as_ref()
            .map_or(PinState::Unknown, |e| e.pin_state(path))
    }

    pub fn set_pin_state(&mut self, path: &str, value: u64) {
        if let Some(executor) = &mut self.executor {
            executor.set_pin_state(path, value);
        }
    }

    pub fn step(&mut self) {
        if let Some(executor) = &mut self.executor {
            executor.step();
        }
    }

    /// Flips one bit of a pin. Unknown pins start from zero. Returns false
    /// when no executor is attached.
    pub fn flip_bit(&mut self, path: &str, bit: u32) -> bool {
        let Some(executor) = &mut self.executor else {
            return false;
        };
        if bit >= MAX_WIDTH {
            return false;
        }
        let current = match executor.pin_state(path) {
            PinState::Known(v) => v,
            PinState::Unknown => 0,
        };
        log::debug!("flipping bit {bit} of {path}");
        executor.set_pin_state(path, current ^ (1 << bit));
        true
    }
}

/// Fixed-rate step scheduler driven by frame time.
#[derive(Debug, Clone)]
pub struct Ticker {
    pub tick_interval: f32, // seconds between steps
    pub tick_accumulator: f32,
    pub max_steps: u32,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(65.0, 8)
    }
}

impl Ticker {
    pub fn new(rate_hz: f32, max_steps: u32) -> Self {
        Self {
            tick_interval: 1.0 / rate_hz.max(f32::EPSILON),
            tick_accumulator: 0.0,
            max_steps,
        }
    }

    pub fn reset(&mut self) {
        self.tick_accumulator = 0.0;
    }

    /// Number of steps due after `dt` seconds. A backlog beyond `max_steps`
    /// is dropped.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.tick_accumulator += dt;
        let mut steps = 0;
        while self.tick_accumulator >= self.tick_interval {
            if steps == self.max_steps {
                log::debug!("dropping {:.3}s of simulation backlog", self.tick_accumulator);
                self.tick_accumulator = 0.0;
                break;
            }
            self.tick_accumulator -= self.tick_interval;
            steps += 1;
        }
        steps
    }
}

#[derive(Debug, Clone)]
enum Logic {
    Not,
    Gate {
        op: GateOp,
        negated: bool,
    },
}

#[derive(Debug, Clone)]
struct Evaluation {
    logic: Logic,
    inputs: Vec<String>,
    output: String,
    width: u32,
}

/// Bit-level executor over a diagram's netlist.
///
/// Exposed inputs hold whatever was last set. Every step copies driver values
/// along wires, evaluates gates in diagram order and copies again so outputs
/// reach their sinks in the same step.
#[derive(Debug, Default, Clone)]
pub struct Simulator {
    /// Current value of every known pin.
    pub current: HashMap<String, u64>,
    widths: HashMap<String, u32>,
    /// Sink path and the paths driving it.
    links: Vec<(String, Vec<String>)>,
    evaluations: Vec<Evaluation>,
}

impl Simulator {
    pub fn from_diagram(diagram: &Diagram) -> Self {
        let mut sim = Self::default();

        for (_, element) in diagram.elements() {
            if element.descriptor.is_schematic() {
                log::debug!("{} is a nested schematic, its pins stay unknown", element.name);
                continue;
            }
            for pin in element.pins() {
                let path = pin_path(element, &pin.name);
                sim.current.insert(path.clone(), 0);
                sim.widths.insert(path, pin.width);
            }

            let logic = match &element.descriptor {
                Descriptor::Not { .. } => Logic::Not,
                Descriptor::Gate { op, negated, .. } => Logic::Gate {
                    op: *op,
                    negated: *negated,
                },
                _ => continue,
            };
            let Some(output) = element.outputs().into_iter().next() else {
                continue;
            };
            sim.evaluations.push(Evaluation {
                logic,
                inputs: element
                    .inputs()
                    .iter()
                    .map(|pin| pin_path(element, &pin.name))
                    .collect(),
                output: pin_path(element, &output.name),
                width: output.width,
            });
        }

        let mut links: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for connection in diagram.netlist().connections {
            let (Some(source), Some(dest)) = (
                diagram.get(connection.source.element),
                diagram.get(connection.dest.element),
            ) else {
                continue;
            };
            links
                .entry(pin_path(dest, &connection.dest.pin))
                .or_default()
                .push(pin_path(source, &connection.source.pin));
        }
        sim.links = links.into_iter().collect();

        log::info!(
            "simulator built: {} pins, {} gates, {} driven sinks",
            sim.current.len(),
            sim.evaluations.len(),
            sim.links.len()
        );
        sim
    }

    fn value(&self, path: &str) -> u64 {
        self.current.get(path).copied().unwrap_or(0)
    }

    fn width(&self, path: &str) -> u32 {
        self.widths.get(path).copied().unwrap_or(MAX_WIDTH)
    }

    fn propagate(&mut self) {
        for (dest, sources) in &self.links {
            let driven = sources.iter().fold(0, |acc, s| acc | self.value(s));
            if let Some(slot) = self.current.get_mut(dest) {
                *slot = driven & mask(self.widths.get(dest).copied().unwrap_or(MAX_WIDTH));
            }
        }
    }

    fn evaluate(&self, eval: &Evaluation) -> u64 {
        let mut inputs = eval.inputs.iter().map(|p| self.value(p));
        let result = match eval.logic {
            Logic::Not => !inputs.next().unwrap_or(0),
            Logic::Gate { op, negated } => {
                let folded = inputs.reduce(|a, b| op.apply(a, b)).unwrap_or(0);
                if negated { !folded } else { folded }
            }
        };
        result & mask(eval.width)
    }
}

impl Executor for Simulator {
    fn pin_state(&self, path: &str) -> PinState {
        self.current
            .get(path)
            .map_or(PinState::Unknown, |v| PinState::Known(*v))
    }

    fn set_pin_state(&mut self, path: &str, value: u64) {
        let width = self.width(path);
        match self.current.get_mut(path) {
            Some(slot) => *slot = value & mask(width),
            None => log::warn!("ignoring write to unknown pin {path}"),
        }
    }

    fn step(&mut self) {
        self.propagate();
        let outputs: Vec<(String, u64)> = self
            .evaluations
            .iter()
            .map(|eval| (eval.output.clone(), self.evaluate(eval)))
            .collect();
        for (path, value) in outputs {
            self.current.insert(path, value);
        }
        self.propagate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{descriptor::Port, grid::GridPos, wires::Segment};

    fn half_and() -> Diagram {
        let mut d = Diagram::new("main");
        d.add_element(Element::new("a", Descriptor::input(1)).at(GridPos::new(0, -1)));
        d.add_element(Element::new("b", Descriptor::input(1)).at(GridPos::new(0, 1)));
        d.add_element(Element::new("and_1", Descriptor::gate(GateOp::And, false)).at(GridPos::new(10, 0)));
        d.add_element(Element::new("carry", Descriptor::output(1)).at(GridPos::new(14, 0)));
        d.commit_wires(&[
            Segment::new(GridPos::new(0, -1), GridPos::new(6, -1)),
            Segment::new(GridPos::new(0, 1), GridPos::new(6, 1)),
            Segment::new(GridPos::new(10, 0), GridPos::new(14, 0)),
        ]);
        d
    }

    #[test]
    fn pin_paths() {
        let not = Element::new("not_1", Descriptor::Not { width: 1 });
        assert_eq!(pin_path(&not, "in"), "not_1.in");
        let nested = Element::new(
            "adder_1",
            Descriptor::Schematic {
                name: "adder".to_owned(),
                inputs: vec![Port::new("a", 1)],
                outputs: vec![],
            },
        );
        assert_eq!(pin_path(&nested, "a"), "adder_1.a.pin");
        assert_eq!(exposed_pin_path("in_1"), "in_1.pin");
    }

    #[test]
    fn and_gate_drives_output_pin() {
        let mut sim = Simulator::from_diagram(&half_and());
        sim.set_pin_state("a.pin", 1);
        sim.step();
        assert_eq!(sim.pin_state("carry.pin"), PinState::Known(0), "b is still low");

        sim.set_pin_state("b.pin", 1);
        sim.step();
        assert_eq!(sim.pin_state("and_1.in1"), PinState::Known(1));
        assert_eq!(sim.pin_state("carry.pin"), PinState::Known(1));
    }

    #[test]
    fn not_gate_masks_to_width() {
        let mut d = Diagram::new("main");
        d.add_element(Element::new("x", Descriptor::input(4)));
        d.add_element(Element::new("not_1", Descriptor::Not { width: 4 }).at(GridPos::new(6, 0)));
        d.commit_wires(&[Segment::new(GridPos::new(0, 0), GridPos::new(2, 0))]);

        let mut sim = Simulator::from_diagram(&d);
        sim.set_pin_state("x.pin", 0b1_0101);
        assert_eq!(sim.pin_state("x.pin"), PinState::Known(0b0101));
        sim.step();
        assert_eq!(sim.pin_state("not_1.out"), PinState::Known(0b1010));
    }

    #[test]
    fn not_fed_by_its_own_output_oscillates() {
        let mut d = Diagram::new("main");
        d.add_element(Element::new("not_1", Descriptor::Not { width: 1 }).at(GridPos::new(10, 0)));
        d.commit_wires(&[
            Segment::new(GridPos::new(10, 0), GridPos::new(10, 2)),
            Segment::new(GridPos::new(10, 2), GridPos::new(6, 2)),
            Segment::new(GridPos::new(6, 2), GridPos::new(6, 0)),
        ]);

        let mut sim = Simulator::from_diagram(&d);
        let mut seen = Vec::new();
        for _ in 0..4 {
            sim.step();
            seen.push((sim.pin_state("not_1.out"), sim.pin_state("not_1.in")));
        }
        let (lo, hi) = (PinState::Known(0), PinState::Known(1));
        assert_eq!(seen, vec![(hi, hi), (lo, lo), (hi, hi), (lo, lo)]);
    }

    #[test]
    fn unknown_paths_stay_unknown() {
        let mut sim = Simulator::from_diagram(&half_and());
        sim.set_pin_state("nope.pin", 3);
        assert_eq!(sim.pin_state("nope.pin"), PinState::Unknown);
    }

    #[test]
    fn detached_link_reports_unknown() {
        let mut link = SimulationLink::default();
        assert!(!link.is_attached());
        assert_eq!(link.pin_state("a.pin"), PinState::Unknown);
        assert!(!link.flip_bit("a.pin", 0), "nothing to flip without an executor");
    }

    #[test]
    fn flip_bit_goes_through_executor() {
        let mut link = SimulationLink::default();
        link.attach(Box::new(Simulator::from_diagram(&half_and())));
        assert!(link.flip_bit("a.pin", 0));
        assert_eq!(link.pin_state("a.pin"), PinState::Known(1));
        assert!(link.flip_bit("a.pin", 0));
        assert_eq!(link.pin_state("a.pin"), PinState::Known(0));

        link.detach();
        assert_eq!(link.pin_state("a.pin"), PinState::Unknown);
    }

    #[test]
    fn ticker_counts_due_steps() {
        let mut ticker = Ticker::new(4.0, 8);
        assert_eq!(ticker.advance(0.625), 2);
        assert_eq!(ticker.advance(0.125), 1);
        assert_eq!(ticker.advance(0.125), 0);
    }

    #[test]
    fn ticker_drops_backlog() {
        let mut ticker = Ticker::new(4.0, 3);
        assert_eq!(ticker.advance(10.0), 3);
        assert_eq!(ticker.tick_accumulator, 0.0);
    }

    #[test]
    fn pin_state_bits() {
        assert_eq!(PinState::Known(0b10).bit(1), Some(true));
        assert_eq!(PinState::Known(0b10).bit(0), Some(false));
        assert_eq!(PinState::Unknown.bit(0), None);
    }
}
