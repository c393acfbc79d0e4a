use std::collections::HashSet;
use std::fmt::Display;

use slotmap::SlotMap;

use crate::{
    descriptor::{Descriptor, PinDirection, PinLayout, Port},
    grid::{ElementTransform, Facing, GridPos, GridRect},
    wires::{Direction, Segment, WireNetwork, WirePolicy},
};

slotmap::new_key_type! {
    pub struct ElementId;
}

impl Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A placed component instance.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub descriptor: Descriptor,
    pub position: GridPos,
    pub facing: Facing,
}

impl Element {
    pub fn new(name: impl Into<String>, descriptor: Descriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            position: GridPos::ZERO,
            facing: Facing::East,
        }
    }

    pub fn at(mut self, position: GridPos) -> Self {
        self.position = position;
        self
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn bounding_rect(&self) -> GridRect {
        self.descriptor.bounding_rect()
    }

    pub fn inputs(&self) -> Vec<PinLayout> {
        self.descriptor.inputs()
    }

    pub fn outputs(&self) -> Vec<PinLayout> {
        self.descriptor.outputs()
    }

    pub fn pins(&self) -> Vec<PinLayout> {
        self.descriptor.pins()
    }

    pub fn transform(&self, grid_size: f32) -> ElementTransform {
        ElementTransform::new(self.position, self.facing, grid_size)
    }

    /// Transform for drawing the element somewhere other than its position,
    /// e.g. while it is being dragged.
    pub fn transform_at(&self, position: GridPos, grid_size: f32) -> ElementTransform {
        ElementTransform::new(position, self.facing, grid_size)
    }

    /// Lattice point a pin sits on once placed.
    pub fn pin_position(&self, pin: &PinLayout) -> GridPos {
        self.position + self.facing.rotate(pin.offset)
    }
}

/// A single pin of a placed element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinRef {
    pub element: ElementId,
    pub pin: String,
}

/// A driver pin feeding an input pin through the wire mesh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: PinRef,
    pub dest: PinRef,
}

#[derive(Debug, Default, Clone)]
pub struct Netlist {
    pub connections: Vec<Connection>,
}

impl Netlist {
    pub fn drivers_of(&self, dest: &PinRef) -> impl Iterator<Item = &PinRef> {
        self.connections
            .iter()
            .filter(move |c| &c.dest == dest)
            .map(|c| &c.source)
    }

    pub fn is_connected(&self, source: &PinRef, dest: &PinRef) -> bool {
        self.connections
            .iter()
            .any(|c| &c.source == source && &c.dest == dest)
    }
}

/// Elements plus the wire mesh between them.
///
/// Iteration order is insertion order and doubles as z-order: hit-testing
/// returns the first match, rendering draws in the same order.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone)]
pub struct Diagram {
    pub name: String,
    elements: SlotMap<ElementId, Element>,
    order: Vec<ElementId>,
    wires: WireNetwork,
}

impl Diagram {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_policy(name: impl Into<String>, policy: WirePolicy) -> Self {
        Self {
            name: name.into(),
            wires: WireNetwork::new(policy),
            ..Default::default()
        }
    }

    pub fn add_element(&mut self, element: Element) -> ElementId {
        log::debug!("adding element {} at {}", element.name, element.position);
        let id = self.elements.insert(element);
        self.order.push(id);
        id
    }

    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let element = self.elements.remove(id)?;
        self.order.retain(|other| *other != id);
        log::debug!("removed element {}", element.name);
        Some(element)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn element_by_name(&self, name: &str) -> Option<ElementId> {
        self.elements()
            .find(|(_, element)| element.name == name)
            .map(|(id, _)| id)
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.order
            .iter()
            .filter_map(|id| self.elements.get(*id).map(|element| (*id, element)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn wires(&self) -> &WireNetwork {
        &self.wires
    }

    pub fn wires_mut(&mut self) -> &mut WireNetwork {
        &mut self.wires
    }

    pub fn preview_wires(&self, segments: &[Segment]) -> WireNetwork {
        self.wires.preview(segments)
    }

    pub fn commit_wires(&mut self, segments: &[Segment]) {
        self.wires.commit(segments);
    }

    /// Boundary of this diagram when it is placed inside another one.
    pub fn as_component(&self) -> Descriptor {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for (_, element) in self.elements() {
            if let Descriptor::ExposedPin { direction, width } = element.descriptor {
                let port = Port::new(element.name.clone(), width);
                match direction {
                    PinDirection::In => inputs.push(port),
                    PinDirection::Out => outputs.push(port),
                }
            }
        }
        Descriptor::Schematic {
            name: self.name.clone(),
            inputs,
            outputs,
        }
    }

    /// Traces every output pin through the wire mesh and records the input
    /// pins it reaches. Overlapped crossings pass the trace straight through.
    pub fn netlist(&self) -> Netlist {
        let mut sources = Vec::new();
        let mut dests = Vec::new();
        for (id, element) in self.elements() {
            for pin in element.outputs() {
                let at = element.pin_position(&pin);
                sources.push((PinRef { element: id, pin: pin.name }, at));
            }
            for pin in element.inputs() {
                let at = element.pin_position(&pin);
                dests.push((PinRef { element: id, pin: pin.name }, at));
            }
        }

        let mut netlist = Netlist::default();
        for (source, start) in sources {
            let mut visited = HashSet::new();
            let mut to_explore = vec![(start, start)];

            while let Some((prev, pos)) = to_explore.pop() {
                let node = self.wires.get(pos);
                let crossing = node.is_some_and(|n| n.all_connected() && n.overlap);
                let at_start = prev == pos;
                let arrived_vertically = prev.x == pos.x && !at_start;

                // A crossing is traversed once per axis.
                let key = (pos, crossing.then_some(arrived_vertically));
                if !visited.insert(key) {
                    continue;
                }

                for (dest, at) in &dests {
                    if *at == pos && !netlist.is_connected(&source, dest) {
                        netlist.connections.push(Connection {
                            source: source.clone(),
                            dest: dest.clone(),
                        });
                    }
                }

                let Some(node) = node else {
                    continue;
                };
                for dir in Direction::ALL {
                    if !node.is_connected(dir) {
                        continue;
                    }
                    if crossing && !at_start && dir.is_vertical() != arrived_vertically {
                        continue;
                    }
                    to_explore.push((pos, pos + dir.offset()));
                }
            }
        }
        netlist
    }
}
