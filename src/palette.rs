use std::collections::HashMap;

use crate::{
    descriptor::{Descriptor, GateOp},
    diagram::{Diagram, Element},
};

/// One placeable kind in the element library.
#[derive(Debug, Clone)]
pub struct PaletteEntry {
    pub category: &'static str,
    pub label: &'static str,
    /// Base of generated element names, e.g. `and` for `and_3`.
    pub prefix: &'static str,
    pub template: Descriptor,
}

impl PaletteEntry {
    fn new(
        category: &'static str,
        label: &'static str,
        prefix: &'static str,
        template: Descriptor,
    ) -> Self {
        Self {
            category,
            label,
            prefix,
            template,
        }
    }
}

/// Element factories with a running counter per name prefix.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    counters: HashMap<String, u32>,
}

impl Default for Palette {
    fn default() -> Self {
        let gate = |op, negated| Descriptor::gate(op, negated);
        Self::new(vec![
            PaletteEntry::new("Wiring", "Input", "input", Descriptor::input(1)),
            PaletteEntry::new("Wiring", "Output", "output", Descriptor::output(1)),
            PaletteEntry::new("Gates", "NOT Gate", "not", Descriptor::Not { width: 1 }),
            PaletteEntry::new("Gates", "AND Gate", "and", gate(GateOp::And, false)),
            PaletteEntry::new("Gates", "OR Gate", "or", gate(GateOp::Or, false)),
            PaletteEntry::new("Gates", "XOR Gate", "xor", gate(GateOp::Xor, false)),
            PaletteEntry::new("Gates", "NAND Gate", "nand", gate(GateOp::And, true)),
            PaletteEntry::new("Gates", "NOR Gate", "nor", gate(GateOp::Or, true)),
            PaletteEntry::new("Gates", "XNOR Gate", "xnor", gate(GateOp::Xor, true)),
        ])
    }
}

impl Palette {
    pub fn new(entries: Vec<PaletteEntry>) -> Self {
        Self {
            entries,
            counters: HashMap::new(),
        }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Categories in first-seen order.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut categories: Vec<&'static str> = Vec::new();
        for entry in &self.entries {
            if !categories.contains(&entry.category) {
                categories.push(entry.category);
            }
        }
        categories
    }

    fn next_name(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_owned()).or_default();
        *counter += 1;
        format!("{prefix}_{counter}")
    }

    /// Fresh element for the entry at `index`, named `<prefix>_<n>`.
    pub fn create(&mut self, index: usize) -> Option<Element> {
        let entry = self.entries.get(index)?;
        let (prefix, template) = (entry.prefix, entry.template.clone());
        let name = self.next_name(prefix);
        log::debug!("palette created {name}");
        Some(Element::new(name, template))
    }

    /// Element wrapping another diagram, named after that diagram.
    pub fn create_schematic(&mut self, diagram: &Diagram) -> Element {
        let name = self.next_name(&diagram.name);
        Element::new(name, diagram.as_component())
    }
}
