//! Pointer-driven editing and viewing of a diagram.
//!
//! [`Editor`] owns the interaction session: the active mode and its state
//! machine, selection, the element being placed, gesture anchors and the
//! view translation. The host feeds it [`PointerEvent`]s in widget-local
//! pixels and drains [`EditorEvent`]s afterwards.

use std::borrow::Cow;

use egui::{Pos2, Vec2};

use crate::{
    config::EditorConfig,
    diagram::{Diagram, Element, ElementId},
    grid::{GridPos, to_grid},
    hit_test::{element_at, input_bit_at},
    router::route,
    simulator::{Executor, PinState, SimulationLink, Simulator, Ticker, exposed_pin_path, pin_path},
    wires::{Segment, WireNetwork},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Edit,
    View,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    #[default]
    None,
    ElementClick,
    EmptyClick,
    Wire,
    Drag,
    Select,
    Place,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    None,
    Click,
    Move,
}

/// Only the machine of the active mode carries state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    Edit(EditState),
    View(ViewState),
}

/// Pointer input in widget-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press(Pos2),
    Move(Pos2),
    Release(Pos2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    SelectionChanged(Option<ElementId>),
    RedrawRequested,
}

pub struct Editor {
    pub diagram: Diagram,
    pub simulation: SimulationLink,
    pub ticker: Ticker,
    grid_size: f32,
    interaction: Interaction,
    selected: Option<ElementId>,
    placing: Option<Element>,
    // Grid anchors of the current EDIT gesture.
    start: GridPos,
    end: GridPos,
    // Untranslated pixel anchors of the current pan.
    pan_start: Pos2,
    pan_end: Pos2,
    translation: Vec2,
    cursor: Option<GridPos>,
    events: Vec<EditorEvent>,
}

impl Editor {
    pub fn new(mut diagram: Diagram, config: &EditorConfig) -> Self {
        diagram.wires_mut().policy = config.wire_policy;
        Self {
            diagram,
            simulation: SimulationLink::default(),
            ticker: Ticker::new(config.tick_rate_hz, config.max_steps_per_frame),
            grid_size: config.grid_size,
            interaction: Interaction::Edit(EditState::None),
            selected: None,
            placing: None,
            start: GridPos::ZERO,
            end: GridPos::ZERO,
            pan_start: Pos2::ZERO,
            pan_end: Pos2::ZERO,
            translation: Vec2::ZERO,
            cursor: None,
            events: Vec::new(),
        }
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    pub fn set_grid_size(&mut self, grid_size: f32) {
        self.grid_size = grid_size;
        self.request_redraw();
    }

    pub fn mode(&self) -> Mode {
        match self.interaction {
            Interaction::Edit(_) => Mode::Edit,
            Interaction::View(_) => Mode::View,
        }
    }

    pub fn edit_state(&self) -> Option<EditState> {
        match self.interaction {
            Interaction::Edit(state) => Some(state),
            Interaction::View(_) => None,
        }
    }

    pub fn view_state(&self) -> Option<ViewState> {
        match self.interaction {
            Interaction::View(state) => Some(state),
            Interaction::Edit(_) => None,
        }
    }

    /// Selected element, if it is still part of the diagram.
    pub fn selected(&self) -> Option<ElementId> {
        self.selected.filter(|id| self.diagram.contains(*id))
    }

    pub fn selected_element(&self) -> Option<&Element> {
        self.selected().and_then(|id| self.diagram.get(id))
    }

    pub fn placing_element(&self) -> Option<&Element> {
        self.placing.as_ref()
    }

    /// Committed pan offset.
    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    /// Pan offset to draw with, including a pan in progress.
    pub fn view_translation(&self) -> Vec2 {
        match self.interaction {
            Interaction::View(ViewState::Move) => self.translation + (self.pan_end - self.pan_start),
            _ => self.translation,
        }
    }

    pub fn cursor(&self) -> Option<GridPos> {
        self.cursor
    }

    /// Element being dragged and where it would land.
    pub fn drag_preview(&self) -> Option<(ElementId, GridPos)> {
        if self.interaction != Interaction::Edit(EditState::Drag) {
            return None;
        }
        let id = self.selected()?;
        let element = self.diagram.get(id)?;
        Some((id, element.position + (self.end - self.start)))
    }

    pub fn wire_preview(&self) -> Option<Vec<Segment>> {
        if self.interaction != Interaction::Edit(EditState::Wire) {
            return None;
        }
        route(self.start, self.end)
    }

    /// Wire mesh to draw: the diagram's, merged with the wire being drawn.
    pub fn visible_wires(&self) -> Cow<'_, WireNetwork> {
        match self.wire_preview() {
            Some(segments) => Cow::Owned(self.diagram.preview_wires(&segments)),
            None => Cow::Borrowed(self.diagram.wires()),
        }
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn request_redraw(&mut self) {
        if !self.events.contains(&EditorEvent::RedrawRequested) {
            self.events.push(EditorEvent::RedrawRequested);
        }
    }

    fn set_selection(&mut self, id: Option<ElementId>) {
        if self.selected == id {
            return;
        }
        self.selected = id;
        self.events.push(EditorEvent::SelectionChanged(id));
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press(pixel) => self.press(pixel),
            PointerEvent::Move(pixel) => self.pointer_move(pixel),
            PointerEvent::Release(pixel) => self.release(pixel),
        }
        self.request_redraw();
    }

    fn press(&mut self, pixel: Pos2) {
        let d = pixel - self.translation;
        let p = to_grid(pixel, self.translation, self.grid_size);

        match self.interaction {
            Interaction::View(_) => {
                self.interaction = Interaction::View(ViewState::Click);
                self.pan_start = d;
                self.pan_end = d;
            }
            Interaction::Edit(state @ (EditState::None | EditState::Select)) => {
                let next = if let Some(id) = element_at(&self.diagram, d, self.grid_size) {
                    self.set_selection(Some(id));
                    EditState::ElementClick
                } else {
                    if state == EditState::Select {
                        self.set_selection(None);
                    }
                    EditState::EmptyClick
                };
                self.interaction = Interaction::Edit(next);
                self.start = p;
                self.end = p;
            }
            Interaction::Edit(EditState::Place) => {}
            Interaction::Edit(state) => {
                log::debug!("press during {state:?}, resetting");
                self.interaction = Interaction::Edit(EditState::None);
            }
        }
    }

    fn pointer_move(&mut self, pixel: Pos2) {
        let d = pixel - self.translation;
        let p = to_grid(pixel, self.translation, self.grid_size);
        self.cursor = Some(p);

        match self.interaction {
            Interaction::View(ViewState::Click | ViewState::Move) => {
                self.interaction = Interaction::View(ViewState::Move);
                self.pan_end = d;
            }
            Interaction::View(ViewState::None) => {}
            Interaction::Edit(EditState::Place) => {
                if let Some(element) = &mut self.placing {
                    element.position = p;
                }
            }
            Interaction::Edit(EditState::ElementClick | EditState::Drag) => {
                self.interaction = Interaction::Edit(EditState::Drag);
                self.end = p;
            }
            Interaction::Edit(EditState::EmptyClick | EditState::Wire) => {
                self.interaction = Interaction::Edit(EditState::Wire);
                self.end = p;
            }
            Interaction::Edit(EditState::None | EditState::Select) => {}
        }
    }

    fn release(&mut self, pixel: Pos2) {
        let d = pixel - self.translation;
        let p = to_grid(pixel, self.translation, self.grid_size);

        match self.interaction {
            Interaction::View(ViewState::Move) => {
                self.translation += self.pan_end - self.pan_start;
                self.interaction = Interaction::View(ViewState::None);
            }
            Interaction::View(ViewState::Click) => {
                self.flip_input_bit(d);
                self.interaction = Interaction::View(ViewState::None);
            }
            Interaction::View(ViewState::None) => {}
            Interaction::Edit(EditState::Place) => {
                if let Some(element) = self.placing.take() {
                    let id = self.diagram.add_element(element);
                    self.interaction = Interaction::Edit(EditState::Select);
                    self.set_selection(Some(id));
                } else {
                    self.interaction = Interaction::Edit(EditState::None);
                }
            }
            Interaction::Edit(EditState::Drag) => {
                let delta = self.end - self.start;
                if let Some(element) = self.selected.and_then(|id| self.diagram.get_mut(id)) {
                    element.position += delta;
                    log::debug!("moved {} to {}", element.name, element.position);
                }
                self.interaction = Interaction::Edit(EditState::None);
            }
            Interaction::Edit(EditState::Wire) => {
                if let Some(segments) = route(self.start, self.end) {
                    self.diagram.commit_wires(&segments);
                }
                self.interaction = Interaction::Edit(EditState::None);
            }
            Interaction::Edit(EditState::ElementClick) => {
                self.interaction = Interaction::Edit(EditState::Select);
            }
            Interaction::Edit(EditState::EmptyClick) => {
                if self.diagram.wires_mut().toggle_crossing(p) {
                    log::debug!("toggled crossing at {p}");
                }
                self.interaction = Interaction::Edit(EditState::None);
            }
            Interaction::Edit(EditState::None | EditState::Select) => {}
        }
    }

    fn flip_input_bit(&mut self, pixel: Pos2) {
        if !self.simulation.is_attached() {
            return;
        }
        let grid_size = self.grid_size;
        let hit = self.diagram.elements().find_map(|(_, element)| {
            input_bit_at(element, pixel, grid_size).map(|bit| (exposed_pin_path(&element.name), bit))
        });
        if let Some((path, bit)) = hit {
            self.simulation.flip_bit(&path, bit);
        }
    }

    pub fn toggle_mode(&mut self) {
        self.interaction = match self.interaction {
            Interaction::Edit(_) => Interaction::View(ViewState::None),
            Interaction::View(_) => Interaction::Edit(EditState::None),
        };
        if self.placing.take().is_some() {
            log::debug!("placement discarded");
        }
        log::info!("switched to {:?} mode", self.mode());
        self.request_redraw();
    }

    /// Drops the gesture in progress. Placed elements are untouched.
    pub fn cancel(&mut self) {
        self.interaction = match self.interaction {
            Interaction::Edit(_) => Interaction::Edit(EditState::None),
            Interaction::View(_) => Interaction::View(ViewState::None),
        };
        self.placing = None;
        self.request_redraw();
    }

    pub fn start_placing(&mut self, mut element: Element) {
        if self.mode() == Mode::View {
            self.toggle_mode();
        }
        if let Some(cursor) = self.cursor {
            element.position = cursor;
        }
        log::debug!("placing {}", element.name);
        self.placing = Some(element);
        self.interaction = Interaction::Edit(EditState::Place);
        self.request_redraw();
    }

    pub fn stop_placing(&mut self) {
        self.interaction = Interaction::Edit(EditState::None);
        self.placing = None;
        self.request_redraw();
    }

    /// Removes the selected element. Only acts while something is selected
    /// in the SELECT state.
    pub fn delete_selected(&mut self) -> bool {
        if self.interaction != Interaction::Edit(EditState::Select) {
            return false;
        }
        let Some(id) = self.selected() else {
            return false;
        };
        self.diagram.remove_element(id);
        self.set_selection(None);
        self.interaction = Interaction::Edit(EditState::None);
        self.request_redraw();
        true
    }

    /// Turns the selected element a quarter counter-clockwise. Like
    /// [`Self::delete_selected`], only acts in the SELECT state.
    pub fn rotate_selected(&mut self) -> bool {
        if self.interaction != Interaction::Edit(EditState::Select) {
            return false;
        }
        let Some(element) = self.selected.and_then(|id| self.diagram.get_mut(id)) else {
            return false;
        };
        element.facing = element.facing.turned();
        log::debug!("{} now faces {}", element.name, element.facing.label());
        self.request_redraw();
        true
    }

    /// Swaps in another diagram, returning the previous one.
    pub fn set_diagram(&mut self, diagram: Diagram) -> Diagram {
        self.stop_placing();
        self.stop_simulation();
        self.set_selection(None);
        log::info!("editing diagram {}", diagram.name);
        std::mem::replace(&mut self.diagram, diagram)
    }

    /// Attaches the built-in simulator over the current diagram.
    pub fn start_simulation(&mut self) {
        let simulator = Simulator::from_diagram(&self.diagram);
        self.attach_executor(Box::new(simulator));
    }

    pub fn attach_executor(&mut self, executor: Box<dyn Executor>) {
        self.simulation.attach(executor);
        self.ticker.reset();
        self.request_redraw();
    }

    pub fn stop_simulation(&mut self) {
        if self.simulation.is_attached() {
            self.simulation.detach();
            self.request_redraw();
        }
    }

    pub fn pin_state(&self, element: &Element, pin: &str) -> PinState {
        self.simulation.pin_state(&pin_path(element, pin))
    }

    /// Runs the simulation steps due after `dt` seconds. Returns how many ran.
    pub fn tick(&mut self, dt: f32) -> u32 {
        if !self.simulation.is_attached() {
            self.ticker.reset();
            return 0;
        }
        let steps = self.ticker.advance(dt);
        for _ in 0..steps {
            self.simulation.step();
        }
        if steps > 0 {
            self.request_redraw();
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use egui::{pos2, vec2};

    use super::*;
    use crate::{
        descriptor::{Descriptor, Port},
        wires::Direction,
    };

    const GS: f32 = 16.0;

    fn editor() -> Editor {
        Editor::new(Diagram::new("main"), &EditorConfig::default())
    }

    fn at(x: i32, y: i32) -> Pos2 {
        pos2(x as f32 * GS, y as f32 * GS)
    }

    /// Box with three inputs on the left and one output on the right. Its
    /// origin is the top-left corner, clear of every pin.
    fn block(name: &str, x: i32, y: i32) -> Element {
        Element::new(
            name,
            Descriptor::Schematic {
                name: "block".to_owned(),
                inputs: vec![Port::new("a", 1), Port::new("b", 1), Port::new("c", 1)],
                outputs: vec![Port::new("y", 1)],
            },
        )
        .at(GridPos::new(x, y))
    }

    /// A point inside a block's body that rounds to the block's origin.
    fn body_of(x: i32, y: i32) -> Pos2 {
        at(x, y) + vec2(1.0, 1.0)
    }

    fn click(ed: &mut Editor, pixel: Pos2) {
        ed.handle(PointerEvent::Press(pixel));
        ed.handle(PointerEvent::Release(pixel));
    }

    fn selection_events(ed: &mut Editor) -> Vec<Option<ElementId>> {
        ed.drain_events()
            .into_iter()
            .filter_map(|e| match e {
                EditorEvent::SelectionChanged(id) => Some(id),
                EditorEvent::RedrawRequested => None,
            })
            .collect()
    }

    #[derive(Default)]
    struct MockExecutor {
        pins: HashMap<String, u64>,
    }

    impl Executor for MockExecutor {
        fn pin_state(&self, path: &str) -> PinState {
            self.pins
                .get(path)
                .map_or(PinState::Unknown, |v| PinState::Known(*v))
        }

        fn set_pin_state(&mut self, path: &str, value: u64) {
            self.pins.insert(path.to_owned(), value);
        }

        fn step(&mut self) {}
    }

    fn reach(state: EditState) -> Editor {
        let mut ed = editor();
        ed.diagram.add_element(block("blk_1", 2, 2));
        match state {
            EditState::None => {}
            EditState::ElementClick => ed.handle(PointerEvent::Press(body_of(2, 2))),
            EditState::EmptyClick => ed.handle(PointerEvent::Press(at(20, 20))),
            EditState::Wire => {
                ed.handle(PointerEvent::Press(at(20, 20)));
                ed.handle(PointerEvent::Move(at(22, 20)));
            }
            EditState::Drag => {
                ed.handle(PointerEvent::Press(body_of(2, 2)));
                ed.handle(PointerEvent::Move(at(4, 4)));
            }
            EditState::Select => click(&mut ed, body_of(2, 2)),
            EditState::Place => ed.start_placing(block("blk_2", 0, 0)),
        }
        assert_eq!(ed.edit_state(), Some(state), "failed to reach {state:?}");
        ed
    }

    #[test]
    fn every_state_handles_every_event() {
        use EditState::{Drag, ElementClick, EmptyClick, Place, Select, Wire};

        // Press lands on empty space, away from the block at (2, 2).
        let press = PointerEvent::Press(at(30, 30));
        let moved = PointerEvent::Move(at(31, 30));
        let release = PointerEvent::Release(at(31, 30));
        let table = [
            (EditState::None, [EmptyClick, EditState::None, EditState::None]),
            (ElementClick, [EditState::None, Drag, Select]),
            (EmptyClick, [EditState::None, Wire, EditState::None]),
            (Wire, [EditState::None, Wire, EditState::None]),
            (Drag, [EditState::None, Drag, EditState::None]),
            (Select, [EmptyClick, Select, Select]),
            (Place, [Place, Place, Select]),
        ];
        for (state, expected) in table {
            for (event, next) in [press, moved, release].into_iter().zip(expected) {
                let mut ed = reach(state);
                ed.handle(event);
                assert_eq!(ed.edit_state(), Some(next), "{state:?} + {event:?}");
            }
        }
    }

    fn reach_view(state: ViewState) -> Editor {
        let mut ed = editor();
        ed.toggle_mode();
        match state {
            ViewState::None => {}
            ViewState::Click => ed.handle(PointerEvent::Press(pos2(10.0, 10.0))),
            ViewState::Move => {
                ed.handle(PointerEvent::Press(pos2(10.0, 10.0)));
                ed.handle(PointerEvent::Move(pos2(20.0, 10.0)));
            }
        }
        assert_eq!(ed.view_state(), Some(state), "failed to reach {state:?}");
        ed
    }

    #[test]
    fn every_view_state_handles_every_event() {
        let press = PointerEvent::Press(pos2(50.0, 50.0));
        let moved = PointerEvent::Move(pos2(60.0, 50.0));
        let release = PointerEvent::Release(pos2(60.0, 50.0));
        let table = [
            (ViewState::None, [ViewState::Click, ViewState::None, ViewState::None]),
            (ViewState::Click, [ViewState::Click, ViewState::Move, ViewState::None]),
            (ViewState::Move, [ViewState::Click, ViewState::Move, ViewState::None]),
        ];
        for (state, expected) in table {
            for (event, next) in [press, moved, release].into_iter().zip(expected) {
                let mut ed = reach_view(state);
                ed.handle(event);
                assert_eq!(ed.view_state(), Some(next), "{state:?} + {event:?}");
            }
        }
    }

    #[test]
    fn stray_press_resets_to_none() {
        let mut ed = reach(EditState::Wire);
        ed.handle(PointerEvent::Press(at(0, 0)));
        assert_eq!(ed.edit_state(), Some(EditState::None));
        ed.handle(PointerEvent::Release(at(0, 0)));
        assert!(ed.diagram.wires().is_empty(), "reset gesture must not commit");
    }

    #[test]
    fn place_ignores_presses() {
        let mut ed = reach(EditState::Place);
        ed.handle(PointerEvent::Press(at(3, 3)));
        assert_eq!(ed.edit_state(), Some(EditState::Place));
    }

    #[test]
    fn reselecting_does_not_notify_again() {
        let mut ed = editor();
        let a = ed.diagram.add_element(block("a", 2, 2));
        let b = ed.diagram.add_element(block("b", 10, 2));

        click(&mut ed, body_of(2, 2));
        assert_eq!(selection_events(&mut ed), vec![Some(a)]);
        assert_eq!(ed.edit_state(), Some(EditState::Select));

        click(&mut ed, body_of(2, 2));
        assert!(selection_events(&mut ed).is_empty(), "same element re-notified");

        click(&mut ed, body_of(10, 2));
        assert_eq!(selection_events(&mut ed), vec![Some(b)]);

        click(&mut ed, at(30, 30));
        assert_eq!(selection_events(&mut ed), vec![None]);
        assert_eq!(ed.selected(), None);
    }

    #[test]
    fn drag_commits_delta_once() {
        let mut ed = editor();
        let id = ed.diagram.add_element(block("a", 2, 2));

        ed.handle(PointerEvent::Press(body_of(2, 2)));
        ed.handle(PointerEvent::Move(at(3, 3)));
        ed.handle(PointerEvent::Move(at(4, 3)));
        ed.handle(PointerEvent::Move(at(5, 4)));
        assert_eq!(ed.drag_preview(), Some((id, GridPos::new(5, 4))));
        assert_eq!(
            ed.diagram.get(id).map(|e| e.position),
            Some(GridPos::new(2, 2)),
            "position must not change before release"
        );

        ed.handle(PointerEvent::Release(at(5, 4)));
        assert_eq!(ed.diagram.get(id).map(|e| e.position), Some(GridPos::new(5, 4)));
        assert_eq!(ed.edit_state(), Some(EditState::None));
    }

    #[test]
    fn pan_commits_translation() {
        let mut ed = editor();
        ed.toggle_mode();
        ed.handle(PointerEvent::Press(pos2(100.0, 50.0)));
        ed.handle(PointerEvent::Move(pos2(120.0, 60.0)));
        ed.handle(PointerEvent::Move(pos2(140.0, 70.0)));
        assert_eq!(ed.view_translation(), vec2(40.0, 20.0));
        assert_eq!(ed.translation(), Vec2::ZERO);

        ed.handle(PointerEvent::Release(pos2(140.0, 70.0)));
        assert_eq!(ed.translation(), vec2(40.0, 20.0));
        assert_eq!(ed.view_state(), Some(ViewState::None));
    }

    #[test]
    fn translation_shifts_grid_mapping() {
        let mut ed = editor();
        ed.toggle_mode();
        ed.handle(PointerEvent::Press(pos2(0.0, 0.0)));
        ed.handle(PointerEvent::Move(pos2(32.0, 16.0)));
        ed.handle(PointerEvent::Release(pos2(32.0, 16.0)));
        ed.toggle_mode();

        ed.handle(PointerEvent::Move(pos2(32.0 + 48.0, 16.0 + 16.0)));
        assert_eq!(ed.cursor(), Some(GridPos::new(3, 1)));
    }

    #[test]
    fn mode_switch_discards_wire() {
        let mut ed = editor();
        ed.handle(PointerEvent::Press(at(0, 0)));
        ed.handle(PointerEvent::Move(at(3, 1)));
        assert_eq!(ed.edit_state(), Some(EditState::Wire));
        assert_eq!(ed.wire_preview().map(|s| s.len()), Some(2));
        assert!(!ed.visible_wires().is_empty(), "preview should be visible");

        ed.toggle_mode();
        assert_eq!(ed.view_state(), Some(ViewState::None));
        assert!(ed.wire_preview().is_none());
        assert!(ed.diagram.wires().is_empty(), "no partial commit");

        ed.toggle_mode();
        assert_eq!(ed.edit_state(), Some(EditState::None));
    }

    #[test]
    fn wire_release_commits_route() {
        let mut ed = editor();
        ed.handle(PointerEvent::Press(at(0, 0)));
        ed.handle(PointerEvent::Move(at(3, 1)));
        ed.handle(PointerEvent::Release(at(3, 1)));

        let wires = ed.diagram.wires();
        assert!(wires.get(GridPos::new(0, 0)).is_some_and(|n| n.is_connected(Direction::East)));
        assert!(wires.get(GridPos::new(3, 0)).is_some_and(|n| n.is_connected(Direction::South)));
        assert!(wires.get(GridPos::new(3, 1)).is_some_and(|n| n.is_connected(Direction::North)));
    }

    #[test]
    fn empty_click_toggles_crossing() {
        let mut ed = editor();
        ed.diagram.commit_wires(&[
            Segment::new(GridPos::new(-2, 0), GridPos::new(2, 0)),
            Segment::new(GridPos::new(0, -2), GridPos::new(0, 2)),
        ]);

        click(&mut ed, at(0, 0));
        assert!(ed.diagram.wires().get(GridPos::ZERO).is_some_and(|n| n.overlap));
        click(&mut ed, at(0, 0));
        assert!(ed.diagram.wires().get(GridPos::ZERO).is_some_and(|n| !n.overlap));

        // Two-way node along the horizontal run.
        click(&mut ed, at(1, 0));
        assert!(ed.diagram.wires().get(GridPos::new(1, 0)).is_some_and(|n| !n.overlap));
    }

    #[test]
    fn placing_adds_and_selects() {
        let mut ed = editor();
        ed.toggle_mode();
        ed.start_placing(Element::new("not_1", Descriptor::Not { width: 1 }));
        assert_eq!(ed.mode(), Mode::Edit);
        assert_eq!(ed.edit_state(), Some(EditState::Place));
        assert!(ed.diagram.is_empty(), "not part of the diagram until released");

        ed.handle(PointerEvent::Move(at(5, 5)));
        assert_eq!(ed.placing_element().map(|e| e.position), Some(GridPos::new(5, 5)));
        ed.handle(PointerEvent::Release(at(5, 5)));

        let id = ed.diagram.element_by_name("not_1").expect("placed");
        assert_eq!(ed.selected(), Some(id));
        assert_eq!(ed.edit_state(), Some(EditState::Select));
        assert_eq!(selection_events(&mut ed), vec![Some(id)]);
        assert!(ed.placing_element().is_none());
    }

    #[test]
    fn stop_placing_discards_element() {
        let mut ed = editor();
        ed.start_placing(Element::new("not_1", Descriptor::Not { width: 1 }));
        ed.stop_placing();
        assert!(ed.placing_element().is_none());
        assert_eq!(ed.edit_state(), Some(EditState::None));
        assert!(ed.diagram.is_empty());
    }

    #[test]
    fn delete_only_from_select() {
        let mut ed = editor();
        let id = ed.diagram.add_element(block("a", 2, 2));
        assert!(!ed.delete_selected(), "nothing selected");

        click(&mut ed, body_of(2, 2));
        selection_events(&mut ed);
        assert!(ed.delete_selected());
        assert!(!ed.diagram.contains(id));
        assert_eq!(ed.selected(), None);
        assert_eq!(selection_events(&mut ed), vec![None]);
        assert_eq!(ed.edit_state(), Some(EditState::None));
    }

    #[test]
    fn cancel_keeps_placed_elements() {
        let mut ed = reach(EditState::Drag);
        ed.cancel();
        assert_eq!(ed.edit_state(), Some(EditState::None));
        assert_eq!(ed.diagram.len(), 1);
        assert_eq!(
            ed.diagram.elements().next().map(|(_, e)| e.position),
            Some(GridPos::new(2, 2))
        );
    }

    #[test]
    fn view_click_flips_input_bit() {
        let mut ed = editor();
        ed.diagram.add_element(Element::new("in_1", Descriptor::input(2)).at(GridPos::new(4, 4)));
        ed.toggle_mode();

        click(&mut ed, pos2(40.0, 64.0));
        assert_eq!(ed.simulation.pin_state("in_1.pin"), PinState::Unknown, "detached");

        ed.start_simulation();
        click(&mut ed, pos2(40.0, 64.0));
        assert_eq!(ed.simulation.pin_state("in_1.pin"), PinState::Known(0b01));
        click(&mut ed, pos2(56.0, 64.0));
        assert_eq!(ed.simulation.pin_state("in_1.pin"), PinState::Known(0b11));
    }

    #[test]
    fn unknown_pin_flips_from_zero() {
        let mut ed = editor();
        ed.diagram.add_element(Element::new("in_1", Descriptor::input(2)).at(GridPos::new(4, 4)));
        ed.attach_executor(Box::new(MockExecutor::default()));
        ed.toggle_mode();

        click(&mut ed, pos2(56.0, 64.0));
        assert_eq!(ed.simulation.pin_state("in_1.pin"), PinState::Known(0b10));
    }

    #[test]
    fn view_drag_does_not_flip() {
        let mut ed = editor();
        ed.diagram.add_element(Element::new("in_1", Descriptor::input(1)).at(GridPos::new(4, 4)));
        ed.attach_executor(Box::new(MockExecutor::default()));
        ed.toggle_mode();

        ed.handle(PointerEvent::Press(pos2(40.0, 64.0)));
        ed.handle(PointerEvent::Move(pos2(41.0, 64.0)));
        ed.handle(PointerEvent::Release(pos2(41.0, 64.0)));
        assert_eq!(ed.simulation.pin_state("in_1.pin"), PinState::Unknown);
    }

    #[test]
    fn tick_steps_only_while_attached() {
        let mut ed = editor();
        assert_eq!(ed.tick(1.0), 0);

        ed.start_simulation();
        ed.drain_events();
        assert_eq!(ed.tick(1.0), 8, "capped at max steps per frame");
        assert_eq!(ed.drain_events(), vec![EditorEvent::RedrawRequested]);

        ed.stop_simulation();
        assert_eq!(ed.tick(1.0), 0);
    }

    #[test]
    fn redraw_is_requested_once_per_drain() {
        let mut ed = editor();
        ed.handle(PointerEvent::Move(at(1, 1)));
        ed.handle(PointerEvent::Move(at(2, 1)));
        assert_eq!(ed.drain_events(), vec![EditorEvent::RedrawRequested]);
        assert!(ed.drain_events().is_empty());
    }

    #[test]
    fn rotate_turns_selected() {
        let mut ed = editor();
        let id = ed.diagram.add_element(block("a", 2, 2));
        assert!(!ed.rotate_selected());
        click(&mut ed, body_of(2, 2));
        assert!(ed.rotate_selected());
        assert_eq!(ed.diagram.get(id).map(|e| e.facing), Some(crate::grid::Facing::North));
    }

    #[test]
    fn rotate_only_from_select() {
        let facing = |ed: &Editor| ed.diagram.elements().next().map(|(_, e)| e.facing);

        let mut ed = reach(EditState::Drag);
        assert!(!ed.rotate_selected(), "mid drag");
        ed.handle(PointerEvent::Release(at(4, 4)));
        assert_eq!(ed.edit_state(), Some(EditState::None));
        assert!(!ed.rotate_selected(), "selection kept after a drag is not shown");

        let mut ed = reach(EditState::Select);
        ed.toggle_mode();
        assert!(!ed.rotate_selected(), "view mode");
        assert_eq!(facing(&ed), Some(crate::grid::Facing::East));
    }

    #[test]
    fn set_diagram_resets_session() {
        let mut ed = editor();
        ed.diagram.add_element(block("a", 2, 2));
        click(&mut ed, body_of(2, 2));
        ed.start_simulation();

        let previous = ed.set_diagram(Diagram::new("other"));
        assert_eq!(previous.name, "main");
        assert_eq!(ed.diagram.name, "other");
        assert_eq!(ed.selected(), None);
        assert!(!ed.simulation.is_attached());
        assert_eq!(ed.edit_state(), Some(EditState::None));
    }
}
