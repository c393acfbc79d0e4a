use egui::{
    Align2, Color32, CornerRadius, FontId, Key, Painter, Pos2, Rect, Response, Sense, Shape,
    Stroke, StrokeKind, Ui, Vec2, pos2,
};

use crate::{
    config::EditorConfig,
    descriptor::{Descriptor, PinDirection},
    diagram::{Diagram, Element},
    grid::GridPos,
    hit_test::bit_cells,
    interaction::{EditState, Editor, EditorEvent, Mode, PointerEvent},
    palette::Palette,
    simulator::{PinState, Ticker, exposed_pin_path},
    wires::{Direction, WireNetwork},
};

pub const PANEL_WIDTH: f32 = 170.0;
pub const SELECTION_OUTLINE: f32 = 3.0;
pub const CURSOR_RADIUS: f32 = 6.0;
pub const MIN_GRID_DOT_SPACING: f32 = 6.0;

/// Settings restored between runs. Diagrams are not persisted.
#[derive(serde::Deserialize, serde::Serialize, Default)]
#[serde(default)]
pub struct Settings {
    pub config: EditorConfig,
    pub show_logs: bool,
}

pub struct EditorApp {
    pub settings: Settings,
    pub editor: Editor,
    pub palette: Palette,
    /// Diagrams of the project other than the one being edited.
    pub diagrams: Vec<Diagram>,
    diagram_count: u32,
    pressed_on_canvas: bool,
}

impl Default for EditorApp {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl eframe::App for EditorApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.draw_top_bar(ctx);

        egui::SidePanel::left("palette")
            .resizable(false)
            .exact_width(PANEL_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_palette(ui));
            });

        egui::SidePanel::right("inspector")
            .resizable(false)
            .exact_width(PANEL_WIDTH)
            .show(ctx, |ui| self.draw_inspector(ui));

        if self.settings.show_logs {
            egui::Window::new("Logs").show(ctx, |ui| {
                egui_logger::logger_ui().show(ui);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        let dt = ctx.input(|i| i.stable_dt);
        self.editor.tick(dt);

        for event in self.editor.drain_events() {
            match event {
                EditorEvent::SelectionChanged(Some(id)) => log::debug!("selected {id}"),
                EditorEvent::SelectionChanged(None) => log::debug!("selection cleared"),
                EditorEvent::RedrawRequested => ctx.request_repaint(),
            }
        }

        // Keep ticking while a simulation runs.
        if self.editor.simulation.is_attached() {
            ctx.request_repaint();
        }
    }
}

impl EditorApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: Settings) -> Self {
        let editor = Editor::new(Diagram::new("main"), &settings.config);
        Self {
            settings,
            editor,
            palette: Palette::default(),
            diagrams: Vec::new(),
            diagram_count: 0,
            pressed_on_canvas: false,
        }
    }

    fn new_diagram(&mut self) {
        self.diagram_count += 1;
        let name = format!("diagram_{}", self.diagram_count);
        log::info!("created {name}");
        self.diagrams
            .push(Diagram::with_policy(name, self.settings.config.wire_policy));
    }

    fn switch_diagram(&mut self, index: usize) {
        if index >= self.diagrams.len() {
            return;
        }
        let next = self.diagrams.remove(index);
        let previous = self.editor.set_diagram(next);
        self.diagrams.insert(index, previous);
    }

    fn draw_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Quit").clicked() {
                        ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.add_space(16.0);

                ui.menu_button("Project", |ui| {
                    if ui.button("New Diagram").clicked() {
                        self.new_diagram();
                    }
                });
                ui.add_space(16.0);

                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.settings.show_logs, "Logs");
                    let grid = egui::Slider::new(&mut self.settings.config.grid_size, 8.0..=48.0)
                        .text("Grid");
                    if ui.add(grid).changed() {
                        self.editor.set_grid_size(self.settings.config.grid_size);
                    }
                });
                ui.add_space(16.0);

                let mode = self.editor.mode();
                ui.label("Mode:");
                if ui.selectable_label(mode == Mode::Edit, "Edit").clicked() && mode != Mode::Edit {
                    self.editor.toggle_mode();
                }
                if ui.selectable_label(mode == Mode::View, "View").clicked() && mode != Mode::View {
                    self.editor.toggle_mode();
                }
                ui.add_space(16.0);

                ui.label("Simulation:");
                if self.editor.simulation.is_attached() {
                    if ui.button("⏹ Stop").clicked() {
                        self.editor.stop_simulation();
                    }
                    if ui.button("⏭ Step").clicked() {
                        self.editor.simulation.step();
                    }
                } else if ui.button("▶ Start").clicked() {
                    self.editor.start_simulation();
                }

                let config = &mut self.settings.config;
                let speed = egui::Slider::new(&mut config.tick_rate_hz, 1.0..=120.0).text("Hz");
                if ui.add(speed).changed() {
                    self.editor.ticker = Ticker::new(config.tick_rate_hz, config.max_steps_per_frame);
                }
            });
        });
    }

    fn draw_palette(&mut self, ui: &mut Ui) {
        ui.heading("Elements");
        let entries: Vec<(usize, &'static str, &'static str)> = self
            .palette
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, entry.category, entry.label))
            .collect();

        for category in self.palette.categories() {
            egui::CollapsingHeader::new(category)
                .default_open(true)
                .show(ui, |ui| {
                    for (index, _, label) in entries.iter().filter(|(_, c, _)| *c == category) {
                        if ui.button(*label).clicked()
                            && let Some(element) = self.palette.create(*index)
                        {
                            self.editor.start_placing(element);
                        }
                    }
                });
        }

        ui.separator();
        ui.heading("Diagrams");
        ui.label(egui::RichText::new(&self.editor.diagram.name).strong());

        let mut switch_to = None;
        let mut place = None;
        for (i, diagram) in self.diagrams.iter().enumerate() {
            ui.horizontal(|ui| {
                if ui.button(diagram.name.as_str()).clicked() {
                    switch_to = Some(i);
                }
                if ui.small_button("Place").clicked() {
                    place = Some(i);
                }
            });
        }

        if let Some(i) = place
            && let Some(diagram) = self.diagrams.get(i)
        {
            let element = self.palette.create_schematic(diagram);
            self.editor.start_placing(element);
        }
        if let Some(i) = switch_to {
            self.switch_diagram(i);
        }
    }

    fn draw_inspector(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        let Some(element) = self.editor.selected_element() else {
            ui.label("Nothing selected");
            return;
        };

        ui.label(egui::RichText::new(&element.name).strong());
        ui.label(format!("Kind: {}", element.descriptor.label()));
        ui.label(format!("Position: {}", element.position));
        ui.label(format!("Facing: {}", element.facing.label()));
        ui.separator();
        for pin in element.pins() {
            let state = match self.editor.pin_state(element, &pin.name) {
                PinState::Known(v) => format!("{v:#b}"),
                PinState::Unknown => "?".to_owned(),
            };
            ui.label(format!("{} {}: {state}", pin.kind, pin.name));
        }
        ui.separator();

        let editing = self.editor.edit_state() == Some(EditState::Select);
        let (rotate, delete) = ui
            .horizontal(|ui| {
                (
                    ui.add_enabled(editing, egui::Button::new("Rotate")).clicked(),
                    ui.add_enabled(editing, egui::Button::new("Delete")).clicked(),
                )
            })
            .inner;
        if rotate {
            self.editor.rotate_selected();
        }
        if delete {
            self.editor.delete_selected();
        }
    }

    fn handle_pointer(&mut self, ui: &Ui, resp: &Response) {
        let (pressed, released, latest, moving) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
                i.pointer.is_moving(),
            )
        });
        let Some(pos) = latest else {
            return;
        };
        let local = (pos - resp.rect.min).to_pos2();
        let inside = resp.contains_pointer();

        if pressed && inside {
            self.pressed_on_canvas = true;
            self.editor.handle(PointerEvent::Press(local));
        }
        if moving && (inside || self.pressed_on_canvas) {
            self.editor.handle(PointerEvent::Move(local));
        }
        // Releases of clicks that started elsewhere, e.g. on a palette button, are not ours.
        if released && self.pressed_on_canvas {
            self.pressed_on_canvas = false;
            self.editor.handle(PointerEvent::Release(local));
        }
    }

    fn handle_keys(&mut self, ui: &Ui) {
        if ui.ctx().wants_keyboard_input() {
            return;
        }
        let (toggle, delete, cancel, rotate) = ui.input(|i| {
            (
                i.key_pressed(Key::E),
                i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace),
                i.key_pressed(Key::Escape),
                i.key_pressed(Key::R),
            )
        });
        if toggle {
            self.editor.toggle_mode();
        }
        if delete {
            self.editor.delete_selected();
        }
        if cancel {
            self.editor.cancel();
        }
        if rotate {
            self.editor.rotate_selected();
        }
    }

    fn draw_canvas(&mut self, ui: &mut Ui) {
        let (resp, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        self.handle_pointer(ui, &resp);
        self.handle_keys(ui);

        let editor = &self.editor;
        let config = &self.settings.config;
        let gs = editor.grid_size();
        let offset = resp.rect.min.to_vec2() + editor.view_translation();

        draw_grid(&painter, resp.rect, offset, gs, config.grid_dot_color);

        let dragged = editor.drag_preview();
        for (id, element) in editor.diagram.elements() {
            if dragged.is_some_and(|(dragged_id, _)| dragged_id == id) {
                continue;
            }
            let selected =
                editor.edit_state() == Some(EditState::Select) && editor.selected() == Some(id);
            self.draw_element(&painter, element, element.position, offset, false, selected);
        }

        if let Some((id, position)) = dragged
            && let Some(element) = editor.diagram.get(id)
        {
            self.draw_element(&painter, element, position, offset, true, false);
        }
        if let Some(element) = editor.placing_element() {
            self.draw_element(&painter, element, element.position, offset, true, false);
        }

        draw_wires(&painter, &editor.visible_wires(), offset, gs, config);

        let gesture = editor.edit_state();
        let show_cursor = gesture.is_some_and(|s| s != EditState::Drag && s != EditState::Place);
        if show_cursor && let Some(cursor) = editor.cursor() {
            painter.circle_stroke(
                cursor.to_pixel(gs) + offset,
                CURSOR_RADIUS,
                Stroke::new(2.0, config.cursor_color),
            );
        }
    }

    fn draw_element(
        &self,
        painter: &Painter,
        element: &Element,
        position: GridPos,
        offset: Vec2,
        ghost: bool,
        selected: bool,
    ) {
        let config = &self.settings.config;
        let gs = self.editor.grid_size();
        let transform = element.transform_at(position, gs);
        let to_screen = |local: Pos2| transform.map_pos(local) + offset;

        let tint = |color: Color32| {
            if ghost {
                color.gamma_multiply(config.ghost_alpha)
            } else {
                color
            }
        };
        let fill = tint(config.element_fill_color);
        let stroke = Stroke::new(config.element_stroke, tint(config.element_stroke_color));

        let body = element.bounding_rect().to_local_pixels(gs);
        let screen_body = transform.map_rect(body).translate(offset);

        match &element.descriptor {
            Descriptor::Not { .. } => {
                let points = vec![
                    to_screen(pos2(-3.0 * gs, -gs)),
                    to_screen(pos2(-0.8 * gs, 0.0)),
                    to_screen(pos2(-3.0 * gs, gs)),
                ];
                painter.add(Shape::convex_polygon(points, fill, stroke));
                painter.line_segment([to_screen(pos2(-4.0 * gs, 0.0)), to_screen(pos2(-3.0 * gs, 0.0))], stroke);
                draw_bubble(painter, to_screen(pos2(-0.4 * gs, 0.0)), gs, fill, stroke);
            }
            Descriptor::Gate { negated, .. } => {
                painter.rect(screen_body, CornerRadius::same(4), fill, stroke, StrokeKind::Inside);
                painter.text(
                    screen_body.center(),
                    Align2::CENTER_CENTER,
                    element.descriptor.label(),
                    FontId::proportional(gs * 0.6),
                    stroke.color,
                );
                if *negated {
                    draw_bubble(painter, to_screen(pos2(0.0, 0.0)), gs, fill, stroke);
                }
            }
            Descriptor::ExposedPin { direction, .. } => {
                let glyph = Rect::from_min_max(
                    pos2(body.min.x, body.min.y + body.height() / 8.0),
                    pos2(body.max.x, body.max.y - body.height() / 8.0),
                );
                let glyph = transform.map_rect(glyph).translate(offset);
                let rounding = match direction {
                    PinDirection::In => CornerRadius::ZERO,
                    PinDirection::Out => CornerRadius::same((gs / 4.0) as u8),
                };
                painter.rect(glyph, rounding, fill, stroke, StrokeKind::Inside);
                if !ghost {
                    self.draw_bits(painter, element, offset, stroke.color);
                }
            }
            Descriptor::Schematic { name, .. } => {
                painter.rect(screen_body, CornerRadius::ZERO, fill, stroke, StrokeKind::Inside);
                painter.text(
                    screen_body.center(),
                    Align2::CENTER_CENTER,
                    name,
                    FontId::proportional(gs * 0.5),
                    stroke.color,
                );
            }
        }

        for pin in element.pins() {
            let color = match self.editor.pin_state(element, &pin.name) {
                PinState::Unknown => config.pin_unknown_color,
                PinState::Known(0) => config.pin_low_color,
                PinState::Known(_) => config.pin_high_color,
            };
            let centre = to_screen(pin.offset.to_pixel(gs));
            painter.circle_filled(centre, config.pin_radius, tint(color));
        }

        if selected {
            painter.rect_stroke(
                screen_body.expand(SELECTION_OUTLINE),
                CornerRadius::same(2),
                Stroke::new(2.0, config.selection_color),
                StrokeKind::Outside,
            );
        }
    }

    /// Current bit values inside an exposed pin glyph, nothing while unknown.
    fn draw_bits(&self, painter: &Painter, element: &Element, offset: Vec2, color: Color32) {
        let PinState::Known(value) = self
            .editor
            .simulation
            .pin_state(&exposed_pin_path(&element.name))
        else {
            return;
        };
        let gs = self.editor.grid_size();
        for (i, cell) in bit_cells(element, gs).into_iter().enumerate() {
            let bit = (value >> i) & 1;
            painter.text(
                cell.translate(offset).center(),
                Align2::CENTER_CENTER,
                bit.to_string(),
                FontId::monospace(gs * 0.6),
                color,
            );
        }
    }
}

fn draw_bubble(painter: &Painter, centre: Pos2, gs: f32, fill: Color32, stroke: Stroke) {
    painter.circle(centre, gs * 0.4, fill, stroke);
}

fn draw_grid(painter: &Painter, rect: Rect, offset: Vec2, gs: f32, color: Color32) {
    if gs < MIN_GRID_DOT_SPACING {
        return;
    }
    let x0 = ((rect.left() - offset.x) / gs).floor() as i32;
    let x1 = ((rect.right() - offset.x) / gs).ceil() as i32;
    let y0 = ((rect.top() - offset.y) / gs).floor() as i32;
    let y1 = ((rect.bottom() - offset.y) / gs).ceil() as i32;
    for x in x0..=x1 {
        for y in y0..=y1 {
            painter.circle_filled(GridPos::new(x, y).to_pixel(gs) + offset, 1.0, color);
        }
    }
}

fn draw_wires(painter: &Painter, wires: &WireNetwork, offset: Vec2, gs: f32, config: &EditorConfig) {
    let stroke = Stroke::new(config.wire_thickness, config.wire_color);
    for (pos, node) in wires.iter() {
        let from = pos.to_pixel(gs) + offset;
        // Each run is stored on both ends, draw it from its west or north end only.
        for dir in [Direction::East, Direction::South] {
            if node.is_connected(dir) {
                let to = (pos + dir.offset()).to_pixel(gs) + offset;
                painter.line_segment([from, to], stroke);
            }
        }
        if node.is_junction() {
            painter.circle_filled(from, config.wire_thickness * 2.0, config.wire_color);
        }
    }
}
