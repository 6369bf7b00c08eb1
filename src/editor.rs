use eframe::egui;
use egui::{Color32, Pos2, Rect};

use crate::io;
use crate::snapshot::Snapshot;
use crate::surface::{Surface, DEFAULT_SIZE};
use crate::tabs::TabSet;
use crate::tools::{
    rgba_to_color32, Tool, ToolState, MAX_STROKE_WIDTH, MIN_STROKE_WIDTH,
};
use crate::{log_err, log_warn};

/// What the widget hands back to its host when the session ends.
pub enum EditorOutcome {
    /// One slot per tab, in order; `None` for tabs never touched by a
    /// history-affecting action.
    Saved(Vec<Option<Snapshot>>),
    Cancelled,
}

/// The annotation canvas widget: a fixed set of drawing tabs over one shared
/// raster surface, with per-tab undo/redo and session-global tool state.
///
/// All document mutations go through the headless methods (`pointer_down`,
/// `undo`, `select_tab`, ...); `show` only translates egui input into those
/// calls and paints the surface texture.
pub struct SketchEditor {
    tabs: TabSet,
    surface: Surface,
    pub tools: ToolState,
    /// Last recorded stroke position in surface coordinates; `Some` exactly
    /// while a stroke is in progress.
    last_pos: Option<(f32, f32)>,
    texture: Option<egui::TextureHandle>,
    surface_dirty: bool,
}

impl SketchEditor {
    /// Open a session seeded with up to `TAB_CAPACITY` reference images from
    /// the host's order context. An oversized seed list or out-of-range
    /// index panics — that is a host integration bug, not a runtime state.
    pub fn new(seeds: Vec<Option<Snapshot>>, initial_tab: usize) -> Self {
        let tabs = TabSet::from_seeds(seeds, initial_tab);
        let mut editor = Self {
            tabs,
            surface: Surface::new(DEFAULT_SIZE),
            tools: ToolState::default(),
            last_pos: None,
            texture: None,
            surface_dirty: true,
        };
        // A corrupt seed falls back to a blank surface; the seed blob itself
        // stays on the tab so an untouched save round-trips it unchanged.
        editor.repaint_from_tab(initial_tab);
        editor.seed_active_history();
        editor
    }

    pub fn is_drawing(&self) -> bool {
        self.last_pos.is_some()
    }

    pub fn tabs(&self) -> &TabSet {
        &self.tabs
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    // -- Stroke capture -----------------------------------------------------

    /// Pointer pressed at a surface-space position. Pen and eraser enter the
    /// drawing state; the color picker samples and snaps back to the pen.
    pub fn pointer_down(&mut self, pos: (f32, f32)) {
        match self.tools.tool {
            Tool::Pen | Tool::Eraser => {
                self.last_pos = Some(pos);
            }
            Tool::ColorPicker => {
                self.tools.color = rgba_to_color32(self.surface.sample(pos.0, pos.1));
                self.tools.tool = Tool::Pen;
            }
        }
    }

    /// Pointer moved: paint a segment from the last recorded position and
    /// advance it. Ignored unless a stroke is in progress.
    pub fn pointer_move(&mut self, pos: (f32, f32)) {
        let Some(last) = self.last_pos else {
            return;
        };
        let Some(ink) = self.tools.stroke_ink() else {
            return;
        };
        self.surface.stroke_segment(last, pos, ink, self.tools.width);
        self.surface_dirty = true;
        self.last_pos = Some(pos);
    }

    /// Pointer released (or the stroke otherwise ended): commit the surface
    /// as one history entry. A release while idle is a no-op, so each stroke
    /// commits exactly once.
    pub fn pointer_up(&mut self) {
        if self.last_pos.take().is_some() {
            self.commit();
        }
    }

    // -- History ------------------------------------------------------------

    pub fn undo(&mut self) {
        if self.is_drawing() {
            return;
        }
        let tab = self.tabs.active_tab_mut();
        match tab.history.undo(&mut self.surface) {
            Ok(true) => {
                tab.image = tab.history.current().cloned();
                self.surface_dirty = true;
            }
            Ok(false) => {}
            Err(e) => log_warn!("Undo restore failed: {}", e),
        }
    }

    pub fn redo(&mut self) {
        if self.is_drawing() {
            return;
        }
        let tab = self.tabs.active_tab_mut();
        match tab.history.redo(&mut self.surface) {
            Ok(true) => {
                tab.image = tab.history.current().cloned();
                self.surface_dirty = true;
            }
            Ok(false) => {}
            Err(e) => log_warn!("Redo restore failed: {}", e),
        }
    }

    /// Blank the active surface and commit the blank state — clearing is an
    /// undoable action, not a history reset.
    pub fn clear(&mut self) {
        if self.is_drawing() {
            return;
        }
        self.surface.clear();
        self.surface_dirty = true;
        self.commit();
    }

    // -- Tab & image lifecycle ----------------------------------------------

    /// Switch the active tab, repainting the surface from the target tab's
    /// stored snapshot. If that snapshot fails to decode the switch is
    /// abandoned and the current tab stays active.
    pub fn select_tab(&mut self, index: usize) {
        if self.is_drawing() || index == self.tabs.active_index() {
            return;
        }
        if !self.repaint_from_tab(index) {
            return;
        }
        self.tabs.set_active(index);
        self.seed_active_history();
    }

    /// Import a decoded image into the active tab: the backing store is
    /// re-sized for it, the old content replaced, and the result committed.
    pub fn import_image(&mut self, image: &image::RgbaImage) {
        if self.is_drawing() {
            return;
        }
        self.surface.resize_for_image(image.dimensions());
        self.surface.place_fitted(image);
        self.surface_dirty = true;
        self.commit();
    }

    /// The ordered image slots for the host to persist.
    pub fn save(&self) -> Vec<Option<Snapshot>> {
        self.tabs.export_images()
    }

    fn commit(&mut self) {
        match self.surface.snapshot() {
            Ok(snapshot) => {
                let tab = self.tabs.active_tab_mut();
                tab.history.push(snapshot.clone());
                tab.image = Some(snapshot);
            }
            Err(e) => log_err!("Surface snapshot failed, commit dropped: {}", e),
        }
    }

    /// Repaint the surface from `index`'s stored snapshot (or blank it).
    /// Returns false when a stored snapshot fails to decode.
    fn repaint_from_tab(&mut self, index: usize) -> bool {
        let painted = match &self.tabs.get(index).image {
            Some(snapshot) => match snapshot.decode() {
                Ok(decoded) => {
                    self.surface.resize_for_image(decoded.dimensions());
                    self.surface.place_fitted(&decoded);
                    true
                }
                Err(e) => {
                    log_warn!("Tab {} image failed to decode: {}", index + 1, e);
                    false
                }
            },
            None => {
                self.surface.clear();
                true
            }
        };
        if painted {
            self.surface_dirty = true;
        }
        painted
    }

    /// Guarantee the history invariant: after a tab's first render its
    /// history holds the rendered state as the irreducible base entry.
    fn seed_active_history(&mut self) {
        if self.tabs.active_tab().history.is_seeded() {
            return;
        }
        match self.surface.snapshot() {
            Ok(snapshot) => self.tabs.active_tab_mut().history.seed(snapshot),
            Err(e) => log_err!("Could not seed tab history: {}", e),
        }
    }

    // -- UI ------------------------------------------------------------------

    /// Render the widget and process its input for one frame. Returns an
    /// outcome when the user confirms or cancels the session.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<EditorOutcome> {
        let mut outcome = None;

        let (undo_pressed, redo_pressed) = ui.input(|input| {
            let modifier = input.modifiers.command || input.modifiers.ctrl;
            (
                modifier && !input.modifiers.shift && input.key_pressed(egui::Key::Z),
                modifier
                    && (input.key_pressed(egui::Key::Y)
                        || (input.modifiers.shift && input.key_pressed(egui::Key::Z))),
            )
        });
        if undo_pressed {
            self.undo();
        }
        if redo_pressed {
            self.redo();
        }

        self.show_header(ui, &mut outcome);
        self.show_toolbar(ui);
        ui.separator();
        self.show_canvas(ui);

        outcome
    }

    fn show_header(&mut self, ui: &mut egui::Ui, outcome: &mut Option<EditorOutcome>) {
        let drawing = self.is_drawing();
        ui.horizontal(|ui| {
            let mut switch_to = None;
            for (index, tab) in self.tabs.iter().enumerate() {
                let selected = index == self.tabs.active_index();
                let label = egui::SelectableLabel::new(selected, tab.name());
                if ui.add_enabled(!drawing, label).clicked() {
                    switch_to = Some(index);
                }
            }
            if let Some(index) = switch_to {
                self.select_tab(index);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add_enabled(!drawing, egui::Button::new("Done")).clicked() {
                    *outcome = Some(EditorOutcome::Saved(self.save()));
                }
                if ui
                    .add_enabled(!drawing, egui::Button::new("Cancel"))
                    .clicked()
                {
                    *outcome = Some(EditorOutcome::Cancelled);
                }
            });
        });
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        let drawing = self.is_drawing();
        ui.add_enabled_ui(!drawing, |ui| {
            ui.horizontal_wrapped(|ui| {
                egui::ComboBox::from_id_source("sketch_tool")
                    .selected_text(self.tools.tool.label())
                    .show_ui(ui, |ui| {
                        for tool in Tool::all() {
                            ui.selectable_value(&mut self.tools.tool, *tool, tool.label());
                        }
                    });

                ui.add_enabled_ui(self.tools.tool != Tool::Eraser, |ui| {
                    ui.color_edit_button_srgba(&mut self.tools.color);
                });

                ui.add(
                    egui::Slider::new(&mut self.tools.width, MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH)
                        .text("Width"),
                );

                ui.separator();

                let can_undo = self.tabs.active_tab().history.can_undo();
                if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                    self.undo();
                }
                let can_redo = self.tabs.active_tab().history.can_redo();
                if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                    self.redo();
                }
                if ui.button("Clear").clicked() {
                    self.clear();
                }

                ui.separator();

                if ui.button("Upload image…").clicked() {
                    if let Some(image) = io::pick_reference_image() {
                        self.import_image(&image);
                    }
                }
                if ui.button("Paste").clicked() {
                    if let Some(image) = io::clipboard_image() {
                        self.import_image(&image);
                    }
                }

                ui.separator();

                if ui.button("−").clicked() {
                    self.tools.zoom_out();
                }
                ui.label(format!("{:.0}%", self.tools.zoom * 100.0));
                if ui.button("+").clicked() {
                    self.tools.zoom_in();
                }
            });
        });
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        self.refresh_texture(ui.ctx());

        let backing = (self.surface.width(), self.surface.height());
        let displayed =
            egui::vec2(backing.0 as f32, backing.1 as f32) * self.tools.zoom;

        egui::ScrollArea::both()
            .id_source("sketch_canvas_scroll")
            .show(ui, |ui| {
                let (rect, response) = ui
                    .allocate_exact_size(displayed.max(ui.available_size()), egui::Sense::drag());
                let origin = rect.center() - displayed * 0.5;
                let image_rect = Rect::from_min_size(origin, displayed);

                if let Some(texture) = &self.texture {
                    ui.painter_at(rect).image(
                        texture.id(),
                        image_rect,
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }

                // Transform per event: the displayed rect changes with zoom
                // and reflow, the backing resolution does not.
                if response.drag_started() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        if image_rect.contains(pos) {
                            self.pointer_down(surface_point(pos, image_rect, backing));
                        }
                    }
                } else if response.dragged() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        self.pointer_move(surface_point(pos, image_rect, backing));
                    }
                }
                if response.drag_released() {
                    self.pointer_up();
                }
            });
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.surface_dirty && self.texture.is_some() {
            return;
        }
        let size = [self.surface.width() as usize, self.surface.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, self.surface.pixels().as_raw());
        self.texture = Some(ctx.load_texture("sketch_surface", image, egui::TextureOptions::NEAREST));
        self.surface_dirty = false;
    }
}

/// Map a pointer position to surface-space coordinates: offset from the
/// displayed rect's corner, scaled by backing resolution over displayed size
/// on each axis independently.
pub fn surface_point(pointer: Pos2, displayed: Rect, backing: (u32, u32)) -> (f32, f32) {
    (
        (pointer.x - displayed.min.x) * backing.0 as f32 / displayed.width(),
        (pointer.y - displayed.min.y) * backing.1 as f32 / displayed.height(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::BACKGROUND;
    use crate::tabs::TAB_CAPACITY;
    use image::{Rgba, RgbaImage};

    fn stroke(editor: &mut SketchEditor, from: (f32, f32), to: (f32, f32)) {
        editor.pointer_down(from);
        let mid = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
        editor.pointer_move(mid);
        editor.pointer_move(to);
        editor.pointer_up();
    }

    #[test]
    fn one_stroke_commits_one_history_entry() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        assert_eq!(editor.tabs().active_tab().history.len(), 1);

        editor.pointer_down((10.0, 10.0));
        for step in 1..20 {
            editor.pointer_move((10.0 + step as f32 * 4.0, 10.0));
        }
        editor.pointer_up();
        assert_eq!(editor.tabs().active_tab().history.len(), 2);

        // Release while idle commits nothing.
        editor.pointer_up();
        assert_eq!(editor.tabs().active_tab().history.len(), 2);
    }

    #[test]
    fn color_picker_samples_and_reverts_to_pen() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        editor.tools.color = Color32::from_rgb(10, 160, 220);
        stroke(&mut editor, (50.0, 50.0), (50.0, 50.0));

        editor.tools.color = Color32::BLACK;
        editor.tools.tool = Tool::ColorPicker;
        editor.pointer_down((50.0, 50.0));

        assert_eq!(editor.tools.tool, Tool::Pen);
        assert_eq!(editor.tools.color, Color32::from_rgb(10, 160, 220));
        // The picker never enters the drawing state.
        assert!(!editor.is_drawing());
        assert_eq!(editor.tabs().active_tab().history.len(), 2);
    }

    #[test]
    fn history_inputs_ignored_mid_stroke() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        stroke(&mut editor, (10.0, 10.0), (80.0, 80.0));

        editor.pointer_down((100.0, 100.0));
        editor.pointer_move((140.0, 140.0));
        let len_before = editor.tabs().active_tab().history.len();
        editor.undo();
        editor.clear();
        editor.select_tab(1);
        assert!(editor.is_drawing());
        assert_eq!(editor.tabs().active_index(), 0);
        assert_eq!(editor.tabs().active_tab().history.len(), len_before);
        editor.pointer_up();
        assert_eq!(editor.tabs().active_tab().history.len(), len_before + 1);
    }

    #[test]
    fn tabs_are_isolated() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        stroke(&mut editor, (10.0, 10.0), (90.0, 90.0));
        let tab0_image = editor.tabs().get(0).image.clone();
        let tab0_len = editor.tabs().get(0).history.len();

        editor.select_tab(1);
        stroke(&mut editor, (200.0, 40.0), (300.0, 40.0));
        stroke(&mut editor, (200.0, 80.0), (300.0, 80.0));
        editor.undo();

        assert_eq!(editor.tabs().get(0).image, tab0_image);
        assert_eq!(editor.tabs().get(0).history.len(), tab0_len);
        assert_eq!(editor.tabs().get(0).history.redo_len(), 0);
        assert!(editor.tabs().get(1).history.redo_len() > 0);
    }

    #[test]
    fn switching_back_restores_tab_content() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        editor.tools.color = Color32::from_rgb(255, 0, 0);
        stroke(&mut editor, (300.0, 300.0), (300.0, 300.0));
        let ink = editor.surface().sample(300.0, 300.0);

        editor.select_tab(1);
        assert_eq!(editor.surface().sample(300.0, 300.0), BACKGROUND);
        editor.select_tab(0);
        assert_eq!(editor.surface().sample(300.0, 300.0), ink);
    }

    #[test]
    fn clear_is_undoable() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        stroke(&mut editor, (20.0, 20.0), (120.0, 120.0));
        let before_clear = editor.tabs().active_tab().image.clone().unwrap();

        editor.clear();
        assert_eq!(editor.surface().sample(70.0, 70.0), BACKGROUND);

        editor.undo();
        assert_eq!(editor.tabs().active_tab().image, Some(before_clear.clone()));
        assert_eq!(
            editor.surface().pixels().as_raw(),
            before_clear.decode().unwrap().as_raw()
        );
    }

    #[test]
    fn save_round_trips_untouched_seeds() {
        let mut seed_surface = Surface::new(DEFAULT_SIZE);
        seed_surface.stroke_segment((50.0, 50.0), (400.0, 400.0), Rgba([0, 0, 0, 255]), 5.0);
        let seed = seed_surface.snapshot().unwrap();

        let editor = SketchEditor::new(vec![Some(seed.clone()), None], 0);
        let saved = editor.save();

        assert_eq!(saved.len(), TAB_CAPACITY);
        assert_eq!(saved[0], Some(seed));
        for slot in &saved[1..] {
            assert_eq!(*slot, None);
        }
    }

    #[test]
    fn blank_tab_becomes_concrete_after_commit() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        assert_eq!(editor.save()[0], None);

        stroke(&mut editor, (10.0, 10.0), (20.0, 20.0));
        assert!(editor.save()[0].is_some());

        // Undoing back to the blank base still leaves a concrete snapshot.
        editor.undo();
        assert!(editor.save()[0].is_some());
    }

    #[test]
    fn corrupt_seed_falls_back_to_blank_but_round_trips() {
        let bad = Snapshot::from_encoded(vec![7, 7, 7]);
        let editor = SketchEditor::new(vec![Some(bad.clone())], 0);

        assert_eq!(editor.surface().sample(10.0, 10.0), BACKGROUND);
        assert_eq!(editor.save()[0], Some(bad));
    }

    #[test]
    fn import_replaces_content_and_commits() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        stroke(&mut editor, (10.0, 10.0), (500.0, 500.0));

        let reference = RgbaImage::from_pixel(640, 480, Rgba([40, 80, 120, 255]));
        editor.import_image(&reference);

        assert_eq!(editor.surface().width(), 640);
        assert_eq!(editor.surface().sample(320.0, 320.0), Rgba([40, 80, 120, 255]));
        assert_eq!(editor.tabs().active_tab().history.len(), 3);

        // The letterboxed bands above and below stay background.
        assert_eq!(editor.surface().sample(320.0, 20.0), BACKGROUND);
    }

    #[test]
    fn pointer_mapping_scales_by_backing_over_displayed() {
        let displayed = Rect::from_min_size(Pos2::new(40.0, 60.0), egui::vec2(300.0, 300.0));
        let mapped = surface_point(Pos2::new(90.0, 110.0), displayed, (600, 600));
        assert_eq!(mapped, (100.0, 100.0));
    }

    #[test]
    fn zoom_does_not_affect_stroke_coordinates() {
        let mut editor = SketchEditor::new(Vec::new(), 0);
        editor.tools.zoom_in();

        // The same client gesture maps through whatever rect is displayed;
        // painting itself is zoom-independent.
        let displayed = Rect::from_min_size(Pos2::ZERO, egui::vec2(750.0, 750.0));
        let pos = surface_point(Pos2::new(375.0, 375.0), displayed, (600, 600));
        editor.pointer_down(pos);
        editor.pointer_move((pos.0 + 1.0, pos.1));
        editor.pointer_up();

        assert_ne!(editor.surface().sample(300.0, 300.0), BACKGROUND);
    }
}
