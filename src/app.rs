use eframe::egui;

use crate::editor::{EditorOutcome, SketchEditor};
use crate::log_info;
use crate::snapshot::Snapshot;
use crate::tabs::TAB_CAPACITY;

/// Host shell: holds the order's annotation slots and opens the sketch pad
/// over them. The editor owns all document state while it is open; the shell
/// only stores what `EditorOutcome::Saved` hands back.
pub struct TailorNoteApp {
    order_images: Vec<Option<Snapshot>>,
    editor: Option<SketchEditor>,
}

impl TailorNoteApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            order_images: vec![None; TAB_CAPACITY],
            editor: None,
        }
    }

    fn open_editor(&mut self, initial_tab: usize) {
        log_info!("Opening sketch pad at tab {}", initial_tab + 1);
        self.editor = Some(SketchEditor::new(self.order_images.clone(), initial_tab));
    }

    fn show_order(&mut self, ui: &mut egui::Ui) {
        ui.heading("Order annotations");
        ui.add_space(8.0);

        let mut open_at = None;
        for (index, slot) in self.order_images.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(format!("Sketch {}", index + 1));
                ui.label(if slot.is_some() { "annotated" } else { "empty" });
                if ui.button("Edit").clicked() {
                    open_at = Some(index);
                }
            });
        }
        if let Some(index) = open_at {
            self.open_editor(index);
        }
    }
}

impl eframe::App for TailorNoteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(editor) = &mut self.editor else {
                self.show_order(ui);
                return;
            };
            match editor.show(ui) {
                Some(EditorOutcome::Saved(images)) => {
                    log_info!(
                        "Sketch pad saved, {} annotated slot(s)",
                        images.iter().filter(|s| s.is_some()).count()
                    );
                    self.order_images = images;
                    self.editor = None;
                }
                Some(EditorOutcome::Cancelled) => {
                    log_info!("Sketch pad cancelled, order images unchanged");
                    self.editor = None;
                }
                None => {}
            }
        });
    }
}
