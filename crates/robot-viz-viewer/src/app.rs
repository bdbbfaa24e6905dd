//! eframe application hosting a scene

use std::time::Instant;

use robot_viz::scene::Scene;

use crate::camera::OrbitCamera;
use crate::render;
use crate::{SceneController, ViewerOptions};

/// Window contents: optional control panel and the 3D viewport
pub struct ViewerApp<C> {
    scene: Scene,
    controller: C,
    options: ViewerOptions,
    camera: OrbitCamera,
    started: Instant,
    /// Camera has been framed on the scene bounds
    fitted: bool,
}

impl<C: SceneController> ViewerApp<C> {
    pub fn new(scene: Scene, controller: C, options: ViewerOptions) -> Self {
        Self {
            scene,
            controller,
            options,
            camera: OrbitCamera::default(),
            started: Instant::now(),
            fitted: false,
        }
    }

    fn fit_camera(&mut self) {
        if let Some(bounds) = self.scene.compute_bounds() {
            self.camera.fit_bounds(&bounds);
            self.fitted = true;
        }
    }

    fn viewport_ui(&mut self, ui: &mut egui::Ui) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        if !self.fitted || response.double_clicked() {
            self.fit_camera();
        }
        self.camera.handle_input(&response, ui);

        let painter = ui.painter_at(rect);
        render::paint_scene(&painter, rect, &self.camera, &self.scene, self.options.show_grid);

        painter.text(
            rect.left_bottom() + egui::vec2(8.0, -8.0),
            egui::Align2::LEFT_BOTTOM,
            "drag: orbit   right drag: pan   scroll: zoom   double click: fit",
            egui::FontId::proportional(12.0),
            egui::Color32::from_gray(140),
        );
    }
}

impl<C: SceneController> eframe::App for ViewerApp<C> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let elapsed = self.started.elapsed().as_secs_f64();
        self.controller.on_frame(&mut self.scene, elapsed);

        if self.controller.has_panel() {
            egui::SidePanel::left("controls")
                .resizable(true)
                .default_width(280.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        self.controller.ui(ui, &mut self.scene);
                    });
                });
        }

        let [r, g, b] = self.options.background.to_rgb8();
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(r, g, b)))
            .show(ctx, |ui| self.viewport_ui(ui));

        self.scene.mark_clean();
        if self.controller.wants_repaint() {
            ctx.request_repaint();
        }
    }
}
