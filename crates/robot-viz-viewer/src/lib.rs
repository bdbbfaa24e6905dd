//! robot-viz viewer
//!
//! Opens an eframe window that paints a [`Scene`] with an orbit camera.
//! [`show`] blocks until the window is closed; [`show_with`] additionally
//! calls back once per frame so the scene can be animated, and [`run`]
//! accepts a full [`SceneController`] with its own side panel.

mod app;
pub mod camera;
pub mod config;
mod error;
pub mod playback;
pub mod render;
pub mod session;

pub use app::ViewerApp;
pub use camera::OrbitCamera;
pub use config::{ConfigError, ConfigManager, ViewerConfig};
pub use error::ViewerError;
pub use session::RobotSession;

use robot_viz::scene::{Color, Scene};

/// Window settings
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub title: String,
    pub window_size: [f32; 2],
    pub background: Color,
    pub show_grid: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        let config = ViewerConfig::default();
        Self {
            title: "robot-viz".to_string(),
            window_size: config.window_size,
            background: config.background,
            show_grid: config.show_grid,
        }
    }
}

impl From<&ViewerConfig> for ViewerOptions {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            window_size: config.window_size,
            background: config.background,
            show_grid: config.show_grid,
            ..Default::default()
        }
    }
}

/// Drives a scene from inside the viewer loop
pub trait SceneController {
    /// Called once per frame before painting with the seconds elapsed
    /// since the window opened
    fn on_frame(&mut self, scene: &mut Scene, elapsed: f64);

    /// Contents of the left side panel
    fn ui(&mut self, _ui: &mut egui::Ui, _scene: &mut Scene) {}

    fn has_panel(&self) -> bool {
        false
    }

    /// Whether to keep repainting without input
    fn wants_repaint(&self) -> bool {
        true
    }
}

/// A static scene
struct NoController;

impl SceneController for NoController {
    fn on_frame(&mut self, _scene: &mut Scene, _elapsed: f64) {}

    fn wants_repaint(&self) -> bool {
        false
    }
}

/// Adapts a per-frame closure
struct FrameCallback<F>(F);

impl<F: FnMut(&mut Scene, f64)> SceneController for FrameCallback<F> {
    fn on_frame(&mut self, scene: &mut Scene, elapsed: f64) {
        (self.0)(scene, elapsed)
    }
}

/// Show `scene` in a window until it is closed
pub fn show(scene: Scene, options: ViewerOptions) -> Result<(), ViewerError> {
    run(scene, NoController, options)
}

/// Show `scene` and call `on_frame` before every frame
pub fn show_with<F>(scene: Scene, options: ViewerOptions, on_frame: F) -> Result<(), ViewerError>
where
    F: FnMut(&mut Scene, f64) + 'static,
{
    run(scene, FrameCallback(on_frame), options)
}

/// Show `scene` driven by `controller`
pub fn run(
    scene: Scene,
    controller: impl SceneController + 'static,
    options: ViewerOptions,
) -> Result<(), ViewerError> {
    let native_options = native_options(&options);
    eframe::run_native(
        "robot-viz",
        native_options,
        Box::new(move |_cc| Ok(Box::new(ViewerApp::new(scene, controller, options)))),
    )?;
    Ok(())
}

/// Window and wgpu settings
pub fn native_options(options: &ViewerOptions) -> eframe::NativeOptions {
    // Configure wgpu for better compatibility (especially WSL2 with llvmpipe)
    let wgpu_options = egui_wgpu::WgpuConfiguration {
        wgpu_setup: egui_wgpu::WgpuSetup::CreateNew {
            // Use GL backend for llvmpipe compatibility
            supported_backends: wgpu::Backends::GL,
            power_preference: wgpu::PowerPreference::LowPower,
            device_descriptor: std::sync::Arc::new(|_adapter| wgpu::DeviceDescriptor {
                label: Some("robot-viz device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
            }),
        },
        ..Default::default()
    };

    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(options.window_size)
            .with_min_inner_size([640.0, 480.0])
            .with_title(options.title.clone()),
        wgpu_options,
        ..Default::default()
    }
}
