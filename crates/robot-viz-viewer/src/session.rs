//! Interactive robot session behind the `robot-viz` binary

use std::path::{Path, PathBuf};

use glam::DVec3;
use robot_viz::scene::{ActorHandle, Plotter, Scene};
use robot_viz::{AxesVisualizer, MarkerKind, Robot, VizError};
use robot_viz_core::{LoadOptions, Trajectory};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::playback::{Playback, PlaybackStep};
use crate::SceneController;

/// A loaded robot with joint sliders, end-effector overlays and
/// trajectory playback
pub struct RobotSession {
    robot: Robot,
    urdf_path: PathBuf,
    load: LoadOptions,
    config: ViewerConfig,
    ee_link: String,
    q: Vec<f64>,
    /// Markers and path segments added by the user or by playback
    overlays: Vec<ActorHandle>,
    world_axes: Option<AxesVisualizer>,
    ee_axes: Option<AxesVisualizer>,
    playback: Option<Playback>,
    playing: bool,
    status: Option<String>,
}

impl RobotSession {
    pub fn new(
        scene: &mut Scene,
        urdf_path: impl AsRef<Path>,
        config: ViewerConfig,
        load: LoadOptions,
    ) -> Result<Self, ViewerError> {
        let urdf_path = urdf_path.as_ref().to_path_buf();
        let robot = Self::load_robot(scene, &urdf_path, &config, &load)?;
        let ee_link = Self::pick_ee_link(&robot, config.ee_link.as_deref());

        let world_axes = if config.show_world_axes {
            Some(AxesVisualizer::new(scene, DVec3::ZERO, config.axes_scale * 2.0)?)
        } else {
            None
        };

        let mut session = Self {
            q: robot.model().zero_configuration(),
            ee_axes: Some(AxesVisualizer::new(scene, DVec3::ZERO, config.axes_scale)?),
            robot,
            urdf_path,
            load,
            config,
            ee_link,
            overlays: Vec::new(),
            world_axes,
            playback: None,
            playing: false,
            status: None,
        };
        session.apply(scene)?;
        Ok(session)
    }

    fn load_robot(
        scene: &mut Scene,
        path: &Path,
        config: &ViewerConfig,
        load: &LoadOptions,
    ) -> Result<Robot, VizError> {
        let options = robot_viz::RobotOptions {
            load: load.clone(),
            ..config.robot_options()
        };
        Robot::load(path, scene, options)
    }

    /// The configured link if it exists, else the deepest leaf
    fn pick_ee_link(robot: &Robot, configured: Option<&str>) -> String {
        match configured {
            Some(name) if robot.model().link(name).is_some() => name.to_string(),
            Some(name) => {
                let fallback = robot.model().deepest_leaf().name.clone();
                tracing::warn!("End-effector link '{}' not found, using '{}'", name, fallback);
                fallback
            }
            None => robot.model().deepest_leaf().name.clone(),
        }
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn ee_link(&self) -> &str {
        &self.ee_link
    }

    pub fn configuration(&self) -> &[f64] {
        &self.q
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Set the joint vector and move the robot and end-effector axes
    pub fn set_configuration(&mut self, scene: &mut Scene, q: &[f64]) -> Result<(), ViewerError> {
        self.robot.update(scene, q)?;
        self.q = q.to_vec();
        self.update_ee_axes(scene)?;
        Ok(())
    }

    fn apply(&mut self, scene: &mut Scene) -> Result<(), ViewerError> {
        let q = self.q.clone();
        self.set_configuration(scene, &q)
    }

    fn update_ee_axes(&mut self, scene: &mut Scene) -> Result<(), ViewerError> {
        if let Some(axes) = &mut self.ee_axes {
            let pose = self.robot.link_pose(&self.q, &self.ee_link)?;
            axes.set_pose(scene, &pose)?;
        }
        Ok(())
    }

    /// Drop a marker at the current end-effector position
    pub fn mark_ee(&mut self, scene: &mut Scene) -> Result<(), ViewerError> {
        let handle = self
            .robot
            .plot_ee(scene, &self.q, &self.ee_link, &self.config.marker)?;
        self.overlays.push(handle);
        Ok(())
    }

    /// Remove all markers and path segments
    pub fn clear_overlays(&mut self, scene: &mut Scene) {
        for handle in self.overlays.drain(..) {
            let _ = scene.remove_actor(handle);
        }
    }

    /// Queue a trajectory and start playing it
    pub fn set_trajectory(&mut self, trajectory: Trajectory) -> Result<(), ViewerError> {
        trajectory.validate(self.robot.dof())?;
        self.playback = Some(Playback::new(trajectory));
        self.playing = true;
        Ok(())
    }

    pub fn load_trajectory(&mut self, path: impl AsRef<Path>) -> Result<(), ViewerError> {
        let trajectory = Trajectory::load(path.as_ref())?;
        tracing::info!("Loaded trajectory {:?}", path.as_ref());
        self.set_trajectory(trajectory)
    }

    /// Replace the robot with another URDF, keeping the world axes
    pub fn open_urdf(&mut self, scene: &mut Scene, path: PathBuf) -> Result<(), ViewerError> {
        let robot = Self::load_robot(scene, &path, &self.config, &self.load)?;

        self.robot.remove_robot_mesh(scene);
        self.clear_overlays(scene);
        self.playback = None;
        self.playing = false;

        self.ee_link = Self::pick_ee_link(&robot, self.config.ee_link.as_deref());
        self.q = robot.model().zero_configuration();
        self.robot = robot;
        self.urdf_path = path;
        self.apply(scene)
    }

    /// Show the next playback sample, drawing the end-effector path
    fn step_playback(&mut self, scene: &mut Scene, elapsed: f64) -> Result<(), ViewerError> {
        let Some(playback) = &mut self.playback else {
            return Ok(());
        };

        match playback.advance(elapsed) {
            PlaybackStep::Hold => Ok(()),
            PlaybackStep::Finished => {
                self.playing = false;
                self.status = Some("Playback finished".to_string());
                Ok(())
            }
            PlaybackStep::Show { index, previous } => {
                let q = playback.sample(index).map(|s| s.q.clone()).unwrap_or_default();
                let previous_q = previous.and_then(|i| playback.sample(i)).map(|s| s.q.clone());

                self.set_configuration(scene, &q)?;
                if let Some(previous_q) = previous_q {
                    let handle = self.robot.plot_ee_path(
                        scene,
                        &previous_q,
                        &q,
                        &self.ee_link,
                        &self.config.path,
                    )?;
                    self.overlays.push(handle);
                }
                Ok(())
            }
        }
    }

    fn report(&mut self, result: Result<(), ViewerError>) {
        if let Err(e) = result {
            tracing::error!("{e}");
            self.status = Some(e.to_string());
        }
    }

    fn file_ui(&mut self, ui: &mut egui::Ui, scene: &mut Scene) {
        ui.horizontal(|ui| {
            if ui.button("Open URDF...").clicked()
                && let Some(path) = rfd::FileDialog::new()
                    .add_filter("URDF", &["urdf", "xml"])
                    .pick_file()
            {
                let result = self.open_urdf(scene, path);
                self.report(result);
            }
            if ui.button("Open trajectory...").clicked()
                && let Some(path) = rfd::FileDialog::new()
                    .add_filter("Trajectory", &["json"])
                    .pick_file()
            {
                let result = self.load_trajectory(path);
                self.report(result);
            }
        });
        ui.label(
            egui::RichText::new(self.urdf_path.display().to_string())
                .small()
                .weak(),
        );
    }

    fn joints_ui(&mut self, ui: &mut egui::Ui, scene: &mut Scene) {
        let names: Vec<String> = self.robot.joint_names().iter().map(|s| s.to_string()).collect();
        let limits = self.robot.joint_limits();

        let mut changed = false;
        for (i, (name, limits)) in names.iter().zip(&limits).enumerate() {
            changed |= ui
                .add(egui::Slider::new(&mut self.q[i], limits.lower..=limits.upper).text(name.as_str()))
                .changed();
        }

        ui.horizontal(|ui| {
            if ui.button("Zero").clicked() {
                self.q.iter_mut().for_each(|v| *v = 0.0);
                changed = true;
            }
            if ui.button("Mark EE").clicked() {
                let result = self.mark_ee(scene);
                self.report(result);
            }
            if ui.button("Clear markers").clicked() {
                self.clear_overlays(scene);
            }
        });

        if changed {
            self.playing = false;
            let result = self.apply(scene);
            self.report(result);
        }
    }

    fn overlay_ui(&mut self, ui: &mut egui::Ui, scene: &mut Scene) {
        let links: Vec<String> = self.robot.link_names().iter().map(|s| s.to_string()).collect();
        let previous_ee = self.ee_link.clone();
        egui::ComboBox::from_label("End effector")
            .selected_text(self.ee_link.as_str())
            .show_ui(ui, |ui| {
                for link in links {
                    ui.selectable_value(&mut self.ee_link, link.clone(), link);
                }
            });
        if self.ee_link != previous_ee {
            let result = self.update_ee_axes(scene);
            self.report(result);
        }

        egui::ComboBox::from_label("Marker")
            .selected_text(self.config.marker.kind.name())
            .show_ui(ui, |ui| {
                for kind in MarkerKind::ALL {
                    ui.selectable_value(&mut self.config.marker.kind, kind, kind.name());
                }
            });
        ui.add(
            egui::Slider::new(&mut self.config.marker.size, 0.001..=0.1)
                .logarithmic(true)
                .text("Marker size"),
        );

        if let Some(axes) = &self.world_axes {
            let mut visible = axes.actors().iter().all(|&h| {
                scene.actor(h).is_some_and(|actor| actor.visible)
            });
            if ui.checkbox(&mut visible, "World axes").changed() {
                for handle in axes.actors() {
                    let _ = scene.set_visible(handle, visible);
                }
            }
        }
    }

    fn playback_ui(&mut self, ui: &mut egui::Ui) {
        let Some(playback) = &mut self.playback else {
            return;
        };

        ui.label(format!(
            "{} samples, {:.1} fps, {:.1} s",
            playback.trajectory().len(),
            playback.fps(),
            playback.duration()
        ));
        if let Some(current) = playback.current() {
            ui.add(egui::ProgressBar::new(
                (current + 1) as f32 / playback.trajectory().len().max(1) as f32,
            ));
        }
        ui.horizontal(|ui| {
            let label = if self.playing { "Pause" } else { "Play" };
            if ui.button(label).clicked() {
                self.playing = !self.playing;
            }
            if ui.button("Restart").clicked() {
                playback.restart();
                self.playing = true;
            }
        });
    }
}

impl SceneController for RobotSession {
    fn on_frame(&mut self, scene: &mut Scene, elapsed: f64) {
        if self.playing {
            let result = self.step_playback(scene, elapsed);
            if result.is_err() {
                self.playing = false;
            }
            self.report(result);
        }
    }

    fn ui(&mut self, ui: &mut egui::Ui, scene: &mut Scene) {
        ui.heading(self.robot.model().name().to_string());
        self.file_ui(ui, scene);
        ui.separator();

        ui.label(egui::RichText::new("Joints").strong());
        self.joints_ui(ui, scene);
        ui.separator();

        ui.label(egui::RichText::new("Overlays").strong());
        self.overlay_ui(ui, scene);

        if self.playback.is_some() {
            ui.separator();
            ui.label(egui::RichText::new("Trajectory").strong());
            self.playback_ui(ui);
        }

        if let Some(status) = &self.status {
            ui.separator();
            ui.label(egui::RichText::new(status).color(ui.visuals().warn_fg_color));
        }
    }

    fn has_panel(&self) -> bool {
        true
    }

    fn wants_repaint(&self) -> bool {
        self.playing
    }
}
