//! Fixed-rate trajectory playback

use robot_viz_core::{Trajectory, TrajectorySample};

/// Plays a trajectory at its mean sample rate.
///
/// Each output frame shows one sample; samples are repeated so the
/// recording's timing is kept at a fixed frame rate.
#[derive(Debug, Clone)]
pub struct Playback {
    trajectory: Trajectory,
    schedule: Vec<usize>,
    fps: f64,
    /// Viewer time at which frame 0 was shown
    started_at: Option<f64>,
    /// Sample shown on the previous call to `advance`
    current: Option<usize>,
}

/// What `Playback::advance` asks the caller to display
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackStep {
    /// Same sample as last time
    Hold,
    /// A new sample and the one shown before it
    Show {
        index: usize,
        previous: Option<usize>,
    },
    Finished,
}

impl Playback {
    pub fn new(trajectory: Trajectory) -> Self {
        let fps = trajectory.mean_fps();
        let schedule = trajectory.frame_schedule(fps);
        tracing::info!(
            "Trajectory: {} samples, {} frames at {:.1} fps",
            trajectory.len(),
            schedule.len(),
            fps
        );
        Self {
            trajectory,
            schedule,
            fps,
            started_at: None,
            current: None,
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_count(&self) -> usize {
        self.schedule.len()
    }

    /// Playback length in seconds
    pub fn duration(&self) -> f64 {
        self.schedule.len() as f64 / self.fps
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn sample(&self, index: usize) -> Option<&TrajectorySample> {
        self.trajectory.samples.get(index)
    }

    /// Index of the sample currently shown
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Restart from the first frame at the next `advance`
    pub fn restart(&mut self) {
        self.started_at = None;
        self.current = None;
    }

    /// Output frame for viewer time `now` (seconds)
    pub fn frame_at(&mut self, now: f64) -> usize {
        let start = *self.started_at.get_or_insert(now);
        ((now - start).max(0.0) * self.fps).floor() as usize
    }

    pub fn advance(&mut self, now: f64) -> PlaybackStep {
        let frame = self.frame_at(now);
        let Some(&index) = self.schedule.get(frame) else {
            return PlaybackStep::Finished;
        };

        if self.current == Some(index) {
            return PlaybackStep::Hold;
        }
        let previous = self.current.replace(index);
        PlaybackStep::Show { index, previous }
    }
}
