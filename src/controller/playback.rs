//! The default [`AnimationPlayback`]: linear keyframes timed by frame count and frame rate.

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_reflect::prelude::*;

use super::{
    collaborators::{AnimationPlayback, PlaybackSample},
    transition::ParamTransition,
};

#[derive(Debug, Clone, Reflect)]
struct Track {
    transition: ParamTransition,
    elapsed: Duration,
}

/// Plays a camera's transitions. Added automatically alongside
/// [`TransitionCam`](super::component::TransitionCam); replace the systems in
/// [`TransitionCamSystems::Animate`](super::TransitionCamSystems::Animate) to use another player.
#[derive(Debug, Default, Clone, Component, Reflect)]
pub struct TransitionPlayback {
    tracks: Vec<Track>,
}

impl TransitionPlayback {
    /// Is anything playing?
    pub fn is_playing(&self) -> bool {
        !self.tracks.is_empty()
    }
}

impl AnimationPlayback for TransitionPlayback {
    fn play(&mut self, transition: ParamTransition) {
        self.tracks.push(Track {
            transition,
            elapsed: Duration::ZERO,
        });
    }

    fn advance(&mut self, delta: Duration) -> Vec<PlaybackSample> {
        let samples = self
            .tracks
            .iter_mut()
            .map(|track| {
                track.elapsed += delta;
                let transition = &track.transition;
                let frame = track.elapsed.as_secs_f64() * transition.frame_rate;
                let finished = frame >= transition.frame_count as f64;
                PlaybackSample {
                    id: transition.id,
                    param: transition.param,
                    value: transition.value_at_frame(frame),
                    finished,
                }
            })
            .collect::<Vec<_>>();
        self.tracks.retain(|track| {
            track.elapsed.as_secs_f64() * track.transition.frame_rate
                < track.transition.frame_count as f64
        });
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::transition::{ParamId, TransitionDriver};

    #[test]
    fn plays_to_the_end_then_stops() {
        let mut driver = TransitionDriver::new(4, 4.0);
        driver.enqueue(ParamId::Pitch, 0.0, 8.0);
        let mut playback = TransitionPlayback::default();
        for transition in driver.take_unplayed() {
            playback.play(transition);
        }

        let half = playback.advance(Duration::from_millis(500));
        assert_eq!(half.len(), 1);
        assert_eq!(half[0].value, 4.0);
        assert!(!half[0].finished);

        let end = playback.advance(Duration::from_millis(750));
        assert_eq!(end[0].value, 8.0);
        assert!(end[0].finished);
        assert!(!playback.is_playing());
        assert!(playback.advance(Duration::from_millis(16)).is_empty());
    }

    #[test]
    fn overlapping_tracks_are_sampled_in_issue_order() {
        let mut driver = TransitionDriver::new(2, 2.0);
        driver.enqueue(ParamId::Yaw, 0.0, 10.0);
        driver.enqueue(ParamId::Yaw, 0.0, 20.0);
        let mut playback = TransitionPlayback::default();
        for transition in driver.take_unplayed() {
            playback.play(transition);
        }
        let samples = playback.advance(Duration::from_secs(1));
        assert_eq!(
            samples.iter().map(|s| s.value).collect::<Vec<_>>(),
            vec![10.0, 20.0]
        );
    }
}
