use std::time::Duration;

use bevy::{
    math::curve::{Curve, EaseFunction, EasingCurve},
    prelude::*,
};

use crate::systems::time::{dilated, Dilation, DilationPlugin};

#[derive(Default, States, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MotionSystemsActive {
    #[default]
    False,
    True,
}

pub struct MotionPlugin;

impl Plugin for MotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<MotionSystemsActive>()
            .add_systems(Update, activate_systems)
            .add_systems(
                Update,
                ScaleTransition::enact.run_if(in_state(MotionSystemsActive::True)),
            );

        if !app.is_plugin_added::<DilationPlugin>() {
            app.add_plugins(DilationPlugin);
        }
    }
}

fn activate_systems(
    mut state: ResMut<NextState<MotionSystemsActive>>,
    query: Query<(), With<ScaleTransition>>,
) {
    if !query.is_empty() {
        state.set(MotionSystemsActive::True)
    } else {
        state.set(MotionSystemsActive::False)
    }
}

/// Eased scale tween between two fixed endpoints, enacted once per frame.
#[derive(Component)]
pub struct ScaleTransition {
    pub start: Vec3,
    pub end: Vec3,
    pub easing: EaseFunction,
    pub timer: Timer,
}

impl ScaleTransition {
    pub fn new(start: Vec3, end: Vec3, easing: EaseFunction, duration: Duration) -> Self {
        Self {
            start,
            end,
            easing,
            timer: Timer::new(duration, TimerMode::Once),
        }
    }

    pub fn finished(&self) -> bool {
        self.timer.finished()
    }

    pub fn sample(&self) -> Vec3 {
        EasingCurve::new(self.start, self.end, self.easing).sample_clamped(self.timer.fraction())
    }

    pub fn enact(
        time: Res<Time>,
        dilation: Res<Dilation>,
        mut query: Query<(&mut ScaleTransition, &mut Transform)>,
    ) {
        for (mut transition, mut transform) in query.iter_mut() {
            transition.timer.tick(dilated(time.delta(), &dilation));

            if !transition.timer.finished() {
                transform.scale = transition.sample();
            } else if transition.timer.just_finished() {
                transform.scale = transition.end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_covers_both_endpoints() {
        let mut transition = ScaleTransition::new(
            Vec3::ZERO,
            Vec3::ONE,
            EaseFunction::Linear,
            Duration::from_secs_f32(0.5),
        );

        assert_eq!(transition.sample(), Vec3::ZERO);

        transition.timer.tick(Duration::from_secs_f32(0.5));
        assert!(transition.finished());
        assert_eq!(transition.sample(), Vec3::ONE);
    }

    #[test]
    fn linear_sample_is_proportional_midway() {
        let mut transition = ScaleTransition::new(
            Vec3::ZERO,
            Vec3::splat(2.0),
            EaseFunction::Linear,
            Duration::from_secs_f32(1.0),
        );

        transition.timer.tick(Duration::from_secs_f32(0.5));
        assert!((transition.sample() - Vec3::splat(1.0)).length() < 1e-4);
    }

    #[test]
    fn zero_duration_transition_finishes_on_first_tick() {
        let mut transition =
            ScaleTransition::new(Vec3::ONE, Vec3::ZERO, EaseFunction::BackOut, Duration::ZERO);

        transition.timer.tick(Duration::ZERO);
        assert!(transition.finished());
        assert_eq!(transition.sample(), Vec3::ZERO);
    }
}
