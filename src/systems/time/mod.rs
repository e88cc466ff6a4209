use std::time::Duration;

use bevy::prelude::*;

/// Global time-dilation factor applied to every popup timer and tween.
#[derive(Resource)]
pub struct Dilation(pub f32);

pub struct DilationPlugin;
impl Plugin for DilationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Dilation(1.0));
    }
}

pub fn dilated(delta: Duration, dilation: &Dilation) -> Duration {
    delta.mul_f32(dilation.0.max(0.0))
}
