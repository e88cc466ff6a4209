use bevy::prelude::*;

pub const PRIMARY_COLOR: Color = Color::Srgba(Srgba::new(0.9, 0.9, 0.9, 1.0));
pub const HOVERED_BUTTON: Color = Color::srgb(0.0, 0.9, 0.9);
pub const CLICKED_BUTTON: Color = Color::srgb(0.9, 0.9, 0.0);

pub const BACKDROP_COLOR: Color = Color::Srgba(Srgba::new(0.0, 0.0, 0.0, 0.6));

/// Remembered base color so hover/press tints can be restored.
#[derive(Component, Clone, Copy)]
pub struct ColorAnchor(pub Color);
