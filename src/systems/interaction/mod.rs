//! Cursor and keyboard interaction primitives for popup controls.
//!
//! Behavioral truth lives in `Clickable`; hover/press tints are presentation
//! outputs layered on top of it. All activation is gated by `InputGate`,
//! which mirrors the popup container's interactivity.

use bevy::{prelude::*, window::PrimaryWindow};

use crate::systems::colors::{ColorAnchor, CLICKED_BUTTON, HOVERED_BUTTON, PRIMARY_COLOR};

/// Master switch for button activation. Disabled buttons neither hover nor
/// click; the popup container drives this from its fade state.
#[derive(Resource, Default)]
pub struct InputGate {
    pub enabled: bool,
}

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum InteractionSystem {
    Hoverable,
    Clickable,
}

pub struct InteractionPlugin;
impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputGate>().configure_sets(
            Update,
            InteractionSystem::Clickable.after(InteractionSystem::Hoverable),
        );
    }
}

/// Emitted once per action on the frame a button is activated.
#[derive(Event, Debug, Clone, Copy)]
pub struct ButtonPressed<A: Send + Sync + 'static> {
    pub source: Entity,
    pub action: A,
}

#[derive(Component)]
pub struct Clickable<A: Send + Sync + 'static> {
    pub actions: Vec<A>,
    pub keys: Vec<KeyCode>,
    pub region: Vec2,
}

impl<A: Send + Sync + 'static> Clickable<A> {
    pub fn new(actions: Vec<A>, keys: Vec<KeyCode>, region: Vec2) -> Self {
        Self {
            actions,
            keys,
            region,
        }
    }
}

#[derive(Component, Default)]
pub struct Hoverable {
    pub hovered: bool,
}

#[derive(Component)]
pub struct TextButton;

impl TextButton {
    pub fn new<A>(actions: Vec<A>, keys: Vec<KeyCode>, text: impl Into<String>) -> impl Bundle
    where
        A: Clone + Copy + std::fmt::Debug + std::cmp::Eq + Send + Sync + 'static,
    {
        (
            TextButton,
            Clickable::new(actions, keys, Vec2::new(120.0, 30.0)),
            Hoverable::default(),
            ColorAnchor(PRIMARY_COLOR),
            TextColor(PRIMARY_COLOR),
            TextFont {
                font_size: 16.0,
                ..default()
            },
            Text2d::new(text.into()),
        )
    }
}

pub fn register_button_systems<A>(app: &mut App)
where
    A: Clone + Copy + std::fmt::Debug + std::cmp::Eq + Send + Sync + 'static,
{
    if !app.is_plugin_added::<InteractionPlugin>() {
        app.add_plugins(InteractionPlugin);
    }

    app.add_event::<ButtonPressed<A>>().add_systems(
        Update,
        (
            hoverable_system::<A>.in_set(InteractionSystem::Hoverable),
            clickable_system::<A>.in_set(InteractionSystem::Clickable),
        ),
    );
}

pub fn cursor_world_position(
    windows: &Query<&Window, With<PrimaryWindow>>,
    cameras: &Query<(&Camera, &GlobalTransform), With<Camera2d>>,
) -> Option<Vec2> {
    let window = windows.single().ok()?;
    let cursor = window.cursor_position()?;
    let (camera, camera_transform) = cameras.single().ok()?;

    camera.viewport_to_world_2d(camera_transform, cursor).ok()
}

fn cursor_within_region(cursor: Vec2, transform: &GlobalTransform, region: Vec2) -> bool {
    let center = transform.translation().truncate();
    let half = region * 0.5;

    (cursor.x - center.x).abs() <= half.x && (cursor.y - center.y).abs() <= half.y
}

fn hoverable_system<A>(
    gate: Res<InputGate>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    mut query: Query<(
        &Clickable<A>,
        &GlobalTransform,
        &mut Hoverable,
        &mut TextColor,
        &ColorAnchor,
    )>,
) where
    A: Clone + Copy + std::fmt::Debug + std::cmp::Eq + Send + Sync + 'static,
{
    let cursor = if gate.enabled {
        cursor_world_position(&windows, &cameras)
    } else {
        None
    };

    for (clickable, transform, mut hoverable, mut color, anchor) in query.iter_mut() {
        hoverable.hovered =
            cursor.is_some_and(|cursor| cursor_within_region(cursor, transform, clickable.region));

        *color = TextColor(if hoverable.hovered {
            HOVERED_BUTTON
        } else {
            anchor.0
        });
    }
}

fn clickable_system<A>(
    gate: Res<InputGate>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<(
        Entity,
        &Clickable<A>,
        &GlobalTransform,
        Option<&mut TextColor>,
    )>,
    mut pressed: EventWriter<ButtonPressed<A>>,
) where
    A: Clone + Copy + std::fmt::Debug + std::cmp::Eq + Send + Sync + 'static,
{
    if !gate.enabled {
        return;
    }

    let cursor = mouse
        .just_pressed(MouseButton::Left)
        .then(|| cursor_world_position(&windows, &cameras))
        .flatten();

    for (entity, clickable, transform, color) in query.iter_mut() {
        let clicked =
            cursor.is_some_and(|cursor| cursor_within_region(cursor, transform, clickable.region));
        let keyed = clickable.keys.iter().any(|key| keyboard.just_pressed(*key));

        if !clicked && !keyed {
            continue;
        }

        if let Some(mut color) = color {
            *color = TextColor(CLICKED_BUTTON);
        }

        for action in &clickable.actions {
            pressed.write(ButtonPressed {
                source: entity,
                action: *action,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_hit_test_is_inclusive_at_edges() {
        let transform = GlobalTransform::from_xyz(10.0, -20.0, 0.0);
        let region = Vec2::new(100.0, 40.0);

        assert!(cursor_within_region(Vec2::new(10.0, -20.0), &transform, region));
        assert!(cursor_within_region(Vec2::new(60.0, 0.0), &transform, region));
        assert!(!cursor_within_region(Vec2::new(61.0, 0.0), &transform, region));
        assert!(!cursor_within_region(Vec2::new(10.0, 1.0), &transform, region));
    }
}
