use std::time::Duration;

use bevy::prelude::*;
use serde_json::Value;

use crate::systems::{
    colors::PRIMARY_COLOR,
    interaction::TextButton,
    motion::ScaleTransition,
    time::{dilated, Dilation},
};

use super::definition::{PopupAnimation, PopupDefinition, PopupKind};

const POPUP_SIZE: Vec2 = Vec2::new(360.0, 220.0);
const MESSAGE_OFFSET: Vec3 = Vec3::new(0.0, 30.0, 1.0);
const NEXT_BUTTON_OFFSET: Vec3 = Vec3::new(90.0, -75.0, 1.0);
const BACK_BUTTON_OFFSET: Vec3 = Vec3::new(-90.0, -75.0, 1.0);

/// Navigation signals a popup can raise. Exactly one fires per dismissal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    Advance,
    Back,
}

impl std::fmt::Display for PopupAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Raised once a popup has fully closed, carrying the signal to dispatch.
#[derive(Event, Debug, Clone, Copy)]
pub struct PopupSignal {
    pub source: Entity,
    pub action: PopupAction,
}

/// How a popup leaves the screen when dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissalStyle {
    /// User-dismissed popups shrink back out before signalling.
    Animated,
    /// Auto-closing popups already expired visually; no reverse animation.
    Immediate,
}

/// One live popup built from a definition, parented under the container.
#[derive(Component)]
#[require(Transform, Visibility)]
pub struct PopupInstance {
    pub kind: PopupKind,
    pub animation: PopupAnimation,
    pub auto_close: bool,
    pub auto_close_delay: Duration,
    pub open: bool,
}

/// Pending auto-close countdown. Removing this component is the
/// synchronous cancellation path.
#[derive(Component)]
pub struct AutoClose {
    pub timer: Timer,
}

/// Signal to deliver once the exit animation finishes.
#[derive(Component)]
pub struct PendingDismissal {
    pub action: PopupAction,
}

impl PopupInstance {
    pub fn dismissal_style(&self) -> DismissalStyle {
        if self.auto_close {
            DismissalStyle::Immediate
        } else {
            DismissalStyle::Animated
        }
    }

    /// Builds the instance and its visuals from `definition`, initially
    /// inactive unless `started`.
    pub fn spawn(
        commands: &mut Commands,
        container: Entity,
        definition: &PopupDefinition,
        parameters: Option<&Value>,
        started: bool,
    ) -> Entity {
        let instance = PopupInstance {
            kind: definition.kind,
            animation: definition.animation.clone(),
            auto_close: definition.auto_close,
            auto_close_delay: definition.auto_close_delay(),
            open: started,
        };
        let animation = &definition.animation;

        let root = commands
            .spawn((
                Transform::from_scale(animation.start_scale),
                if started {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                },
                ChildOf(container),
            ))
            .id();

        if started {
            commands.entity(root).insert(ScaleTransition::new(
                animation.start_scale,
                animation.end_scale,
                animation.easing.ease_function(),
                animation.duration(),
            ));
            if instance.auto_close {
                commands.entity(root).insert(AutoClose {
                    timer: Timer::new(instance.auto_close_delay, TimerMode::Once),
                });
            }
        }

        commands.spawn((
            Sprite::from_color(definition.background, POPUP_SIZE),
            Transform::from_xyz(0.0, 0.0, -1.0),
            ChildOf(root),
        ));
        commands.spawn((
            Text2d::new(bind_message(&definition.message, parameters)),
            TextFont {
                font_size: 16.0,
                ..default()
            },
            TextColor(PRIMARY_COLOR),
            Transform::from_translation(MESSAGE_OFFSET),
            ChildOf(root),
        ));

        if definition.has_next_button {
            commands.spawn((
                TextButton::new(
                    vec![PopupAction::Advance],
                    vec![KeyCode::Enter],
                    "[ Next ]",
                ),
                Transform::from_translation(NEXT_BUTTON_OFFSET),
                ChildOf(root),
            ));
        }
        if definition.has_back_button {
            commands.spawn((
                TextButton::new(
                    vec![PopupAction::Back],
                    vec![KeyCode::Backspace],
                    "[ Back ]",
                ),
                Transform::from_translation(BACK_BUTTON_OFFSET),
                ChildOf(root),
            ));
        }

        commands.entity(root).insert(instance);

        root
    }

    /// Makes the popup visible and plays the enter animation; arms the
    /// auto-close countdown where the definition asks for one.
    pub fn start(commands: &mut Commands, entity: Entity, instance: &mut PopupInstance) {
        instance.open = true;
        let animation = &instance.animation;

        commands
            .entity(entity)
            .remove::<PendingDismissal>()
            .insert((
                Visibility::Inherited,
                ScaleTransition::new(
                    animation.start_scale,
                    animation.end_scale,
                    animation.easing.ease_function(),
                    animation.duration(),
                ),
            ));

        if instance.auto_close {
            commands.entity(entity).insert(AutoClose {
                timer: Timer::new(instance.auto_close_delay, TimerMode::Once),
            });
        } else {
            commands.entity(entity).remove::<AutoClose>();
        }
    }

    /// Begins dismissal. Auto-close popups hide and signal immediately;
    /// everything else shrinks out first and signals on completion. Closes
    /// the popup to input at once, so repeated activations during the exit
    /// animation cannot restart it or retarget the pending signal.
    pub fn dismiss(
        commands: &mut Commands,
        entity: Entity,
        instance: &mut PopupInstance,
        action: PopupAction,
        signals: &mut EventWriter<PopupSignal>,
    ) {
        // Cancel before anything else so an in-flight countdown can never
        // fire for a popup the user already dismissed.
        commands.entity(entity).remove::<AutoClose>();
        instance.open = false;

        match instance.dismissal_style() {
            DismissalStyle::Immediate => {
                commands.entity(entity).insert(Visibility::Hidden);
                signals.write(PopupSignal {
                    source: entity,
                    action,
                });
            }
            DismissalStyle::Animated => {
                let animation = &instance.animation;
                commands.entity(entity).insert((
                    ScaleTransition::new(
                        animation.end_scale,
                        animation.start_scale,
                        animation.easing.ease_function(),
                        animation.duration(),
                    ),
                    PendingDismissal { action },
                ));
            }
        }
    }

    /// Takes the popup off screen without raising any signal, cancelling
    /// whatever countdown or exit animation was in flight. Used when an
    /// instance is superseded or pushed back into the sequencer's keeping.
    pub fn suspend(commands: &mut Commands, entity: Entity, instance: &mut PopupInstance) {
        instance.open = false;
        commands
            .entity(entity)
            .remove::<(ScaleTransition, PendingDismissal, AutoClose)>()
            .insert(Visibility::Hidden);
    }

    pub fn tick_auto_close(
        mut commands: Commands,
        time: Res<Time>,
        dilation: Res<Dilation>,
        mut query: Query<(Entity, &mut PopupInstance, &mut AutoClose)>,
        mut signals: EventWriter<PopupSignal>,
    ) {
        for (entity, mut instance, mut auto_close) in query.iter_mut() {
            if auto_close
                .timer
                .tick(dilated(time.delta(), &dilation))
                .just_finished()
            {
                instance.open = false;
                commands
                    .entity(entity)
                    .remove::<AutoClose>()
                    .insert(Visibility::Hidden);
                signals.write(PopupSignal {
                    source: entity,
                    action: PopupAction::Advance,
                });
            }
        }
    }

    pub fn finish_dismissals(
        mut commands: Commands,
        mut query: Query<(Entity, &mut PopupInstance, &ScaleTransition, &PendingDismissal)>,
        mut signals: EventWriter<PopupSignal>,
    ) {
        for (entity, mut instance, transition, pending) in query.iter_mut() {
            if !transition.finished() {
                continue;
            }

            instance.open = false;
            commands
                .entity(entity)
                .remove::<(ScaleTransition, PendingDismissal)>()
                .insert(Visibility::Hidden);
            signals.write(PopupSignal {
                source: entity,
                action: pending.action,
            });
        }
    }
}

/// Substitutes `{key}` tokens in `template` from a JSON object parameter.
/// Anything else (absent parameters, non-object values) leaves the template
/// untouched.
fn bind_message(template: &str, parameters: Option<&Value>) -> String {
    let Some(Value::Object(entries)) = parameters else {
        return template.to_string();
    };

    let mut message = template.to_string();
    for (key, value) in entries {
        let token = format!("{{{key}}}");
        let replacement = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        message = message.replace(&token, &replacement);
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(auto_close: bool) -> PopupInstance {
        PopupInstance {
            kind: PopupKind::Welcome,
            animation: PopupAnimation::default(),
            auto_close,
            auto_close_delay: Duration::from_secs_f32(2.5),
            open: false,
        }
    }

    #[test]
    fn auto_close_popups_skip_the_exit_animation() {
        assert_eq!(instance(true).dismissal_style(), DismissalStyle::Immediate);
        assert_eq!(instance(false).dismissal_style(), DismissalStyle::Animated);
    }

    #[test]
    fn message_parameters_substitute_object_entries() {
        let parameters = json!({ "user": "ada", "count": 3 });

        assert_eq!(
            bind_message("Hello {user}, you have {count} alerts.", Some(&parameters)),
            "Hello ada, you have 3 alerts."
        );
    }

    #[test]
    fn message_without_parameters_is_left_untouched() {
        assert_eq!(bind_message("Hello {user}.", None), "Hello {user}.");
        assert_eq!(
            bind_message("Hello {user}.", Some(&json!("not an object"))),
            "Hello {user}."
        );
    }
}
