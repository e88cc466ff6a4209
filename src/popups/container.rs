use std::time::Duration;

use bevy::prelude::*;

use crate::systems::{
    colors::{ColorAnchor, BACKDROP_COLOR},
    interaction::InputGate,
    time::{dilated, Dilation},
};

pub const CONTAINER_FADE_SECS: f32 = 0.5;

const BACKDROP_SIZE: Vec2 = Vec2::new(4000.0, 4000.0);

/// The shared surface every popup instance is parented under.
#[derive(Component)]
#[require(Transform, Visibility)]
pub struct PopupContainer;

impl PopupContainer {
    pub fn spawn(commands: &mut Commands) -> Entity {
        commands
            .spawn((
                PopupContainer,
                ContainerVisibility::new(CONTAINER_FADE_SECS),
                Sprite::from_color(BACKDROP_COLOR.with_alpha(0.0), BACKDROP_SIZE),
                ColorAnchor(BACKDROP_COLOR),
                Transform::from_xyz(0.0, 0.0, 10.0),
            ))
            .id()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerPhase {
    Hidden,
    FadingIn,
    Shown,
    FadingOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContainerGoal {
    Shown,
    Hidden,
}

/// Fade state of the popup surface.
///
/// A fade-in only ever starts from fully hidden and a fade-out only from
/// fully shown; requests arriving mid-fade are remembered and applied when
/// the running fade settles. Interactivity switches on at the first frame of
/// a fade-in and off only once a fade-out completes, so popups are clickable
/// as soon as they start appearing and stay clickable until fully gone.
#[derive(Component)]
pub struct ContainerVisibility {
    phase: ContainerPhase,
    goal: ContainerGoal,
    timer: Timer,
    fade_secs: f32,
    interactive: bool,
}

impl ContainerVisibility {
    pub fn new(fade_secs: f32) -> Self {
        let fade_secs = fade_secs.max(0.0);

        Self {
            phase: ContainerPhase::Hidden,
            goal: ContainerGoal::Hidden,
            timer: Timer::from_seconds(fade_secs, TimerMode::Once),
            fade_secs,
            interactive: false,
        }
    }

    pub fn phase(&self) -> ContainerPhase {
        self.phase
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn show(&mut self) {
        self.goal = ContainerGoal::Shown;
        self.apply_goal();
    }

    pub fn hide(&mut self) {
        self.goal = ContainerGoal::Hidden;
        self.apply_goal();
    }

    fn apply_goal(&mut self) {
        match (self.phase, self.goal) {
            (ContainerPhase::Hidden, ContainerGoal::Shown) => {
                self.phase = ContainerPhase::FadingIn;
                self.timer = Timer::from_seconds(self.fade_secs, TimerMode::Once);
                self.interactive = true;
            }
            (ContainerPhase::Shown, ContainerGoal::Hidden) => {
                self.phase = ContainerPhase::FadingOut;
                self.timer = Timer::from_seconds(self.fade_secs, TimerMode::Once);
            }
            // Mid-fade, or already settled at the goal: nothing to start.
            _ => {}
        }
    }

    pub fn tick(&mut self, delta: Duration) {
        match self.phase {
            ContainerPhase::FadingIn => {
                if self.timer.tick(delta).finished() {
                    self.phase = ContainerPhase::Shown;
                    self.apply_goal();
                }
            }
            ContainerPhase::FadingOut => {
                if self.timer.tick(delta).finished() {
                    self.phase = ContainerPhase::Hidden;
                    self.interactive = false;
                    self.apply_goal();
                }
            }
            ContainerPhase::Hidden | ContainerPhase::Shown => {}
        }
    }

    pub fn alpha(&self) -> f32 {
        match self.phase {
            ContainerPhase::Hidden => 0.0,
            ContainerPhase::Shown => 1.0,
            ContainerPhase::FadingIn => self.timer.fraction(),
            ContainerPhase::FadingOut => self.timer.fraction_remaining(),
        }
    }

    pub fn enact(
        time: Res<Time>,
        dilation: Res<Dilation>,
        mut query: Query<(&mut ContainerVisibility, &mut Sprite, &ColorAnchor)>,
    ) {
        for (mut visibility, mut sprite, anchor) in query.iter_mut() {
            visibility.tick(dilated(time.delta(), &dilation));
            sprite.color = anchor.0.with_alpha(anchor.0.alpha() * visibility.alpha());
        }
    }

    pub fn sync_input_gate(query: Query<&ContainerVisibility>, mut gate: ResMut<InputGate>) {
        gate.enabled = query.iter().any(ContainerVisibility::interactive);
    }
}
