mod popups;
mod systems;

use bevy::prelude::*;
use serde_json::json;

use crate::{
    popups::{
        container::PopupContainer,
        content::PopupSet,
        definition::{PopupKind, PopupLibrary},
        PopupPlugin, PopupRequest, PopupsFinished,
    },
    systems::colors::PRIMARY_COLOR,
};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(bevy::window::WindowPlugin {
            primary_window: Some(Window {
                title: String::from("popup_engine"),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(PopupPlugin)
        .insert_resource(PopupLibrary::load(&PopupSet::Onboarding))
        .add_systems(Startup, setup)
        .add_systems(Update, (drive_sequence, report_finished))
        .run();
}

fn onboarding_tour() -> PopupRequest {
    PopupRequest::Configure {
        kinds: vec![PopupKind::Welcome, PopupKind::Warning, PopupKind::Error],
        parameters: vec![Some(json!({ "user": "operator" }))],
        has_replay: true,
    }
}

fn setup(mut commands: Commands, mut requests: EventWriter<PopupRequest>) {
    commands.spawn(Camera2d);
    PopupContainer::spawn(&mut commands);

    commands.spawn((
        Text2d::new("[N] next   [B] back   [W] warning   [R] restart tour"),
        TextFont {
            font_size: 13.0,
            ..default()
        },
        TextColor(PRIMARY_COLOR),
        Transform::from_xyz(0.0, -320.0, 0.0),
    ));

    requests.write(onboarding_tour());
}

fn drive_sequence(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut requests: EventWriter<PopupRequest>,
) {
    if keyboard.just_pressed(KeyCode::KeyN) {
        requests.write(PopupRequest::ShowNext);
    }
    if keyboard.just_pressed(KeyCode::KeyB) {
        requests.write(PopupRequest::ShowPrevious);
    }
    if keyboard.just_pressed(KeyCode::KeyW) {
        requests.write(PopupRequest::Show {
            kind: PopupKind::Warning,
            parameters: None,
        });
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        requests.write(onboarding_tour());
    }
}

fn report_finished(mut finished: EventReader<PopupsFinished>) {
    for _ in finished.read() {
        info!("popup sequence finished");
    }
}
