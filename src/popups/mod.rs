//! Popup sequencing: which popup is visible, in what order, and how
//! next/back/replay navigation walks the queue.
//!
//! The sequencer owns a forward queue, a back-navigation history stack, the
//! replay record and the single `current` pointer. Popups talk back through
//! `PopupSignal` events rather than per-instance callbacks; the signal is
//! interpreted against the role the current popup was given when it was
//! shown (`Sequenced` or `OneShot`), so a handler from a previous role can
//! never fire after the instance is repurposed.

pub mod container;
pub mod content;
pub mod definition;
pub mod instance;

use std::collections::VecDeque;

use bevy::prelude::*;
use serde_json::Value;

use crate::systems::{
    interaction::{register_button_systems, ButtonPressed, InteractionSystem},
    motion::MotionPlugin,
    time::DilationPlugin,
};

use container::{ContainerVisibility, PopupContainer};
use definition::{PopupDefinition, PopupKind, PopupLibrary};
use instance::{PopupAction, PopupInstance, PopupSignal};

/* ─────────────────────────  PLUGIN  ───────────────────────── */

#[derive(Default, States, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PopupSystemsActive {
    #[default]
    False,
    True,
}

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct PopupSystem;

pub struct PopupPlugin;
impl Plugin for PopupPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<PopupSystemsActive>()
            .init_resource::<PopupSequencer>()
            .init_resource::<PopupLibrary>()
            .add_event::<PopupRequest>()
            .add_event::<PopupSignal>()
            .add_event::<PopupsFinished>()
            .configure_sets(Update, PopupSystem.after(InteractionSystem::Clickable))
            .add_systems(Update, activate_systems)
            .add_systems(
                Update,
                (
                    PopupSequencer::process_requests,
                    PopupSequencer::handle_button_presses,
                    PopupInstance::tick_auto_close,
                    PopupInstance::finish_dismissals,
                    PopupSequencer::dispatch_signals,
                    ContainerVisibility::enact,
                    ContainerVisibility::sync_input_gate,
                )
                    .chain()
                    .in_set(PopupSystem)
                    .run_if(in_state(PopupSystemsActive::True)),
            );

        if !app.is_plugin_added::<MotionPlugin>() {
            app.add_plugins(MotionPlugin);
        }
        if !app.is_plugin_added::<DilationPlugin>() {
            app.add_plugins(DilationPlugin);
        }
        register_button_systems::<PopupAction>(app);
    }
}

fn activate_systems(
    mut state: ResMut<NextState<PopupSystemsActive>>,
    containers: Query<(), With<PopupContainer>>,
) {
    if !containers.is_empty() {
        state.set(PopupSystemsActive::True)
    } else {
        state.set(PopupSystemsActive::False)
    }
}

/* ─────────────────────────  EVENTS  ───────────────────────── */

/// Driver commands for the sequencer.
#[derive(Event, Debug, Clone)]
pub enum PopupRequest {
    /// Replaces all sequencer state with a fresh queue built from `kinds`,
    /// in order. `parameters` aligns positionally; missing entries mean no
    /// parameters for that popup.
    Configure {
        kinds: Vec<PopupKind>,
        parameters: Vec<Option<Value>>,
        has_replay: bool,
    },
    ShowNext,
    ShowPrevious,
    /// Out-of-band display independent of the queue and history.
    Show {
        kind: PopupKind,
        parameters: Option<Value>,
    },
}

/// Fired once each time forward or backward navigation runs out of popups.
#[derive(Event, Debug, Clone, Copy)]
pub struct PopupsFinished;

/* ───────────────────────  SEQUENCER  ──────────────────────── */

/// How the current popup's advance/back signals are interpreted. Reassigned
/// atomically whenever a popup becomes current.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DispatchRole {
    /// Advance walks the queue, back walks the history.
    #[default]
    Sequenced,
    /// Either signal just closes the popup; queue and history are untouched.
    OneShot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerPhase {
    Idle,
    Showing,
}

/// Outcome of one sequencer transition, applied by the calling system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerStep {
    /// Show the container and start this instance.
    Show(Entity),
    /// Hide the container and report the sequence as finished.
    Finished { requeued: usize },
    /// Hide the container after a one-shot popup closed; not a sequence end.
    Dismissed,
}

#[derive(Resource, Default)]
pub struct PopupSequencer {
    queue: VecDeque<Entity>,
    history: Vec<Entity>,
    shown: Vec<Entity>,
    roster: Vec<Entity>,
    current: Option<Entity>,
    role: DispatchRole,
    has_replay: bool,
}

impl PopupSequencer {
    pub fn current(&self) -> Option<Entity> {
        self.current
    }

    pub fn phase(&self) -> SequencerPhase {
        if self.current.is_some() {
            SequencerPhase::Showing
        } else {
            SequencerPhase::Idle
        }
    }

    pub fn has_replay(&self) -> bool {
        self.has_replay
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn shown_len(&self) -> usize {
        self.shown.len()
    }

    /// Clears every collection and returns all instances ever registered
    /// under the previous configuration, for despawning.
    pub fn reset(&mut self, has_replay: bool) -> Vec<Entity> {
        self.queue.clear();
        self.history.clear();
        self.shown.clear();
        self.current = None;
        self.role = DispatchRole::default();
        self.has_replay = has_replay;

        std::mem::take(&mut self.roster)
    }

    pub fn enqueue(&mut self, entity: Entity) {
        self.roster.push(entity);
        self.queue.push_back(entity);
    }

    /// Forward transition. While the queue holds popups the head becomes
    /// current and the previous current is pushed onto history; once the
    /// queue is exhausted the sequence finishes, requeuing the replay record
    /// first when replay is enabled. Requeuing clears history (an instance
    /// may not sit in both); without replay, history survives exhaustion so
    /// backward navigation can still step into the finished sequence.
    pub fn advance(&mut self) -> SequencerStep {
        match self.queue.pop_front() {
            Some(next) => {
                if let Some(previous) = self.current.replace(next) {
                    self.history.push(previous);
                }
                self.role = DispatchRole::Sequenced;
                if self.has_replay {
                    self.shown.push(next);
                }

                SequencerStep::Show(next)
            }
            None => {
                let requeued = if self.has_replay {
                    let count = self.shown.len();
                    self.queue.extend(self.shown.drain(..));
                    self.history.clear();
                    count
                } else {
                    0
                };
                self.current = None;

                SequencerStep::Finished { requeued }
            }
        }
    }

    /// Backward transition. Pops history into current; never re-enqueues
    /// anything into the forward queue.
    pub fn back(&mut self) -> SequencerStep {
        self.current = None;

        match self.history.pop() {
            Some(previous) => {
                self.current = Some(previous);
                self.role = DispatchRole::Sequenced;

                SequencerStep::Show(previous)
            }
            None => SequencerStep::Finished { requeued: 0 },
        }
    }

    /// Re-arms the current popup as a one-shot, leaving the queue and
    /// history untouched.
    pub fn reshow_current(&mut self) -> Option<Entity> {
        if self.current.is_some() {
            self.role = DispatchRole::OneShot;
        }

        self.current
    }

    /// Installs a freshly spawned instance as the one-shot current popup,
    /// returning whichever instance it superseded.
    pub fn register_one_shot(&mut self, entity: Entity) -> Option<Entity> {
        self.roster.push(entity);
        self.role = DispatchRole::OneShot;

        self.current.replace(entity)
    }

    /// Interprets a dismissal signal against the current popup's role.
    pub fn dispatch(&mut self, action: PopupAction) -> SequencerStep {
        match self.role {
            DispatchRole::Sequenced => match action {
                PopupAction::Advance => self.advance(),
                PopupAction::Back => self.back(),
            },
            DispatchRole::OneShot => {
                self.current = None;
                self.role = DispatchRole::Sequenced;

                SequencerStep::Dismissed
            }
        }
    }

    /* ─────────────────────  SYSTEMS  ───────────────────── */

    pub fn process_requests(
        mut commands: Commands,
        mut requests: EventReader<PopupRequest>,
        library: Res<PopupLibrary>,
        mut sequencer: ResMut<PopupSequencer>,
        mut containers: Query<(Entity, &mut ContainerVisibility), With<PopupContainer>>,
        mut instances: Query<&mut PopupInstance>,
        mut finished: EventWriter<PopupsFinished>,
    ) {
        let Ok((container, mut visibility)) = containers.single_mut() else {
            return;
        };

        for request in requests.read() {
            match request {
                PopupRequest::Configure {
                    kinds,
                    parameters,
                    has_replay,
                } => {
                    for stale in sequencer.reset(*has_replay) {
                        commands.entity(stale).despawn();
                    }
                    visibility.hide();

                    for (position, popup) in resolve_kinds(&library, kinds) {
                        let popup_parameters =
                            parameters.get(position).and_then(|entry| entry.as_ref());
                        let entity = PopupInstance::spawn(
                            &mut commands,
                            container,
                            popup,
                            popup_parameters,
                            false,
                        );
                        sequencer.enqueue(entity);
                    }
                }
                PopupRequest::ShowNext => {
                    suspend_open_current(&mut commands, &sequencer, &mut instances);
                    let step = sequencer.advance();
                    apply_step(
                        step,
                        &mut commands,
                        &mut visibility,
                        &mut instances,
                        &mut finished,
                    );
                }
                PopupRequest::ShowPrevious => {
                    suspend_open_current(&mut commands, &sequencer, &mut instances);
                    let step = sequencer.back();
                    apply_step(
                        step,
                        &mut commands,
                        &mut visibility,
                        &mut instances,
                        &mut finished,
                    );
                }
                PopupRequest::Show { kind, parameters } => {
                    if let Some(current) = sequencer.current() {
                        let same_kind = instances
                            .get(current)
                            .is_ok_and(|instance| instance.kind == *kind);
                        if same_kind {
                            sequencer.reshow_current();
                            visibility.show();
                            if let Ok(mut instance) = instances.get_mut(current) {
                                PopupInstance::start(&mut commands, current, &mut instance);
                            }
                            continue;
                        }
                    }

                    let Some(popup) = library.find(*kind) else {
                        warn!("popup definition not found: {kind}");
                        continue;
                    };

                    let entity = PopupInstance::spawn(
                        &mut commands,
                        container,
                        popup,
                        parameters.as_ref(),
                        true,
                    );
                    if let Some(superseded) = sequencer.register_one_shot(entity) {
                        if let Ok(mut instance) = instances.get_mut(superseded) {
                            PopupInstance::suspend(&mut commands, superseded, &mut instance);
                        }
                    }
                    visibility.show();
                }
            }
        }
    }

    /// Routes button activations to the popup that owns the button, then
    /// begins that popup's dismissal. Presses on anything but the current
    /// popup are ignored.
    pub fn handle_button_presses(
        mut commands: Commands,
        mut presses: EventReader<ButtonPressed<PopupAction>>,
        parents: Query<&ChildOf>,
        mut instances: Query<&mut PopupInstance>,
        sequencer: Res<PopupSequencer>,
        mut signals: EventWriter<PopupSignal>,
    ) {
        for press in presses.read() {
            let Some(root) = owning_popup(press.source, &parents, &instances) else {
                continue;
            };
            if sequencer.current() != Some(root) {
                continue;
            }
            let Ok(mut instance) = instances.get_mut(root) else {
                continue;
            };
            if !instance.open {
                continue;
            }

            PopupInstance::dismiss(&mut commands, root, &mut instance, press.action, &mut signals);
        }
    }

    pub fn dispatch_signals(
        mut commands: Commands,
        mut signals: EventReader<PopupSignal>,
        mut sequencer: ResMut<PopupSequencer>,
        mut containers: Query<&mut ContainerVisibility, With<PopupContainer>>,
        mut instances: Query<&mut PopupInstance>,
        mut finished: EventWriter<PopupsFinished>,
    ) {
        let Ok(mut visibility) = containers.single_mut() else {
            return;
        };

        for signal in signals.read() {
            // Signals from superseded instances are stale; only the current
            // popup may drive a transition.
            if sequencer.current() != Some(signal.source) {
                continue;
            }

            let step = sequencer.dispatch(signal.action);
            apply_step(
                step,
                &mut commands,
                &mut visibility,
                &mut instances,
                &mut finished,
            );
        }
    }
}

/* ─────────────────────────  HELPERS  ───────────────────────── */

/// Resolves each requested kind against the library, preserving the input
/// position so parameters stay aligned. Unresolved kinds are reported and
/// skipped; sequencing continues with the rest.
fn resolve_kinds<'a>(
    library: &'a PopupLibrary,
    kinds: &[PopupKind],
) -> Vec<(usize, &'a PopupDefinition)> {
    kinds
        .iter()
        .enumerate()
        .filter_map(|(position, kind)| match library.find(*kind) {
            Some(definition) => Some((position, definition)),
            None => {
                warn!("popup definition not found: {kind}");
                None
            }
        })
        .collect()
}

fn owning_popup(
    mut entity: Entity,
    parents: &Query<&ChildOf>,
    instances: &Query<&mut PopupInstance>,
) -> Option<Entity> {
    loop {
        if instances.contains(entity) {
            return Some(entity);
        }
        entity = parents.get(entity).ok()?.parent();
    }
}

/// A popup that is still on screen when navigation moves elsewhere is taken
/// down without a dismissal signal; the sequencer already decided where it
/// belongs.
fn suspend_open_current(
    commands: &mut Commands,
    sequencer: &PopupSequencer,
    instances: &mut Query<&mut PopupInstance>,
) {
    if let Some(current) = sequencer.current() {
        if let Ok(mut instance) = instances.get_mut(current) {
            if instance.open {
                PopupInstance::suspend(commands, current, &mut instance);
            }
        }
    }
}

fn apply_step(
    step: SequencerStep,
    commands: &mut Commands,
    visibility: &mut ContainerVisibility,
    instances: &mut Query<&mut PopupInstance>,
    finished: &mut EventWriter<PopupsFinished>,
) {
    match step {
        SequencerStep::Show(entity) => {
            visibility.show();
            if let Ok(mut instance) = instances.get_mut(entity) {
                PopupInstance::start(commands, entity, &mut instance);
            }
        }
        SequencerStep::Finished { requeued } => {
            visibility.hide();
            debug!("popup sequence exhausted ({requeued} requeued for replay)");
            finished.write(PopupsFinished);
        }
        SequencerStep::Dismissed => {
            visibility.hide();
        }
    }
}
