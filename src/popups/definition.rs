use std::time::Duration;

use bevy::{math::curve::EaseFunction, prelude::*};
use enum_map::{Enum, EnumMap};
use serde::{Deserialize, Serialize};

use super::content::PopupSet;

#[derive(Enum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupKind {
    Warning,
    Error,
    Welcome,
}

impl std::fmt::Display for PopupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Serializable mirror of the Bevy easing functions popups are allowed to use.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupEasing {
    Linear,
    BackIn,
    #[default]
    BackOut,
    CubicIn,
    CubicOut,
    SineInOut,
}

impl PopupEasing {
    pub fn ease_function(self) -> EaseFunction {
        match self {
            PopupEasing::Linear => EaseFunction::Linear,
            PopupEasing::BackIn => EaseFunction::BackIn,
            PopupEasing::BackOut => EaseFunction::BackOut,
            PopupEasing::CubicIn => EaseFunction::CubicIn,
            PopupEasing::CubicOut => EaseFunction::CubicOut,
            PopupEasing::SineInOut => EaseFunction::SineInOut,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PopupAnimation {
    pub animation_secs: f32,
    pub easing: PopupEasing,
    pub start_scale: Vec3,
    pub end_scale: Vec3,
}

impl PopupAnimation {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.animation_secs.max(0.0))
    }
}

impl Default for PopupAnimation {
    fn default() -> Self {
        Self {
            animation_secs: 0.5,
            easing: PopupEasing::default(),
            start_scale: Vec3::ZERO,
            end_scale: Vec3::ONE,
        }
    }
}

/// Static description of one popup. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct PopupDefinition {
    pub kind: PopupKind,
    pub message: String,
    pub background: Color,
    pub animation: PopupAnimation,
    pub has_next_button: bool,
    pub has_back_button: bool,
    pub auto_close: bool,
    pub auto_close_secs: f32,
}

impl PopupDefinition {
    /// Authored values below zero collapse to an immediate close.
    pub fn auto_close_delay(&self) -> Duration {
        Duration::from_secs_f32(self.auto_close_secs.max(0.0))
    }
}

/// Ordered definition store with a kind index built once at load time.
/// Duplicate kinds keep the first entry, by construction order.
#[derive(Resource, Default)]
pub struct PopupLibrary {
    definitions: Vec<PopupDefinition>,
    index: EnumMap<PopupKind, Option<usize>>,
}

impl PopupLibrary {
    pub fn new(definitions: Vec<PopupDefinition>) -> Self {
        let mut index: EnumMap<PopupKind, Option<usize>> = EnumMap::default();

        for (position, definition) in definitions.iter().enumerate() {
            if index[definition.kind].is_none() {
                index[definition.kind] = Some(position);
            }
        }

        Self { definitions, index }
    }

    pub fn load(content: &PopupSet) -> Self {
        let loaded: PopupSetLoader =
            serde_json::from_str(content.content()).expect("Failed to parse embedded JSON");

        Self::new(loaded.popups.into_iter().map(PopupDefinition::from).collect())
    }

    pub fn find(&self, kind: PopupKind) -> Option<&PopupDefinition> {
        self.index[kind].map(|position| &self.definitions[position])
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn default_true() -> bool {
    true
}

fn default_animation_secs() -> f32 {
    0.5
}

fn default_auto_close_secs() -> f32 {
    3.0
}

fn default_start_scale() -> [f32; 3] {
    [0.0; 3]
}

fn default_end_scale() -> [f32; 3] {
    [1.0; 3]
}

fn default_background() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

#[derive(Serialize, Deserialize, Debug)]
struct PopupAnimationLoader {
    #[serde(default = "default_animation_secs")]
    animation_secs: f32,
    #[serde(default)]
    easing: PopupEasing,
    #[serde(default = "default_start_scale")]
    start_scale: [f32; 3],
    #[serde(default = "default_end_scale")]
    end_scale: [f32; 3],
}

impl Default for PopupAnimationLoader {
    fn default() -> Self {
        Self {
            animation_secs: default_animation_secs(),
            easing: PopupEasing::default(),
            start_scale: default_start_scale(),
            end_scale: default_end_scale(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct PopupDefinitionLoader {
    kind: PopupKind,
    message: String,
    #[serde(default = "default_background")]
    background: [f32; 4],
    #[serde(default)]
    animation: PopupAnimationLoader,
    #[serde(default = "default_true")]
    has_next_button: bool,
    #[serde(default = "default_true")]
    has_back_button: bool,
    #[serde(default)]
    auto_close: bool,
    #[serde(default = "default_auto_close_secs")]
    auto_close_secs: f32,
}

#[derive(Serialize, Deserialize, Debug)]
struct PopupSetLoader {
    popups: Vec<PopupDefinitionLoader>,
}

impl From<PopupDefinitionLoader> for PopupDefinition {
    fn from(loader: PopupDefinitionLoader) -> Self {
        let [red, green, blue, alpha] = loader.background;
        let animation = loader.animation;

        Self {
            kind: loader.kind,
            message: loader.message,
            background: Color::srgba(red, green, blue, alpha),
            animation: PopupAnimation {
                animation_secs: animation.animation_secs,
                easing: animation.easing,
                start_scale: Vec3::from_array(animation.start_scale),
                end_scale: Vec3::from_array(animation.end_scale),
            },
            has_next_button: loader.has_next_button,
            has_back_button: loader.has_back_button,
            auto_close: loader.auto_close,
            auto_close_secs: loader.auto_close_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(kind: PopupKind, message: &str) -> PopupDefinition {
        PopupDefinition {
            kind,
            message: message.into(),
            background: Color::WHITE,
            animation: PopupAnimation::default(),
            has_next_button: true,
            has_back_button: true,
            auto_close: false,
            auto_close_secs: 3.0,
        }
    }

    #[test]
    fn lookup_returns_first_match_for_duplicate_kinds() {
        let library = PopupLibrary::new(vec![
            definition(PopupKind::Warning, "first"),
            definition(PopupKind::Warning, "second"),
            definition(PopupKind::Welcome, "hello"),
        ]);

        assert_eq!(library.find(PopupKind::Warning).unwrap().message, "first");
        assert_eq!(library.find(PopupKind::Welcome).unwrap().message, "hello");
    }

    #[test]
    fn lookup_of_missing_kind_returns_none() {
        let library = PopupLibrary::new(vec![definition(PopupKind::Welcome, "hello")]);

        assert!(library.find(PopupKind::Error).is_none());
    }

    #[test]
    fn negative_auto_close_time_clamps_to_zero() {
        let mut popup = definition(PopupKind::Error, "oops");
        popup.auto_close_secs = -2.0;

        assert_eq!(popup.auto_close_delay(), Duration::ZERO);
    }

    #[test]
    fn loader_defaults_match_authoring_defaults() {
        let loaded: PopupDefinitionLoader =
            serde_json::from_str(r#"{ "kind": "Welcome", "message": "hi" }"#)
                .expect("minimal definition should parse");
        let popup = PopupDefinition::from(loaded);

        assert!(popup.has_next_button);
        assert!(popup.has_back_button);
        assert!(!popup.auto_close);
        assert_eq!(popup.auto_close_secs, 3.0);
        assert_eq!(popup.animation.start_scale, Vec3::ZERO);
        assert_eq!(popup.animation.end_scale, Vec3::ONE);
        assert_eq!(popup.animation.easing, PopupEasing::BackOut);
    }

    #[test]
    fn embedded_onboarding_set_parses_and_indexes() {
        let library = PopupLibrary::load(&PopupSet::Onboarding);

        assert_eq!(library.len(), 3);
        assert!(library.find(PopupKind::Welcome).is_some());
        assert!(library.find(PopupKind::Warning).is_some());
        assert!(library.find(PopupKind::Error).unwrap().auto_close);
    }
}
