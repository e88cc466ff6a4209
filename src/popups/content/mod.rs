/// Embedded popup definition sets, authored as JSON.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PopupSet {
    Onboarding,
}

impl PopupSet {
    pub fn content(&self) -> &'static str {
        match self {
            Self::Onboarding => include_str!("./onboarding.json"),
        }
    }
}
