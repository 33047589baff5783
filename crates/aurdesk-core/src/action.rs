use std::collections::BTreeMap;

/// Classification of a staged package action.
///
/// "No pending action" is `Option::None` at call sites; the ledger itself
/// only ever stores these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionType {
    Install,
    Remove,
    Update,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
            Self::Update => "update",
        }
    }
}

/// The staged-action queue: one ordered name list per classification.
///
/// `toggle` and `drain` are the entire mutation surface. A name appears in
/// at most one list and at most once within it; toggling a name that is
/// queued elsewhere moves it rather than duplicating it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLedger {
    entries: BTreeMap<ActionType, Vec<String>>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `name` under `action`, or de-stages it if it is already
    /// queued there. Returns whether the name is staged afterwards.
    pub fn toggle(&mut self, action: ActionType, name: &str) -> bool {
        if let Some(list) = self.entries.get_mut(&action) {
            if let Some(position) = list.iter().position(|queued| queued == name) {
                list.remove(position);
                if list.is_empty() {
                    self.entries.remove(&action);
                }
                return false;
            }
        }

        self.remove_everywhere(name);
        self.entries
            .entry(action)
            .or_default()
            .push(name.to_string());
        true
    }

    /// Empties one classification and hands its contents to the caller, so
    /// a re-triggered execution cannot submit the same names twice.
    pub fn drain(&mut self, action: ActionType) -> Vec<String> {
        self.entries.remove(&action).unwrap_or_default()
    }

    pub fn queued(&self, action: ActionType) -> &[String] {
        self.entries
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The classification `name` is currently staged under, if any.
    pub fn classification_of(&self, name: &str) -> Option<ActionType> {
        self.entries
            .iter()
            .find(|(_, list)| list.iter().any(|queued| queued == name))
            .map(|(action, _)| *action)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_everywhere(&mut self, name: &str) {
        self.entries
            .values_mut()
            .for_each(|list| list.retain(|queued| queued != name));
        self.entries.retain(|_, list| !list.is_empty());
    }
}
