//! Document-wide theme marker.
//!
//! Stands in for the host document's dark/light class toggle: the embedding
//! layer reads this state after reconciliation and mirrors it onto whatever
//! surface it paints. Only session resolution and shell messages write it.

use std::any::Any;

use conship_states::State;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemeMarker {
    dark: bool,
}

impl ThemeMarker {
    pub fn apply(&mut self, dark: bool) {
        self.dark = dark;
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }
}

impl State for ThemeMarker {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
