//! Keyboard focus confinement for the open modal.
//!
//! The trap captures the focusable elements once, when the modal opens.
//! Elements that appear or disappear afterwards are not picked up until the
//! next activation.

use crate::modal::view::ModalView;

/// Opaque handle of an interactive element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

/// Controls the modal itself renders; each maps to a stable [`ElementId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalControl {
    Close,
    Prev,
    Next,
    ZoomOut,
    ZoomIn,
    ToggleDetail(usize),
}

const TOGGLE_BASE: u32 = 100;

impl ModalControl {
    pub fn id(self) -> ElementId {
        match self {
            ModalControl::Close => ElementId(1),
            ModalControl::Prev => ElementId(2),
            ModalControl::Next => ElementId(3),
            ModalControl::ZoomOut => ElementId(4),
            ModalControl::ZoomIn => ElementId(5),
            ModalControl::ToggleDetail(row) => {
                ElementId(TOGGLE_BASE.saturating_add(u32::try_from(row).unwrap_or(u32::MAX)))
            }
        }
    }

    pub fn from_id(id: ElementId) -> Option<Self> {
        match id.0 {
            1 => Some(ModalControl::Close),
            2 => Some(ModalControl::Prev),
            3 => Some(ModalControl::Next),
            4 => Some(ModalControl::ZoomOut),
            5 => Some(ModalControl::ZoomIn),
            raw if raw >= TOGGLE_BASE => {
                Some(ModalControl::ToggleDetail((raw - TOGGLE_BASE) as usize))
            }
            _ => None,
        }
    }
}

/// Describes which elements inside the modal can take focus right now.
pub trait FocusScope {
    /// Enabled interactive elements in tab order.
    fn focusable_elements(&self, view: &ModalView) -> Vec<ElementId>;
}

impl FocusScope for Vec<ElementId> {
    fn focusable_elements(&self, _view: &ModalView) -> Vec<ElementId> {
        self.clone()
    }
}

/// Scope of the stock modal layout: close, navigation and zoom buttons, then
/// one expand toggle per long detail row. Disabled controls are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScope;

impl FocusScope for StandardScope {
    fn focusable_elements(&self, view: &ModalView) -> Vec<ElementId> {
        let mut elements = vec![ModalControl::Close.id()];
        if view.can_prev {
            elements.push(ModalControl::Prev.id());
        }
        if view.can_next {
            elements.push(ModalControl::Next.id());
        }
        if view.can_zoom {
            elements.push(ModalControl::ZoomOut.id());
            elements.push(ModalControl::ZoomIn.id());
        }
        elements.extend(
            view.details
                .iter()
                .filter(|row| row.truncatable)
                .map(|row| ModalControl::ToggleDetail(row.index).id()),
        );
        elements
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    Forward,
    Backward,
}

#[derive(Debug, Default)]
pub struct FocusTrap {
    captured: Vec<ElementId>,
    focused: Option<usize>,
    active: bool,
}

impl FocusTrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the scope's elements and focuses the first one.
    pub fn activate<S: FocusScope + ?Sized>(
        &mut self,
        scope: &S,
        view: &ModalView,
    ) -> Option<ElementId> {
        self.captured = scope.focusable_elements(view);
        self.active = true;
        self.focused = if self.captured.is_empty() {
            None
        } else {
            Some(0)
        };
        self.focused()
    }

    /// Moves focus within the captured set, wrapping at both ends. With an
    /// empty set focus stays where it is.
    pub fn cycle(&mut self, direction: FocusDirection) -> Option<ElementId> {
        if !self.active || self.captured.is_empty() {
            return self.focused();
        }
        let len = self.captured.len();
        let next = match (self.focused, direction) {
            (None, FocusDirection::Forward) => 0,
            (None, FocusDirection::Backward) => len - 1,
            (Some(current), FocusDirection::Forward) => (current + 1) % len,
            (Some(current), FocusDirection::Backward) => (current + len - 1) % len,
        };
        self.focused = Some(next);
        self.focused()
    }

    /// Clears the captured set and hands back the element to refocus.
    pub fn deactivate(&mut self, restore_to: Option<ElementId>) -> Option<ElementId> {
        self.captured.clear();
        self.focused = None;
        self.active = false;
        restore_to
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused.and_then(|slot| self.captured.get(slot).copied())
    }

    pub fn captured(&self) -> &[ElementId] {
        &self.captured
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<ElementId> {
        raw.iter().copied().map(ElementId).collect()
    }

    #[test]
    fn cycle_wraps_in_both_directions() {
        let mut trap = FocusTrap::new();
        let view = ModalView::default();
        assert_eq!(trap.activate(&ids(&[7, 8, 9]), &view), Some(ElementId(7)));
        assert_eq!(trap.cycle(FocusDirection::Forward), Some(ElementId(8)));
        assert_eq!(trap.cycle(FocusDirection::Forward), Some(ElementId(9)));
        assert_eq!(trap.cycle(FocusDirection::Forward), Some(ElementId(7)));
        assert_eq!(trap.cycle(FocusDirection::Backward), Some(ElementId(9)));
    }

    #[test]
    fn empty_scope_keeps_focus_unset() {
        let mut trap = FocusTrap::new();
        assert_eq!(trap.activate(&Vec::<ElementId>::new(), &ModalView::default()), None);
        assert_eq!(trap.cycle(FocusDirection::Forward), None);
        assert!(trap.is_active());
    }

    #[test]
    fn deactivate_clears_and_restores() {
        let mut trap = FocusTrap::new();
        trap.activate(&ids(&[1, 2]), &ModalView::default());
        assert_eq!(trap.deactivate(Some(ElementId(42))), Some(ElementId(42)));
        assert!(trap.captured().is_empty());
        assert_eq!(trap.focused(), None);
        assert_eq!(trap.cycle(FocusDirection::Forward), None);
    }

    #[test]
    fn standard_scope_skips_disabled_controls() {
        let view = ModalView {
            can_prev: false,
            can_next: true,
            can_zoom: true,
            ..ModalView::default()
        };
        assert_eq!(
            StandardScope.focusable_elements(&view),
            vec![
                ModalControl::Close.id(),
                ModalControl::Next.id(),
                ModalControl::ZoomOut.id(),
                ModalControl::ZoomIn.id(),
            ]
        );
    }

    #[test]
    fn control_ids_round_trip() {
        for control in [
            ModalControl::Close,
            ModalControl::Prev,
            ModalControl::Next,
            ModalControl::ZoomOut,
            ModalControl::ZoomIn,
            ModalControl::ToggleDetail(3),
        ] {
            assert_eq!(ModalControl::from_id(control.id()), Some(control));
        }
        assert_eq!(ModalControl::from_id(ElementId(0)), None);
    }
}
