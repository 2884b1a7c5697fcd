use iced::keyboard::{key::Named, Key, Modifiers};
use vistacore::modal::NavKey;

/// Maps a key press to the modal key it stands for, if any.
pub fn nav_key(key: &Key, modifiers: Modifiers) -> Option<NavKey> {
    match key.as_ref() {
        Key::Named(Named::Escape) => Some(NavKey::Escape),
        Key::Named(Named::ArrowLeft) => Some(NavKey::ArrowLeft),
        Key::Named(Named::ArrowRight) => Some(NavKey::ArrowRight),
        Key::Named(Named::Tab) if modifiers.shift() => Some(NavKey::ShiftTab),
        Key::Named(Named::Tab) => Some(NavKey::Tab),
        Key::Named(Named::Enter) | Key::Named(Named::Space) => Some(NavKey::Activate),
        Key::Character("+") | Key::Character("=") => Some(NavKey::ZoomIn),
        Key::Character("-") | Key::Character("_") => Some(NavKey::ZoomOut),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_escape_map_directly() {
        let none = Modifiers::empty();
        assert_eq!(nav_key(&Key::Named(Named::Escape), none), Some(NavKey::Escape));
        assert_eq!(nav_key(&Key::Named(Named::ArrowLeft), none), Some(NavKey::ArrowLeft));
        assert_eq!(nav_key(&Key::Named(Named::ArrowRight), none), Some(NavKey::ArrowRight));
    }

    #[test]
    fn shift_reverses_tab() {
        let tab = Key::Named(Named::Tab);
        assert_eq!(nav_key(&tab, Modifiers::empty()), Some(NavKey::Tab));
        assert_eq!(nav_key(&tab, Modifiers::SHIFT), Some(NavKey::ShiftTab));
    }

    #[test]
    fn zoom_keys_accept_unshifted_variants() {
        let none = Modifiers::empty();
        assert_eq!(nav_key(&Key::Character("+".into()), none), Some(NavKey::ZoomIn));
        assert_eq!(nav_key(&Key::Character("=".into()), none), Some(NavKey::ZoomIn));
        assert_eq!(nav_key(&Key::Character("-".into()), none), Some(NavKey::ZoomOut));
        assert_eq!(nav_key(&Key::Character("a".into()), none), None);
    }
}
