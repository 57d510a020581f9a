//! Headless popup behaviors: outside dismissal and roving menu focus.
//!
//! Both are pure state machines. The host UI reports pointer and key
//! events and carries out the returned [`MenuAction`].

/// Keys the menu reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
    ArrowDown,
    ArrowUp,
    Home,
    End,
    Escape,
    Tab { shift: bool },
    /// Anything else; ignored.
    Other,
}

/// What the host should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Nothing to do; let the event proceed.
    None,
    /// Move focus to the item at this index. The host should suppress the
    /// key's default behavior.
    Focus(usize),
    /// Close the menu. When `focus_trigger` is set focus returns to the
    /// trigger button, otherwise it is left where the event sends it.
    Close { focus_trigger: bool },
}

/// Dismissal on outside pointer-down or Escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutsideDismiss {
    pub enabled: bool,
    /// Also dismiss on Escape
    pub escape: bool,
}

impl Default for OutsideDismiss {
    fn default() -> Self {
        Self {
            enabled: true,
            escape: true,
        }
    }
}

impl OutsideDismiss {
    /// Whether a pointer-down should dismiss. `inside` is true when the
    /// event target lies within the bound element.
    pub fn on_pointer_down(&self, inside: bool) -> bool {
        self.enabled && !inside
    }

    pub fn on_key(&self, key: MenuKey) -> bool {
        self.enabled && self.escape && key == MenuKey::Escape
    }
}

/// Roving focus over the enabled items of an open menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuFocus {
    open: bool,
    item_count: usize,
    focused: Option<usize>,
}

impl MenuFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Open with `item_count` enabled items and focus the first one.
    pub fn open(&mut self, item_count: usize) -> MenuAction {
        self.open = true;
        self.item_count = item_count;
        self.focused = None;
        if item_count == 0 {
            return MenuAction::None;
        }
        self.focus(0)
    }

    /// Close from the host side (trigger toggled) and return focus to the trigger.
    pub fn close(&mut self) -> MenuAction {
        self.close_with(true)
    }

    /// Report that focus moved to an item by other means (e.g. hover).
    pub fn set_focused(&mut self, index: Option<usize>) {
        self.focused = index.filter(|i| *i < self.item_count);
    }

    /// Update the number of enabled items while open.
    pub fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
        if self.focused.map_or(false, |i| i >= item_count) {
            self.focused = None;
        }
    }

    pub fn on_key(&mut self, key: MenuKey) -> MenuAction {
        if !self.open || self.item_count == 0 {
            return MenuAction::None;
        }
        let last = self.item_count - 1;

        match key {
            MenuKey::ArrowDown => match self.focused {
                Some(i) if i < last => self.focus(i + 1),
                _ => self.focus(0),
            },
            MenuKey::ArrowUp => match self.focused {
                Some(i) if i > 0 => self.focus(i - 1),
                _ => self.focus(last),
            },
            MenuKey::Home => self.focus(0),
            MenuKey::End => self.focus(last),
            MenuKey::Escape => self.close_with(true),
            MenuKey::Tab { shift: true } if self.focused == Some(0) => self.close_with(false),
            MenuKey::Tab { shift: false } if self.focused == Some(last) => self.close_with(false),
            MenuKey::Tab { .. } | MenuKey::Other => MenuAction::None,
        }
    }

    pub fn on_pointer_down(&mut self, inside: bool) -> MenuAction {
        if !self.open || inside {
            return MenuAction::None;
        }
        self.close_with(false)
    }

    fn focus(&mut self, index: usize) -> MenuAction {
        self.focused = Some(index);
        MenuAction::Focus(index)
    }

    fn close_with(&mut self, focus_trigger: bool) -> MenuAction {
        if !self.open {
            return MenuAction::None;
        }
        self.open = false;
        self.focused = None;
        MenuAction::Close { focus_trigger }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_dismiss() {
        let dismiss = OutsideDismiss::default();
        assert!(dismiss.on_pointer_down(false));
        assert!(!dismiss.on_pointer_down(true));
        assert!(dismiss.on_key(MenuKey::Escape));
        assert!(!dismiss.on_key(MenuKey::Home));

        let no_escape = OutsideDismiss {
            escape: false,
            ..Default::default()
        };
        assert!(!no_escape.on_key(MenuKey::Escape));

        let disabled = OutsideDismiss {
            enabled: false,
            escape: true,
        };
        assert!(!disabled.on_pointer_down(false));
        assert!(!disabled.on_key(MenuKey::Escape));
    }

    #[test]
    fn open_focuses_first() {
        let mut menu = MenuFocus::new();
        assert_eq!(menu.open(3), MenuAction::Focus(0));
        assert!(menu.is_open());
        assert_eq!(menu.focused(), Some(0));
    }

    #[test]
    fn arrows_wrap() {
        let mut menu = MenuFocus::new();
        menu.open(3);
        assert_eq!(menu.on_key(MenuKey::ArrowDown), MenuAction::Focus(1));
        assert_eq!(menu.on_key(MenuKey::ArrowDown), MenuAction::Focus(2));
        assert_eq!(menu.on_key(MenuKey::ArrowDown), MenuAction::Focus(0));
        assert_eq!(menu.on_key(MenuKey::ArrowUp), MenuAction::Focus(2));
    }

    #[test]
    fn arrows_from_unfocused() {
        let mut menu = MenuFocus::new();
        menu.open(3);
        menu.set_focused(None);
        assert_eq!(menu.on_key(MenuKey::ArrowDown), MenuAction::Focus(0));
        menu.set_focused(None);
        assert_eq!(menu.on_key(MenuKey::ArrowUp), MenuAction::Focus(2));
    }

    #[test]
    fn home_end() {
        let mut menu = MenuFocus::new();
        menu.open(4);
        assert_eq!(menu.on_key(MenuKey::End), MenuAction::Focus(3));
        assert_eq!(menu.on_key(MenuKey::Home), MenuAction::Focus(0));
    }

    #[test]
    fn escape_returns_focus_to_trigger() {
        let mut menu = MenuFocus::new();
        menu.open(2);
        assert_eq!(
            menu.on_key(MenuKey::Escape),
            MenuAction::Close {
                focus_trigger: true
            }
        );
        assert!(!menu.is_open());
        assert_eq!(menu.on_key(MenuKey::ArrowDown), MenuAction::None);
    }

    #[test]
    fn tab_past_edges_closes_without_refocus() {
        let mut menu = MenuFocus::new();
        menu.open(2);
        assert_eq!(
            menu.on_key(MenuKey::Tab { shift: true }),
            MenuAction::Close {
                focus_trigger: false
            }
        );

        menu.open(2);
        assert_eq!(menu.on_key(MenuKey::Tab { shift: false }), MenuAction::None);
        menu.on_key(MenuKey::End);
        assert_eq!(
            menu.on_key(MenuKey::Tab { shift: false }),
            MenuAction::Close {
                focus_trigger: false
            }
        );
    }

    #[test]
    fn pointer_outside_closes() {
        let mut menu = MenuFocus::new();
        menu.open(2);
        assert_eq!(menu.on_pointer_down(true), MenuAction::None);
        assert_eq!(
            menu.on_pointer_down(false),
            MenuAction::Close {
                focus_trigger: false
            }
        );
        assert_eq!(menu.on_pointer_down(false), MenuAction::None);
    }

    #[test]
    fn empty_menu_ignores_keys() {
        let mut menu = MenuFocus::new();
        assert_eq!(menu.open(0), MenuAction::None);
        assert_eq!(menu.on_key(MenuKey::ArrowDown), MenuAction::None);
        assert_eq!(menu.on_key(MenuKey::Escape), MenuAction::None);
    }

    #[test]
    fn shrinking_items_drops_focus() {
        let mut menu = MenuFocus::new();
        menu.open(3);
        menu.on_key(MenuKey::End);
        menu.set_item_count(2);
        assert_eq!(menu.focused(), None);
        assert_eq!(menu.close(), MenuAction::Close { focus_trigger: true });
    }
}
