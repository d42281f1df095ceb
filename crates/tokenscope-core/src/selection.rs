/// Which token, if any, the user has picked. Clicking the selected token
/// again deselects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected(usize),
    Deselected(usize),
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<usize> {
        self.index
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.index == Some(index)
    }

    pub fn toggle(&mut self, index: usize) -> Toggle {
        if self.index == Some(index) {
            self.index = None;
            Toggle::Deselected(index)
        } else {
            self.index = Some(index);
            Toggle::Selected(index)
        }
    }

    pub fn clear(&mut self) -> Option<usize> {
        self.index.take()
    }

    /// Drop the selection if it no longer points into a sequence of `len`
    /// tokens. Returns true when it was dropped.
    pub fn retain_within(&mut self, len: usize) -> bool {
        match self.index {
            Some(i) if i >= len => {
                self.index = None;
                true
            }
            _ => false,
        }
    }

    /// 1-based "Token n of m" label for display.
    pub fn label(&self, total: usize) -> Option<String> {
        self.index
            .map(|i| format!("Token {} of {}", i + 1, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_returns_to_empty() {
        let mut sel = Selection::new();
        assert_eq!(sel.toggle(2), Toggle::Selected(2));
        assert_eq!(sel.current(), Some(2));
        assert_eq!(sel.toggle(2), Toggle::Deselected(2));
        assert_eq!(sel.current(), None);
    }

    #[test]
    fn test_toggle_other_index_moves_selection() {
        let mut sel = Selection::new();
        sel.toggle(1);
        assert_eq!(sel.toggle(3), Toggle::Selected(3));
        assert!(sel.is_selected(3));
        assert!(!sel.is_selected(1));
    }

    #[test]
    fn test_retain_within() {
        let mut sel = Selection::new();
        sel.toggle(4);
        assert!(!sel.retain_within(5));
        assert_eq!(sel.current(), Some(4));
        assert!(sel.retain_within(4));
        assert_eq!(sel.current(), None);
        assert!(!sel.retain_within(0));
    }

    #[test]
    fn test_label_is_one_based() {
        let mut sel = Selection::new();
        assert!(sel.label(3).is_none());
        sel.toggle(0);
        assert_eq!(sel.label(3).as_deref(), Some("Token 1 of 3"));
    }
}
