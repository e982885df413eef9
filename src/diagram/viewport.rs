//! Viewport size and resize-listener registry.
//!
//! Renderers subscribe while initialised and must unsubscribe on destroy.
//! [`Viewport::resize`] returns the listeners to notify; the host forwards
//! the new width to each of them.

use std::collections::BTreeSet;

/// Handle of a registered resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
pub struct Viewport {
    width: f32,
    height: f32,
    listeners: BTreeSet<ListenerId>,
    next_id: u64,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            listeners: BTreeSet::new(),
            next_id: 0,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn subscribe(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id);
        id
    }

    /// Returns `false` if the listener was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id)
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.listeners.contains(&id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Updates the size and returns the listeners to notify.
    ///
    /// Nobody is notified when the width is unchanged.
    pub fn resize(&mut self, width: f32, height: f32) -> Vec<ListenerId> {
        let width_changed = (self.width - width).abs() > f32::EPSILON;
        self.width = width;
        self.height = height;
        if width_changed {
            self.listeners.iter().copied().collect()
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut viewport = Viewport::new(800.0, 600.0);
        let a = viewport.subscribe();
        let b = viewport.subscribe();
        assert_ne!(a, b);
        assert_eq!(viewport.listener_count(), 2);
        assert!(viewport.unsubscribe(a));
        assert!(!viewport.unsubscribe(a));
        assert!(viewport.is_subscribed(b));
    }

    #[test]
    fn test_resize_notifies_on_width_change_only() {
        let mut viewport = Viewport::new(800.0, 600.0);
        let id = viewport.subscribe();
        assert!(viewport.resize(800.0, 400.0).is_empty());
        assert_eq!(viewport.resize(500.0, 400.0), vec![id]);
        assert_eq!(viewport.size(), (500.0, 400.0));
    }
}
