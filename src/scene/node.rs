use crate::signal::Signal;
use glam::Mat4;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

pub type NodeRef = Arc<Node>;

/// One entity in the host scene graph.
pub struct Node {
    id: u64,
    name: String,
    transform: RwLock<Mat4>,
    children: Mutex<Vec<NodeRef>>,
    /// Fired after the world transform is replaced.
    pub transform_changed: Signal<()>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> NodeRef {
        Self::with_transform(name, Mat4::IDENTITY)
    }

    pub fn with_transform(name: impl Into<String>, transform: Mat4) -> NodeRef {
        Arc::new(Self {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            transform: RwLock::new(transform),
            children: Mutex::new(Vec::new()),
            transform_changed: Signal::new(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> Mat4 {
        *self.transform.read()
    }

    pub fn set_transform(&self, transform: Mat4) {
        *self.transform.write() = transform;
        self.transform_changed.emit(&());
    }

    pub fn add_child(&self, child: NodeRef) {
        self.children.lock().push(child);
    }

    /// Detach a child; true when it was present.
    pub fn remove_child(&self, child: &NodeRef) -> bool {
        let mut children = self.children.lock();
        let before = children.len();
        children.retain(|existing| existing.id != child.id);
        children.len() != before
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.children.lock().clone()
    }

    pub fn find_child(&self, name: &str) -> Option<NodeRef> {
        self.children
            .lock()
            .iter()
            .find(|child| child.name == name)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_node_ids_are_unique() {
        let a = Node::new("a");
        let b = Node::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_set_transform_fires_signal() {
        let node = Node::new("tracked");
        let fired = Arc::new(Mutex::new(0));

        let sink = fired.clone();
        let _slot = node.transform_changed.connect(move |_| *sink.lock() += 1);

        node.set_transform(Mat4::from_translation(Vec3::X));
        assert_eq!(*fired.lock(), 1);
        assert_eq!(node.transform(), Mat4::from_translation(Vec3::X));
    }

    #[test]
    fn test_child_lookup_and_removal() {
        let root = Node::new("root");
        let left = Node::new("left_eye");
        root.add_child(left.clone());
        root.add_child(Node::new("right_eye"));

        assert_eq!(root.children().len(), 2);
        assert!(root.find_child("left_eye").is_some());
        assert!(root.find_child("missing").is_none());

        assert!(root.remove_child(&left));
        assert!(!root.remove_child(&left));
        assert_eq!(root.children().len(), 1);
    }
}
