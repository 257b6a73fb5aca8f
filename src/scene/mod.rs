/// Scene graph seam
///
/// The slice of the host scene graph both bridges consume: named nodes with a
/// world transform and child links. Anything richer stays on the host side.

pub mod node;

pub use node::{Node, NodeRef};
