//! Re-attaching behaviour to plain-data nodes.
//!
//! Saved boards carry only data. After a load (or when a node is created)
//! each node gets the callbacks its kind supports. A callback never touches
//! the board itself: it enqueues a [`BoardCommand`] that the owning
//! [`BoardStore`](crate::store::BoardStore) applies on its next
//! `apply_pending`.

use crate::board::BoardDocument;
use crate::nodes::{Node, NodeData, NodeId};
use crate::store::BoardCommand;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Shared FIFO of commands raised by node callbacks.
#[derive(Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<BoardCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<BoardCommand>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, command: BoardCommand) {
        self.lock().push_back(command);
    }

    /// Take every queued command, oldest first.
    pub fn drain(&self) -> Vec<BoardCommand> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue").field("pending", &self.len()).finish()
    }
}

/// Callbacks attached to a node. Which ones are present depends on the kind.
#[derive(Clone, Default)]
pub struct NodeCallbacks {
    pub on_delete: Option<Arc<dyn Fn() + Send + Sync>>,
    /// Section id and its new lines.
    pub on_update_content: Option<Callback<(String, Vec<String>)>>,
    /// New HTML body of a sticky note.
    pub on_change: Option<Callback<String>>,
    pub on_color_change: Option<Callback<String>>,
}

impl NodeCallbacks {
    /// Whether any behaviour has been attached.
    pub fn is_attached(&self) -> bool {
        self.on_delete.is_some()
            || self.on_update_content.is_some()
            || self.on_change.is_some()
            || self.on_color_change.is_some()
    }

    /// Fire `on_delete`. Returns false if the node has no such callback.
    pub fn delete(&self) -> bool {
        match &self.on_delete {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }

    pub fn update_content(&self, section_id: &str, lines: Vec<String>) -> bool {
        match &self.on_update_content {
            Some(cb) => {
                cb((section_id.to_string(), lines));
                true
            }
            None => false,
        }
    }

    pub fn change_text(&self, html: &str) -> bool {
        match &self.on_change {
            Some(cb) => {
                cb(html.to_string());
                true
            }
            None => false,
        }
    }

    pub fn change_color(&self, color: &str) -> bool {
        match &self.on_color_change {
            Some(cb) => {
                cb(color.to_string());
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for NodeCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCallbacks")
            .field("on_delete", &self.on_delete.is_some())
            .field("on_update_content", &self.on_update_content.is_some())
            .field("on_change", &self.on_change.is_some())
            .field("on_color_change", &self.on_color_change.is_some())
            .finish()
    }
}

fn delete_callback(id: &NodeId, queue: &CommandQueue) -> Arc<dyn Fn() + Send + Sync> {
    let id = id.clone();
    let queue = queue.clone();
    Arc::new(move || queue.push(BoardCommand::Delete(id.clone())))
}

/// Build the callbacks a node of this kind supports.
pub fn callbacks_for(node: &Node, queue: &CommandQueue) -> NodeCallbacks {
    let id = &node.id;
    match &node.data {
        NodeData::Framework(_) => {
            let node_id = id.clone();
            let q = queue.clone();
            NodeCallbacks {
                on_delete: Some(delete_callback(id, queue)),
                on_update_content: Some(Arc::new(move |(section, lines): (String, Vec<String>)| {
                    q.push(BoardCommand::UpdateContent {
                        node: node_id.clone(),
                        section,
                        lines,
                    })
                })),
                ..Default::default()
            }
        }
        NodeData::StickyNote(_) => {
            let text_id = id.clone();
            let text_q = queue.clone();
            let color_id = id.clone();
            let color_q = queue.clone();
            NodeCallbacks {
                on_delete: Some(delete_callback(id, queue)),
                on_change: Some(Arc::new(move |html: String| {
                    text_q.push(BoardCommand::ChangeText {
                        node: text_id.clone(),
                        html,
                    })
                })),
                on_color_change: Some(Arc::new(move |color: String| {
                    color_q.push(BoardCommand::ChangeColor {
                        node: color_id.clone(),
                        color,
                    })
                })),
                ..Default::default()
            }
        }
        NodeData::Image(_) => NodeCallbacks {
            on_delete: Some(delete_callback(id, queue)),
            ..Default::default()
        },
    }
}

/// Attach callbacks to a node that has none. Returns true if the node was
/// changed.
pub fn hydrate(node: &mut Node, queue: &CommandQueue) -> bool {
    if node.callbacks.is_attached() {
        return false;
    }
    node.callbacks = callbacks_for(node, queue);
    true
}

/// Hydrate every node of a document. Returns how many nodes were hydrated.
pub fn hydrate_all(doc: &mut BoardDocument, queue: &CommandQueue) -> usize {
    let count = doc
        .nodes
        .iter_mut()
        .map(|node| hydrate(node, queue))
        .filter(|changed| *changed)
        .count();
    if count > 0 {
        log::debug!("Hydrated {} node(s)", count);
    }
    count
}
