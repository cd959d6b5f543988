//! StratBoard Core Library
//!
//! Platform-agnostic board model, framework catalog, persistence and export
//! for the StratBoard strategic-analysis whiteboard.

pub mod board;
pub mod camera;
pub mod edge;
pub mod export;
pub mod frameworks;
pub mod hydrate;
pub mod instantiate;
pub mod nodes;
pub mod session;
pub mod storage;
pub mod store;

pub use board::{BoardDocument, BoardError, BoardResult};
pub use camera::Camera;
pub use edge::{Connection, Edge};
pub use frameworks::{Catalog, DiagramKind, Framework, FrameworkCategory, FrameworkSection};
pub use hydrate::{CommandQueue, NodeCallbacks};
pub use instantiate::{ClipboardItem, DropPayload};
pub use nodes::{Anchor, Node, NodeData, NodeId, NodeKind, NodeSize, Position};
pub use session::BoardSession;
pub use storage::{Persistence, Project, Storage, StorageError, StorageMode, StorageResult};
pub use store::{BoardCommand, BoardStore};
