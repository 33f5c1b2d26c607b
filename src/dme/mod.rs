//! Domain object tree.
//!
//! Turns the generic element arena into typed `Dme*` values. Every type
//! implements [`FromElement`] with the element type string it accepts;
//! building starts at [`DmElement::from_document`].
//!
//! ```text
//! DmElement
//! ├── model / skeleton: DmeModel
//! │   └── children: DagNode { Dag | Joint | Attachment | Mesh }
//! │       └── DmeMesh → DmeVertexData, DmeFaceSet → DmeMaterial
//! └── animationList: DmeAnimationList
//!     └── DmeChannelsClip → DmeChannel → ChannelLog → DmeLogLayer
//! ```

mod animation;
mod context;
mod dag;
mod mesh;
mod root;
mod transform;

pub use animation::*;
pub use context::*;
pub use dag::*;
pub use mesh::*;
pub use root::*;
pub use transform::*;
