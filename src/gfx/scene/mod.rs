//! # Scene
//!
//! The entities the frame loop reads every iteration ([`Scene`]), their
//! [`Transform`]s, the vertex record uploaded to the GPU and the GPU objects
//! that hold the scene ([`SceneResources`]).

pub mod scene;
pub mod scene_resources;
pub mod transform;
pub mod vertex;

// Re-export main types
pub use scene::Scene;
pub use scene_resources::SceneResources;
pub use transform::Transform;
pub use vertex::DiffuseVertex;
