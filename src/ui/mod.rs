#[cfg(feature = "hydrate")]
pub mod local_storage;
#[cfg(feature = "hydrate")]
pub mod message_listener;
pub mod visualizer_context;

#[cfg(feature = "hydrate")]
pub use local_storage::LocalStoragePersistence;
pub use visualizer_context::{VisualizerContext, provide_visualizer_context, use_visualizer_context};
