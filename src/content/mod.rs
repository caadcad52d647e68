//! Content data model: notes, practice items, the loaded-once store and the
//! anti-repeat sampler over it.

pub mod item;
pub mod note;
pub mod sampler;
pub mod store;

pub use item::{ContentItem, Inversion, ItemSpec, TonicPosition};
pub use note::Note;
pub use sampler::Sampler;
pub use store::ContentStore;
