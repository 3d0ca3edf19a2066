pub mod body;
pub mod codegen;
pub mod data;
pub mod error;
pub mod escape;
pub mod har;
pub mod headers;
pub mod response;
pub mod schema;
pub mod settings;

pub use body::{BodyDescriptor, decode};
pub use codegen::{CodeArtifact, Dialect};
pub use error::StoreError;
pub use har::{Exchange, Har};
pub use headers::{HeaderFilterList, Preset, include};
pub use schema::{Schema, infer};
