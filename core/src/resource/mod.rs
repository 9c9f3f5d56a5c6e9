mod id;
mod meta;

pub use id::ResourceId;
pub use meta::ResourceMeta;

pub(crate) use meta::millis_precision;
