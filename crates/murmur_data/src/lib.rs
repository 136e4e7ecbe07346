//! Plain data types shared by the murmur crates.

pub mod data;

pub use data::effect::{EffectKind, ExternalId};
pub use data::entity::EntityId;
pub use data::force::ForceKind;
pub use data::transform::Transform;
pub use data::vector::Vec3;
pub use data::ParseKindError;
