pub mod codec;
pub mod permissions;
