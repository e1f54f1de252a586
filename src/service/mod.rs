pub mod issue;
pub mod validate;

/// Most active tokens a single owner may hold.
pub const MAX_ACTIVE_TOKENS_PER_OWNER: i64 = 10;

/// Generation attempts before a fingerprint unique-violation becomes fatal.
pub const MAX_GENERATION_ATTEMPTS: u32 = 3;
