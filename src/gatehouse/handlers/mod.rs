//! Route handlers for the admission gate service.
//!
//! `/login` runs the gate; `/portal` is the public diversion target and is
//! deliberately not behind it. The probe endpoints follow the usual
//! live/ready/health split.

pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

pub mod portal;
pub use self::portal::portal;

pub mod root;
pub use self::root::root;
