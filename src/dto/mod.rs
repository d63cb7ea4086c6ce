pub mod health;
pub mod room;
pub mod sse;
pub mod validation;
