//! Authentication actions, kept separate from the HTTP layer so the
//! credential flow is unit-testable without a router.

mod login;
mod logout;

pub use login::LoginAction;
pub use logout::LogoutAction;
