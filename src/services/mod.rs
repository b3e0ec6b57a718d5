//! Service layer: validation, authorization and orchestration of repository calls.
//!
//! Every operation returns `ServiceError` from the closed taxonomy in `crate::error`;
//! handlers turn that into a status code and `{ "error": ... }` body.

pub mod blogs;
pub mod login;
pub mod users;

pub use blogs::BlogService;
pub use login::LoginService;
pub use users::UserService;
