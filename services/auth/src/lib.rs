//! Credentials, roles and run visibility for the dispatch log
//!
//! Everything here works over flat files shared between workstations: the
//! credential file, the admin list and the responder-link map.

pub mod access;
pub mod error;
pub mod models;
pub mod repositories;
pub mod session;
pub mod validation;

pub use access::{AccessPolicy, Assignment};
pub use error::{AuthError, AuthResult};
pub use models::{NewUser, ProfileUpdate, Role, UserRecord};
pub use repositories::{AdminRepository, ResponderLinks, UserRepository};
pub use session::{Session, login};
