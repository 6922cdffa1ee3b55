//! Flat-file repositories for credentials, admins and responder links

pub mod admin;
pub mod responder_link;
pub mod user;

pub use admin::AdminRepository;
pub use responder_link::ResponderLinks;
pub use user::UserRepository;
