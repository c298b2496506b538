//! Repository implementations over PostgreSQL

pub mod event;
pub mod merchandise;
pub mod registration;
pub mod user;

pub use event::EventRepository;
pub use merchandise::MerchandiseRepository;
pub use registration::RegistrationRepository;
pub use user::UserRepository;
