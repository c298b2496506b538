//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod merchandise;
pub mod registration;
pub mod user;

// Re-export commonly used models
pub use event::{
    CreateEventRequest, Event, EventStatus, FormField, NewFormField, UpdateEventRequest,
};
pub use merchandise::{
    CartLine, CartLineStatus, CheckoutOutcome, CreateMerchandiseItemRequest, MerchandiseItem,
    NewCartLine, UpdateMerchandiseItemRequest,
};
pub use registration::{
    FormResponse, Guest, NewGuest, NewRegistration, PaymentStatus, Registration,
    RegistrationChanges, RegistrationStatus, SubmittedResponse,
};
pub use user::{User, UserRole};
