//! # Blog Core
//!
//! The domain layer of the blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, ports, form validation, pagination and ranking policies, and the
//! [`BlogService`] that ties them together.

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;
pub mod search;
pub mod service;
pub mod similar;

pub use error::DomainError;
pub use service::BlogService;
