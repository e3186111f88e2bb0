//! Cascading location selection for volunteer address forms.
//!
//! The [`selector`] keeps three dependent dropdowns (province,
//! municipality, barangay) consistent while their option lists load
//! asynchronously from a [`location::Directory`]. Resolved names are
//! projected into an [`address::AddressSink`] owned by the form.

pub mod address;
pub mod config;
pub mod location;
pub mod selector;
pub mod server;
