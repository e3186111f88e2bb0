//! Address fields projected from the selector into a consuming form.

use serde::{Deserialize, Serialize};

use crate::location::Level;

/// Receives resolved display names as selections change.
///
/// `None` means the level was cleared.
pub trait AddressSink {
    fn project(&mut self, level: Level, name: Option<&str>);
}

impl<T: AddressSink + ?Sized> AddressSink for &mut T {
    fn project(&mut self, level: Level, name: Option<&str>) {
        (**self).project(level, name)
    }
}

/// The address part of a volunteer form. Empty strings mean unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub province: String,
    pub municipality: String,
    pub barangay: String,
}

impl AddressFields {
    pub fn field(&self, level: Level) -> &str {
        match level {
            Level::Province => &self.province,
            Level::Municipality => &self.municipality,
            Level::Barangay => &self.barangay,
        }
    }

    fn field_mut(&mut self, level: Level) -> &mut String {
        match level {
            Level::Province => &mut self.province,
            Level::Municipality => &mut self.municipality,
            Level::Barangay => &mut self.barangay,
        }
    }
}

impl AddressSink for AddressFields {
    fn project(&mut self, level: Level, name: Option<&str>) {
        let field = self.field_mut(level);
        field.clear();
        if let Some(name) = name {
            field.push_str(name);
        }
    }
}
