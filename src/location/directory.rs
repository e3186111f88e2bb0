//! The directory seam: anything that can list options for a level.

use async_trait::async_trait;

use super::types::{LocationError, LocationOption, OptionsKey};

/// A read-only hierarchical location directory.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn provinces(&self) -> Result<Vec<LocationOption>, LocationError>;

    async fn municipalities(&self, province: &str) -> Result<Vec<LocationOption>, LocationError>;

    async fn barangays(&self, municipality: &str) -> Result<Vec<LocationOption>, LocationError>;

    /// Dispatch on a request key.
    async fn list(&self, key: &OptionsKey) -> Result<Vec<LocationOption>, LocationError> {
        match key {
            OptionsKey::Provinces => self.provinces().await,
            OptionsKey::Municipalities(code) => self.municipalities(code).await,
            OptionsKey::Barangays(code) => self.barangays(code).await,
        }
    }
}

#[async_trait]
impl<T: Directory + ?Sized> Directory for std::sync::Arc<T> {
    async fn provinces(&self) -> Result<Vec<LocationOption>, LocationError> {
        (**self).provinces().await
    }

    async fn municipalities(&self, province: &str) -> Result<Vec<LocationOption>, LocationError> {
        (**self).municipalities(province).await
    }

    async fn barangays(&self, municipality: &str) -> Result<Vec<LocationOption>, LocationError> {
        (**self).barangays(municipality).await
    }

    async fn list(&self, key: &OptionsKey) -> Result<Vec<LocationOption>, LocationError> {
        (**self).list(key).await
    }
}
