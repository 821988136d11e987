//! Listing data access.

use chrono::Utc;
use opero_core::backend::Backend;
use opero_core::error::{ServiceError, ServiceResult};
use opero_core::property::{NewProperty, PortfolioStats, Property, PropertyFilter, PropertyUpdate};
use uuid::Uuid;

/// Reads and writes the `properties` table of one backend.
#[derive(Clone)]
pub struct PropertyService {
    backend: Backend,
}

impl PropertyService {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Lists a workspace's listings matching `filter`, newest first.
    pub async fn list_properties(
        &self,
        workspace_id: &str,
        filter: &PropertyFilter,
    ) -> ServiceResult<Vec<Property>> {
        let mut properties: Vec<Property> = self
            .backend
            .properties
            .list_by_workspace(workspace_id)
            .await?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tracing::debug!(workspace_id, count = properties.len(), "Listed properties");
        Ok(properties)
    }

    pub async fn get_property(&self, property_id: &str) -> ServiceResult<Property> {
        Ok(self.backend.properties.get(property_id).await?)
    }

    pub async fn create_property(&self, new: NewProperty) -> ServiceResult<Property> {
        new.validate()?;
        let property = new.into_property(Uuid::new_v4().to_string(), Utc::now());
        let created = self.backend.properties.insert(property).await?;
        tracing::info!(property_id = %created.id, workspace_id = %created.workspace_id, "Created property");
        Ok(created)
    }

    pub async fn update_property(
        &self,
        property_id: &str,
        update: PropertyUpdate,
    ) -> ServiceResult<Property> {
        update.validate()?;
        let mut property = self.backend.properties.get(property_id).await?;
        update.apply(&mut property, Utc::now());
        let updated = self.backend.properties.update(property).await?;
        tracing::info!(property_id, status = %updated.status, "Updated property");
        Ok(updated)
    }

    pub async fn delete_property(&self, property_id: &str) -> ServiceResult<()> {
        // Surface a missing row instead of a silent no-op.
        self.backend.properties.get(property_id).await?;
        self.backend.properties.delete(property_id).await?;
        tracing::info!(property_id, "Deleted property");
        Ok(())
    }

    /// Counts per status and the value of open listings.
    pub async fn portfolio_stats(&self, workspace_id: &str) -> ServiceResult<PortfolioStats> {
        if workspace_id.is_empty() {
            return Err(ServiceError::validation("Çalışma alanı seçilmedi."));
        }
        let properties = self.backend.properties.list_by_workspace(workspace_id).await?;
        Ok(PortfolioStats::from_properties(&properties))
    }
}
