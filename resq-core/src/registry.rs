use dashmap::{DashMap, mapref::entry::Entry};
use std::{fmt, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::{
    error::{IncidentError, Result},
    incident::{Incident, IncidentId, IncidentStatus, Severity},
};

/// Exclusive access to one incident record. Transitions for that incident
/// are serialized behind it; other incidents are unaffected.
pub type IncidentGuard = OwnedMutexGuard<Incident>;

/// Process-wide map from incident id to its authoritative record.
///
/// Each record sits behind its own lock, so there is no lock spanning all
/// incidents. Map shard locks are never held across an `.await`.
#[derive(Default)]
pub struct IncidentRegistry {
    incidents: DashMap<IncidentId, Arc<Mutex<Incident>>>,
}

impl fmt::Debug for IncidentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncidentRegistry")
            .field("incident_count", &self.incidents.len())
            .finish()
    }
}

impl IncidentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new incident at the first step.
    pub fn create(&self, id: IncidentId, severity: Severity) -> Result<Incident> {
        self.insert(Incident::new(id, severity))
    }

    /// Register a fully built incident record (intake path).
    pub fn insert(&self, incident: Incident) -> Result<Incident> {
        match self.incidents.entry(incident.id.clone()) {
            Entry::Occupied(_) => Err(IncidentError::AlreadyExists(incident.id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(incident.clone())));
                info!(
                    incident_id = %incident.id,
                    severity = %incident.severity,
                    "incident registered"
                );
                Ok(incident)
            }
        }
    }

    /// Snapshot of the current record.
    pub async fn get(&self, id: &IncidentId) -> Result<Incident> {
        let record = self.record(id)?;
        let incident = record.lock().await;
        Ok(incident.clone())
    }

    /// Validate and apply a status change in place.
    pub async fn set_status(
        &self,
        id: &IncidentId,
        new_status: IncidentStatus,
    ) -> Result<Incident> {
        let mut incident = self.lock(id).await?;
        incident
            .advance_to(new_status)
            .map_err(|rejection| IncidentError::invalid_transition(id, rejection))?;
        Ok(incident.clone())
    }

    /// Take exclusive access to one incident.
    pub async fn lock(&self, id: &IncidentId) -> Result<IncidentGuard> {
        let record = self.record(id)?;
        Ok(record.lock_owned().await)
    }

    /// All incidents, newest first.
    pub async fn list(&self) -> Vec<Incident> {
        let records: Vec<Arc<Mutex<Incident>>> = self
            .incidents
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut incidents = Vec::with_capacity(records.len());
        for record in records {
            incidents.push(record.lock().await.clone());
        }
        incidents.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
        });
        incidents
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &IncidentId) -> bool {
        self.incidents.contains_key(id)
    }

    /// Number of registered incidents.
    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    /// No incidents registered.
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    fn record(&self, id: &IncidentId) -> Result<Arc<Mutex<Incident>>> {
        match self.incidents.get(id) {
            Some(entry) => Ok(Arc::clone(entry.value())),
            None => {
                debug!(incident_id = %id, "lookup for unknown incident");
                Err(IncidentError::NotFound(id.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransitionRejection;

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let registry = IncidentRegistry::new();
        registry.create("I-1".into(), Severity::Critical).unwrap();

        let err = registry.create("I-1".into(), Severity::Low).unwrap_err();
        assert_eq!(err, IncidentError::AlreadyExists("I-1".into()));

        let stored = registry.get(&"I-1".into()).await.unwrap();
        assert_eq!(stored.severity, Severity::Critical);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let registry = IncidentRegistry::new();
        let err = registry.get(&"I-404".into()).await.unwrap_err();
        assert_eq!(err, IncidentError::NotFound("I-404".into()));
    }

    #[tokio::test]
    async fn set_status_moves_forward_only() {
        let registry = IncidentRegistry::new();
        let id = IncidentId::from("I-1");
        registry.create(id.clone(), Severity::Medium).unwrap();

        let updated = registry
            .set_status(&id, IncidentStatus::Dispatched)
            .await
            .unwrap();
        assert_eq!(updated.status, IncidentStatus::Dispatched);

        let err = registry
            .set_status(&id, IncidentStatus::Preparing)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            IncidentError::InvalidTransition {
                incident_id: id.clone(),
                rejection: TransitionRejection::Backward {
                    from: IncidentStatus::Dispatched,
                    to: IncidentStatus::Preparing,
                },
            }
        );
        assert_eq!(
            registry.get(&id).await.unwrap().status,
            IncidentStatus::Dispatched
        );
    }

    #[tokio::test]
    async fn set_status_unknown_is_not_found() {
        let registry = IncidentRegistry::new();
        let err = registry
            .set_status(&"I-404".into(), IncidentStatus::Resolved)
            .await
            .unwrap_err();
        assert!(matches!(err, IncidentError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let registry = IncidentRegistry::new();
        let mut older = Incident::new("I-old".into(), Severity::Low);
        older.created_at -= chrono::Duration::minutes(5);
        registry.insert(older).unwrap();
        registry.create("I-new".into(), Severity::High).unwrap();

        let ids: Vec<String> = registry
            .list()
            .await
            .into_iter()
            .map(|incident| incident.id.to_string())
            .collect();
        assert_eq!(ids, ["I-new", "I-old"]);
    }
}
