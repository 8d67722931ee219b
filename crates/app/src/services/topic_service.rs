//! Topic service: maintenance categories.

use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::{NotFoundError, PmTrackError};
use pmtrack_domain::id::TopicId;
use pmtrack_domain::topic::{Topic, TopicPatch};

use crate::ports::TopicRepository;

/// Application service for topic CRUD operations.
pub struct TopicService<T> {
    repo: T,
}

impl<T: TopicRepository> TopicService<T> {
    pub fn new(repo: T) -> Self {
        Self { repo }
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_topics(
        &self,
        actor: &Actor,
        is_active: Option<bool>,
    ) -> Result<Vec<Topic>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        let topics = self.repo.get_all().await?;
        Ok(topics
            .into_iter()
            .filter(|topic| is_active.is_none_or(|active| topic.is_active == active))
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown topic.
    pub async fn get_topic(&self, actor: &Actor, id: TopicId) -> Result<Topic, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find(id).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageFacilities`.
    pub async fn create_topic(&self, actor: &Actor, topic: Topic) -> Result<Topic, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        topic.validate()?;
        self.repo.create(topic).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown topic.
    pub async fn update_topic(
        &self,
        actor: &Actor,
        id: TopicId,
        patch: TopicPatch,
    ) -> Result<Topic, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut topic = self.find(id).await?;
        topic.apply(patch)?;
        self.repo.update(topic).await
    }

    /// Soft delete a topic.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown topic.
    pub async fn delete_topic(&self, actor: &Actor, id: TopicId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut topic = self.find(id).await?;
        topic.deactivate();
        self.repo.update(topic).await?;
        Ok(())
    }

    async fn find(&self, id: TopicId) -> Result<Topic, PmTrackError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Topic",
                id: id.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemory, actor, user};
    use pmtrack_domain::user::UserRole;

    #[tokio::test]
    async fn should_create_and_soft_delete_topic() {
        let service = TopicService::new(InMemory::default());
        let manager = actor(&user("manager", UserRole::Manager));
        let topic = service
            .create_topic(&manager, Topic::new("Electrical", None).unwrap())
            .await
            .unwrap();
        service.delete_topic(&manager, topic.id).await.unwrap();
        let active = service.list_topics(&manager, Some(true)).await.unwrap();
        assert!(active.is_empty());
        assert!(!service.get_topic(&manager, topic.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn should_let_technician_read_but_not_write() {
        let service = TopicService::new(InMemory::default());
        let technician = actor(&user("tech", UserRole::Technician));
        assert!(service.list_topics(&technician, None).await.is_ok());
        let result = service
            .create_topic(&technician, Topic::new("Electrical", None).unwrap())
            .await;
        assert!(matches!(result, Err(PmTrackError::Forbidden(_))));
    }
}
