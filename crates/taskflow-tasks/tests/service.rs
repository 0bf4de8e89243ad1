//! Ownership rules of the task service.

use std::sync::Arc;
use taskflow_tasks::{MemoryTaskRepository, NewTask, TaskError, TaskService, TaskUpdate};
use uuid::Uuid;

fn service() -> TaskService {
    TaskService::new(Arc::new(MemoryTaskRepository::new()))
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: None,
    }
}

#[tokio::test]
async fn test_create_and_list_own_tasks() {
    let service = service();
    let ann = Uuid::now_v7();
    let bob = Uuid::now_v7();

    let task = service.create(ann, new_task("Buy milk")).await.unwrap();
    service.create(bob, new_task("Walk dog")).await.unwrap();

    let listed = service.list(ann).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, task.id);
    assert_eq!(listed[0].user_id, ann);
}

#[tokio::test]
async fn test_create_requires_title() {
    let service = service();
    let result = service.create(Uuid::now_v7(), new_task("  ")).await;
    assert!(matches!(result, Err(TaskError::ValidationFailed(_))));
}

#[tokio::test]
async fn test_owner_can_update() {
    let service = service();
    let ann = Uuid::now_v7();
    let task = service.create(ann, new_task("Draft")).await.unwrap();

    let updated = service
        .update(
            ann,
            task.id,
            TaskUpdate {
                title: Some("Final".to_string()),
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Final");
    assert!(updated.completed);
    assert!(updated.updated_at >= task.updated_at);
    assert_eq!(service.list(ann).await.unwrap(), vec![updated]);
}

#[tokio::test]
async fn test_other_user_is_forbidden() {
    let service = service();
    let ann = Uuid::now_v7();
    let mallory = Uuid::now_v7();
    let task = service.create(ann, new_task("Private")).await.unwrap();

    let update = service
        .update(
            mallory,
            task.id,
            TaskUpdate {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await;
    let delete = service.delete(mallory, task.id).await;

    assert!(matches!(update, Err(TaskError::Forbidden)));
    assert!(matches!(delete, Err(TaskError::Forbidden)));
    let listed = service.list(ann).await.unwrap();
    assert_eq!(listed, vec![task]);
}

#[tokio::test]
async fn test_missing_task_is_not_found() {
    let service = service();
    let ann = Uuid::now_v7();

    let update = service
        .update(ann, Uuid::now_v7(), TaskUpdate::default())
        .await;
    let delete = service.delete(ann, Uuid::now_v7()).await;

    assert!(matches!(update, Err(TaskError::NotFound)));
    assert!(matches!(delete, Err(TaskError::NotFound)));
}

#[tokio::test]
async fn test_owner_can_delete() {
    let service = service();
    let ann = Uuid::now_v7();
    let task = service.create(ann, new_task("Done")).await.unwrap();

    service.delete(ann, task.id).await.unwrap();

    assert!(service.list(ann).await.unwrap().is_empty());
    assert!(matches!(
        service.delete(ann, task.id).await,
        Err(TaskError::NotFound)
    ));
}

#[tokio::test]
async fn test_empty_update_leaves_task_untouched() {
    let service = service();
    let ann = Uuid::now_v7();
    let task = service.create(ann, new_task("Draft")).await.unwrap();

    let same = service
        .update(ann, task.id, TaskUpdate::default())
        .await
        .unwrap();
    assert_eq!(same, task);

    // Ownership is still enforced for empty updates.
    let bob = Uuid::now_v7();
    let result = service.update(bob, task.id, TaskUpdate::default()).await;
    assert!(matches!(result, Err(TaskError::Forbidden)));
}
