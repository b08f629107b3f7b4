//! Todo CRUD scoped to the authenticated owner.
//!
//! Every lookup by id distinguishes "no such todo" (`NotFound`) from
//! "somebody else's todo" (`Forbidden`). Update and delete are a single
//! conditional write on `(id, user_id)`; only when it matches nothing is the
//! row looked up again to pick the error.

use sqlx::{query, query_as, query_scalar, Pool, Sqlite};
use tracing::info;

use crate::{
    error::AppError,
    model::{CurrentUser, Todo},
    schema::UpdateTodoSchema,
};

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title must not be empty".into()));
    }
    Ok(())
}

// Explains why a write scoped to `user` matched no row.
async fn miss_reason(db: &Pool<Sqlite>, id: i64) -> Result<AppError, AppError> {
    let owner = query_scalar::<_, i64>("SELECT user_id FROM todo WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(match owner {
        Some(_) => AppError::Forbidden,
        None => AppError::NotFound,
    })
}

pub async fn list_todos(db: &Pool<Sqlite>, user: &CurrentUser) -> Result<Vec<Todo>, AppError> {
    let todos = query_as::<_, Todo>(
        "SELECT id, title, completed, user_id FROM todo WHERE user_id = ? ORDER BY id",
    )
    .bind(user.id)
    .fetch_all(db)
    .await?;
    Ok(todos)
}

pub async fn create_todo(
    db: &Pool<Sqlite>,
    user: &CurrentUser,
    title: Option<String>,
) -> Result<Todo, AppError> {
    let title = title.unwrap_or_default();
    validate_title(&title)?;

    let todo = query_as::<_, Todo>(
        "INSERT INTO todo (title, completed, user_id) VALUES (?, 0, ?) RETURNING id, title, completed, user_id",
    )
    .bind(title)
    .bind(user.id)
    .fetch_one(db)
    .await?;

    info!(user_id = user.id, todo_id = todo.id, "todo created");
    Ok(todo)
}

pub async fn update_todo(
    db: &Pool<Sqlite>,
    user: &CurrentUser,
    id: i64,
    patch: UpdateTodoSchema,
) -> Result<Todo, AppError> {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }

    // NULL binds keep the stored value
    let updated = query_as::<_, Todo>(
        "UPDATE todo SET title = COALESCE(?, title), completed = COALESCE(?, completed) \
         WHERE id = ? AND user_id = ? RETURNING id, title, completed, user_id",
    )
    .bind(patch.title)
    .bind(patch.completed)
    .bind(id)
    .bind(user.id)
    .fetch_optional(db)
    .await?;

    match updated {
        Some(todo) => {
            info!(user_id = user.id, todo_id = id, "todo updated");
            Ok(todo)
        }
        None => Err(miss_reason(db, id).await?),
    }
}

pub async fn delete_todo(db: &Pool<Sqlite>, user: &CurrentUser, id: i64) -> Result<(), AppError> {
    let deleted = query("DELETE FROM todo WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.id)
        .execute(db)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(miss_reason(db, id).await?);
    }

    info!(user_id = user.id, todo_id = id, "todo deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth, db};

    async fn user(pool: &Pool<Sqlite>, name: &str) -> CurrentUser {
        sqlx::query_as::<_, crate::model::User>(
            "INSERT INTO user (username, password_hash) VALUES (?, 'x') RETURNING id, username, password_hash",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
        .into()
    }

    #[tokio::test]
    async fn create_then_list() {
        let pool = db::memory().await;
        let alice = user(&pool, "alice").await;

        let todo = create_todo(&pool, &alice, Some("Buy milk".into())).await.unwrap();
        assert!(!todo.completed);
        assert_eq!(todo.user_id, alice.id);

        let todos = list_todos(&pool, &alice).await.unwrap();
        assert_eq!(todos, vec![todo]);
    }

    #[tokio::test]
    async fn create_requires_title() {
        let pool = db::memory().await;
        let alice = user(&pool, "alice").await;

        for title in [None, Some(String::new()), Some("   ".into())] {
            let err = create_todo(&pool, &alice, title).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(list_todos(&pool, &alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_are_private() {
        let pool = db::memory().await;
        let alice = user(&pool, "alice").await;
        let bob = user(&pool, "bob").await;

        create_todo(&pool, &alice, Some("A".into())).await.unwrap();
        create_todo(&pool, &bob, Some("B".into())).await.unwrap();

        let bobs = list_todos(&pool, &bob).await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert!(bobs.iter().all(|t| t.user_id == bob.id));
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let pool = db::memory().await;
        let alice = user(&pool, "alice").await;
        let todo = create_todo(&pool, &alice, Some("A".into())).await.unwrap();

        let patch = UpdateTodoSchema {
            completed: Some(true),
            ..Default::default()
        };
        let updated = update_todo(&pool, &alice, todo.id, patch).await.unwrap();
        assert_eq!(updated.title, "A");
        assert!(updated.completed);

        let patch = UpdateTodoSchema {
            title: Some("B".into()),
            ..Default::default()
        };
        let updated = update_todo(&pool, &alice, todo.id, patch).await.unwrap();
        assert_eq!(updated.title, "B");
        assert!(updated.completed);
    }

    #[tokio::test]
    async fn update_rejects_blank_title() {
        let pool = db::memory().await;
        let alice = user(&pool, "alice").await;
        let todo = create_todo(&pool, &alice, Some("A".into())).await.unwrap();

        let patch = UpdateTodoSchema {
            title: Some(String::new()),
            completed: Some(true),
        };
        let err = update_todo(&pool, &alice, todo.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // nothing was written
        let todos = list_todos(&pool, &alice).await.unwrap();
        assert!(!todos[0].completed);
    }

    #[tokio::test]
    async fn foreign_todo_is_forbidden_missing_is_not_found() {
        let pool = db::memory().await;
        let alice = user(&pool, "alice").await;
        let bob = user(&pool, "bob").await;
        let todo = create_todo(&pool, &alice, Some("A".into())).await.unwrap();

        let err = update_todo(&pool, &bob, todo.id, UpdateTodoSchema::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        let err = delete_todo(&pool, &bob, todo.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = update_todo(&pool, &bob, 999, UpdateTodoSchema::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        assert_eq!(list_todos(&pool, &alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_twice() {
        let pool = db::memory().await;
        let alice: CurrentUser = auth::register(&pool, "alice", "pw1").await.unwrap().into();
        let todo = create_todo(&pool, &alice, Some("A".into())).await.unwrap();

        delete_todo(&pool, &alice, todo.id).await.unwrap();
        let err = delete_todo(&pool, &alice, todo.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    async fn file_pool(dir: &tempfile::TempDir) -> Pool<Sqlite> {
        let url = format!("sqlite://{}", dir.path().join("todo.db").display());
        let pool = db::connect(&url, 10).await.unwrap();
        db::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_of_own_todos_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let pool = file_pool(&dir).await;
        let alice = user(&pool, "alice").await;

        let mut ids = Vec::new();
        for i in 0..20 {
            let todo = create_todo(&pool, &alice, Some(format!("todo {i}"))).await.unwrap();
            ids.push(todo.id);
        }

        let tasks: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let pool = pool.clone();
                let alice = alice.clone();
                tokio::spawn(async move { delete_todo(&pool, &alice, id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert!(list_todos(&pool, &alice).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_of_one_todo_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let pool = file_pool(&dir).await;
        let alice = user(&pool, "alice").await;
        let id = create_todo(&pool, &alice, Some("A".into())).await.unwrap().id;

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let pool = pool.clone();
                let alice = alice.clone();
                let patch = UpdateTodoSchema {
                    completed: Some(i % 2 == 0),
                    ..Default::default()
                };
                tokio::spawn(async move { update_todo(&pool, &alice, id, patch).await })
            })
            .collect();
        for task in tasks {
            let updated = task.await.unwrap().unwrap();
            assert_eq!(updated.title, "A");
        }

        // the row survived and is still alice's
        let todos = list_todos(&pool, &alice).await.unwrap();
        assert_eq!(todos.len(), 1);
    }
}
