//! Integration test exercising the Postgres adapters a full pipeline run
//! touches: task lookup, run/step creation, and cancellation, against a
//! real database.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use pipeline_core::domain::{PipelineRun, PipelineStepRun, StepStatus, Task};
use pipeline_core::ports::{PipelineRunRepository, PipelineStepRunRepository, TaskRepository};
use pipeline_db::repositories::{PgPipelineRunRepository, PgPipelineStepRunRepository, PgTaskRepository};
use pipeline_test_utils::{create_test_db, drop_test_db};

async fn insert_task(pool: &PgPool, task: &Task) {
    sqlx::query("INSERT INTO tasks (id, tenant_id, title, input_spec) VALUES ($1, $2, $3, $4)")
        .bind(task.id)
        .bind(task.tenant_id)
        .bind(&task.title)
        .bind(&task.input_spec)
        .execute(pool)
        .await
        .expect("failed to seed task");
}

#[tokio::test]
async fn task_repository_is_tenant_scoped() {
    let (pool, db_name) = create_test_db().await;

    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();
    let task = Task {
        id: Uuid::new_v4(),
        tenant_id: tenant_a,
        title: "Build a widget".to_string(),
        input_spec: "widgets should spin".to_string(),
    };
    insert_task(&pool, &task).await;

    let repo = PgTaskRepository::new(pool.clone());
    let found = repo.get_by_id(task.id, tenant_a).await.unwrap();
    assert_eq!(found.unwrap().id, task.id);

    let not_found = repo.get_by_id(task.id, tenant_b).await.unwrap();
    assert!(not_found.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn pipeline_run_and_step_round_trip_through_postgres() {
    let (pool, db_name) = create_test_db().await;

    let tenant_id = Uuid::new_v4();
    let task = Task {
        id: Uuid::new_v4(),
        tenant_id,
        title: "Build a widget".to_string(),
        input_spec: "widgets should spin".to_string(),
    };
    insert_task(&pool, &task).await;

    let run_repo = PgPipelineRunRepository::new(pool.clone());
    let step_repo = PgPipelineStepRunRepository::new(pool.clone());

    let now = Utc::now();
    let run = PipelineRun::new_running(Uuid::new_v4(), task.id, tenant_id, now);
    let created_run = run_repo.create(run.clone()).await.unwrap();

    let fetched = run_repo.get_by_id(created_run.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, run.status);
    assert_eq!(fetched.current_step, 1);

    let mut step = PipelineStepRun::new_running(Uuid::new_v4(), created_run.id, 1, now);
    step_repo.create(step.clone()).await.unwrap();

    step.complete(now);
    step_repo.update(&step).await.unwrap();

    let steps = step_repo.get_by_pipeline_run_id(created_run.id).await.unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].status, StepStatus::Completed);

    let mut run = fetched;
    run.advance(now);
    run_repo.update(&run).await.unwrap();

    let reloaded = run_repo.get_by_id(run.id).await.unwrap().unwrap();
    assert_eq!(reloaded.current_step, 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}
