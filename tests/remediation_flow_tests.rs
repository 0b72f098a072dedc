//! 整改流程集成测试
//!
//! 直接驱动服务层：从持久化的审计结果创建计划、跟踪进度、
//! 复验整改项。ServiceNow 指向不可达地址，复验路径因此只能
//! 拿到 error 结果，正好覆盖"未修复不改状态"的分支。

use secrecy::Secret;
use snow_audit_service::config::{AuditSettings, ServiceNowConfig};
use snow_audit_service::models::{
    AuditResult, AuditRunStatus, AuditType, CheckOutcome, CheckStatus, ItemStatus, PlanStatus,
    Severity,
};
use snow_audit_service::repository::AuditStore;
use snow_audit_service::services::{AuditEngine, RemediationService};
use snow_audit_service::snow::ServiceNowClient;
use std::sync::Arc;
use uuid::Uuid;

fn test_settings(storage_path: &str) -> AuditSettings {
    AuditSettings {
        storage_path: storage_path.to_string(),
        sample_limit: 10,
        stale_ci_days: 90,
        stale_schedule_days: 7,
        orphan_rate_threshold: 0.20,
        stale_rate_threshold: 0.10,
        duplicate_rate_threshold: 0.05,
        missing_field_rate_threshold: 0.15,
        pattern_min_count: 5,
    }
}

fn unreachable_client() -> Arc<ServiceNowClient> {
    let config = ServiceNowConfig {
        instance_url: "http://127.0.0.1:1".to_string(),
        username: "auditor".to_string(),
        password: Secret::new("test-password".to_string()),
        timeout_secs: 1,
        max_retries: 0,
        retry_backoff_ms: 1,
    };
    Arc::new(ServiceNowClient::from_config(&config).unwrap())
}

async fn service_with_store(dir: &tempfile::TempDir) -> (RemediationService, AuditStore) {
    let storage_path = dir.path().to_str().unwrap();
    let store = AuditStore::new(storage_path);
    store.ensure_dirs().await.unwrap();
    let engine = Arc::new(AuditEngine::new(
        unreachable_client(),
        test_settings(storage_path),
    ));
    (RemediationService::new(engine, store.clone()), store)
}

fn failed_audit() -> AuditResult {
    let mut result = AuditResult::started(AuditType::Full);
    result.checks = vec![
        CheckOutcome::new(
            "unassigned_assets",
            "Detect active assets with no assigned user",
            Severity::Low,
            CheckStatus::Fail,
            "3 active assets have no assigned user".to_string(),
        )
        .with_affected(3, vec!["a1".into(), "a2".into(), "a3".into()]),
        CheckOutcome::new(
            "missing_ip_address",
            "Detect server CIs missing IP address",
            Severity::Critical,
            CheckStatus::Fail,
            "20.0% missing rate".to_string(),
        ),
        CheckOutcome::new(
            "orphan_cis",
            "Detect CIs with no relationships",
            Severity::Medium,
            CheckStatus::Pass,
            "orphan rate below threshold".to_string(),
        ),
        CheckOutcome::new(
            "pattern_coverage",
            "Check active discovery pattern count",
            Severity::Medium,
            CheckStatus::Error,
            "upstream unreachable".to_string(),
        ),
    ];
    result.status = AuditRunStatus::CompletedWithErrors;
    result
}

#[tokio::test]
async fn test_plan_built_from_failures_in_priority_order() {
    let dir = tempfile::tempdir().unwrap();
    let (service, store) = service_with_store(&dir).await;

    let audit = failed_audit();
    store.save_audit(&audit).await.unwrap();

    let plan = service.create_plan(audit.id).await.unwrap();

    // pass/error 不产生整改项，剩下的按优先级降序
    assert_eq!(plan.items.len(), 2);
    assert_eq!(plan.items[0].check_name, "missing_ip_address");
    assert_eq!(plan.items[0].priority, Severity::Critical);
    assert_eq!(plan.items[1].check_name, "unassigned_assets");
    assert_eq!(plan.items[1].target_ids, vec!["a1", "a2", "a3"]);
    assert_eq!(plan.status, PlanStatus::Active);
    assert!(plan.items.iter().all(|i| i.status == ItemStatus::Pending));

    // 注册表中的动作文案被采用
    assert_eq!(
        plan.items[1].action,
        "Assign active assets to responsible users or teams"
    );
}

#[tokio::test]
async fn test_plan_without_failures_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (service, store) = service_with_store(&dir).await;

    let mut audit = AuditResult::started(AuditType::Cmdb);
    audit.checks = vec![CheckOutcome::new(
        "orphan_cis",
        "Detect CIs with no relationships",
        Severity::Medium,
        CheckStatus::Pass,
        String::new(),
    )];
    audit.status = AuditRunStatus::Passed;
    store.save_audit(&audit).await.unwrap();

    let plan = service.create_plan(audit.id).await.unwrap();
    assert_eq!(plan.status, PlanStatus::Empty);
    assert!(plan.items.is_empty());
}

#[tokio::test]
async fn test_track_progress_recomputes_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (service, store) = service_with_store(&dir).await;

    let audit = failed_audit();
    store.save_audit(&audit).await.unwrap();
    let plan = service.create_plan(audit.id).await.unwrap();

    // 手动推进一项到 done，模拟外部整改完成
    let mut stored = store.load_plan(plan.id).await.unwrap();
    stored.items[0].status = ItemStatus::Done;
    store.save_plan(&stored).await.unwrap();

    let progress = service.track_progress(plan.id).await.unwrap();
    assert_eq!(progress.total_items, 2);
    assert_eq!(progress.done, 1);
    assert_eq!(progress.pending, 1);
    assert_eq!(progress.progress_pct, 50.0);
    assert_eq!(progress.status, PlanStatus::Active);

    // 进度已回写
    let reloaded = store.load_plan(plan.id).await.unwrap();
    assert_eq!(reloaded.progress_pct, 50.0);
}

#[tokio::test]
async fn test_done_plus_skipped_completes_plan() {
    let dir = tempfile::tempdir().unwrap();
    let (service, store) = service_with_store(&dir).await;

    let audit = failed_audit();
    store.save_audit(&audit).await.unwrap();
    let plan = service.create_plan(audit.id).await.unwrap();

    let mut stored = store.load_plan(plan.id).await.unwrap();
    stored.items[0].status = ItemStatus::Done;
    stored.items[1].status = ItemStatus::Skipped;
    store.save_plan(&stored).await.unwrap();

    let progress = service.track_progress(plan.id).await.unwrap();
    assert_eq!(progress.status, PlanStatus::Completed);
    // skipped 不计入进度分子
    assert_eq!(progress.progress_pct, 50.0);
}

#[tokio::test]
async fn test_validate_unknown_item_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (service, store) = service_with_store(&dir).await;

    let audit = failed_audit();
    store.save_audit(&audit).await.unwrap();
    let plan = service.create_plan(audit.id).await.unwrap();

    let err = service
        .validate_fix(plan.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code(), 404);
}

#[tokio::test]
async fn test_validate_with_unreachable_check_keeps_item_status() {
    let dir = tempfile::tempdir().unwrap();
    let (service, store) = service_with_store(&dir).await;

    let audit = failed_audit();
    store.save_audit(&audit).await.unwrap();
    let plan = service.create_plan(audit.id).await.unwrap();
    let item_id = plan.items[0].id;

    let outcome = service.validate_fix(plan.id, item_id).await.unwrap();

    // 复验检查落入 error，项未被判定为已修复
    assert!(!outcome.is_fixed);
    assert_eq!(outcome.previous_status, ItemStatus::Pending);
    assert_eq!(outcome.new_check_status, CheckStatus::Error);

    let reloaded = store.load_plan(plan.id).await.unwrap();
    let item = reloaded.items.iter().find(|i| i.id == item_id).unwrap();
    assert_eq!(item.status, ItemStatus::Pending);
    assert!(item.notes.starts_with("Validation failed:"));
}

#[tokio::test]
async fn test_validate_unregistered_check_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let (service, store) = service_with_store(&dir).await;

    let mut audit = AuditResult::started(AuditType::Full);
    audit.checks = vec![CheckOutcome::new(
        "legacy_check",
        "A check that no longer exists",
        Severity::Low,
        CheckStatus::Fail,
        String::new(),
    )];
    store.save_audit(&audit).await.unwrap();

    let plan = service.create_plan(audit.id).await.unwrap();
    // 未注册的检查退回通用整改文案
    assert_eq!(plan.items[0].action, "Remediate: A check that no longer exists");

    let err = service
        .validate_fix(plan.id, plan.items[0].id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 400);
}
