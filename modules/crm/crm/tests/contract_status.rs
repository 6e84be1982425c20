//! A sales contact without `change_contract` may flip a contract's status
//! as long as amount and payment due date are resubmitted unchanged.

mod common;

use chrono::{TimeZone, Utc};
use crm::domain::error::DomainError;
use crm_sdk::ContractPatch;
use rust_decimal::Decimal;

fn status_patch(amount: Decimal) -> ContractPatch {
    ContractPatch {
        status: Some(true),
        amount: Some(amount),
        payment_due: Some(Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()),
        ..ContractPatch::default()
    }
}

#[tokio::test]
async fn unchanged_amount_and_due_date_allow_status_change() {
    let app = common::setup().await;
    let sales = app.actor("sales_contact_01").await;

    let contract = app
        .module
        .services()
        .contracts
        .update(&sales, 1, status_patch(Decimal::new(150_000, 2)))
        .await
        .unwrap();
    assert!(contract.status);
    assert_eq!(contract.amount, Decimal::new(1500, 0));
}

#[tokio::test]
async fn changed_amount_is_forbidden() {
    let app = common::setup().await;
    let sales = app.actor("sales_contact_01").await;

    let res = app
        .module
        .services()
        .contracts
        .update(&sales, 1, status_patch(Decimal::new(999, 0)))
        .await;
    assert!(matches!(res, Err(DomainError::Forbidden)));
}

#[tokio::test]
async fn missing_fields_never_match() {
    let app = common::setup().await;
    let sales = app.actor("sales_contact_01").await;
    let contracts = &app.module.services().contracts;

    let status_only = ContractPatch {
        status: Some(true),
        ..ContractPatch::default()
    };
    assert!(matches!(
        contracts.update(&sales, 1, status_only).await,
        Err(DomainError::Forbidden)
    ));

    let no_due = ContractPatch {
        payment_due: None,
        ..status_patch(Decimal::new(1500, 0))
    };
    assert!(matches!(
        contracts.update(&sales, 1, no_due).await,
        Err(DomainError::Forbidden)
    ));
}

#[tokio::test]
async fn staff_may_change_anything() {
    let app = common::setup().await;
    let staff = app.actor("staff_contact_01").await;

    let contract = app
        .module
        .services()
        .contracts
        .update(&staff, 1, status_patch(Decimal::new(2_000_050, 2)))
        .await
        .unwrap();
    assert_eq!(contract.amount, Decimal::new(2_000_050, 2));
}

#[tokio::test]
async fn support_cannot_touch_contracts() {
    let app = common::setup().await;
    let support = app.actor("support_contact_01").await;

    let res = app
        .module
        .services()
        .contracts
        .update(&support, 1, status_patch(Decimal::new(1500, 0)))
        .await;
    assert!(matches!(res, Err(DomainError::Forbidden)));
}

#[tokio::test]
async fn status_change_carries_relation_fields_along() {
    let app = common::setup().await;
    let sales = app.actor("sales_contact_01").await;

    let patch = ContractPatch {
        client_id: Some(2),
        sales_contact_id: Some(2),
        ..status_patch(Decimal::new(1500, 0))
    };
    let contract = app
        .module
        .services()
        .contracts
        .update(&sales, 1, patch)
        .await
        .unwrap();
    assert!(contract.status);
    assert_eq!(contract.client_id, 2);
    assert_eq!(contract.sales_contact_id, 2);
    assert_eq!(contract.amount, Decimal::new(1500, 0));
}
