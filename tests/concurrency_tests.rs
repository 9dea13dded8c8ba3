mod common;

use common::{caller, initialized, new_task, screenshot, verified_success, TestContext};
use hovertask::application::payments::InitializePayment;
use hovertask::domain::money::Balance;
use hovertask::error::Error;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_concurrent_submits_for_last_slot_admit_exactly_one() {
    let ctx = Arc::new(TestContext::new());
    let task_id = ctx
        .lifecycle
        .create(1, new_task(dec!(50), 1))
        .await
        .unwrap()
        .id;

    let a = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.lifecycle.submit(2, task_id, screenshot(), None).await })
    };
    let b = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.lifecycle.submit(3, task_id, screenshot(), None).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(Error::TaskExhausted))));

    let view = ctx.lifecycle.get(task_id).await.unwrap();
    assert_eq!(view.task.task_count_remaining, 0);
    assert_eq!(ctx.lifecycle.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_approvals_credit_once() {
    let ctx = Arc::new(TestContext::new());
    let task = ctx
        .lifecycle
        .create(1, new_task(dec!(50), 5))
        .await
        .unwrap();
    ctx.lifecycle.submit(2, task.id, screenshot(), None).await.unwrap();
    let submission_id = ctx.lifecycle.history().await.unwrap()[0].id;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.settlement.approve_submission(submission_id).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(
        ctx.settlement.balance(2).await.unwrap(),
        Balance::new(dec!(50))
    );
}

#[tokio::test]
async fn test_concurrent_verifies_settle_once() {
    let ctx = Arc::new(TestContext::new());
    ctx.gateway.push_init(Ok(initialized("ref_1")));
    ctx.payments
        .initialize(
            &caller(4),
            InitializePayment {
                amount: dec!(500),
                order_id: None,
            },
        )
        .await
        .unwrap();

    // Both callers pass the fail-fast check while the deposit is pending, both
    // reach the gateway, and the store transition admits exactly one.
    ctx.gateway
        .push_verify(Ok(verified_success("ref_1", 50_000, 4)));
    ctx.gateway
        .push_verify(Ok(verified_success("ref_1", 50_000, 4)));

    let a = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.payments.verify("ref_1").await })
    };
    let b = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.payments.verify("ref_1").await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(Error::AlreadyProcessed))));
    assert_eq!(
        ctx.payments.balance(4).await.unwrap(),
        Balance::new(dec!(500))
    );
}
