//! Dashboard aggregation queries.

use std::sync::Arc;

use chrono::Utc;
use crmsync::gateway::Row;
use crmsync::{CrmClient, Dashboard, MemoryGateway, StaticSession, TableGateway};
use serde_json::json;

fn lead_row(name: &str, source: Option<&str>) -> Row {
    let mut row = Row::new();
    row.insert("user_id".into(), json!("user-a"));
    row.insert("name".into(), json!(name));
    row.insert("email".into(), json!(format!("{name}@example.com")));
    row.insert("status".into(), json!("new"));
    row.insert("score".into(), json!(0));
    row.insert("source".into(), json!(source));
    row.insert("created_at".into(), json!(Utc::now()));
    row
}

fn opportunity_row(name: &str, stage: &str, value: f64) -> Row {
    let mut row = Row::new();
    row.insert("user_id".into(), json!("user-a"));
    row.insert("name".into(), json!(name));
    row.insert("stage".into(), json!(stage));
    row.insert("value".into(), json!(value));
    row.insert("probability".into(), json!(10));
    row.insert("currency".into(), json!("USD"));
    row.insert("created_at".into(), json!(Utc::now()));
    row
}

async fn seed(gateway: &MemoryGateway) {
    for row in [
        lead_row("l1", Some("website")),
        lead_row("l2", Some("website")),
        lead_row("l3", Some("referral")),
        lead_row("l4", None),
    ] {
        gateway.insert("leads", row).await.unwrap();
    }
    for row in [
        opportunity_row("won-a", "closed-won", 100.0),
        opportunity_row("won-b", "closed-won", 300.0),
        opportunity_row("open-a", "prospecting", 50.0),
        opportunity_row("lost-a", "closed-lost", 10.0),
    ] {
        gateway.insert("opportunities", row).await.unwrap();
    }
}

fn dashboard(gateway: &Arc<MemoryGateway>) -> Dashboard {
    CrmClient::new(gateway.clone(), Arc::new(StaticSession::new("user-a"))).dashboard()
}

#[tokio::test]
async fn metrics_aggregate_the_owners_rows() {
    let gateway = Arc::new(MemoryGateway::new());
    seed(&gateway).await;

    let metrics = dashboard(&gateway).metrics().await.unwrap();
    assert_eq!(metrics.total_leads, 4);
    assert_eq!(metrics.total_opportunities, 4);
    assert_eq!(metrics.active_opportunities, 1);
    assert_eq!(metrics.total_revenue, 400.0);
    assert_eq!(metrics.avg_deal_size, 200.0);
    // 2 closed-won out of 4 leads.
    assert_eq!(metrics.conversion_rate, 50.0);
}

#[tokio::test]
async fn metrics_on_an_empty_workspace_are_all_zero() {
    let gateway = Arc::new(MemoryGateway::new());

    let metrics = dashboard(&gateway).metrics().await.unwrap();
    assert_eq!(metrics.total_leads, 0);
    assert_eq!(metrics.total_opportunities, 0);
    assert_eq!(metrics.total_revenue, 0.0);
    assert_eq!(metrics.avg_deal_size, 0.0);
    assert_eq!(metrics.conversion_rate, 0.0);
}

#[tokio::test]
async fn metrics_ignore_other_owners() {
    let gateway = Arc::new(MemoryGateway::new());
    seed(&gateway).await;

    let mut foreign = lead_row("other", Some("website"));
    foreign.insert("user_id".into(), json!("user-b"));
    gateway.insert("leads", foreign).await.unwrap();

    let metrics = dashboard(&gateway).metrics().await.unwrap();
    assert_eq!(metrics.total_leads, 4);
}

#[tokio::test]
async fn lead_sources_count_per_source_and_skip_sourceless_leads() {
    let gateway = Arc::new(MemoryGateway::new());
    seed(&gateway).await;

    let sources = dashboard(&gateway).lead_sources().await.unwrap();
    assert_eq!(sources.len(), 2);

    let websites = sources.iter().find(|p| p.source == "website").unwrap();
    assert_eq!(websites.count, 2);
    let referrals = sources.iter().find(|p| p.source == "referral").unwrap();
    assert_eq!(referrals.count, 1);
}

#[tokio::test]
async fn pipeline_groups_count_and_value_by_stage() {
    let gateway = Arc::new(MemoryGateway::new());
    seed(&gateway).await;

    let pipeline = dashboard(&gateway).pipeline().await.unwrap();
    assert_eq!(pipeline.len(), 3);

    let won = pipeline.iter().find(|p| p.stage == "closed-won").unwrap();
    assert_eq!(won.count, 2);
    assert_eq!(won.value, 400.0);

    let open = pipeline.iter().find(|p| p.stage == "prospecting").unwrap();
    assert_eq!(open.count, 1);
    assert_eq!(open.value, 50.0);
}

#[tokio::test]
async fn top_opportunities_exclude_closed_stages_and_order_by_value() {
    let gateway = Arc::new(MemoryGateway::new());
    seed(&gateway).await;
    gateway
        .insert("opportunities", opportunity_row("open-b", "negotiation", 500.0))
        .await
        .unwrap();

    let top = dashboard(&gateway).top_opportunities(5).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].name, "open-b");
    assert_eq!(top[1].name, "open-a");

    let just_one = dashboard(&gateway).top_opportunities(1).await.unwrap();
    assert_eq!(just_one.len(), 1);
    assert_eq!(just_one[0].name, "open-b");
}
