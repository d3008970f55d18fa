use serde_json::json;

use crate::*;

#[tokio::test]
async fn test_probe_then_extend_over_http() {
    let a = Node::spawn(1).await;

    let r = a
        .post("/pubsub/probe", json!({ "target_id": a.user, "task_id": "T1" }))
        .await
        .unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    let lease = r.json();
    assert_eq!(lease["id"], 0);
    assert_eq!(lease["task_id"], "T1");
    let first_expiration = lease["expiration"].as_u64().unwrap();

    // Only one device: the next probe finds nothing.
    let r = a
        .post("/pubsub/probe", json!({ "target_id": a.user, "task_id": "T2" }))
        .await
        .unwrap();
    assert_eq!(r.status, 503);

    let r = a
        .post(
            "/pubsub/extend",
            json!({ "target_id": a.user, "id": 0, "task_id": "T1", "lease": 600 }),
        )
        .await
        .unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    assert!(r.json()["expiration"].as_u64().unwrap() > first_expiration);
}

#[tokio::test]
async fn test_extend_by_other_task_is_not_found() {
    let a = Node::spawn(1).await;
    a.post("/pubsub/probe", json!({ "target_id": a.user, "task_id": "T1" }))
        .await
        .unwrap();

    let r = a
        .post(
            "/pubsub/extend",
            json!({ "target_id": a.user, "id": 0, "task_id": "T2", "lease": 60 }),
        )
        .await
        .unwrap();
    assert_eq!(r.status, 404);

    let r = a
        .post(
            "/pubsub/extend",
            json!({ "target_id": a.user, "id": 7, "task_id": "T1", "lease": 60 }),
        )
        .await
        .unwrap();
    assert_eq!(r.status, 404);
}

#[tokio::test]
async fn test_stale_target_is_conflict() {
    let a = Node::spawn(1).await;

    let r = a
        .post("/pubsub/probe", json!({ "target_id": "someone-else", "task_id": "T1" }))
        .await
        .unwrap();
    assert_eq!(r.status, 409);
    assert!(r.body.starts_with("requested server is gone"), "{}", r.body);

    // Nothing was leased.
    assert_eq!(a.governor.leases().free_count().await, 1);
}

#[tokio::test]
async fn test_lease_bounds_are_validated() {
    let a = Node::spawn(1).await;
    a.post("/pubsub/probe", json!({ "target_id": a.user, "task_id": "T1" }))
        .await
        .unwrap();

    for secs in [0, MAX_LEASE_SECS + 1] {
        let r = a
            .post(
                "/pubsub/extend",
                json!({ "target_id": a.user, "id": 0, "task_id": "T1", "lease": secs }),
            )
            .await
            .unwrap();
        assert_eq!(r.status, 400, "lease {secs}");
    }
}

#[tokio::test]
async fn test_acquire_prefers_local_devices() {
    let a = Node::spawn(1).await;
    let b = Node::spawn(1).await;
    b.join(&a).await.unwrap();

    let r = a
        .post("/api/acquire", json!({ "task_id": "job-1" }))
        .await
        .unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    assert_eq!(r.json()["user"], a.user.as_str());
    assert_eq!(b.governor.leases().free_count().await, 1);
}

#[tokio::test]
async fn test_acquire_forwards_to_neighbor() {
    let a = Node::spawn(0).await;
    let b = Node::spawn(1).await;
    b.join(&a).await.unwrap();

    let r = a
        .post("/api/acquire", json!({ "task_id": "job-1", "lease": 900 }))
        .await
        .unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    let placed = r.json();
    assert_eq!(placed["user"], b.user.as_str());
    assert_eq!(placed["host"], b.host.as_str());
    assert_eq!(placed["lease"]["task_id"], "job-1");
    assert!(placed.get("requested_secs").is_none());

    // The follow-up extend stretched the lease past the 60s default.
    let devices = b.get("/api/devices").await.unwrap().json();
    let remaining = devices["devices"][0]["expires_in_ms"].as_u64().unwrap();
    assert!(remaining > 60_000, "remaining {remaining}");
    assert_eq!(devices["devices"][0]["task_id"], "job-1");

    // Swarm is now full.
    let r = a.post("/api/acquire", json!({})).await.unwrap();
    assert_eq!(r.status, 503);
}

/// A neighbor that caps leases below the request still grants its default,
/// and the reply says how long was asked for.
#[tokio::test]
async fn test_forwarded_acquire_reports_shortfall() {
    let a = Node::spawn(0).await;
    let b = Node::spawn_with_max_lease(1, 100).await;
    b.join(&a).await.unwrap();

    let r = a
        .post("/api/acquire", json!({ "task_id": "job", "lease": 900 }))
        .await
        .unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    let placed = r.json();
    assert_eq!(placed["user"], b.user.as_str());
    assert_eq!(placed["requested_secs"], 900);

    let devices = b.get("/api/devices").await.unwrap().json();
    let remaining = devices["devices"][0]["expires_in_ms"].as_u64().unwrap();
    assert!(remaining <= 60_000, "remaining {remaining}");
}

#[tokio::test]
async fn test_acquire_without_task_id_generates_one() {
    let a = Node::spawn(1).await;
    let r = a.post("/api/acquire", json!({})).await.unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    let task = r.json()["lease"]["task_id"].as_str().unwrap().to_string();
    assert_eq!(task.len(), 32);
}

#[tokio::test]
async fn test_renew_routes_to_owning_node() {
    let a = Node::spawn(0).await;
    let b = Node::spawn(1).await;
    b.join(&a).await.unwrap();

    let placed = a
        .post("/api/acquire", json!({ "task_id": "job-1" }))
        .await
        .unwrap()
        .json();
    let id = placed["lease"]["id"].as_u64().unwrap();

    let r = a
        .post(
            "/api/renew",
            json!({ "target_id": b.user, "id": id, "task_id": "job-1", "lease": 1200 }),
        )
        .await
        .unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    assert_eq!(r.json()["user"], b.user.as_str());

    let r = a
        .post(
            "/api/renew",
            json!({ "target_id": b.user, "id": id, "task_id": "other", "lease": 60 }),
        )
        .await
        .unwrap();
    assert_eq!(r.status, 404);
}

#[tokio::test]
async fn test_renew_local_lease() {
    let a = Node::spawn(1).await;
    a.post("/api/acquire", json!({ "task_id": "job-1" }))
        .await
        .unwrap();

    let r = a
        .post(
            "/api/renew",
            json!({ "target_id": a.user, "id": 0, "task_id": "job-1", "lease": 300 }),
        )
        .await
        .unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    assert_eq!(r.json()["user"], a.user.as_str());
}
