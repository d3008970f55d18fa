use serde_json::json;

use crate::*;

#[tokio::test]
async fn test_status_shape() {
    let a = Node::spawn(2).await;
    let b = Node::spawn(1).await;
    b.join(&a).await.unwrap();
    a.post("/api/acquire", json!({ "task_id": "job-1" }))
        .await
        .unwrap();

    let status = a.get("/api/status").await.unwrap().json();
    assert_eq!(status["user"], a.user.as_str());
    assert_eq!(status["host"], a.host.as_str());
    assert_eq!(status["neighbors"], 1);
    assert_eq!(status["devices"]["total"], 2);
    assert_eq!(status["devices"]["free"], 1);
    assert_eq!(status["devices"]["reserved"], 1);
}

#[tokio::test]
async fn test_devices_listing() {
    let a = Node::spawn(2).await;
    a.post("/api/acquire", json!({ "task_id": "job-1" }))
        .await
        .unwrap();

    let devices = a.get("/api/devices").await.unwrap().json();
    let list = devices["devices"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["state"], "reserved");
    assert_eq!(list[0]["task_id"], "job-1");
    assert_eq!(list[1]["state"], "free");
    assert!(list[1].get("task_id").is_none());
}

#[tokio::test]
async fn test_neighbors_listing_starts_with_self() {
    let a = Node::spawn(1).await;
    let b = Node::spawn(1).await;
    b.join(&a).await.unwrap();

    let body = a.get("/api/neighbors").await.unwrap().json();
    let list = body["neighbors"].as_array().unwrap();
    assert_eq!(list[0]["user"], a.user.as_str());
    assert_eq!(list[1]["user"], b.user.as_str());
    assert_eq!(list[1]["host"], b.host.as_str());
}

#[tokio::test]
async fn test_neighbor_drop() {
    let a = Node::spawn(1).await;
    let b = Node::spawn(1).await;
    b.join(&a).await.unwrap();

    let r = a
        .post("/api/neighbors/drop", json!({ "user": b.user, "host": b.host }))
        .await
        .unwrap();
    assert_eq!(r.status, 200, "{}", r.body);
    assert_eq!(r.json()["dropped"], true);
    assert_eq!(a.directory().await, vec![a.user.clone()]);

    // Second drop: unknown record.
    let r = a
        .post("/api/neighbors/drop", json!({ "user": b.user, "host": b.host }))
        .await
        .unwrap();
    assert_eq!(r.status, 400);

    // The node cannot drop itself.
    let r = a
        .post("/api/neighbors/drop", json!({ "user": a.user, "host": a.host }))
        .await
        .unwrap();
    assert_eq!(r.status, 400);
}

#[tokio::test]
async fn test_shutdown_stops_serving() {
    let a = Node::spawn(1).await;
    let r = a.post("/api/daemon/shutdown", json!({})).await.unwrap();
    assert_eq!(r.status, 200);
    assert_eq!(r.json()["message"], "Shutdown initiated");

    let mut stopped = false;
    for _ in 0..50 {
        if reqwest::Client::new()
            .get(format!("{}/api/status", a.host))
            .header("connection", "close")
            .send()
            .await
            .is_err()
        {
            stopped = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(stopped, "node still answering after shutdown");
}
