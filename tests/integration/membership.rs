use serde_json::json;

use crate::*;

/// A join answers with our id and every record after our own, the caller included.
#[tokio::test]
async fn test_join_returns_directory() {
    let a = Node::spawn(1).await;
    let b = Node::spawn(1).await;
    let c = Node::spawn(1).await;

    let r = b.join(&a).await.unwrap();
    assert_eq!(r.status, 200);
    let body = r.json();
    assert_eq!(body["user"], a.user.as_str());
    let listed: Vec<&str> = body["neighbors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["user"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec![b.user.as_str()]);

    let r = c.join(&a).await.unwrap();
    let body = r.json();
    let listed: Vec<&str> = body["neighbors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["user"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec![b.user.as_str(), c.user.as_str()]);

    assert_eq!(a.directory().await, vec![a.user.clone(), b.user.clone(), c.user.clone()]);
}

#[tokio::test]
async fn test_repeated_join_is_idempotent() {
    let a = Node::spawn(1).await;
    let b = Node::spawn(1).await;

    for _ in 0..3 {
        assert_eq!(b.join(&a).await.unwrap().status, 200);
    }
    assert_eq!(a.directory().await.len(), 2);
}

/// Without an explicit host the caller's address and port are used.
#[tokio::test]
async fn test_join_without_host_uses_remote_address() {
    let a = Node::spawn(1).await;

    let r = a
        .post("/pubsub/join", json!({ "user": "remote-node", "port": 5123 }))
        .await
        .unwrap();
    assert_eq!(r.status, 200);

    let record = a.governor.neighbors().get("remote-node").await.unwrap();
    assert_eq!(record.host, "http://127.0.0.1:5123");
}

#[tokio::test]
async fn test_join_with_empty_user_is_rejected() {
    let a = Node::spawn(1).await;
    let r = a
        .post("/pubsub/join", json!({ "user": "", "port": 5000 }))
        .await
        .unwrap();
    assert_eq!(r.status, 400);
    assert_eq!(a.directory().await.len(), 1);
}

/// A join never overwrites a known user with a new host.
#[tokio::test]
async fn test_join_does_not_overwrite_known_user() {
    let a = Node::spawn(1).await;
    let b = Node::spawn(1).await;
    b.join(&a).await.unwrap();

    a.post(
        "/pubsub/join",
        json!({ "user": b.user, "port": 0, "host": "http://10.9.9.9:5000" }),
    )
    .await
    .unwrap();

    let record = a.governor.neighbors().get(&b.user).await.unwrap();
    assert_eq!(record.host, b.host);
}
