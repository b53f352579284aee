//! Full sessions against the scripted game server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::Message;

use super::*;
use crate::api::SessionEnd;
use crate::session::AuthFailure;
use crate::App;

/// Walk the bot from `connected` to a selected table 2.
async fn seat(conn: &mut ServerConnection) {
    conn.send("connected", json!({ "playerId": 7, "playerName": "bot" })).await;
    let login = conn.expect_command("login").await;
    assert_eq!(login, json!({ "username": "bot", "password": "secret" }));

    conn.send("login", json!({ "success": true, "token": "tok" })).await;
    let params = conn.expect_command("userParams").await;
    assert_eq!(params, json!({ "token": "tok" }));

    conn.send("userParams", json!({ "success": true, "username": "bot" })).await;
    conn.expect_command("getTables").await;

    conn.send(
        "getTables",
        json!({ "tables": [table_json(1, 6, false), table_json(2, 2, false)] }),
    )
    .await;
    let select = conn.expect_command("selectTable").await;
    assert_eq!(select, json!({ "tableId": 2 }));
}

#[tokio::test]
async fn raises_exactly_once_when_turn_repeats_before_decision() {
    let server = TestServer::bind().await;
    let gate = Arc::new(Notify::new());
    let llm = Arc::new(
        ScriptedLlm::new(r#"{"action":"RAISE","amount":50,"reason":"value bet"}"#, "null")
            .gated(Arc::clone(&gate)),
    );
    let app = App::with_llm(agent_config(server.url(), &[]), llm.clone());

    let script = async {
        let mut conn = server.accept().await;
        seat(&mut conn).await;

        conn.send(
            "holeCards",
            json!({ "players": [{ "playerId": 7, "cards": ["AS", "KS"] }] }),
        )
        .await;
        conn.send("statusUpdate", status_json(true)).await;
        conn.send("statusUpdate", status_json(true)).await;

        // Let both updates reach the dispatcher before the oracle answers.
        tokio::time::sleep(Duration::from_millis(200)).await;
        gate.notify_one();

        let raise = conn.expect_command("setRaise").await;
        assert_eq!(raise, json!({ "tableId": 2, "amount": 50 }));
        assert!(conn.commands_within(Duration::from_millis(300)).await.is_empty());

        conn.close().await;
    };

    let (end, ()) = tokio::join!(app.run(), script);
    assert_eq!(end.unwrap(), SessionEnd::ChannelClosed);
    assert_eq!(llm.action_calls(), 1);
}

#[tokio::test]
async fn unusable_oracle_answer_folds() {
    let server = TestServer::bind().await;
    let llm = Arc::new(ScriptedLlm::new("I'd probably raise, maybe", "null"));
    let app = App::with_llm(agent_config(server.url(), &[]), llm);

    let script = async {
        let mut conn = server.accept().await;
        seat(&mut conn).await;
        conn.send("statusUpdate", status_json(true)).await;

        let fold = conn.expect_command("setFold").await;
        assert_eq!(fold, json!({ "tableId": 2 }));
        conn.close().await;
    };

    let (end, ()) = tokio::join!(app.run(), script);
    assert_eq!(end.unwrap(), SessionEnd::ChannelClosed);
}

#[tokio::test]
async fn rejected_login_ends_session_without_retry() {
    let server = TestServer::bind().await;
    let llm = Arc::new(ScriptedLlm::new("{}", "null"));
    let app = App::with_llm(agent_config(server.url(), &[]), llm);

    let script = async {
        let mut conn = server.accept().await;
        conn.send("connected", json!({ "playerId": 7, "playerName": "bot" })).await;
        conn.expect_command("login").await;
        conn.send("login", json!({ "success": false })).await;

        // The bot hangs up instead of logging in again.
        assert_eq!(conn.next_command().await, None);
    };

    let (end, ()) = tokio::join!(app.run(), script);
    assert_eq!(
        end.unwrap(),
        SessionEnd::AuthFailed(AuthFailure::LoginRejected)
    );
}

#[tokio::test]
async fn request_tables_handshake_uses_early_listing() {
    let server = TestServer::bind().await;
    let llm = Arc::new(ScriptedLlm::new("{}", "null"));
    let config = agent_config(
        server.url(),
        &[
            ("POKER_HANDSHAKE", "request_tables"),
            ("POKER_TABLE_ID", "5"),
            ("POKER_TABLE_PASSWORD", "pw"),
        ],
    );
    let app = App::with_llm(config, llm.clone());

    let script = async {
        let mut conn = server.accept().await;
        conn.expect_command("getTables").await;
        conn.send("getTables", json!({ "tables": [table_json(5, 1, true)] })).await;

        conn.send("connected", json!({ "playerId": 7, "playerName": "bot" })).await;
        conn.expect_command("login").await;
        conn.send("login", json!({ "success": true, "token": "tok" })).await;
        conn.expect_command("userParams").await;
        conn.send("userParams", json!({ "success": true })).await;

        let select = conn.expect_command("selectTable").await;
        assert_eq!(select, json!({ "tableId": 5, "password": "pw" }));
        conn.close().await;
    };

    let (end, ()) = tokio::join!(app.run(), script);
    assert_eq!(end.unwrap(), SessionEnd::ChannelClosed);
    assert_eq!(llm.action_calls(), 0);
}

#[tokio::test]
async fn answers_ping_before_anything_else() {
    let server = TestServer::bind().await;
    let llm = Arc::new(ScriptedLlm::new("{}", "null"));
    let app = App::with_llm(agent_config(server.url(), &[]), llm);

    let script = async {
        let mut conn = server.accept().await;
        conn.ping(b"hb").await;
        conn.send("connected", json!({ "playerId": 7, "playerName": "bot" })).await;

        assert_eq!(conn.next_frame().await, Some(Message::Pong(b"hb".to_vec())));
        conn.expect_command("login").await;
        conn.close().await;
    };

    let (end, ()) = tokio::join!(app.run(), script);
    assert_eq!(end.unwrap(), SessionEnd::ChannelClosed);
}

#[tokio::test]
async fn replies_to_chat_from_others_only() {
    let server = TestServer::bind().await;
    let llm = Arc::new(ScriptedLlm::new("{}", "Nice try."));
    let app = App::with_llm(agent_config(server.url(), &[]), llm.clone());

    let script = async {
        let mut conn = server.accept().await;
        seat(&mut conn).await;

        conn.send(
            "chatMessage",
            json!({ "chatMessage": { "playerName": "bot", "message": "gg" } }),
        )
        .await;
        conn.send(
            "chatMessage",
            json!({ "chatMessage": { "playerName": "alice", "message": "you fold like paper" } }),
        )
        .await;

        let reply = conn.expect_command("chatMessage").await;
        assert_eq!(reply, json!({ "message": "Nice try." }));
        assert!(conn.commands_within(Duration::from_millis(200)).await.is_empty());
        conn.close().await;
    };

    let (end, ()) = tokio::join!(app.run(), script);
    assert_eq!(end.unwrap(), SessionEnd::ChannelClosed);
    assert_eq!(llm.chat_calls(), 1);
}

#[tokio::test]
async fn unreachable_server_is_an_error() {
    let llm = Arc::new(ScriptedLlm::new("{}", "null"));
    let app = App::with_llm(agent_config("ws://127.0.0.1:1", &[]), llm);
    assert!(app.run().await.is_err());
}

#[tokio::test]
async fn unknown_keys_are_skipped_without_ending_the_session() {
    let server = TestServer::bind().await;
    let llm = Arc::new(ScriptedLlm::new("{}", "null"));
    let app = App::with_llm(agent_config(server.url(), &[]), llm);

    let script = async {
        let mut conn = server.accept().await;
        conn.send("tournamentSchedule", json!({ "next": "tomorrow" })).await;
        seat(&mut conn).await;

        conn.send("leaderboard", json!({ "rows": [] })).await;
        conn.send("statusUpdate", status_json(true)).await;
        let fold = conn.expect_command("setFold").await;
        assert_eq!(fold, json!({ "tableId": 2 }));
        conn.close().await;
    };

    let (end, ()) = tokio::join!(app.run(), script);
    assert_eq!(end.unwrap(), SessionEnd::ChannelClosed);
}
