use super::*;
use crate::board::Board;
use crate::session::{MatchSnapshot, MatchStatus, SessionError};
use serde_json::json;

#[test]
fn inbound_move_parses_index() {
    let msg: ClientMessage =
        serde_json::from_str(r#"{"type":"move","index":4}"#).expect("parse move");
    assert_eq!(msg, ClientMessage::Move { index: 4 });
}

#[test]
fn inbound_reset_and_chat_parse() {
    let reset: ClientMessage = serde_json::from_str(r#"{"type":"reset"}"#).expect("parse reset");
    assert_eq!(reset, ClientMessage::Reset);

    let chat: ClientMessage =
        serde_json::from_str(r#"{"type":"chat","text":"gg"}"#).expect("parse chat");
    assert_eq!(chat, ClientMessage::Chat { text: "gg".into() });
}

#[test]
fn unknown_type_is_rejected() {
    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"teleport"}"#).is_err());
    assert!(serde_json::from_str::<ClientMessage>(r#"{"index":4}"#).is_err());
}

#[test]
fn move_with_missing_index_is_rejected() {
    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"move"}"#).is_err());
}

#[test]
fn init_carries_symbol_and_room() {
    let room = Uuid::new_v4();
    let value = serde_json::to_value(ServerMessage::Init { symbol: Symbol::O, room })
        .expect("serialize init");
    assert_eq!(
        value,
        json!({"type": "init", "symbol": "O", "room": room.to_string()})
    );
}

#[test]
fn update_is_a_flat_tagged_snapshot() {
    let mut board = Board::new();
    board.place(0, Symbol::X).expect("corner should be free");

    let value = serde_json::to_value(ServerMessage::Update(MatchSnapshot {
        board,
        turn: Symbol::O,
        status: MatchStatus::InProgress,
        winner: None,
        winning_line: None,
    }))
    .expect("serialize update");

    assert_eq!(
        value,
        json!({
            "type": "update",
            "board": ["X", null, null, null, null, null, null, null, null],
            "turn": "O",
            "status": "inProgress",
            "winner": null,
            "winningLine": null,
        })
    );
}

#[test]
fn won_update_reports_winner_and_line() {
    let mut board = Board::new();
    for index in [0, 1, 2] {
        board.place(index, Symbol::X).expect("row cell should be free");
    }
    let value = serde_json::to_value(ServerMessage::Update(MatchSnapshot {
        board,
        turn: Symbol::O,
        status: MatchStatus::Won,
        winner: Some(Symbol::X),
        winning_line: Some([0, 1, 2]),
    }))
    .expect("serialize update");

    assert_eq!(value["status"], json!("won"));
    assert_eq!(value["winner"], json!("X"));
    assert_eq!(value["winningLine"], json!([0, 1, 2]));
}

#[test]
fn room_full_and_opponent_left_tags() {
    let value = serde_json::to_value(ServerMessage::RoomFull { message: "room already has two players".into() })
        .expect("serialize roomFull");
    assert_eq!(value["type"], json!("roomFull"));

    let value = serde_json::to_value(ServerMessage::OpponentLeft).expect("serialize opponentLeft");
    assert_eq!(value, json!({"type": "opponentLeft"}));
}

#[test]
fn chat_broadcast_carries_sender_and_timestamp() {
    let value = serde_json::to_value(ServerMessage::Chat(ChatMessage::new(Symbol::X, "hello")))
        .expect("serialize chat");
    assert_eq!(value["type"], json!("chat"));
    assert_eq!(value["sender"], json!("X"));
    assert_eq!(value["text"], json!("hello"));
    assert!(value["ts"].as_i64().expect("ts should be numeric") > 0);
}

#[test]
fn error_from_typed_rejection() {
    let msg = ServerMessage::error_from(&SessionError::NotYourTurn);
    let value = serde_json::to_value(msg).expect("serialize error");
    assert_eq!(value["type"], json!("error"));
    assert_eq!(value["code"], json!("E_NOT_YOUR_TURN"));
    assert_eq!(value["message"], json!("it is not your turn"));
}

#[test]
fn server_message_round_trips() {
    let original = ServerMessage::Init { symbol: Symbol::X, room: Uuid::new_v4() };
    let json = serde_json::to_string(&original).expect("serialize");
    let restored: ServerMessage = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, original);
}
