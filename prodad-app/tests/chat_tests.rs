use prodad_app::assistant::{respond, ChatSession};
use prodad_model::{Reaction, Sender};
use prodad_storage::ProDadStore;

fn session() -> (ProDadStore, ChatSession) {
    let store = ProDadStore::open_in_memory().unwrap();
    (store.clone(), ChatSession::new(store))
}

#[test]
fn send_persists_both_sides_of_the_exchange() {
    let (_store, chat) = session();
    let reply = chat.send("my toddler won't sleep").unwrap();
    assert_eq!(reply.sender, Sender::Ai);
    assert_eq!(reply.content, respond("my toddler won't sleep"));

    let history = chat.history().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[0].content, "my toddler won't sleep");
    assert_eq!(history[1].id, reply.id);
}

#[test]
fn history_keeps_conversation_order() {
    let (_store, chat) = session();
    chat.send("first question").unwrap();
    chat.send("second question").unwrap();

    let history = chat.history().unwrap();
    assert_eq!(history.len(), 4);
    let contents: Vec<_> = history
        .iter()
        .filter(|m| m.sender == Sender::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["first question", "second question"]);
}

#[test]
fn reactions_toggle_through_the_session() {
    let (_store, chat) = session();
    let reply = chat.send("hello").unwrap();

    assert_eq!(chat.react(&reply.id, Reaction::Liked).unwrap(), Some(Some(Reaction::Liked)));
    // Same reaction again clears, the other one replaces
    assert_eq!(chat.react(&reply.id, Reaction::Liked).unwrap(), Some(None));
    assert_eq!(
        chat.react(&reply.id, Reaction::Disliked).unwrap(),
        Some(Some(Reaction::Disliked))
    );
    assert_eq!(chat.react("no-such-id", Reaction::Liked).unwrap(), None);
}

#[test]
fn reset_clears_the_conversation() {
    let (_store, chat) = session();
    chat.send("hello").unwrap();
    chat.reset().unwrap();
    assert!(chat.history().unwrap().is_empty());
}
