mod common;

use std::sync::Arc;

use common::{Guild, BOT};
use lobby_bot::lobby::maps::{self, MAPVOTE_DURATION};
use serenity::model::id::UserId;

#[tokio::test(start_paused = true)]
async fn test_mapvote_counts_live_reactions_without_bot() {
    let guild = Guild::new();
    let (_, _, text) = guild.lobby("Map Lobby");
    let gw = Arc::clone(&guild.gateway);

    let poll = tokio::spawn({
        let gw = Arc::clone(&gw);
        async move { maps::run_mapvote(&*gw, text, MAPVOTE_DURATION).await }
    });

    while gw.messages_in(text).is_empty() {
        tokio::task::yield_now().await;
    }
    let message = gw.messages_in(text)[0].id;
    gw.react(message, "❄️", UserId::new(1));
    gw.react(message, "❄️", UserId::new(2));
    gw.react(message, "🚀", UserId::new(3));

    let results = poll.await.unwrap().unwrap();
    assert_eq!(
        results,
        vec![
            ("🚀 Skeld".to_string(), 1),
            ("✈️ Mira".to_string(), 0),
            ("❄️ Polus".to_string(), 2),
        ]
    );

    let poll_message = &gw.messages_in(text)[0];
    assert_eq!(poll_message.embed_title(), Some("Map vote"));
    assert_eq!(
        gw.call_count(&format!("add_reaction {text}")),
        maps::MAPS.len()
    );
}

#[tokio::test(start_paused = true)]
async fn test_map_picker_returns_first_valid_pick() {
    let guild = Guild::new();
    let (_, _, text) = guild.lobby("Map Lobby");
    let gw = &guild.gateway;

    gw.script_reaction("❄️", BOT);
    gw.script_reaction("✅", UserId::new(1));
    gw.script_reaction("✈️", UserId::new(2));
    gw.script_reaction("🚀", UserId::new(3));

    let picked = maps::pick_map(&**gw, text, maps::MAP_PICK_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(picked.map(|m| m.name), Some("mira"));

    let prompt = gw.texts_in(text);
    assert_eq!(
        prompt,
        vec!["Select a map by reacting to this message.\n🚀 - Skeld\n✈️ - Mira\n❄️ - Polus"]
    );
    assert_eq!(
        gw.call_count(&format!("add_reaction {text}")),
        maps::MAPS.len()
    );
}

#[tokio::test(start_paused = true)]
async fn test_map_picker_times_out_without_pick() {
    let guild = Guild::new();
    let (_, _, text) = guild.lobby("Map Lobby");
    let gw = &guild.gateway;

    let started = tokio::time::Instant::now();
    let picked = maps::pick_map(&**gw, text, maps::MAP_PICK_TIMEOUT)
        .await
        .unwrap();

    assert!(picked.is_none());
    assert!(started.elapsed() >= maps::MAP_PICK_TIMEOUT);
}
