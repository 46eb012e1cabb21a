//! Whole sessions through the outer play loop.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use netris::core::NullDisplay;
use netris::engine::{play, EventMux, GameConfig, GravityTimer, NetMode};

fn mux_with_keys(config: &GameConfig) -> (EventMux, mpsc::Sender<u8>) {
    let mut mux = EventMux::new(GravityTimer::new(config.interval()));
    let (keys, rx) = mpsc::channel(16);
    mux.register_keys(rx);
    (mux, keys)
}

#[tokio::test(start_paused = true)]
async fn test_solo_game_is_lost_then_quit_at_the_prompt() {
    let config = GameConfig {
        seed: Some(1234),
        ..GameConfig::default()
    };
    let (mut mux, keys) = mux_with_keys(&config);

    let (counters, ()) = tokio::join!(
        async { play(&config, &mut NullDisplay, &mut mux).await.unwrap() },
        async {
            // Long enough for gravity alone to fill the board.
            sleep(Duration::from_secs(3600)).await;
            keys.send(b'q').await.unwrap();
        }
    );
    assert_eq!(counters.lost, 1);
    assert_eq!(counters.won, 0);
}

#[tokio::test(start_paused = true)]
async fn test_new_game_key_starts_another_round() {
    let config = GameConfig {
        seed: Some(99),
        ..GameConfig::default()
    };
    let (mut mux, keys) = mux_with_keys(&config);

    let (counters, ()) = tokio::join!(
        async { play(&config, &mut NullDisplay, &mut mux).await.unwrap() },
        async {
            sleep(Duration::from_secs(3600)).await;
            keys.send(b'n').await.unwrap();
            sleep(Duration::from_secs(3600)).await;
            keys.send(b'q').await.unwrap();
        }
    );
    assert_eq!(counters.lost, 2);
}

#[tokio::test]
async fn test_two_player_quit_is_a_win_for_the_other_side() {
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };
    let server_config = GameConfig {
        net: NetMode::Listen { port },
        ..GameConfig::default()
    };
    let client_config = GameConfig {
        net: NetMode::Connect {
            host: "127.0.0.1".to_string(),
            port,
        },
        ..GameConfig::default()
    };
    let (mut server_mux, server_keys) = mux_with_keys(&server_config);
    let (mut client_mux, client_keys) = mux_with_keys(&client_config);
    // Queued until the round starts; negotiation only listens to the peer.
    client_keys.send(b'q').await.unwrap();

    let (server, client) = tokio::join!(
        async { play(&server_config, &mut NullDisplay, &mut server_mux).await },
        async {
            sleep(Duration::from_millis(200)).await;
            let result = play(&client_config, &mut NullDisplay, &mut client_mux).await;
            sleep(Duration::from_secs(2)).await;
            server_keys.send(b'q').await.unwrap();
            result
        }
    );

    let client = client.unwrap();
    assert_eq!((client.won, client.lost), (0, 0));
    let server = server.unwrap();
    assert_eq!((server.won, server.lost), (1, 0));
}
