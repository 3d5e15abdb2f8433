#[allow(dead_code)]
mod support;

use gamebot_core::games::tictactoe::{self, TicTacToe, TAKEN};
use gamebot_core::games::{Connect4, GAME_OVER};
use gamebot_core::{DispatchOutcome, GameSession, Interaction, InteractionKind, SessionStatus};
use std::sync::Arc;
use std::time::Duration;
use support::{BotFixture, ScriptedSession, Teardown};

#[tokio::test]
async fn test_tictactoe_round_through_dispatcher() {
    let fixture = BotFixture::new();
    let alice = BotFixture::participant("Alice");
    let bob = BotFixture::participant("Bob");

    let game = TicTacToe::starting_with(
        fixture.ctx.clone(),
        vec![alice.clone(), bob.clone()],
        alice.id(),
    )
    .unwrap();
    assert!(fixture.ctx.registry.reserve(game.identity(), game.clone()));
    game.begin().await.unwrap();
    let board = game.board_message().await.unwrap();

    // Alice takes the top-left corner
    fixture.react(&alice, board, "1️⃣").await;
    fixture.react(&alice, board, "🥇").await;
    assert_eq!(game.cell(0, 0).await, Some(alice.id()));
    assert_eq!(game.current_player().await, bob.id());

    // Bob tries the same cell
    fixture.react(&bob, board, "1️⃣").await;
    fixture.react(&bob, board, "🥇").await;
    assert_eq!(game.status_line().await.as_deref(), Some(TAKEN));
    assert_eq!(game.current_player().await, bob.id());
    assert!(fixture.transport.content(board).unwrap().contains(TAKEN));

    for (who, row, col) in [
        (&bob, "2️⃣", "🥇"),
        (&alice, "1️⃣", "🥈"),
        (&bob, "2️⃣", "🥈"),
        (&alice, "1️⃣", "🥉"),
    ] {
        fixture.react(who, board, row).await;
        fixture.react(who, board, col).await;
    }

    assert_eq!(game.outcome().await, Some(tictactoe::Outcome::Winner(0)));
    assert_eq!(game.status(), SessionStatus::Ended);
    assert!(fixture.ctx.registry.lookup_by_identity(game.identity()).is_none());
    assert!(fixture.ctx.registry.session_for_message(board).is_none());

    let content = fixture.transport.content(board).unwrap();
    assert!(content.contains("@Alice **has won**!"));
    assert!(content.contains(GAME_OVER));

    // The board is no longer routed anywhere
    let outcome = fixture
        .dispatcher
        .dispatch(Interaction::reaction(bob.clone(), board, "3️⃣"))
        .await;
    assert_eq!(outcome, DispatchOutcome::Ignored);
}

#[tokio::test]
async fn test_outsider_marker_is_removed() {
    let fixture = BotFixture::new();
    let alice = BotFixture::participant("Alice");
    let bob = BotFixture::participant("Bob");
    let mallory = BotFixture::participant("Mallory");

    let game = TicTacToe::starting_with(
        fixture.ctx.clone(),
        vec![alice.clone(), bob.clone()],
        alice.id(),
    )
    .unwrap();
    fixture.ctx.registry.reserve(game.identity(), game.clone());
    game.begin().await.unwrap();
    let board = game.board_message().await.unwrap();

    fixture.transport.react(board, "2️⃣", mallory.id()).unwrap();
    let outcome = fixture
        .dispatcher
        .dispatch_and_wait(Interaction::reaction(mallory.clone(), board, "2️⃣"))
        .await;

    assert_eq!(outcome, DispatchOutcome::Rejected);
    assert_eq!(fixture.participant_markers(board), 0);
    assert_eq!(game.current_player().await, alice.id());
}

#[tokio::test]
async fn test_started_session_is_reachable_by_its_board() {
    let fixture = BotFixture::new();
    let alice = BotFixture::participant("Alice");
    let bob = BotFixture::participant("Bob");

    let session = fixture
        .commands
        .start_session("connect4", &alice, &[bob.clone()])
        .await
        .unwrap();

    assert_eq!(session.status(), SessionStatus::Active);
    let snapshot = fixture.ctx.registry.snapshot();
    assert_eq!(snapshot.sessions.len(), 1);
    assert_eq!(snapshot.sessions[0].game, "connect4");
    assert_eq!(snapshot.participants, 2);
    assert!(snapshot.bound_messages >= 1);

    let reply = fixture.commands.end_session(&alice, &[bob]).await.unwrap();
    assert_eq!(reply, "Ended game with @Alice and @Bob");
    assert_eq!(fixture.ctx.registry.snapshot().bound_messages, 0);
}

#[tokio::test]
async fn test_preference_change_reaches_every_session_of_the_participant() {
    let fixture = BotFixture::new();
    let alice = BotFixture::participant("Alice");
    let bob = BotFixture::participant("Bob");
    let carol = BotFixture::participant("Carol");

    let first = ScriptedSession::new(&[&alice, &bob], Teardown::Clean);
    let second = ScriptedSession::new(&[&alice, &carol], Teardown::Clean);
    let other = ScriptedSession::new(&[&bob, &carol], Teardown::Clean);
    for session in [&first, &second, &other] {
        fixture.ctx.registry.reserve(session.identity(), session.shared());
    }

    let outcome = fixture
        .dispatcher
        .dispatch_and_wait(Interaction::preference_changed(alice.clone()))
        .await;

    assert_eq!(outcome, DispatchOutcome::Delivered(2));
    assert_eq!(first.handled().len(), 1);
    assert_eq!(second.handled().len(), 1);
    assert!(other.handled().is_empty());
}

#[tokio::test]
async fn test_set_preference_redraws_running_board() {
    let fixture = BotFixture::new();
    let alice = BotFixture::participant("Alice");
    let bob = BotFixture::participant("Bob");

    let game = Connect4::starting_with(
        fixture.ctx.clone(),
        vec![alice.clone(), bob.clone()],
        alice.id(),
    )
    .unwrap();
    fixture.ctx.registry.reserve(game.identity(), game.clone());
    game.begin().await.unwrap();
    let board = game.board_message().await.unwrap();

    fixture
        .commands
        .set_preference(&alice, Some("connect4"), Some("emoji"), Some("🟣"))
        .await
        .unwrap();
    fixture.react(&alice, board, "4️⃣").await;

    assert!(fixture.transport.content(board).unwrap().contains("🟣"));
}

#[tokio::test]
async fn test_unknown_interaction_kind_is_forwarded_and_ignored() {
    let fixture = BotFixture::new();
    let alice = BotFixture::participant("Alice");
    let bob = BotFixture::participant("Bob");

    let game = TicTacToe::starting_with(
        fixture.ctx.clone(),
        vec![alice.clone(), bob.clone()],
        alice.id(),
    )
    .unwrap();
    fixture.ctx.registry.reserve(game.identity(), game.clone());
    game.begin().await.unwrap();
    let board = game.board_message().await.unwrap();
    let before = fixture.transport.content(board);

    let outcome = fixture
        .dispatcher
        .dispatch_and_wait(Interaction {
            kind: InteractionKind::parse("thread-archived"),
            participant: alice.clone(),
            symbol: None,
            message: Some(board),
        })
        .await;

    assert_eq!(outcome, DispatchOutcome::Delivered(1));
    assert_eq!(fixture.transport.content(board), before);
    assert_eq!(game.status(), SessionStatus::Active);
}

#[tokio::test]
async fn test_bot_reactions_never_reach_sessions() {
    let fixture = BotFixture::new();
    let alice = BotFixture::participant("Alice");
    let bot = fixture.ctx.bot().clone();

    let game = TicTacToe::starting_with(
        fixture.ctx.clone(),
        vec![alice.clone(), bot.clone()],
        alice.id(),
    )
    .unwrap();
    fixture.ctx.registry.reserve(game.identity(), game.clone());
    game.begin().await.unwrap();
    let board = game.board_message().await.unwrap();

    let outcome = fixture
        .dispatcher
        .dispatch(Interaction::reaction(bot, board, "1️⃣"))
        .await;

    assert_eq!(outcome, DispatchOutcome::Ignored);
    assert_eq!(game.current_player().await, alice.id());
}

#[tokio::test]
async fn test_ended_sessions_release_their_workers() {
    let fixture = BotFixture::new();
    let alice = BotFixture::participant("Alice");
    let bob = BotFixture::participant("Bob");

    for round in 0..5 {
        let game = TicTacToe::starting_with(
            fixture.ctx.clone(),
            vec![alice.clone(), bob.clone()],
            alice.id(),
        )
        .unwrap();
        assert!(fixture.ctx.registry.reserve(game.identity(), game.clone()));
        game.begin().await.unwrap();
        let board = game.board_message().await.unwrap();

        fixture.react(&alice, board, "1️⃣").await;
        assert_eq!(fixture.dispatcher.active_mailboxes(), 1, "round {}", round);

        fixture.commands.end_session(&bob, &[alice.clone()]).await.unwrap();
        assert_eq!(fixture.dispatcher.active_mailboxes(), 0, "round {}", round);

        tokio::time::timeout(Duration::from_secs(1), async {
            while Arc::strong_count(&game) > 1 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("the worker should let go of the ended session");
    }
}
