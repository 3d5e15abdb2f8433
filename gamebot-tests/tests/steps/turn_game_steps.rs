use cucumber::{given, then, when};
use gamebot_core::games::tictactoe::{Outcome, TicTacToe, COLUMN_CONTROLS, ROW_CONTROLS};
use gamebot_core::games::GAME_OVER;
use gamebot_core::{DispatchOutcome, GameSession, SessionStatus};
use gamebot_tests::GameWorld;

#[given(expr = "a tic-tac-toe game between {string} and {string} where {string} starts")]
async fn tictactoe_game(world: &mut GameWorld, first: String, second: String, starter: String) {
    let players = vec![world.participant(&first), world.participant(&second)];
    let starter = world.participant(&starter);

    let game = TicTacToe::starting_with(world.ctx.clone(), players, starter.id())
        .expect("two players");
    assert!(world.ctx.registry.reserve(game.identity(), game.clone()));
    game.begin().await.expect("board posted");
    world.game = Some(game);
}

#[when(expr = "{string} picks row {int} and column {int}")]
async fn pick(world: &mut GameWorld, name: String, row: usize, col: usize) {
    let board = world
        .game()
        .board_message()
        .await
        .expect("board was posted");

    world.react(&name, board, ROW_CONTROLS[row - 1]).await;
    world.react(&name, board, COLUMN_CONTROLS[col - 1]).await;
}

#[when("the game is ended twice")]
async fn end_twice(world: &mut GameWorld) {
    let game = world.game().clone();
    game.end().await.expect("first end");
    game.end().await.expect("second end");
}

#[then(expr = "the board says {string}")]
async fn board_says(world: &mut GameWorld, text: String) {
    let board = world.game().board_message().await.expect("board was posted");
    let content = world.transport.content(board).expect("board still exists");
    assert!(content.contains(&text), "board:\n{}", content);
}

#[then(expr = "it is the turn of {string}")]
async fn turn_of(world: &mut GameWorld, name: String) {
    let expected = world.participant(&name);
    assert_eq!(world.game().current_player().await, expected.id());
}

#[then(expr = "{string} has won")]
async fn has_won(world: &mut GameWorld, name: String) {
    let game = world.game();
    let seat = game
        .participants()
        .iter()
        .position(|p| p.name() == name)
        .expect("winner is a participant");
    assert_eq!(game.outcome().await, Some(Outcome::Winner(seat)));
}

#[then("the game is over")]
async fn game_over(world: &mut GameWorld) {
    let game = world.game();
    assert_eq!(game.status(), SessionStatus::Ended);

    let board = game.board_message().await.expect("board was posted");
    assert!(world.ctx.registry.session_for_message(board).is_none());
    let stored = world.transport.message(board).expect("board still exists");
    assert!(stored.content.contains(GAME_OVER));
    assert!(stored.markers.is_empty());
}

#[then("the reaction was rejected")]
async fn reaction_rejected(world: &mut GameWorld) {
    assert_eq!(world.last_outcome, Some(DispatchOutcome::Rejected));
}
