use cucumber::{given, then, when};
use gamebot_tests::GameWorld;

// ===== Given Steps =====

#[given(expr = "players {string} and {string}")]
async fn players(world: &mut GameWorld, first: String, second: String) {
    world.participant(&first);
    world.participant(&second);
}

// ===== When Steps =====

#[when(expr = "{string} starts {string} with {string}")]
async fn start_with(world: &mut GameWorld, author: String, game: String, opponent: String) {
    let author = world.participant(&author);
    let opponent = world.participant(&opponent);
    let result = world
        .commands
        .start_session(&game, &author, &[opponent])
        .await;
    world.record(result);
}

#[when(expr = "{string} starts {string} alone")]
async fn start_alone(world: &mut GameWorld, author: String, game: String) {
    let author = world.participant(&author);
    let result = world.commands.start_session(&game, &author, &[]).await;
    world.record(result);
}

#[when(expr = "{string} ends the game with {string}")]
async fn end_with(world: &mut GameWorld, author: String, opponent: String) {
    let author = world.participant(&author);
    let opponent = world.participant(&opponent);
    let result = world.commands.end_session(&author, &[opponent]).await;
    world.last_reply = world.record(result);
}

#[when("the bot shuts down")]
async fn shut_down(world: &mut GameWorld) {
    world.last_report = Some(world.ctx.registry.shutdown_all().await);
}

// ===== Then Steps =====

#[then(expr = "the last command fails with {string}")]
async fn last_command_fails(world: &mut GameWorld, message: String) {
    assert_eq!(world.last_error.as_deref(), Some(message.as_str()));
}

#[then(expr = "the reply is {string}")]
async fn reply_is(world: &mut GameWorld, reply: String) {
    assert_eq!(world.last_reply.as_deref(), Some(reply.as_str()));
}

#[then(expr = "there is/are {int} running session(s)")]
async fn running_sessions(world: &mut GameWorld, count: usize) {
    assert_eq!(
        world.ctx.registry.len(),
        count,
        "registry: {:?}",
        world.ctx.registry.snapshot()
    );
}

#[then(expr = "{string} is in {int} session(s)")]
async fn sessions_of(world: &mut GameWorld, name: String, count: usize) {
    let participant = world.participant(&name);
    assert_eq!(world.ctx.registry.sessions_for(participant.id()).len(), count);
}

#[then(expr = "the shutdown report lists {int} ended session(s) and no failures")]
async fn shutdown_report(world: &mut GameWorld, ended: usize) {
    let report = world.last_report.as_ref().expect("No shutdown ran");
    assert_eq!(report.ended.len(), ended);
    assert!(report.is_clean(), "failures: {:?}", report.failures);
}
