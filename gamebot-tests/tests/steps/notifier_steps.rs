use cucumber::{given, then, when};
use gamebot_core::{NotifierConfig, NotifierPolicy, TurnNotifier};
use gamebot_tests::{GameWorld, QUIET_INTERVAL};

#[given(expr = "a turn notifier with the {string} policy")]
async fn notifier_with_policy(world: &mut GameWorld, policy: String) {
    let policy: NotifierPolicy = policy.parse().expect("known policy");
    let config = NotifierConfig::new()
        .with_policy(policy)
        .with_quiet_interval(QUIET_INTERVAL);
    world.notifier = Some(TurnNotifier::new(world.transport.clone(), config));
}

#[when(expr = "it posts {string}")]
async fn posts(world: &mut GameWorld, text: String) {
    world.notifier().post(text).await;
}

#[when("the quiet interval passes")]
async fn quiet_interval_passes(_world: &mut GameWorld) {
    tokio::time::sleep(QUIET_INTERVAL * 4).await;
}

#[when("the notifier is cleaned up")]
async fn cleaned_up(world: &mut GameWorld) {
    world.notifier().cleanup().await;
}

#[then(expr = "exactly {int} notification(s) was/were sent")]
async fn notifications_sent(world: &mut GameWorld, count: usize) {
    assert_eq!(
        world.notifications_sent().len(),
        count,
        "sent: {:?}",
        world.notifications_sent()
    );
}

#[then(expr = "the notification reads {string}")]
async fn notification_reads(world: &mut GameWorld, text: String) {
    let message = world.notifier().message().await.expect("a live notification");
    assert_eq!(world.transport.content(message).as_deref(), Some(text.as_str()));
}

#[then(expr = "{int} notification(s) is/are visible")]
async fn visible(world: &mut GameWorld, count: usize) {
    assert_eq!(world.transport.live_messages().len(), count);
}
