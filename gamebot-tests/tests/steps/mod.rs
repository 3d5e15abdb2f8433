mod notifier_steps;
mod registry_steps;
mod turn_game_steps;
