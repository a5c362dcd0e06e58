use crate::cli::Commands;
use kubelaunch::config::Config;

mod completions;
mod evaluate;
mod train;

pub async fn handle_commands(config: &Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Train(train_args) => train::handle_train(config, train_args).await,
        Commands::Evaluate(evaluate_args) => evaluate::handle_evaluate(evaluate_args),
        Commands::Completions(completions_args) => {
            completions::handle_completions(completions_args)
        }
    }
}
