use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the scheduler and replicate until SIGINT or SIGTERM
    Run,

    /// Execute one task immediately and print its outcome
    RunOnce {
        #[arg(long, help = "Task name")]
        task: String,

        #[arg(long, help = "Print the outcome as JSON instead of a summary line")]
        json: bool,
    },

    /// Load and validate the configuration, then list the tasks
    Validate,

    /// Ping PostgreSQL (`SELECT 1`) and Redis (`PING`)
    TestConn,

    /// Print the stored checkpoint of a tracked task
    Checkpoint {
        #[arg(long, help = "Task name")]
        task: String,
    },
}
