//! Shared argument types used across multiple commands.

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
