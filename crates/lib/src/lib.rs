//! LINE relay core library: config, prompt context, Gemini client, LINE channel,
//! relay pipeline and webhook gateway used by the CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod prompt;
pub mod relay;
