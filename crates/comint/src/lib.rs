//! Command line front end for comint: replays recorded shell output through
//! a session and prints the resulting transcript.

pub mod cli;
pub mod render;
pub mod replay;
