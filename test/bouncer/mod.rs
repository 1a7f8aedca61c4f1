#![cfg(unix)]

mod cli;
mod common;
mod fixture;
