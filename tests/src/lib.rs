#![cfg(test)]

mod pipeline;
mod stores;
mod support;
