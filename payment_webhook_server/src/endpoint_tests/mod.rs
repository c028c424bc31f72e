pub mod helpers;
pub mod mocks;

mod webhook;
