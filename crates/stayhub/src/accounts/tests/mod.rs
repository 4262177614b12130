mod common;

mod session;
mod tokens;
