pub mod account;
pub mod error;
pub mod generation;
pub mod resolver;
pub mod roster;

#[cfg(test)]
mod test_support;
