pub mod db;
pub mod page;
pub mod security;
pub mod session;
pub mod sqlx_utils;
#[cfg(test)]
pub mod test_utils;
pub mod template;
pub mod utils;
