pub mod accounts;
pub mod assignments;
pub mod profiles;
pub mod votes;
