pub mod account_repo;
pub mod journal_repo;
pub mod sequence_repo;
